pub mod dotenv;
pub mod sheets_config;

pub use dotenv::load_dotenv;
pub use sheets_config::{ConfigLoadError, GoogleSheetConfig};
