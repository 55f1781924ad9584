pub mod a1_notation;
pub mod auth;
pub mod error;
pub mod google_service;
pub mod http_client;
pub mod records;
pub mod service;

pub use error::SheetsError;
pub use google_service::GoogleSheetsService;
pub use records::{CellValue, Record};
pub use service::{SpreadsheetHandle, SpreadsheetService, WorksheetHandle};
