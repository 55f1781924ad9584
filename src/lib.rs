//! Reads Google Sheets spreadsheets by name with a service account.
//!
//! ```no_run
//! # async fn run() -> error_stack::Result<(), google_sheet_client::SheetsError> {
//! use google_sheet_client::GoogleSheetClient;
//!
//! let client = GoogleSheetClient::new(None)
//!     .await
//!     .expect("service account should authenticate");
//! for record in client.fetch("Inventory").await? {
//!     println!("{:?}", record.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod logging;
pub mod retry;
pub mod sheets;

pub use client::{ClientError, GoogleSheetClient};
pub use config::{ConfigLoadError, GoogleSheetConfig};
pub use retry::{RetryDecision, RetryPolicy};
pub use sheets::{CellValue, Record, SheetsError, SpreadsheetService};
