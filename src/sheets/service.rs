use serde_json::Value;

use super::error::SheetsError;

/// A spreadsheet found by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetHandle {
    pub id: String,
    pub title: String,
}

/// One tab of a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetHandle {
    pub spreadsheet_id: String,
    pub sheet_id: i32,
    pub title: String,
    pub index: i32,
}

/// The remote operations the client is built on.
///
/// [`super::google_service::GoogleSheetsService`] talks to Google Drive and Google Sheets; tests
/// provide their own implementations.
#[async_trait::async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Looks a spreadsheet up by its title (not by URL or id).
    async fn open_by_name(
        &self,
        name: &str,
    ) -> error_stack::Result<SpreadsheetHandle, SheetsError>;

    /// The worksheet at index 0.
    async fn first_worksheet(
        &self,
        spreadsheet: &SpreadsheetHandle,
    ) -> error_stack::Result<WorksheetHandle, SheetsError>;

    /// Every populated row of the worksheet, as returned by the API (rows may be ragged).
    async fn read_values(
        &self,
        worksheet: &WorksheetHandle,
    ) -> error_stack::Result<Vec<Vec<Value>>, SheetsError>;
}

#[async_trait::async_trait]
impl<T: SpreadsheetService + ?Sized> SpreadsheetService for std::sync::Arc<T> {
    async fn open_by_name(
        &self,
        name: &str,
    ) -> error_stack::Result<SpreadsheetHandle, SheetsError> {
        (**self).open_by_name(name).await
    }

    async fn first_worksheet(
        &self,
        spreadsheet: &SpreadsheetHandle,
    ) -> error_stack::Result<WorksheetHandle, SheetsError> {
        (**self).first_worksheet(spreadsheet).await
    }

    async fn read_values(
        &self,
        worksheet: &WorksheetHandle,
    ) -> error_stack::Result<Vec<Vec<Value>>, SheetsError> {
        (**self).read_values(worksheet).await
    }
}
