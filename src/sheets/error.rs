use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetsError {
    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),
    #[error("Spreadsheet has no worksheets: {0}")]
    NoWorksheets(String),
    #[error("{0}")]
    Api(String),
    #[error("The header row in the worksheet is not unique: {0:?} repeats")]
    NonUniqueHeader(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(&'static str),
}

impl SheetsError {
    /// Errors that will not go away by asking again.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            SheetsError::SpreadsheetNotFound(_)
                | SheetsError::NoWorksheets(_)
                | SheetsError::NonUniqueHeader(_)
        )
    }
}
