use error_stack::{report, Report};
use google_drive3::{api::File, DriveHub};
use google_sheets4::Sheets;
use serde_json::Value;
use tracing::instrument;

use crate::client::ClientError;
use crate::config::GoogleSheetConfig;

use super::{
    a1_notation::ToA1Notation,
    auth,
    error::SheetsError,
    http_client::{self, HttpsConnector},
    service::{SpreadsheetHandle, SpreadsheetService, WorksheetHandle},
};

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// [`SpreadsheetService`] backed by Google Drive v3 (lookup by name) and Google Sheets v4
/// (metadata and values).
pub struct GoogleSheetsService {
    hub: Sheets<HttpsConnector>,
    drive: DriveHub<HttpsConnector>,
    scopes: Vec<String>,
}

impl std::fmt::Debug for GoogleSheetsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GoogleSheetsService {{ scopes: {:?} }}", self.scopes)
    }
}

impl GoogleSheetsService {
    /// Reads the service account key and authorizes both hubs. Nothing is retried here.
    #[instrument(name = "GoogleSheetsService::connect")]
    pub async fn connect(
        config: &GoogleSheetConfig,
    ) -> error_stack::Result<Self, ClientError> {
        let client = http_client::http_client();
        let auth = auth::auth(config, client.clone()).await?;

        Ok(GoogleSheetsService {
            hub: Sheets::new(client.clone(), auth.clone()),
            drive: DriveHub::new(client, auth),
            scopes: config.scopes.clone(),
        })
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

fn api_error<E>(error: E) -> Report<SheetsError>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = error.to_string();
    Report::new(error).change_context(SheetsError::Api(message))
}

/// Drive search query matching spreadsheets whose title is exactly `name`.
pub fn drive_query_by_name(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME_TYPE
    )
}

/// First file whose title is exactly `name`; Drive's `name =` query is not relied on alone.
fn exact_title_match(files: Vec<File>, name: &str) -> Option<SpreadsheetHandle> {
    files.into_iter().find_map(|file| match (file.id, file.name) {
        (Some(id), Some(title)) if title == name => Some(SpreadsheetHandle { id, title }),
        _ => None,
    })
}

#[async_trait::async_trait]
impl SpreadsheetService for GoogleSheetsService {
    #[instrument(skip(self))]
    async fn open_by_name(
        &self,
        name: &str,
    ) -> error_stack::Result<SpreadsheetHandle, SheetsError> {
        let (_, file_list) = self
            .drive
            .files()
            .list()
            .q(&drive_query_by_name(name))
            .supports_all_drives(true)
            .include_items_from_all_drives(true)
            .add_scopes(&self.scopes)
            .doit()
            .await
            .map_err(api_error)?;

        exact_title_match(file_list.files.unwrap_or_default(), name)
            .ok_or_else(|| report!(SheetsError::SpreadsheetNotFound(name.to_string())))
    }

    #[instrument(skip(self))]
    async fn first_worksheet(
        &self,
        spreadsheet: &SpreadsheetHandle,
    ) -> error_stack::Result<WorksheetHandle, SheetsError> {
        let (_, response) = self
            .hub
            .spreadsheets()
            .get(&spreadsheet.id)
            .param("fields", "sheets.properties(sheetId,title,index)")
            .add_scopes(&self.scopes)
            .doit()
            .await
            .map_err(api_error)?;

        let properties = response
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sheet| sheet.properties)
            .min_by_key(|properties| properties.index.unwrap_or(0))
            .ok_or_else(|| report!(SheetsError::NoWorksheets(spreadsheet.title.clone())))?;

        let title = properties.title.ok_or_else(|| {
            report!(SheetsError::MalformedResponse("worksheet without a title"))
        })?;

        Ok(WorksheetHandle {
            spreadsheet_id: spreadsheet.id.clone(),
            sheet_id: properties.sheet_id.unwrap_or(0),
            title,
            index: properties.index.unwrap_or(0),
        })
    }

    #[instrument(skip(self))]
    async fn read_values(
        &self,
        worksheet: &WorksheetHandle,
    ) -> error_stack::Result<Vec<Vec<Value>>, SheetsError> {
        let range = worksheet.to_a1_notation();
        let (_, value_range) = self
            .hub
            .spreadsheets()
            .values_get(&worksheet.spreadsheet_id, range.as_ref())
            .major_dimension("ROWS")
            .value_render_option("FORMATTED_VALUE")
            .add_scopes(&self.scopes)
            .doit()
            .await
            .map_err(api_error)?;

        // An empty worksheet comes back without `values`.
        Ok(value_range.values.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_query_for_plain_name() {
        assert_eq!(
            drive_query_by_name("Budget 2024"),
            "name = 'Budget 2024' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
    }

    #[test]
    fn test_drive_query_escapes_quotes_and_backslashes() {
        assert_eq!(
            drive_query_by_name(r"Bob's \ sheet"),
            r"name = 'Bob\'s \\ sheet' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
    }

    fn drive_file(id: &str, name: &str) -> File {
        File {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_title_match_skips_near_matches() {
        let files = vec![
            drive_file("id-lower", "testsheet"),
            drive_file("id-padded", "TestSheet "),
            drive_file("id-exact", "TestSheet"),
        ];

        assert_eq!(
            exact_title_match(files, "TestSheet"),
            Some(SpreadsheetHandle {
                id: "id-exact".to_string(),
                title: "TestSheet".to_string(),
            })
        );
    }

    #[test]
    fn test_exact_title_match_requires_id_and_name() {
        let files = vec![
            File {
                name: Some("TestSheet".to_string()),
                ..Default::default()
            },
            File {
                id: Some("id-unnamed".to_string()),
                ..Default::default()
            },
        ];

        assert_eq!(exact_title_match(files, "TestSheet"), None);
        assert_eq!(exact_title_match(Vec::new(), "TestSheet"), None);
    }

    #[test]
    fn test_api_error_keeps_message_and_source() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded");
        let report = api_error(source);
        assert_eq!(
            report.current_context(),
            &SheetsError::Api("quota exceeded".to_string())
        );
        assert!(report.downcast_ref::<std::io::Error>().is_some());
    }
}
