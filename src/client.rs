use error_stack::ResultExt;
use thiserror::Error;
use tracing::instrument;

use crate::config::GoogleSheetConfig;
use crate::retry::{self, Classifier, RetryPolicy};
use crate::sheets::{
    error::SheetsError,
    google_service::GoogleSheetsService,
    records::{IntoRecords, Record},
    service::SpreadsheetService,
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to load Google Sheets configuration")]
    Configuration,
    #[error("Failed to read service account key")]
    ReadServiceAccountKey,
    #[error("Failed to authorize with the service account")]
    BuildAuthenticator,
}

/// Reads spreadsheets by name through one authorized [`SpreadsheetService`].
///
/// The service is created once and reused by every [`GoogleSheetClient::fetch`]; building a new
/// client authenticates again.
pub struct GoogleSheetClient<S = GoogleSheetsService> {
    service: S,
    retry_policy: RetryPolicy,
    classifier: Classifier<SheetsError>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for GoogleSheetClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetClient")
            .field("service", &self.service)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl GoogleSheetClient<GoogleSheetsService> {
    /// Authenticates with the service account from `config`, or from the environment when no
    /// configuration is given. Failures are returned as-is, without retrying.
    #[instrument(name = "GoogleSheetClient::new")]
    pub async fn new(
        config: Option<GoogleSheetConfig>,
    ) -> error_stack::Result<Self, ClientError> {
        let config = match config {
            Some(config) => config,
            None => GoogleSheetConfig::from_env().change_context(ClientError::Configuration)?,
        };

        match GoogleSheetsService::connect(&config).await {
            Ok(service) => {
                tracing::info!("Successfully authenticated with Google Sheets API.");
                Ok(Self::from_service(service, RetryPolicy::from(&config)))
            }
            Err(report) => {
                tracing::error!(
                    "Failed to authenticate with Google Sheets API: {:?}",
                    report
                );
                Err(report)
            }
        }
    }
}

impl<S: SpreadsheetService> GoogleSheetClient<S> {
    pub fn from_service(service: S, retry_policy: RetryPolicy) -> Self {
        Self {
            service,
            retry_policy,
            classifier: retry::retry_always(),
        }
    }

    /// Replaces the default retry-everything behaviour, e.g. with
    /// [`retry::abort_on_permanent`].
    pub fn with_classifier(mut self, classifier: Classifier<SheetsError>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// All rows of the first worksheet of the spreadsheet titled `sheet_name`, keyed by its
    /// header row.
    ///
    /// Every failure is retried according to the [`RetryPolicy`]; once attempts run out the
    /// last error is returned. Nothing is cached between calls.
    #[instrument(skip(self))]
    pub async fn fetch(&self, sheet_name: &str) -> error_stack::Result<Vec<Record>, SheetsError> {
        self.retry_policy
            .run(&self.classifier, |attempt| self.fetch_once(sheet_name, attempt))
            .await
    }

    async fn fetch_once(
        &self,
        sheet_name: &str,
        attempt: u32,
    ) -> error_stack::Result<Vec<Record>, SheetsError> {
        tracing::info!(attempt, "Fetching data from Google Sheet: {}", sheet_name);

        let result = async {
            let spreadsheet = self.service.open_by_name(sheet_name).await?;
            let worksheet = self.service.first_worksheet(&spreadsheet).await?;
            let values = self.service.read_values(&worksheet).await?;
            values.into_records()
        }
        .await;

        if let Err(report) = &result {
            tracing::error!(
                attempt,
                "Error while getting data from the Google Sheet: {}",
                report
            );
        }

        result
    }
}
