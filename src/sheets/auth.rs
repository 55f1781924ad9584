use error_stack::ResultExt;
use google_sheets4::oauth2::{self, authenticator::Authenticator};
use tracing::instrument;

use crate::client::ClientError;
use crate::config::GoogleSheetConfig;

use super::http_client::{HttpClient, HttpsConnector};

#[instrument(skip(client), fields(service_account_file = %config.service_account_file))]
pub async fn auth(
    config: &GoogleSheetConfig,
    client: HttpClient,
) -> error_stack::Result<Authenticator<HttpsConnector>, ClientError> {
    let priv_key_path = config.service_account_file.as_ref();
    let secret: oauth2::ServiceAccountKey = oauth2::read_service_account_key(priv_key_path)
        .await
        .change_context(ClientError::ReadServiceAccountKey)
        .attach_printable_lazy(|| {
            format!(
                "Could not read service account private key at '{}'",
                priv_key_path
            )
        })?;

    oauth2::ServiceAccountAuthenticator::with_client(secret, client)
        .build()
        .await
        .change_context(ClientError::BuildAuthenticator)
}
