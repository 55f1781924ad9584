use std::env;
use std::process::ExitCode;

use google_sheet_client::{config, logging, GoogleSheetClient};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Loaded before logging so `.env` can set LOG_LEVEL.
    let dotenv = config::load_dotenv(None);

    if let Err(e) = logging::setup_tracing() {
        eprintln!("Failed to set up logging: {}", e);
    }

    if let Err(e) = dotenv {
        error!("Could not load .env file: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(sheet_name) = env::args().nth(1) else {
        eprintln!("Usage: google-sheet-client <SPREADSHEET_NAME>");
        return ExitCode::from(2);
    };

    let client = match GoogleSheetClient::new(None).await {
        Ok(client) => client,
        Err(report) => {
            error!("Could not create Google Sheets client: {:?}", report);
            return ExitCode::FAILURE;
        }
    };

    let records = match client.fetch(&sheet_name).await {
        Ok(records) => records,
        Err(report) => {
            error!("Could not fetch '{}': {:?}", sheet_name, report);
            return ExitCode::FAILURE;
        }
    };

    info!("Fetched {} record(s) from '{}'", records.len(), sheet_name);

    match serde_json::to_string_pretty(&records) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Could not serialize records: {}", e);
            ExitCode::FAILURE
        }
    }
}
