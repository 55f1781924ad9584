use std::path::{Path, PathBuf};

/// Loads a `.env` file into the process environment, from `path` or by searching upwards from
/// the working directory. A missing file is not an error and yields `Ok(None)`; an unreadable or
/// malformed one is.
pub fn load_dotenv(path: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        assert_eq!(load_dotenv(Some(&path)).unwrap(), None);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SERVICE_ACCOUNT_FILE=\"unterminated").unwrap();

        let error = load_dotenv(Some(file.path())).unwrap_err();
        assert!(!error.not_found());
    }

    #[test]
    fn test_valid_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GOOGLE_SHEET_CLIENT_DOTENV_TEST=loaded").unwrap();

        let loaded = load_dotenv(Some(file.path())).unwrap();

        assert_eq!(loaded.as_deref(), Some(file.path()));
        assert_eq!(
            std::env::var("GOOGLE_SHEET_CLIENT_DOTENV_TEST").as_deref(),
            Ok("loaded")
        );
    }
}
