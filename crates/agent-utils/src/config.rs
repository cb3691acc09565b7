//! Configuration file loading utilities

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and deserialize a JSON file
pub fn load_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigFileError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading JSON file");

    let raw = std::fs::read_to_string(path).map_err(|source| {
        warn!(path = %path.display(), error = %source, "Failed to read JSON file");
        ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let value = serde_json::from_str(&raw).map_err(|source| {
        warn!(path = %path.display(), error = %source, "Failed to parse JSON file");
        ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;

    debug!(path = %path.display(), bytes = raw.len(), "Loaded JSON file");
    Ok(value)
}

/// Path named by an environment variable, if set and non-empty
pub fn path_from_env(var: &str) -> Option<PathBuf> {
    let path = std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    if let Some(path) = &path {
        debug!(var, path = %path.display(), "Configuration path from environment");
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Log sink shared between the subscriber and the test
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn with_captured_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, logs.text())
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        retries: u32,
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "engine"}}"#).unwrap();

        let sample: Sample = load_json_file(file.path()).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "engine".to_string(),
                retries: 0
            }
        );
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_json_file::<Sample>("/nonexistent/consensus.json").unwrap_err();
        assert!(matches!(err, ConfigFileError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = load_json_file::<Sample>(file.path()).unwrap_err();
        assert!(matches!(err, ConfigFileError::Parse { .. }));
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_loading_is_logged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "engine"}}"#).unwrap();

        let (sample, logs) = with_captured_logs(|| load_json_file::<Sample>(file.path()));
        assert!(sample.is_ok());
        assert!(logs.contains("Loading JSON file"));
        assert!(logs.contains("Loaded JSON file"));
    }

    #[test]
    fn test_parse_failure_is_logged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1,").unwrap();

        let (result, logs) = with_captured_logs(|| load_json_file::<Sample>(file.path()));
        assert!(result.is_err());
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Failed to parse JSON file"));
    }
}
