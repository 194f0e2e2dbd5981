use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, TimeZone};

/// Permissions of newly created log files.
const LOG_FILE_MODE: u32 = 0o640;

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Formats the run timestamp that qualifies every log file name of a run.
pub fn run_stamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Returns the path of the log file `name` for the run started at `stamp`.
///
/// # Example
/// ```
/// # use health_stats_repro::fsutil;
/// let path = fsutil::log_file_path("/var/tmp", "stats", "2018-03-21T10:00:00Z");
/// assert_eq!(path.to_str(), Some("/var/tmp/stats-2018-03-21T10:00:00Z"));
/// ```
pub fn log_file_path(dir: impl AsRef<Path>, name: &str, stamp: &str) -> PathBuf {
    dir.as_ref().join(format!("{name}-{stamp}"))
}

/// Opens a log file for appending, creating it if needed.
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
pub fn open_log_file(path: impl AsRef<Path>) -> Result<tokio::fs::File, FileOpenError> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(LOG_FILE_MODE)
        .open(path)
        .map_err(|source| FileOpenError {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("logging to `{}`", path.display());
    Ok(tokio::fs::File::from_std(file))
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use chrono::{FixedOffset, Utc};
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[test]
    fn test_run_stamp_utc() {
        let time = Utc.with_ymd_and_hms(2018, 3, 21, 10, 4, 5).unwrap();
        assert_eq!(run_stamp(&time), "2018-03-21T10:04:05Z");
    }

    #[test]
    fn test_run_stamp_with_offset() {
        let offset = FixedOffset::west_opt(7 * 3600).unwrap();
        let time = offset.with_ymd_and_hms(2018, 3, 21, 10, 4, 5).unwrap();
        assert_eq!(run_stamp(&time), "2018-03-21T10:04:05-07:00");
    }

    #[tokio::test]
    async fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = log_file_path(dir.path(), "events", "stamp");

        let mut file = open_log_file(&path).expect("should create log file");
        file.write_all(b"first\n").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        let mut file = open_log_file(&path).expect("should reopen log file");
        file.write_all(b"second\n").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & !LOG_FILE_MODE & 0o777, 0);
    }

    #[test]
    fn test_open_log_file_error() {
        let result = open_log_file("/definitely/does/not/exist/stats");
        let err = result.unwrap_err();
        assert_eq!(err.path, PathBuf::from("/definitely/does/not/exist/stats"));
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }
}
