use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_IMAGE_NAME: &str = "docker-poke:healthchecks";
const DEFAULT_IMAGE_SLEEP: &str = "2m";
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(10);

/// Number of containers started per run.
pub const CONTAINER_COUNT: usize = 2;

pub const ENV_IMAGE_NAME: &str = "REPRO_IMAGE_NAME";
pub const ENV_IMAGE_SLEEP: &str = "REPRO_IMAGE_SLEEP";
pub const ENV_CALL_TIMEOUT_SECS: &str = "REPRO_CALL_TIMEOUT_SECS";
pub const ENV_RUN_DURATION_SECS: &str = "REPRO_RUN_DURATION_SECS";
pub const ENV_STOP_CONTAINER: &str = "REPRO_STOP_CONTAINER";
pub const ENV_REMOVE_CONTAINER: &str = "REPRO_REMOVE_CONTAINER";
pub const ENV_OUTPUT_DIR: &str = "REPRO_OUTPUT_DIR";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid number of seconds in `{key}`: `{value}`: {source}")]
    InvalidSeconds {
        key: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid boolean in `{key}`: `{value}`")]
    InvalidBool { key: &'static str, value: String },
    #[error("invalid sleep time in `{key}`: `{value}`")]
    InvalidSleep { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Settings of one reproduction run.
///
/// [`Config::default`] holds the compiled-in values; [`Config::from_env`] lets the
/// process-repeating harness override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Tag of the image built for the run.
    pub image_name: String,
    /// Argument to `sleep` in the container command, i.e. how long a container lives.
    pub image_sleep: String,
    /// Timeout attached to every lifecycle call after the observation window.
    pub call_timeout: Duration,
    /// Length of the observation window.
    pub run_duration: Duration,
    pub stop_container: bool,
    pub remove_container: bool,
    /// Directory the events and stats logs are written to.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_name: DEFAULT_IMAGE_NAME.to_owned(),
            image_sleep: DEFAULT_IMAGE_SLEEP.to_owned(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            run_duration: DEFAULT_RUN_DURATION,
            stop_container: false,
            remove_container: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable holds a malformed value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from the defaults and the values `lookup` returns for the
    /// `REPRO_*` keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_IMAGE_NAME) {
            config.image_name = value;
        }
        if let Some(value) = lookup(ENV_IMAGE_SLEEP) {
            config.image_sleep = parse_sleep(ENV_IMAGE_SLEEP, value)?;
        }
        if let Some(value) = lookup(ENV_CALL_TIMEOUT_SECS) {
            config.call_timeout = parse_seconds(ENV_CALL_TIMEOUT_SECS, value)?;
        }
        if let Some(value) = lookup(ENV_RUN_DURATION_SECS) {
            config.run_duration = parse_seconds(ENV_RUN_DURATION_SECS, value)?;
        }
        if let Some(value) = lookup(ENV_STOP_CONTAINER) {
            config.stop_container = parse_bool(ENV_STOP_CONTAINER, value)?;
        }
        if let Some(value) = lookup(ENV_REMOVE_CONTAINER) {
            config.remove_container = parse_bool(ENV_REMOVE_CONTAINER, value)?;
        }
        if let Some(value) = lookup(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(value);
        }

        Ok(config)
    }
}

fn parse_seconds(key: &'static str, value: String) -> Result<Duration> {
    let parsed = value.trim().parse::<u64>();
    match parsed {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(source) => Err(Error::InvalidSeconds { key, value, source }),
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(Error::InvalidBool { key, value }),
    }
}

// busybox `sleep` takes a number with an optional s/m/h/d suffix
fn parse_sleep(key: &'static str, value: String) -> Result<String> {
    let digits = value.trim_end_matches(['s', 'm', 'h', 'd']);
    let valid = !digits.is_empty()
        && value.len() - digits.len() <= 1
        && digits.bytes().all(|b| b.is_ascii_digit());
    if !valid {
        return Err(Error::InvalidSleep { key, value });
    }
    Ok(value)
}
