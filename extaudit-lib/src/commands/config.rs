use crate::Result;
use crate::marketplace::{DEFAULT_REQUEST_DELAY, MARKETPLACE_QUERY_URL};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

const LOG_TARGET: &str = "commands";

/// Name of the configuration file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "extaudit.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Marketplace query endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Pause between two consecutive marketplace lookups
    #[serde(default = "default_request_delay", with = "humantime_serde")]
    pub request_delay: Duration,

    /// Time allowed for a single marketplace lookup
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Per-user extension listing to read
    #[serde(default = "default_input")]
    pub input: Utf8PathBuf,

    /// Where to write the JSON analysis result
    #[serde(default = "default_output")]
    pub output: Utf8PathBuf,
}

fn default_endpoint() -> String {
    MARKETPLACE_QUERY_URL.to_string()
}

const fn default_request_delay() -> Duration {
    DEFAULT_REQUEST_DELAY
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_input() -> Utf8PathBuf {
    Utf8PathBuf::from("input.yaml")
}

fn default_output() -> Utf8PathBuf {
    Utf8PathBuf::from("extension-analysis.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_delay: default_request_delay(),
            request_timeout: default_request_timeout(),
            input: default_input(),
            output: default_output(),
        }
    }
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `extaudit.toml` in `base_dir` is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading extaudit configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading extaudit configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        log::debug!(target: LOG_TARGET, "Loaded configuration from '{final_path}'");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validate_endpoint(&self.endpoint)?;

        if self.request_timeout.is_zero() {
            return Err(app_err!("request_timeout must be greater than zero"));
        }

        Ok(())
    }
}

/// Check that `endpoint` is an absolute http(s) URL.
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint).map_err(|e| app_err!("invalid endpoint '{endpoint}': {e}"))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(app_err!("invalid endpoint '{endpoint}': unsupported scheme '{scheme}'")),
    }
}
