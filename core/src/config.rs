use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use rjudge_client::{Url, DEFAULT_API_URL};
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::serdable::GlobPattern;
use crate::testing::{RateLimits, RetryPolicy};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot read config '{0}': {1}")]
    Read(PathBuf, #[source] io::Error),

    #[error("Invalid config TOML '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Invalid environment variable: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub service: ServiceConfig,
    pub limit: LimitConfig,
    pub retry: RetryConfig,
    #[serde(rename = "language")]
    pub languages: Vec<LanguageConfigEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: Url,
    pub request_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub probe: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    pub max_concurrent: usize,
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageConfigEntry {
    pub pattern: GlobPattern,
    pub name: String,
}

/// Values read from `PISTON_API_URL`, `MAX_CONCURRENT` and `REQUESTS_PER_SECOND`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvOverrides {
    pub piston_api_url: Option<Url>,
    pub max_concurrent: Option<usize>,
    pub requests_per_second: Option<u32>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self> {
        Ok(envy::from_env()?)
    }

    pub fn from_iter<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Default for Config {
    fn default() -> Self {
        Self {
            source_config_file: None,
            service: ServiceConfig::default(),
            limit: LimitConfig::default(),
            retry: RetryConfig::default(),
            languages: Vec::new(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).unwrap(),
            request_timeout_ms: 10_000,
            probe_timeout_ms: 2_000,
            probe: true,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        let RateLimits {
            max_concurrent,
            requests_per_second,
        } = RateLimits::default();
        Self {
            max_concurrent,
            requests_per_second,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            base_delay_ms: RetryPolicy::DEFAULT_BASE_DELAY.as_millis() as u64,
        }
    }
}

impl Config {
    pub const FILENAME: &'static str = "rjudge.toml";

    pub fn example_toml() -> String {
        let file = Asset::get(Self::FILENAME).expect("example config is embedded");
        String::from_utf8_lossy(file.data.as_ref()).into_owned()
    }

    pub fn from_toml(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> Result<Self> {
        let toml =
            std::fs::read_to_string(&filepath).map_err(|e| Error::Read(filepath.clone(), e))?;
        let mut cfg = Self::from_toml(&toml).map_err(|e| Error::Parse(filepath.clone(), e))?;
        cfg.source_config_file = Some(filepath);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Find config file ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> Option<PathBuf> {
        cur_dir
            .as_ref()
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
    }

    /// Config file found in ancestors, or the defaults when there is none.
    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> Result<Self> {
        match Self::find_file_in_ancestors(cur_dir) {
            Some(path) => {
                log::debug!("Using config {}", path.to_string_lossy());
                Self::from_toml_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn with_env(mut self, env: EnvOverrides) -> Result<Self> {
        let EnvOverrides {
            piston_api_url,
            max_concurrent,
            requests_per_second,
        } = env;

        if let Some(url) = piston_api_url {
            self.service.base_url = url;
        }
        if let Some(n) = max_concurrent {
            self.limit.max_concurrent = n;
        }
        if let Some(n) = requests_per_second {
            self.limit.requests_per_second = n;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit.max_concurrent == 0 {
            return Err(Error::Invalid("limit.max_concurrent must be at least 1"));
        }
        if self.limit.requests_per_second == 0 {
            return Err(Error::Invalid("limit.requests_per_second must be at least 1"));
        }
        Ok(())
    }

    pub fn find_language_for_filename(&self, filename: impl AsRef<str>) -> Option<&str> {
        self.languages
            .iter()
            .find(|entry| entry.pattern.matches(filename.as_ref()))
            .map(|entry| entry.name.as_str())
    }

    pub fn rate_limits(&self) -> RateLimits {
        RateLimits::new(self.limit.max_concurrent, self.limit.requests_per_second)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
