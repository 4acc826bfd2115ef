//! Client configuration
//!
//! Values can be set in code or loaded from `AUTO24_*` environment variables
//! (a `.env` file is honoured). Nothing is validated until the client is
//! built; see [`Auto24Config::validate`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

use crate::error::{Auto24Error, Result};
use crate::locale::Locale;
use crate::proxy::Proxy;

pub const DEFAULT_BASE_URL: &str = "https://www.autoscout24.ch";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_DIAGNOSTIC_FILE: &str = "out.html";

/// Raw configuration surface, validated by [`Auto24Config::validate`]
#[derive(Debug, Clone)]
pub struct Auto24Config {
    /// Persist cookies and headers to `{tmp_dir}/.auto24api/tmp/session.json`
    pub use_session: bool,
    /// Kept for API compatibility; captchas are never solved automatically.
    pub bypass_captcha: bool,
    /// Custom request headers. Generated when `None`.
    pub headers: Option<BTreeMap<String, String>>,
    /// Proxy address, see [`Proxy::parse`]
    pub proxy: Option<String>,
    /// Random wait in seconds between retries: exactly `[lower, upper]`
    pub wait_range: Vec<f64>,
    pub max_retries: u32,
    /// Site edition: "fr", "de" or "it"
    pub lang: String,
    pub tmp_dir: PathBuf,
    pub base_url: String,
    pub timeout: Duration,
    /// Where the body of a page without payload is dumped
    pub diagnostic_path: PathBuf,
}

impl Default for Auto24Config {
    fn default() -> Self {
        Self {
            use_session: true,
            bypass_captcha: false,
            headers: None,
            proxy: None,
            wait_range: vec![2.0, 5.0],
            max_retries: DEFAULT_MAX_RETRIES,
            lang: "fr".to_string(),
            tmp_dir: PathBuf::from("."),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            diagnostic_path: PathBuf::from(DEFAULT_DIAGNOSTIC_FILE),
        }
    }
}

impl Auto24Config {
    /// Load configuration from `AUTO24_*` environment variables.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(lang) = lookup("AUTO24_LANG") {
            config.lang = lang.trim().to_string();
        }
        if let Some(v) = lookup("AUTO24_USE_SESSION") {
            config.use_session = parse_bool("AUTO24_USE_SESSION", &v)?;
        }
        if let Some(v) = lookup("AUTO24_BYPASS_CAPTCHA") {
            config.bypass_captcha = parse_bool("AUTO24_BYPASS_CAPTCHA", &v)?;
        }
        if let Some(proxy) = lookup("AUTO24_PROXY").filter(|s| !s.trim().is_empty()) {
            config.proxy = Some(proxy);
        }
        if let Some(v) = lookup("AUTO24_WAIT_RANGE") {
            config.wait_range = v
                .split(',')
                .map(|part| {
                    part.trim().parse::<f64>().map_err(|_| {
                        Auto24Error::InvalidArgs(format!("AUTO24_WAIT_RANGE is not numeric: {}", v))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(v) = lookup("AUTO24_MAX_RETRIES") {
            config.max_retries = v.trim().parse().map_err(|_| {
                Auto24Error::InvalidArgs(format!("AUTO24_MAX_RETRIES is not a number: {}", v))
            })?;
        }
        if let Some(v) = lookup("AUTO24_TIMEOUT_SECS") {
            let secs: u64 = v.trim().parse().map_err(|_| {
                Auto24Error::InvalidArgs(format!("AUTO24_TIMEOUT_SECS is not a number: {}", v))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = lookup("AUTO24_TMP_DIR") {
            config.tmp_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("AUTO24_BASE_URL") {
            config.base_url = url;
        }
        if let Some(path) = lookup("AUTO24_DIAGNOSTIC_PATH") {
            config.diagnostic_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Check the locale, wait range and proxy
    pub fn validate(&self) -> Result<ValidatedConfig> {
        let locale: Locale = self.lang.parse()?;
        let wait_range = WaitRange::from_slice(&self.wait_range)?;
        let proxy = self.proxy.as_deref().map(Proxy::parse).transpose()?;
        let base_url = self.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| Auto24Error::InvalidArgs(format!("invalid base_url {}: {}", base_url, e)))?;

        Ok(ValidatedConfig {
            locale,
            wait_range,
            proxy,
            base_url,
        })
    }

    /// Directory holding the session file
    pub fn tmp_path(&self) -> PathBuf {
        self.tmp_dir.join(".auto24api").join("tmp")
    }

    pub fn session_file_path(&self) -> PathBuf {
        self.tmp_path().join("session.json")
    }
}

/// The parts of [`Auto24Config`] that need parsing
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub locale: Locale,
    pub wait_range: WaitRange,
    pub proxy: Option<Proxy>,
    pub base_url: String,
}

/// Closed interval of seconds to wait between retries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitRange {
    lower: f64,
    upper: f64,
}

impl WaitRange {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() || lower < 0.0 {
            return Err(Auto24Error::InvalidArgs(format!(
                "wait_range bounds must be finite and non-negative, got [{}, {}]",
                lower, upper
            )));
        }
        if lower > upper {
            return Err(Auto24Error::InvalidArgs(format!(
                "wait_range lower bound {} is greater than upper bound {}",
                lower, upper
            )));
        }
        if Duration::try_from_secs_f64(upper).is_err() {
            return Err(Auto24Error::InvalidArgs(format!(
                "wait_range upper bound {} does not fit in a duration",
                upper
            )));
        }
        Ok(Self { lower, upper })
    }

    pub fn from_slice(bounds: &[f64]) -> Result<Self> {
        match bounds {
            [lower, upper] => Self::new(*lower, *upper),
            _ => Err(Auto24Error::InvalidArgs(format!(
                "wait_range must contain exactly 2 elements, got {}",
                bounds.len()
            ))),
        }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Uniformly random duration within the range
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let secs = if self.lower == self.upper {
            self.lower
        } else {
            rng.gen_range(self.lower..=self.upper)
        };
        // bounds were checked in `new`; clamp float rounding at the top end
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Auto24Error::InvalidArgs(format!(
            "{} must be a boolean, got {}",
            key, value
        ))),
    }
}
