//! Settings / Configuration.
//!
//! Layered as: built-in defaults, then the TOML file at
//! [`crate::paths::config_file`], then `PRICEALERT_*` environment variables
//! (nested keys separated by `__`, e.g. `PRICEALERT_RESEND__LIMIT=5`).

use config::{Config, ConfigError, Environment, File, Map, Source, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

use crate::paths::{config_file, default_store_file};

/// Remote endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Endpoint that emails a fresh code. Used for the first request and resends.
    pub otp_request_endpoint: Url,
    /// Endpoint that confirms a code.
    pub otp_confirm_endpoint: Url,
    /// Per request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Limits on asking for another code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendPolicy {
    /// Successful resends allowed per verification screen.
    pub limit: u32,
    /// Seconds to wait between resends.
    pub cooldown_secs: u32,
}

impl Default for ResendPolicy {
    fn default() -> Self {
        Self {
            limit: 3,
            cooldown_secs: 60,
        }
    }
}

/// Verification screen settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSettings {
    /// How long the success modal stays up before returning home.
    pub success_delay_secs: u64,
}

impl VerificationSettings {
    /// [`Self::success_delay_secs`] as a [`Duration`]
    pub fn success_delay(&self) -> Duration {
        Duration::from_secs(self.success_delay_secs)
    }
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            success_delay_secs: 7,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Remote endpoints
    pub api: ApiSettings,
    /// Resend limits
    pub resend: ResendPolicy,
    /// Verification screen behaviour
    pub verification: VerificationSettings,
    /// Where the secure store keeps its file
    pub store_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                otp_request_endpoint: Url::parse(
                    "https://regencyng.net/fs-api/proxy.php?type=daily_alert",
                )
                .expect("Valid hardcoded OTP request URL"),
                otp_confirm_endpoint: Url::parse(
                    "https://regencyng.net/fs-api/proxy.php?type=verify_otp",
                )
                .expect("Valid hardcoded OTP confirmation URL"),
                timeout_ms: 15_000,
            },
            resend: ResendPolicy::default(),
            verification: VerificationSettings::default(),
            store_file: default_store_file(),
        }
    }
}

impl Settings {
    /// Load settings from the platform config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file())
    }

    /// Load settings using `path` as the config file. A missing file is fine.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(DefaultImplSource::<Settings>::new())
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("PRICEALERT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize()
    }
}

// Feeds `T::default()` to `config` as the lowest priority source, so that a
// missing config file still yields complete settings. The value goes through
// `toml::Value` since `config` already knows that shape.

struct DefaultImplSource<T>(PhantomData<T>);

impl<T> Clone for DefaultImplSource<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for DefaultImplSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DefaultImplSource").finish()
    }
}

impl<T> DefaultImplSource<T> {
    fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Default + Serialize + Send + Sync + 'static> Source for DefaultImplSource<T> {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let toml_value =
            toml::Value::try_from(T::default()).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        match from_toml_value(&toml_value).kind {
            ValueKind::Table(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

fn from_toml_value(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(value) => Value::new(None, value.to_string()),
        toml::Value::Float(value) => Value::new(None, *value),
        toml::Value::Integer(value) => Value::new(None, *value),
        toml::Value::Boolean(value) => Value::new(None, *value),
        toml::Value::Table(table) => {
            let map: Map<String, Value> = table
                .iter()
                .map(|(key, value)| (key.clone(), from_toml_value(value)))
                .collect();
            Value::new(None, map)
        }
        toml::Value::Array(array) => {
            Value::new(None, array.iter().map(from_toml_value).collect::<Vec<_>>())
        }
        toml::Value::Datetime(datetime) => Value::new(None, datetime.to_string()),
    }
}
