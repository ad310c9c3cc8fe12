//! Runtime settings read from the environment.
//!
//! Flags describe what to do; these settings tune how the plugin talks to the platform.
use std::{path::PathBuf, time::Duration};

use typed_builder::TypedBuilder;

pub const POLL_INTERVAL_VAR: &str = "CSP_POLL_INTERVAL";
pub const POLL_TIMEOUT_VAR: &str = "CSP_POLL_TIMEOUT";
pub const CF_BINARY_VAR: &str = "CSP_CF_BINARY";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{var} has an invalid duration \"{value}\": {reason}")]
    InvalidDuration {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct Settings {
    /// Delay between two status polls of a brokered service operation.
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub poll_interval: Duration,
    /// Give up waiting for a brokered service operation after this long. `None` waits forever.
    #[builder(default, setter(strip_option))]
    pub poll_timeout: Option<Duration>,
    /// Explicit path of the cf executable used for in-process commands.
    #[builder(default, setter(strip_option))]
    pub cf_binary: Option<PathBuf>,
    /// Directory holding the cf CLI `.cf/config.json`.
    #[builder(default, setter(strip_option))]
    pub cf_home: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let poll_interval = parse_duration(POLL_INTERVAL_VAR, lookup(POLL_INTERVAL_VAR))?
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        let poll_timeout = parse_duration(POLL_TIMEOUT_VAR, lookup(POLL_TIMEOUT_VAR))?;

        let cf_binary = lookup(CF_BINARY_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        // The cf CLI resolves its config the same way: CF_HOME first, then the user's home.
        let cf_home = ["CF_HOME", "HOME", "USERPROFILE"]
            .into_iter()
            .find_map(|name| lookup(name).filter(|value| !value.is_empty()))
            .map(PathBuf::from);

        Ok(Self {
            poll_interval,
            poll_timeout,
            cf_binary,
            cf_home,
        })
    }
}

fn parse_duration(
    var: &'static str,
    value: Option<String>,
) -> Result<Option<Duration>, SettingsError> {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };

    duration_str::parse(value.trim())
        .map(Some)
        .map_err(|e| SettingsError::InvalidDuration {
            var,
            reason: e.to_string(),
            value,
        })
}
