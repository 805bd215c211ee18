use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Typed configuration for the forwarder client.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the remote forwarding service (no trailing slash).
    pub api_base_url: String,
    pub request_timeout: Duration,

    // Wizard timing
    pub status_poll_interval: Duration,
    pub expiry_redirect_delay: Duration,

    /// Seconds between forwarded message groups, preset into new credentials.
    pub default_send_interval: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            status_poll_interval: Duration::from_secs(5),
            expiry_redirect_delay: Duration::from_secs(2),
            default_send_interval: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (env, map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_base_url = get("FORWARDER_API_URL")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "FORWARDER_API_URL must start with http:// or https://, got {api_base_url:?}"
            )));
        }

        let request_timeout = parse_millis(&get, "FORWARDER_TIMEOUT_MS")?
            .unwrap_or(defaults.request_timeout);
        let status_poll_interval = parse_millis(&get, "STATUS_POLL_INTERVAL_MS")?
            .unwrap_or(defaults.status_poll_interval);
        if status_poll_interval.is_zero() {
            return Err(Error::Config(
                "STATUS_POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        let expiry_redirect_delay = parse_millis(&get, "EXPIRY_REDIRECT_DELAY_MS")?
            .unwrap_or(defaults.expiry_redirect_delay);

        let default_send_interval = match get("DEFAULT_SEND_INTERVAL").and_then(non_empty) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!(
                    "DEFAULT_SEND_INTERVAL must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            None => defaults.default_send_interval,
        };

        Ok(Self {
            api_base_url,
            request_timeout,
            status_poll_interval,
            expiry_redirect_delay,
            default_send_interval,
        })
    }
}

fn parse_millis(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    let Some(raw) = get(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| Error::Config(format!("{key} must be milliseconds, got {raw:?}")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
