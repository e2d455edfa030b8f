use std::path::PathBuf;
use std::time::Duration;

use crate::limits::MAX_PAGE_SIZE;
use crate::model::CheckoutPolicy;

pub const DEFAULT_API_BASE: &str = "https://v2.api.noroff.dev/";
const DEFAULT_SESSION_DIR: &str = "./.holidaze";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BOOKINGS_PER_PAGE: u32 = 100;

/// Runtime settings, read once from `HOLIDAZE_*` environment variables.
/// Unparseable values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL with trailing slash; paths like `holidaze/venues` are appended.
    pub api_base: String,
    /// Sent as `X-Noroff-API-Key` when set.
    pub api_key: Option<String>,
    pub session_dir: PathBuf,
    pub http_timeout: Duration,
    pub bookings_per_page: u32,
    pub checkout_policy: CheckoutPolicy,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bookings_per_page: DEFAULT_BOOKINGS_PER_PAGE,
            checkout_policy: CheckoutPolicy::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base = lookup("HOLIDAZE_API_BASE")
            .filter(|s| !s.trim().is_empty())
            .map(|s| normalize_base(&s))
            .unwrap_or(defaults.api_base);
        let api_key = lookup("HOLIDAZE_API_KEY").filter(|s| !s.trim().is_empty());
        let session_dir = lookup("HOLIDAZE_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_dir);
        let http_timeout = lookup("HOLIDAZE_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);
        let bookings_per_page = lookup("HOLIDAZE_BOOKINGS_PER_PAGE")
            .and_then(|s| s.parse::<u32>().ok())
            .map(|n| n.clamp(1, MAX_PAGE_SIZE))
            .unwrap_or(defaults.bookings_per_page);
        let checkout_policy = match lookup("HOLIDAZE_CHECKOUT_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{e}; using {:?}", defaults.checkout_policy);
                defaults.checkout_policy
            }),
            None => defaults.checkout_policy,
        };
        let metrics_port = lookup("HOLIDAZE_METRICS_PORT").and_then(|s| s.parse().ok());

        Self {
            api_base,
            api_key,
            session_dir,
            http_timeout,
            bookings_per_page,
            checkout_policy,
            metrics_port,
        }
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}
