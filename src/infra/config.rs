//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! An invalid configuration is fatal: the service never starts polling with a
//! partial route list.

use crate::domain::error::TrackerError;
use crate::domain::types::{DayState, Route, TrackingState};
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierFormat {
    /// Chat adaptive card envelope
    #[default]
    AdaptiveCard,
    /// Plain `{"text": ...}` body
    Text,
}

impl NotifierFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifierFormat::AdaptiveCard => "adaptive_card",
            NotifierFormat::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: default_interval_secs() }
    }
}

fn default_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub url: String,
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_provider_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_notifier_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub format: NotifierFormat,
    #[serde(default = "default_notifier_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: default_notifier_enabled(),
            webhook_url: None,
            format: NotifierFormat::default(),
            timeout_ms: default_notifier_timeout_ms(),
        }
    }
}

fn default_notifier_enabled() -> bool {
    true
}

fn default_notifier_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Snapshot file path (JSON)
    #[serde(default = "default_state_file")]
    pub file: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self { file: default_state_file() }
    }
}

fn default_state_file() -> String {
    "state/tracking.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayConfig {
    pub date: String,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub poll: PollConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub days: Vec<DayConfig>,
}

/// Main configuration struct, built once at startup and passed explicitly
#[derive(Debug, Clone)]
pub struct Config {
    poll_interval_secs: u64,
    provider_url: String,
    provider_timeout_ms: u64,
    notifier_enabled: bool,
    webhook_url: Option<String>,
    notifier_format: NotifierFormat,
    notifier_timeout_ms: u64,
    state_file: String,
    days: Vec<DayConfig>,
    config_file: String,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        config.config_file = path.display().to_string();
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig =
            toml::from_str(content).map_err(|e| TrackerError::ConfigurationInvalid(e.to_string()))?;

        let config = Self {
            poll_interval_secs: toml_config.poll.interval_secs,
            provider_url: toml_config.provider.url,
            provider_timeout_ms: toml_config.provider.timeout_ms,
            notifier_enabled: toml_config.notifier.enabled,
            webhook_url: toml_config.notifier.webhook_url,
            notifier_format: toml_config.notifier.format,
            notifier_timeout_ms: toml_config.notifier.timeout_ms,
            state_file: toml_config.state.file,
            days: toml_config.days,
            config_file: "inline".to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), TrackerError> {
        let invalid = |msg: String| Err(TrackerError::ConfigurationInvalid(msg));

        if self.poll_interval_secs == 0 {
            return invalid("poll.interval_secs must be greater than zero".to_string());
        }
        if self.provider_url.trim().is_empty() {
            return invalid("provider.url is empty".to_string());
        }
        if self.notifier_enabled && self.webhook_url().map_or(true, |u| u.trim().is_empty()) {
            return invalid("notifier.webhook_url is required when the notifier is enabled".to_string());
        }
        if self.days.is_empty() {
            return invalid("no travel days configured".to_string());
        }

        let mut dates = HashSet::new();
        for day in &self.days {
            if day.date.trim().is_empty() {
                return invalid("day with empty date".to_string());
            }
            if !dates.insert(day.date.as_str()) {
                return invalid(format!("duplicate day {}", day.date));
            }
            if day.routes.is_empty() {
                return invalid(format!("day {} has no routes", day.date));
            }

            let mut routes = HashSet::new();
            for route in &day.routes {
                if route.origin.trim().is_empty() || route.destination.trim().is_empty() {
                    return invalid(format!("day {} has a route with an empty location", day.date));
                }
                if !routes.insert((route.origin.as_str(), route.destination.as_str())) {
                    return invalid(format!(
                        "day {} lists {}->{} twice",
                        day.date, route.origin, route.destination
                    ));
                }
            }
        }
        Ok(())
    }

    /// Tracking state with every configured day and route and no fares yet
    pub fn seed_state(&self) -> TrackingState {
        let days = self
            .days
            .iter()
            .map(|day| {
                let routes = day
                    .routes
                    .iter()
                    .map(|r| Route::new(&r.origin, &r.destination))
                    .collect();
                DayState::new(&day.date, routes)
            })
            .collect();
        TrackingState::new(days)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    pub fn provider_url(&self) -> &str {
        &self.provider_url
    }

    pub fn provider_timeout_ms(&self) -> u64 {
        self.provider_timeout_ms
    }

    pub fn notifier_enabled(&self) -> bool {
        self.notifier_enabled
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    pub fn notifier_format(&self) -> &NotifierFormat {
        &self.notifier_format
    }

    pub fn notifier_timeout_ms(&self) -> u64 {
        self.notifier_timeout_ms
    }

    pub fn state_file(&self) -> &str {
        &self.state_file
    }

    pub fn days(&self) -> &[DayConfig] {
        &self.days
    }

    pub fn route_count(&self) -> usize {
        self.days.iter().map(|d| d.routes.len()).sum()
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the poll interval
    #[cfg(test)]
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[provider]
url = "http://localhost:8080/listings"

[notifier]
enabled = false

[[days]]
date = "2024-05-31"
routes = [{ origin = "NVT", destination = "GRU" }]
"#;

    fn invalid_reason(content: &str) -> String {
        let err = Config::from_toml_str(content).unwrap_err();
        match err.downcast_ref::<TrackerError>() {
            Some(TrackerError::ConfigurationInvalid(reason)) => reason.clone(),
            other => panic!("expected ConfigurationInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.poll_interval_secs(), 300);
        assert_eq!(config.provider_timeout_ms(), 30_000);
        assert_eq!(config.notifier_format(), &NotifierFormat::AdaptiveCard);
        assert_eq!(config.notifier_timeout_ms(), 10_000);
        assert_eq!(config.state_file(), "state/tracking.json");
        assert!(!config.notifier_enabled());
        assert_eq!(config.route_count(), 1);
    }

    #[test]
    fn test_seed_state_preserves_order() {
        let config = Config::from_toml_str(
            r#"
[provider]
url = "http://localhost:8080/listings"

[notifier]
webhook_url = "https://chat.example/hook"
format = "text"

[[days]]
date = "2024-06-01"
routes = [
    { origin = "NVT", destination = "GRU" },
    { origin = "NVT", destination = "CGH" },
]

[[days]]
date = "2024-05-31"
routes = [{ origin = "FLN", destination = "GRU" }]
"#,
        )
        .unwrap();

        assert_eq!(config.notifier_format(), &NotifierFormat::Text);
        let state = config.seed_state();
        assert_eq!(state.days.len(), 2);
        assert_eq!(state.days[0].date, "2024-06-01");
        assert_eq!(state.days[0].routes[1].route, Route::new("NVT", "CGH"));
        assert_eq!(state.days[1].date, "2024-05-31");
        assert!(state.days.iter().all(|d| d.best_fare.is_none()));
        assert!(state.days.iter().flat_map(|d| &d.routes).all(|r| r.best_fare.is_none()));
    }

    #[test]
    fn test_no_days_is_invalid() {
        let reason = invalid_reason(
            r#"
[provider]
url = "http://localhost:8080/listings"
[notifier]
enabled = false
"#,
        );
        assert!(reason.contains("no travel days"));
    }

    #[test]
    fn test_day_without_routes_is_invalid() {
        let reason = invalid_reason(
            r#"
[provider]
url = "http://localhost:8080/listings"
[notifier]
enabled = false
[[days]]
date = "2024-05-31"
"#,
        );
        assert!(reason.contains("has no routes"));
    }

    #[test]
    fn test_duplicate_day_is_invalid() {
        let content = format!("{MINIMAL}\n[[days]]\ndate = \"2024-05-31\"\nroutes = [{{ origin = \"A\", destination = \"B\" }}]\n");
        assert!(invalid_reason(&content).contains("duplicate day"));
    }

    #[test]
    fn test_duplicate_route_is_invalid() {
        let reason = invalid_reason(
            r#"
[provider]
url = "http://localhost:8080/listings"
[notifier]
enabled = false
[[days]]
date = "2024-05-31"
routes = [{ origin = "NVT", destination = "GRU" }, { origin = "NVT", destination = "GRU" }]
"#,
        );
        assert!(reason.contains("twice"));
    }

    #[test]
    fn test_enabled_notifier_requires_webhook() {
        let content = MINIMAL.replace("enabled = false", "enabled = true");
        assert!(invalid_reason(&content).contains("webhook_url"));
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let content = format!("[poll]\ninterval_secs = 0\n{MINIMAL}");
        assert!(invalid_reason(&content).contains("interval_secs"));
    }

    #[test]
    fn test_blank_date_is_invalid() {
        let content = MINIMAL.replace("date = \"2024-05-31\"", "date = \"  \"");
        assert!(invalid_reason(&content).contains("empty date"));
    }

    #[test]
    fn test_blank_location_is_invalid() {
        let content = MINIMAL.replace("origin = \"NVT\"", "origin = \"\"");
        assert!(invalid_reason(&content).contains("empty location"));

        let content = MINIMAL.replace("destination = \"GRU\"", "destination = \" \"");
        assert!(invalid_reason(&content).contains("empty location"));
    }

    #[test]
    fn test_blank_provider_url_is_invalid() {
        let content = MINIMAL.replace("url = \"http://localhost:8080/listings\"", "url = \"\"");
        assert!(invalid_reason(&content).contains("provider.url"));
    }

    #[test]
    fn test_malformed_toml_is_invalid() {
        let reason = invalid_reason("[provider\nurl = ");
        assert!(!reason.is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Config::from_file("/nonexistent/fare-watch.toml").is_err());
    }
}
