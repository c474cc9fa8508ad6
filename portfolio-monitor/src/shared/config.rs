//! Host configuration for the polling dashboard
//!
//! Read from environment variables, falling back to defaults:
//! - `MONITOR_SHEET_URL`: CSV export URL of the snapshot table
//! - `MONITOR_ACCOUNTS`: comma separated account ids (empty = latest row)
//! - `MONITOR_POLL_SECS`: delay between polls (default 5)
//! - `MONITOR_HTTP_TIMEOUT_SECS`: request timeout (default 10)
//! - `MONITOR_TICK_BUDGET`: tick slots per group card (default 30, at most 200)
//! - `MONITOR_HEADLESS`: `1`/`true` logs JSON reports instead of drawing the TUI

use std::time::Duration;

use crate::shared::analytics::{EngineConfig, HUD_TICK_BUDGET};
use crate::shared::source::normalize_account_id;

const DEFAULT_SHEET_URL: &str = "http://127.0.0.1:8080/snapshot.csv";

/// Upper bound for a configured tick budget
pub const MAX_TICK_BUDGET: usize = HUD_TICK_BUDGET * 4;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Snapshot table URL (CSV export)
    pub sheet_url: String,
    /// Accounts to monitor; empty follows the table's latest row
    pub accounts: Vec<String>,
    /// Fixed delay between polls
    pub poll_interval: Duration,
    /// Timeout for one snapshot fetch
    pub http_timeout: Duration,
    /// Log reports instead of rendering the terminal UI
    pub headless: bool,
    pub engine: EngineConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            accounts: Vec::new(),
            poll_interval: Duration::from_secs(5),
            http_timeout: Duration::from_secs(10),
            headless: false,
            engine: EngineConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Create a configuration for a custom snapshot URL
    pub fn new(sheet_url: impl Into<String>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            ..Default::default()
        }
    }

    /// Build from `MONITOR_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let secs = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let tick_budget = lookup("MONITOR_TICK_BUDGET")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .map(|budget| budget.min(MAX_TICK_BUDGET))
            .unwrap_or(defaults.engine.tick_budget);

        let sheet_url = lookup("MONITOR_SHEET_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.sheet_url);

        let headless = lookup("MONITOR_HEADLESS")
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.headless);

        Self::new(sheet_url)
            .with_accounts(
                lookup("MONITOR_ACCOUNTS")
                    .map(|value| parse_accounts(&value))
                    .unwrap_or_default(),
            )
            .with_poll_interval(secs("MONITOR_POLL_SECS", defaults.poll_interval))
            .with_http_timeout(secs("MONITOR_HTTP_TIMEOUT_SECS", defaults.http_timeout))
            .with_headless(headless)
            .with_engine(defaults.engine.with_tick_budget(tick_budget))
    }

    /// Set monitored accounts
    pub fn with_accounts(mut self, accounts: Vec<String>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set HTTP timeout
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set headless mode
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set engine tunables
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

fn parse_accounts(value: &str) -> Vec<String> {
    let mut accounts: Vec<String> = Vec::new();
    for account in value.split(',').map(normalize_account_id) {
        if !account.is_empty() && !accounts.iter().any(|seen| seen == account) {
            accounts.push(account.to_string());
        }
    }
    accounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = MonitorConfig::from_lookup(lookup(&[]));
        assert_eq!(config.sheet_url, DEFAULT_SHEET_URL);
        assert!(config.accounts.is_empty());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(!config.headless);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_config_from_vars() {
        let config = MonitorConfig::from_lookup(lookup(&[
            ("MONITOR_SHEET_URL", " https://example.com/export?format=csv "),
            ("MONITOR_ACCOUNTS", "111, 222,,333 "),
            ("MONITOR_POLL_SECS", "2"),
            ("MONITOR_TICK_BUDGET", "50"),
            ("MONITOR_HEADLESS", "TRUE"),
        ]));

        assert_eq!(config.sheet_url, "https://example.com/export?format=csv");
        assert_eq!(config.accounts, vec!["111", "222", "333"]);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.engine.tick_budget, 50);
        assert!(config.headless);
    }

    #[test]
    fn test_config_ignores_invalid_values() {
        let config = MonitorConfig::from_lookup(lookup(&[
            ("MONITOR_POLL_SECS", "0"),
            ("MONITOR_HTTP_TIMEOUT_SECS", "soon"),
            ("MONITOR_TICK_BUDGET", "-1"),
        ]));

        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.engine.tick_budget, 30);
    }

    #[test]
    fn test_config_tick_budget_is_capped() {
        let config = MonitorConfig::from_lookup(lookup(&[("MONITOR_TICK_BUDGET", "1000000")]));
        assert_eq!(config.engine.tick_budget, MAX_TICK_BUDGET);
    }

    #[test]
    fn test_config_accounts_are_deduplicated() {
        let config = MonitorConfig::from_lookup(lookup(&[("MONITOR_ACCOUNTS", "111, 111.0,222,111")]));
        assert_eq!(config.accounts, vec!["111", "222"]);
    }
}
