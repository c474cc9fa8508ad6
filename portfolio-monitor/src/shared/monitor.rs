//! Multi-account poll state
//!
//! Owns one [`TrendState`] per account so trends never leak between accounts, and
//! turns each fetched table into a frame of per-account panels for the renderer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::shared::analytics::{AnalyticsEngine, PollReport, TrendState};
use crate::shared::error::MonitorError;
use crate::shared::source::{normalize_account_id, SheetTable};

/// One account's slot on the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct AccountPanel {
    /// Account as configured, `None` when following the latest row
    pub requested: Option<String>,
    pub outcome: Result<PollReport, MonitorError>,
}

/// Everything rendered after one poll
#[derive(Debug, Clone, Serialize)]
pub struct DashboardFrame {
    pub polled_at: DateTime<Utc>,
    /// Set when the table could not be fetched; panels are then empty
    pub source_error: Option<MonitorError>,
    pub panels: Vec<AccountPanel>,
}

impl DashboardFrame {
    pub fn is_connected(&self) -> bool {
        self.source_error.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountMonitor {
    engine: AnalyticsEngine,
    accounts: Vec<String>,
    trends: HashMap<String, TrendState>,
}

impl AccountMonitor {
    /// Accounts are normalised and de-duplicated so each one is evaluated once per poll.
    pub fn new(engine: AnalyticsEngine, accounts: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(accounts.len());
        for account in &accounts {
            let id = normalize_account_id(account);
            if !id.is_empty() && !unique.iter().any(|seen| seen == id) {
                unique.push(id.to_string());
            }
        }

        Self {
            engine,
            accounts: unique,
            trends: HashMap::new(),
        }
    }

    pub fn accounts(&self) -> &[String] {
        &self.accounts
    }

    pub fn trend(&self, account_id: &str) -> TrendState {
        self.trends.get(account_id).copied().unwrap_or_default()
    }

    /// Evaluate one poll's table (or its fetch error) for every monitored account.
    pub fn process(&mut self, table: Result<SheetTable, MonitorError>, polled_at: DateTime<Utc>) -> DashboardFrame {
        let table = match table {
            Ok(table) => table,
            Err(error) => {
                warn!("Snapshot source unavailable: {}", error);
                // No snapshot: engine emits nothing and every trend state stays put
                return DashboardFrame {
                    polled_at,
                    source_error: Some(error),
                    panels: Vec::new(),
                };
            }
        };

        let requested: Vec<Option<String>> = if self.accounts.is_empty() {
            vec![None]
        } else {
            self.accounts.iter().cloned().map(Some).collect()
        };

        let panels = requested
            .into_iter()
            .map(|account| {
                let outcome = self.evaluate_account(&table, account.as_deref());
                AccountPanel {
                    requested: account,
                    outcome,
                }
            })
            .collect();

        DashboardFrame {
            polled_at,
            source_error: None,
            panels,
        }
    }

    fn evaluate_account(&mut self, table: &SheetTable, account: Option<&str>) -> Result<PollReport, MonitorError> {
        let (snapshot, missing) = table.select(account)?.to_snapshot();
        for error in &missing {
            debug!("Account {}: {}", snapshot.account_id, error);
        }

        let trend = self.trend(&snapshot.account_id);
        let (report, next) = self.engine.evaluate(Some(&snapshot), &trend);
        self.trends.insert(snapshot.account_id.clone(), next);

        let mut report = report.ok_or_else(|| {
            MonitorError::SourceUnavailable(format!("no report for {}", snapshot.account_id))
        })?;
        let mut diagnostics = missing;
        diagnostics.append(&mut report.diagnostics);
        report.diagnostics = diagnostics;
        Ok(report)
    }
}
