//! Snapshot source: CSV export of the account table, fetched over HTTP
//!
//! The trading terminal appends one row per account update. Each poll downloads the
//! whole table, and a row is picked per monitored account.

use std::collections::HashMap;

use reqwest::Client;
use tracing::debug;

use crate::shared::config::MonitorConfig;
use crate::shared::error::MonitorError;
use crate::shared::types::Snapshot;

/// Column names written by the trading terminal
pub mod columns {
    pub const ACCOUNT_ID: &str = "AccountID";
    pub const BALANCE: &str = "Balance";
    pub const EQUITY: &str = "Equity";
    pub const TOTAL_PROFIT: &str = "TotalProfit";
    pub const CURRENT_PRICE: &str = "CurrentPrice";
    pub const BUY_LOTS: &str = "BuyLots";
    pub const SELL_LOTS: &str = "SellLots";
    pub const BUY_COUNT: &str = "BuyCount";
    pub const SELL_COUNT: &str = "SellCount";
    pub const UPDATE_TIME: &str = "UpdateTime";
    pub const JSON_DATA: &str = "JSON_Data";
}

/// Parsed snapshot table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct SheetRow<'a> {
    index: &'a HashMap<String, usize>,
    cells: &'a [String],
}

impl SheetTable {
    /// Parse CSV text. The first record is the header; header names are trimmed.
    pub fn parse_csv(text: &str) -> Self {
        let mut records = parse_records(text).into_iter();

        let index = records
            .next()
            .map(|header| {
                header
                    .into_iter()
                    .enumerate()
                    .map(|(position, name)| (name.trim().to_string(), position))
                    .collect()
            })
            .unwrap_or_default();

        let rows = records
            .filter(|record| record.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Self { index, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = SheetRow<'_>> {
        self.rows.iter().map(|cells| SheetRow {
            index: &self.index,
            cells,
        })
    }

    /// Latest row for `account`, or the table's last row when no account is given.
    pub fn select(&self, account: Option<&str>) -> Result<SheetRow<'_>, MonitorError> {
        match account {
            Some(account) => {
                let wanted = normalize_account_id(account);
                self.rows()
                    .rev()
                    .find(|row| {
                        row.get(columns::ACCOUNT_ID)
                            .map(normalize_account_id)
                            .is_some_and(|id| id == wanted)
                    })
                    .ok_or_else(|| MonitorError::AccountNotFound(wanted.to_string()))
            }
            None => self
                .rows()
                .next_back()
                .ok_or_else(|| MonitorError::SourceUnavailable("snapshot table is empty".to_string())),
        }
    }
}

impl<'a> SheetRow<'a> {
    /// Raw cell for a column, `None` when the column is absent
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let position = *self.index.get(column)?;
        Some(self.cells.get(position).map(String::as_str).unwrap_or(""))
    }

    /// Build a snapshot, defaulting absent or unparseable numeric cells to zero.
    pub fn to_snapshot(&self) -> (Snapshot, Vec<MonitorError>) {
        let mut missing = Vec::new();

        let mut number = |column: &str| match self.get(column).and_then(parse_number) {
            Some(value) => value,
            None => {
                missing.push(MonitorError::MissingField(column.to_string()));
                0.0
            }
        };

        let balance = number(columns::BALANCE);
        let equity = number(columns::EQUITY);
        let total_profit = number(columns::TOTAL_PROFIT);
        let current_price = number(columns::CURRENT_PRICE);
        let buy_lots = number(columns::BUY_LOTS);
        let sell_lots = number(columns::SELL_LOTS);

        // Order counts are optional columns; absence is not worth a diagnostic
        let count = |column: &str| {
            self.get(column)
                .and_then(parse_number)
                .map(|value| value.max(0.0).round() as u32)
                .unwrap_or(0)
        };

        let snapshot = Snapshot {
            account_id: self
                .get(columns::ACCOUNT_ID)
                .map(normalize_account_id)
                .unwrap_or_default()
                .to_string(),
            balance,
            equity,
            total_profit,
            current_price,
            buy_lots,
            sell_lots,
            buy_count: count(columns::BUY_COUNT),
            sell_count: count(columns::SELL_COUNT),
            update_time: self
                .get(columns::UPDATE_TIME)
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            positions_raw: self.get(columns::JSON_DATA).map(str::to_string),
        };

        (snapshot, missing)
    }
}

/// Account ids are compared as text; spreadsheets may render them as `51234567.0`
pub fn normalize_account_id(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed)
}

fn parse_number(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Split CSV text into records.
///
/// Handles quoted cells with embedded commas, newlines and doubled quotes, which
/// the `JSON_Data` column always contains.
fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.trim_start_matches('\u{feff}').chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if cell.is_empty() => in_quotes = true,
            (',', false) => record.push(std::mem::take(&mut cell)),
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) | ('\r', false) => {
                record.push(std::mem::take(&mut cell));
                records.push(std::mem::take(&mut record));
            }
            (ch, _) => cell.push(ch),
        }
    }

    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        records.push(record);
    }

    records
}

/// HTTP snapshot source
#[derive(Debug, Clone)]
pub struct SheetSource {
    client: Client,
    url: String,
}

impl SheetSource {
    pub fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            client,
            url: config.sheet_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download and parse the snapshot table
    pub async fn fetch(&self) -> Result<SheetTable, MonitorError> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let table = SheetTable::parse_csv(&body);

        if !table.has_column(columns::ACCOUNT_ID) {
            return Err(MonitorError::SourceUnavailable(format!(
                "{} column missing from {}",
                columns::ACCOUNT_ID,
                self.url
            )));
        }

        debug!("Fetched {} snapshot rows from {}", table.len(), self.url);
        Ok(table)
    }
}
