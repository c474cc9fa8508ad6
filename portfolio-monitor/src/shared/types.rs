/// Core data types for account snapshots and open positions
///
/// These types mirror one row of the polled snapshot table (columns `AccountID`,
/// `Balance`, `Equity`, ... `JSON_Data`) and the decoded position list it carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One polled row of account state.
///
/// Immutable once read. Only `current_price` outlives the poll, via
/// [`TrendState`](crate::shared::analytics::TrendState).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    /// Account identity (e.g., "51234567")
    pub account_id: String,
    pub balance: f64,
    pub equity: f64,
    /// Floating profit across all open positions
    pub total_profit: f64,
    /// Current market price of the monitored symbol (0.0 when the column is absent)
    pub current_price: f64,
    pub buy_lots: f64,
    pub sell_lots: f64,
    /// Number of open buy orders
    pub buy_count: u32,
    /// Number of open sell orders
    pub sell_count: u32,
    /// Update time exactly as written by the source
    pub update_time: String,
    /// Serialized position list (`JSON_Data`), decoded by the engine
    pub positions_raw: Option<String>,
}

/// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Parse a direction label as written by the trading terminal.
    ///
    /// Accepts "Buy"/"Sell" and "Long"/"Short" in any case.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Some(Direction::Long),
            "sell" | "short" => Some(Direction::Short),
            _ => None,
        }
    }

    /// Map a MetaTrader order type (0 = buy, 1 = sell).
    pub fn from_order_type(order_type: i64) -> Option<Self> {
        match order_type {
            0 => Some(Direction::Long),
            1 => Some(Direction::Short),
            _ => None,
        }
    }

    /// Convert to display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "BUY",
            Direction::Short => "SELL",
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Direction::Long)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strategy tag ("magic number") attached to a position.
///
/// Source payloads carry either an integer or a free-form string; numeric strings
/// are normalised to [`GroupKey::Number`] so `"7"` and `7` land in the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Number(i64),
    Text(String),
}

impl GroupKey {
    /// Build a key from a raw string cell. Blank strings carry no key.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(number) = trimmed.parse::<i64>() {
            return Some(GroupKey::Number(number));
        }
        Some(
            integral(trimmed.parse::<f64>().ok())
                .map(GroupKey::Number)
                .unwrap_or_else(|| GroupKey::Text(trimmed.to_string())),
        )
    }

    /// Key for a JSON number; integral floats such as `1001.0` become [`GroupKey::Number`]
    pub fn from_f64(value: f64) -> Option<Self> {
        integral(Some(value)).map(GroupKey::Number)
    }
}

fn integral(value: Option<f64>) -> Option<i64> {
    value
        .filter(|float| float.is_finite() && float.fract() == 0.0)
        .filter(|float| *float >= i64::MIN as f64 && *float < i64::MAX as f64)
        .map(|float| float as i64)
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(number) => write!(f, "{}", number),
            GroupKey::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<i64> for GroupKey {
    fn from(value: i64) -> Self {
        GroupKey::Number(value)
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        GroupKey::Text(value.to_string())
    }
}

/// One open trade, in canonical form.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    /// Lots, expected > 0
    pub volume: f64,
    /// Expected > 0
    pub open_price: f64,
    /// Signed floating profit
    pub profit: f64,
    /// Positions without a key are reported as ungrouped
    pub group_key: Option<GroupKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_label() {
        assert_eq!(Direction::from_label("Buy"), Some(Direction::Long));
        assert_eq!(Direction::from_label(" SELL "), Some(Direction::Short));
        assert_eq!(Direction::from_label("long"), Some(Direction::Long));
        assert_eq!(Direction::from_label("Short"), Some(Direction::Short));
        assert_eq!(Direction::from_label("buy_limit"), None);
    }

    #[test]
    fn test_direction_from_order_type() {
        assert_eq!(Direction::from_order_type(0), Some(Direction::Long));
        assert_eq!(Direction::from_order_type(1), Some(Direction::Short));
        assert_eq!(Direction::from_order_type(2), None);
    }

    #[test]
    fn test_group_key_parse() {
        assert_eq!(GroupKey::parse("1001"), Some(GroupKey::Number(1001)));
        assert_eq!(GroupKey::parse(" grid "), Some(GroupKey::Text("grid".to_string())));
        assert_eq!(GroupKey::parse("   "), None);
        assert_eq!(GroupKey::parse("1001.0"), Some(GroupKey::Number(1001)));
        assert_eq!(GroupKey::parse("1001.5"), Some(GroupKey::Text("1001.5".to_string())));
        assert_eq!(GroupKey::parse("NaN"), Some(GroupKey::Text("NaN".to_string())));
    }

    #[test]
    fn test_group_key_display() {
        assert_eq!(GroupKey::Number(42).to_string(), "42");
        assert_eq!(GroupKey::from("A").to_string(), "A");
    }
}
