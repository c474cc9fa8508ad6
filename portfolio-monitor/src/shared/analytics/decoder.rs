//! Position decoding from the serialized `JSON_Data` payload
//!
//! The trading terminal writes abbreviated keys (`s`, `t`, `v`, `p`, `pl`, `m`) to keep
//! the sheet cell small; long-form names are accepted as aliases.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::shared::error::MonitorError;
use crate::shared::types::{Direction, GroupKey, Position};

/// Position record as written by the source
#[derive(Debug, Deserialize)]
struct RawPosition {
    #[serde(default, alias = "s")]
    symbol: String,
    #[serde(default, alias = "t", alias = "type")]
    direction: Value,
    #[serde(default, alias = "v", alias = "lots", deserialize_with = "lenient_f64")]
    volume: f64,
    #[serde(default, alias = "p", alias = "price", deserialize_with = "lenient_f64")]
    open_price: f64,
    #[serde(default, alias = "pl", deserialize_with = "lenient_f64")]
    profit: f64,
    #[serde(default, alias = "m", alias = "magic", alias = "group", deserialize_with = "lenient_group_key")]
    group_key: Option<GroupKey>,
}

impl TryFrom<RawPosition> for Position {
    type Error = MonitorError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        let direction = match &raw.direction {
            Value::String(label) => Direction::from_label(label),
            Value::Number(number) => number.as_i64().and_then(Direction::from_order_type),
            _ => None,
        }
        .ok_or_else(|| {
            MonitorError::Decode(format!(
                "unknown direction {} for {}",
                raw.direction, raw.symbol
            ))
        })?;

        Ok(Position {
            symbol: raw.symbol,
            direction,
            volume: raw.volume,
            open_price: raw.open_price,
            profit: raw.profit,
            group_key: raw.group_key,
        })
    }
}

/// Decoded payload plus the elements that had to be dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPositions {
    pub positions: Vec<Position>,
    pub skipped: Vec<MonitorError>,
}

/// Decode a snapshot's `positions_raw` into canonical positions.
///
/// Missing, blank and `null` payloads are an empty position list. A payload that is not
/// JSON, or not a list, is an `Err` which callers treat exactly like "no positions".
/// Individual list elements that cannot be decoded are skipped and reported.
pub fn decode_positions(raw: Option<&str>) -> Result<DecodedPositions, MonitorError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(DecodedPositions::default());
    };

    let items = match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => items,
        Value::Null => return Ok(DecodedPositions::default()),
        other => {
            return Err(MonitorError::Decode(format!(
                "expected a list of positions, found {}",
                json_kind(&other)
            )))
        }
    };

    let mut decoded = DecodedPositions {
        positions: Vec::with_capacity(items.len()),
        skipped: Vec::new(),
    };

    for (index, item) in items.into_iter().enumerate() {
        let result = serde_json::from_value::<RawPosition>(item)
            .map_err(MonitorError::from)
            .and_then(Position::try_from);

        match result {
            Ok(position) => decoded.positions.push(position),
            Err(error) => {
                debug!("Skipping position #{}: {}", index, error);
                decoded.skipped.push(error);
            }
        }
    }

    Ok(decoded)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Accept JSON numbers or numeric strings; anything else (or non-finite) is 0.0
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|number| number.is_finite()).unwrap_or(0.0))
}

fn lenient_group_key<'de, D>(deserializer: D) -> Result<Option<GroupKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Some(GroupKey::Number(integer)),
            // Sheets sometimes round-trip integers as 1001.0
            None => number
                .as_f64()
                .and_then(GroupKey::from_f64)
                .or_else(|| Some(GroupKey::Text(number.to_string()))),
        },
        Value::String(text) => GroupKey::parse(&text),
        _ => None,
    })
}
