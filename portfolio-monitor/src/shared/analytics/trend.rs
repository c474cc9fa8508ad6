//! One-poll-lagged trend classification
//!
//! [`TrendState`] is the only value that outlives a poll. The host owns one per account
//! and threads it through the engine: the engine reads it, and returns its successor.

use serde::{Deserialize, Serialize};

use super::aggregator::GroupAggregate;
use super::breakeven::distance_to_breakeven;

/// Carried previous-poll price
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub enum TrendState {
    /// No poll observed yet
    #[default]
    Uninitialized,
    Tracking { previous_price: f64 },
}

/// Market price movement since the previous poll
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
pub enum PriceTrend {
    Up,
    Down,
    Flat,
}

impl PriceTrend {
    pub fn label(&self) -> &'static str {
        match self {
            PriceTrend::Up => "UP",
            PriceTrend::Down => "DOWN",
            PriceTrend::Flat => "FLAT",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            PriceTrend::Up => "▲",
            PriceTrend::Down => "▼",
            PriceTrend::Flat => "→",
        }
    }
}

/// Movement of a group's |distance| to breakeven since the previous poll
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
pub enum DistanceTrend {
    /// Closer to breakeven
    Improving,
    Worsening,
    Unchanged,
}

impl DistanceTrend {
    pub fn label(&self) -> &'static str {
        match self {
            DistanceTrend::Improving => "IMPROVING",
            DistanceTrend::Worsening => "WORSENING",
            DistanceTrend::Unchanged => "UNCHANGED",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            DistanceTrend::Improving => "▲",
            DistanceTrend::Worsening => "▼",
            DistanceTrend::Unchanged => "→",
        }
    }
}

/// Strict comparison, no tolerance band
pub fn classify_price(previous_price: f64, current_price: f64) -> PriceTrend {
    if current_price > previous_price {
        PriceTrend::Up
    } else if current_price < previous_price {
        PriceTrend::Down
    } else {
        PriceTrend::Flat
    }
}

pub fn classify_distance(previous_distance: f64, distance: f64) -> DistanceTrend {
    let (before, now) = (previous_distance.abs(), distance.abs());
    if now < before {
        DistanceTrend::Improving
    } else if now > before {
        DistanceTrend::Worsening
    } else {
        DistanceTrend::Unchanged
    }
}

impl TrendState {
    pub fn previous_price(&self) -> Option<f64> {
        match self {
            TrendState::Uninitialized => None,
            TrendState::Tracking { previous_price } => Some(*previous_price),
        }
    }

    /// Price direction since the previous poll, `None` on the first poll
    pub fn price_trend(&self, current_price: f64) -> Option<PriceTrend> {
        self.previous_price()
            .map(|previous_price| classify_price(previous_price, current_price))
    }

    /// Compare the group's distance now with the distance it had against the previous
    /// poll's price. `None` on the first poll and for degenerate groups.
    pub fn distance_trend(&self, group: &GroupAggregate, current_price: f64) -> Option<DistanceTrend> {
        let previous_price = self.previous_price()?;
        let breakeven_price = group.breakeven()?;

        let previous = distance_to_breakeven(group.direction, breakeven_price, previous_price);
        let now = distance_to_breakeven(group.direction, breakeven_price, current_price);
        Some(classify_distance(previous, now))
    }

    /// State after observing `current_price`. Always overwrites, never averages.
    pub fn advance(&self, current_price: f64) -> TrendState {
        TrendState::Tracking {
            previous_price: current_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{Direction, GroupKey};

    fn long_group(breakeven_price: f64) -> GroupAggregate {
        GroupAggregate {
            key: GroupKey::Number(1),
            direction: Direction::Long,
            mixed_direction: false,
            count: 1,
            total_volume: 1.0,
            total_profit: 0.0,
            min_open_price: breakeven_price,
            max_open_price: breakeven_price,
            breakeven_price,
            degenerate: false,
            open_prices: vec![breakeven_price],
        }
    }

    #[test]
    fn test_first_poll_reports_nothing_and_seeds() {
        let state = TrendState::default();
        assert_eq!(state, TrendState::Uninitialized);
        assert_eq!(state.price_trend(1900.0), None);
        assert_eq!(state.distance_trend(&long_group(1900.0), 1900.0), None);

        let next = state.advance(1900.0);
        assert_eq!(next, TrendState::Tracking { previous_price: 1900.0 });
    }

    #[test]
    fn test_price_trend() {
        let state = TrendState::Tracking { previous_price: 1900.0 };
        assert_eq!(state.price_trend(1900.5), Some(PriceTrend::Up));
        assert_eq!(state.price_trend(1899.5), Some(PriceTrend::Down));
        assert_eq!(state.price_trend(1900.0), Some(PriceTrend::Flat));
    }

    #[test]
    fn test_distance_trend() {
        struct TestCase {
            direction: Direction,
            previous_price: f64,
            current_price: f64,
            expected: DistanceTrend,
        }

        // Breakeven 1900 in every case
        let tests = vec![
            TestCase {
                // TC0: underwater long, price rising towards breakeven
                direction: Direction::Long,
                previous_price: 1890.0,
                current_price: 1895.0,
                expected: DistanceTrend::Improving,
            },
            TestCase {
                // TC1: underwater long, price falling away
                direction: Direction::Long,
                previous_price: 1895.0,
                current_price: 1890.0,
                expected: DistanceTrend::Worsening,
            },
            TestCase {
                // TC2: same |distance| on the other side of breakeven
                direction: Direction::Long,
                previous_price: 1895.0,
                current_price: 1905.0,
                expected: DistanceTrend::Unchanged,
            },
            TestCase {
                // TC3: in profit, price moving further up widens |distance|
                direction: Direction::Long,
                previous_price: 1905.0,
                current_price: 1910.0,
                expected: DistanceTrend::Worsening,
            },
            TestCase {
                // TC4: underwater short, price rising away
                direction: Direction::Short,
                previous_price: 1905.0,
                current_price: 1910.0,
                expected: DistanceTrend::Worsening,
            },
            TestCase {
                // TC5: underwater short, price falling towards breakeven
                direction: Direction::Short,
                previous_price: 1910.0,
                current_price: 1905.0,
                expected: DistanceTrend::Improving,
            },
            TestCase {
                // TC6: in profit short, price falling further widens |distance|
                direction: Direction::Short,
                previous_price: 1895.0,
                current_price: 1890.0,
                expected: DistanceTrend::Worsening,
            },
            TestCase {
                // TC7: in profit short, price drifting back to breakeven
                direction: Direction::Short,
                previous_price: 1890.0,
                current_price: 1898.0,
                expected: DistanceTrend::Improving,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let group = GroupAggregate {
                direction: test.direction,
                ..long_group(1900.0)
            };
            let state = TrendState::Tracking { previous_price: test.previous_price };
            let actual = state.distance_trend(&group, test.current_price);
            assert_eq!(actual, Some(test.expected), "TC{} failed", index);
        }
    }

    #[test]
    fn test_trend_is_one_poll_lagged() {
        let mut state = TrendState::default();
        let prices = [1900.0, 1901.0, 1901.0, 1899.0];
        let mut trends = Vec::new();

        for price in prices {
            trends.push(state.price_trend(price));
            state = state.advance(price);
        }

        assert_eq!(
            trends,
            vec![None, Some(PriceTrend::Up), Some(PriceTrend::Flat), Some(PriceTrend::Down)]
        );
        assert_eq!(state.previous_price(), Some(1899.0));
    }

    #[test]
    fn test_degenerate_group_has_no_distance_trend() {
        let mut group = long_group(1900.0);
        group.degenerate = true;
        let state = TrendState::Tracking { previous_price: 1890.0 };
        assert_eq!(state.distance_trend(&group, 1895.0), None);
    }
}
