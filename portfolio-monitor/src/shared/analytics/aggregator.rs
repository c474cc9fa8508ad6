//! Per-group aggregation of open positions
//!
//! Positions are partitioned by strategy tag. Each group gets sums, extrema and a
//! volume-weighted average open price (the breakeven price). Groups are returned in
//! order of first appearance so cards keep the order positions arrived in.

use indexmap::IndexMap;
use serde::Serialize;

use crate::shared::types::{Direction, GroupKey, Position};

/// Aggregated view of every position sharing one group key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAggregate {
    pub key: GroupKey,
    /// Direction of the group's first position
    pub direction: Direction,
    /// Set when a later position disagrees with `direction`. Breakeven and distance
    /// are still computed as if the group were homogeneous.
    pub mixed_direction: bool,
    pub count: usize,
    pub total_volume: f64,
    pub total_profit: f64,
    pub min_open_price: f64,
    pub max_open_price: f64,
    /// Volume-weighted average open price, 0.0 when `degenerate`
    pub breakeven_price: f64,
    /// Total volume is zero: breakeven is undefined
    pub degenerate: bool,
    /// Open prices in arrival order (ladder marks)
    pub open_prices: Vec<f64>,
}

impl GroupAggregate {
    /// Breakeven price, `None` for degenerate groups
    pub fn breakeven(&self) -> Option<f64> {
        (!self.degenerate).then_some(self.breakeven_price)
    }
}

/// Sums over a set of positions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionTotals {
    pub count: usize,
    pub volume: f64,
    pub profit: f64,
    pub long_volume: f64,
    pub short_volume: f64,
}

impl PositionTotals {
    fn add(&mut self, position: &Position) {
        self.count += 1;
        self.volume += position.volume;
        self.profit += position.profit;
        match position.direction {
            Direction::Long => self.long_volume += position.volume,
            Direction::Short => self.short_volume += position.volume,
        }
    }
}

/// Result of aggregating one snapshot's positions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupBreakdown {
    pub groups: Vec<GroupAggregate>,
    /// Positions without a group key
    pub ungrouped: PositionTotals,
    /// Every position, grouped or not
    pub totals: PositionTotals,
}

/// Running sums for one group
#[derive(Debug, Clone)]
struct GroupAccumulator {
    direction: Direction,
    mixed_direction: bool,
    count: usize,
    sum_pv: f64, // Σ(open_price × volume)
    sum_v: f64,  // Σ(volume)
    sum_profit: f64,
    min_open_price: f64,
    max_open_price: f64,
    open_prices: Vec<f64>,
}

impl GroupAccumulator {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            mixed_direction: false,
            count: 0,
            sum_pv: 0.0,
            sum_v: 0.0,
            sum_profit: 0.0,
            min_open_price: f64::MAX,
            max_open_price: f64::MIN,
            open_prices: Vec::new(),
        }
    }

    fn add(&mut self, position: &Position) {
        if position.direction != self.direction {
            self.mixed_direction = true;
        }
        self.count += 1;
        self.sum_pv += position.open_price * position.volume;
        self.sum_v += position.volume;
        self.sum_profit += position.profit;
        self.min_open_price = self.min_open_price.min(position.open_price);
        self.max_open_price = self.max_open_price.max(position.open_price);
        self.open_prices.push(position.open_price);
    }

    fn vwap(&self) -> Option<f64> {
        if self.sum_v > 0.0 {
            Some(self.sum_pv / self.sum_v)
        } else {
            None
        }
    }

    fn finish(self, key: GroupKey) -> GroupAggregate {
        let vwap = self.vwap();
        GroupAggregate {
            key,
            direction: self.direction,
            mixed_direction: self.mixed_direction,
            count: self.count,
            total_volume: self.sum_v,
            total_profit: self.sum_profit,
            min_open_price: self.min_open_price,
            max_open_price: self.max_open_price,
            // Rounding in Σpv/Σv must not push breakeven outside the open-price range
            breakeven_price: vwap
                .map(|price| price.clamp(self.min_open_price, self.max_open_price))
                .unwrap_or(0.0),
            degenerate: vwap.is_none(),
            open_prices: self.open_prices,
        }
    }
}

/// Partition positions by group key and aggregate each group.
pub fn aggregate_groups(positions: &[Position]) -> GroupBreakdown {
    let mut accumulators: IndexMap<GroupKey, GroupAccumulator> = IndexMap::new();
    let mut ungrouped = PositionTotals::default();
    let mut totals = PositionTotals::default();

    for position in positions {
        totals.add(position);

        match &position.group_key {
            Some(key) => accumulators
                .entry(key.clone())
                .or_insert_with(|| GroupAccumulator::new(position.direction))
                .add(position),
            None => ungrouped.add(position),
        }
    }

    GroupBreakdown {
        groups: accumulators
            .into_iter()
            .map(|(key, accumulator)| accumulator.finish(key))
            .collect(),
        ungrouped,
        totals,
    }
}
