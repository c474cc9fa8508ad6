//! Distance between a group's breakeven price and the market
//!
//! Sign convention: `distance <= 0` means price has reached or passed breakeven
//! (favorable), `distance > 0` is how far price still has to travel.

use serde::Serialize;

use super::aggregator::GroupAggregate;
use crate::shared::types::Direction;

/// Price interval covering every point plotted on a group's ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LadderRange {
    pub lo: f64,
    pub hi: f64,
}

impl LadderRange {
    pub fn span(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn contains(&self, price: f64) -> bool {
        self.lo <= price && price <= self.hi
    }
}

/// Breakeven analysis for one non-degenerate group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupDistance {
    pub breakeven_price: f64,
    /// Signed, see module docs
    pub distance: f64,
    pub favorable: bool,
    pub ladder: LadderRange,
}

/// Signed distance to breakeven for a position direction.
///
/// Long: `breakeven - price`. Short: `price - breakeven`.
pub fn distance_to_breakeven(direction: Direction, breakeven_price: f64, current_price: f64) -> f64 {
    match direction {
        Direction::Long => breakeven_price - current_price,
        Direction::Short => current_price - breakeven_price,
    }
}

/// Distance and ladder range for a group. `None` for degenerate groups.
pub fn analyze_group(group: &GroupAggregate, current_price: f64) -> Option<GroupDistance> {
    let breakeven_price = group.breakeven()?;
    let distance = distance_to_breakeven(group.direction, breakeven_price, current_price);

    let ladder = LadderRange {
        lo: group.min_open_price.min(breakeven_price).min(current_price),
        hi: group.max_open_price.max(breakeven_price).max(current_price),
    };

    Some(GroupDistance {
        breakeven_price,
        distance,
        favorable: distance <= 0.0,
        ladder,
    })
}
