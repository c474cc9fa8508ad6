//! Display scaling for bars, tick rows, price ladders and the health bar
//!
//! Every function returns a bounded, dimensionless value and handles its own
//! degenerate input instead of dividing by zero.

use serde::Serialize;

use super::breakeven::LadderRange;

/// Tick slots on a group card
pub const CARD_TICK_BUDGET: usize = 30;
/// Tick slots on the wide HUD layout
pub const HUD_TICK_BUDGET: usize = 50;
/// Smallest bar width for a non-zero profit, as a fraction of full width
pub const MIN_VISIBLE_BAR: f64 = 0.04;
/// Health bar scale: `max(balance, equity) × HEALTH_HEADROOM` is 100%
pub const HEALTH_HEADROOM: f64 = 1.2;

/// Square-root scaled profit bar in 0..=1.
///
/// Small non-zero profits are lifted to `min_visible` so the bar never disappears.
pub fn profit_bar(profit: f64, max_abs_profit: f64, min_visible: f64) -> f64 {
    if !(max_abs_profit > 0.0) || !profit.is_finite() || profit == 0.0 {
        return 0.0;
    }

    let scaled = (profit.abs().sqrt() / max_abs_profit.sqrt()).min(1.0);
    scaled.max(min_visible.clamp(0.0, 1.0))
}

/// Largest |profit| across a set of profits, 0.0 for an empty set
pub fn max_abs_profit(profits: impl IntoIterator<Item = f64>) -> f64 {
    profits
        .into_iter()
        .filter(|profit| profit.is_finite())
        .fold(0.0, |max, profit| max.max(profit.abs()))
}

/// Fixed-width row of order ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickBar {
    pub active: usize,
    pub inactive: usize,
    /// More orders than slots, renderer shows a truncation marker
    pub overflow: bool,
    /// Orders not represented by a tick
    pub hidden: usize,
}

impl TickBar {
    pub fn quantize(count: usize, budget: usize) -> Self {
        let active = count.min(budget);
        Self {
            active,
            inactive: budget - active,
            overflow: count > budget,
            hidden: count - active,
        }
    }

    pub fn budget(&self) -> usize {
        self.active + self.inactive
    }
}

/// Position of `value` on a ladder, in percent of the range.
///
/// A single-point range places every value at 50.
pub fn ladder_position(range: &LadderRange, value: f64) -> f64 {
    let span = range.span();
    if !(span > 0.0) {
        return 50.0;
    }
    ((value - range.lo) / span * 100.0).clamp(0.0, 100.0)
}

/// Equity and balance bar lengths in percent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HealthBars {
    pub equity_pct: f64,
    pub balance_pct: f64,
}

/// Both bars are measured against `max(balance, equity) × headroom`, so under normal
/// conditions neither reaches 100% and the marker line stays visible.
pub fn health_bars(balance: f64, equity: f64, headroom: f64) -> HealthBars {
    let scale = balance.max(equity) * headroom;
    if !(scale > 0.0) {
        return HealthBars::default();
    }

    HealthBars {
        equity_pct: (equity / scale * 100.0).clamp(0.0, 100.0),
        balance_pct: (balance / scale * 100.0).clamp(0.0, 100.0),
    }
}
