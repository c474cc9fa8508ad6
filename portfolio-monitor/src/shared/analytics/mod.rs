//! Snapshot analytics engine
//!
//! Derives every number the dashboard displays from one polled snapshot:
//! - Position decoding from the abbreviated `JSON_Data` payload
//! - Per-group aggregation and volume-weighted breakeven
//! - Distance to breakeven and ladder ranges
//! - One-poll-lagged price and distance trends
//! - Display scaling (profit bars, tick rows, ladder marks, health bar)

mod aggregator;
mod breakeven;
mod decoder;
mod engine;
mod health;
mod scale;
mod trend;

pub use aggregator::{aggregate_groups, GroupAggregate, GroupBreakdown, PositionTotals};
pub use breakeven::{analyze_group, distance_to_breakeven, GroupDistance, LadderRange};
pub use decoder::{decode_positions, DecodedPositions};
pub use engine::{AnalyticsEngine, EngineConfig, GroupReport, LadderMarks, PollReport};
pub use health::{summarize_health, HealthSummary};
pub use scale::{
    health_bars, ladder_position, max_abs_profit, profit_bar, HealthBars, TickBar,
    CARD_TICK_BUDGET, HEALTH_HEADROOM, HUD_TICK_BUDGET, MIN_VISIBLE_BAR,
};
pub use trend::{classify_distance, classify_price, DistanceTrend, PriceTrend, TrendState};
