/// Live Portfolio Monitor - Shared Library
///
/// Polls a tabular snapshot of trading accounts and derives everything the dashboard
/// displays. The library includes:
/// - Core snapshot and position types
/// - The snapshot analytics engine (groups, breakeven, distance, trends, scaling)
/// - CSV snapshot source and multi-account poll state
/// - Ratatui dashboard widget
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{Direction, GroupKey, Position, Snapshot};

pub use shared::error::MonitorError;

pub use shared::config::MonitorConfig;

pub use shared::source::{SheetSource, SheetTable};

pub use shared::monitor::{AccountMonitor, AccountPanel, DashboardFrame};

// Analytics engine
pub use shared::analytics::{
    AnalyticsEngine, DistanceTrend, EngineConfig, GroupAggregate, GroupDistance, GroupReport,
    HealthBars, HealthSummary, LadderMarks, LadderRange, PollReport, PositionTotals, PriceTrend,
    TickBar, TrendState,
};

pub use shared::widget::render_dashboard;
