//! Per-poll analytics pipeline
//!
//! decode → aggregate → {breakeven/distance, health} → trend → scale
//!
//! Pure given a snapshot and the carried [`TrendState`]; no I/O.

use serde::Serialize;
use tracing::debug;

use super::aggregator::{aggregate_groups, GroupAggregate, PositionTotals};
use super::breakeven::{analyze_group, GroupDistance};
use super::decoder::decode_positions;
use super::health::{summarize_health, HealthSummary};
use super::scale::{
    health_bars, ladder_position, max_abs_profit, profit_bar, HealthBars, TickBar,
    CARD_TICK_BUDGET, HEALTH_HEADROOM, MIN_VISIBLE_BAR,
};
use super::trend::{DistanceTrend, PriceTrend, TrendState};
use crate::shared::error::MonitorError;
use crate::shared::types::{Position, Snapshot};

/// Engine tunables
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Tick slots per group card
    pub tick_budget: usize,
    /// Minimum profit bar width for non-zero profit (0..=1)
    pub min_visible_bar: f64,
    /// Health bar headroom factor
    pub headroom: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_budget: CARD_TICK_BUDGET,
            min_visible_bar: MIN_VISIBLE_BAR,
            headroom: HEALTH_HEADROOM,
        }
    }
}

impl EngineConfig {
    pub fn with_tick_budget(mut self, budget: usize) -> Self {
        self.tick_budget = budget;
        self
    }
}

/// Ladder marks in percent (0..=100) of the group's ladder range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LadderMarks {
    pub open_prices: Vec<f64>,
    pub breakeven: f64,
    pub current: f64,
}

/// Everything a group card displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub aggregate: GroupAggregate,
    /// `None` for degenerate groups
    pub distance: Option<GroupDistance>,
    /// `None` on the first poll and for degenerate groups
    pub trend: Option<DistanceTrend>,
    /// 0..=1
    pub profit_bar: f64,
    pub ticks: TickBar,
    pub ladder: Option<LadderMarks>,
}

/// Engine output for one account and one poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollReport {
    pub account_id: String,
    pub update_time: String,
    pub current_price: f64,
    pub price_trend: Option<PriceTrend>,
    pub health: HealthSummary,
    pub health_bars: HealthBars,
    /// Decoded orders in payload order
    pub positions: Vec<Position>,
    /// First-appearance order
    pub groups: Vec<GroupReport>,
    pub ungrouped: PositionTotals,
    pub totals: PositionTotals,
    /// Errors recovered while producing this report
    pub diagnostics: Vec<MonitorError>,
}

impl PollReport {
    /// `false` renders "no active positions", whether the list was empty or unreadable
    pub fn has_positions(&self) -> bool {
        self.totals.count > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: EngineConfig,
}

impl AnalyticsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate one poll.
    ///
    /// No snapshot (source unavailable) emits nothing and leaves the trend state as is.
    pub fn evaluate(
        &self,
        snapshot: Option<&Snapshot>,
        trend: &TrendState,
    ) -> (Option<PollReport>, TrendState) {
        let Some(snapshot) = snapshot else {
            return (None, *trend);
        };

        let mut diagnostics = Vec::new();
        let positions = match decode_positions(snapshot.positions_raw.as_deref()) {
            Ok(decoded) => {
                diagnostics.extend(decoded.skipped);
                decoded.positions
            }
            Err(error) => {
                debug!("Account {}: {}", snapshot.account_id, error);
                diagnostics.push(error);
                Vec::new()
            }
        };

        let (mut report, next) = self.evaluate_positions(snapshot, &positions, trend);
        diagnostics.append(&mut report.diagnostics);
        report.diagnostics = diagnostics;
        (Some(report), next)
    }

    /// Evaluate one poll from already decoded positions.
    pub fn evaluate_positions(
        &self,
        snapshot: &Snapshot,
        positions: &[Position],
        trend: &TrendState,
    ) -> (PollReport, TrendState) {
        let current_price = snapshot.current_price;
        let breakdown = aggregate_groups(positions);
        let health = summarize_health(snapshot, self.config.headroom);
        let max_abs = max_abs_profit(breakdown.groups.iter().map(|group| group.total_profit));

        let mut diagnostics = Vec::new();
        let groups = breakdown
            .groups
            .into_iter()
            .map(|aggregate| {
                if aggregate.degenerate {
                    diagnostics.push(MonitorError::DegenerateGroup {
                        key: aggregate.key.clone(),
                    });
                }

                let distance = analyze_group(&aggregate, current_price);
                let ladder = distance.map(|analysis| LadderMarks {
                    open_prices: aggregate
                        .open_prices
                        .iter()
                        .map(|price| ladder_position(&analysis.ladder, *price))
                        .collect(),
                    breakeven: ladder_position(&analysis.ladder, analysis.breakeven_price),
                    current: ladder_position(&analysis.ladder, current_price),
                });

                GroupReport {
                    trend: trend.distance_trend(&aggregate, current_price),
                    profit_bar: profit_bar(
                        aggregate.total_profit,
                        max_abs,
                        self.config.min_visible_bar,
                    ),
                    ticks: TickBar::quantize(aggregate.count, self.config.tick_budget),
                    distance,
                    ladder,
                    aggregate,
                }
            })
            .collect();

        let report = PollReport {
            account_id: snapshot.account_id.clone(),
            update_time: snapshot.update_time.clone(),
            current_price,
            price_trend: trend.price_trend(current_price),
            health_bars: health_bars(snapshot.balance, snapshot.equity, self.config.headroom),
            health,
            positions: positions.to_vec(),
            groups,
            ungrouped: breakdown.ungrouped,
            totals: breakdown.totals,
            diagnostics,
        };

        (report, trend.advance(current_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{Direction, GroupKey};

    fn snapshot(current_price: f64, positions_raw: Option<&str>) -> Snapshot {
        Snapshot {
            account_id: "51234567".to_string(),
            balance: 10_000.0,
            equity: 9_500.0,
            total_profit: -100.0,
            current_price,
            buy_lots: 2.0,
            sell_lots: 0.0,
            buy_count: 2,
            sell_count: 0,
            update_time: "2024.05.01 10:00:00".to_string(),
            positions_raw: positions_raw.map(str::to_string),
        }
    }

    const TWO_LONGS: &str = r#"[
        {"s":"XAUUSD","t":"Buy","v":1,"p":1890,"pl":-100,"m":"A"},
        {"s":"XAUUSD","t":"Buy","v":1,"p":1910,"pl":0,"m":"A"}
    ]"#;

    #[test]
    fn test_end_to_end_example() {
        let engine = AnalyticsEngine::default();
        let (report, next) = engine.evaluate(Some(&snapshot(1900.0, Some(TWO_LONGS))), &TrendState::default());
        let report = report.unwrap();

        assert_eq!(report.groups.len(), 1);
        let group = &report.groups[0];
        assert_eq!(group.aggregate.key, GroupKey::from("A"));
        assert_eq!(group.aggregate.direction, Direction::Long);
        assert_eq!(group.aggregate.count, 2);
        assert_eq!(group.aggregate.total_volume, 2.0);
        assert_eq!(group.aggregate.total_profit, -100.0);
        assert!((group.aggregate.breakeven_price - 1900.0).abs() < 1e-9);

        let distance = group.distance.unwrap();
        assert!(distance.distance.abs() < 1e-9);
        assert!(distance.favorable);

        // First poll: nothing to compare against
        assert_eq!(report.price_trend, None);
        assert_eq!(group.trend, None);
        assert_eq!(next, TrendState::Tracking { previous_price: 1900.0 });

        // Only group carries the largest profit
        assert_eq!(group.profit_bar, 1.0);
        assert_eq!(group.ticks, TickBar::quantize(2, CARD_TICK_BUDGET));

        let ladder = group.ladder.as_ref().unwrap();
        assert_eq!(ladder.open_prices, vec![0.0, 100.0]);
        assert!((ladder.breakeven - 50.0).abs() < 1e-9);
        assert!((ladder.current - 50.0).abs() < 1e-9);

        assert!(report.has_positions());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_second_poll_classifies_trend() {
        let engine = AnalyticsEngine::default();
        let (_, state) = engine.evaluate(Some(&snapshot(1895.0, Some(TWO_LONGS))), &TrendState::default());
        let (report, state) = engine.evaluate(Some(&snapshot(1898.0, Some(TWO_LONGS))), &state);
        let report = report.unwrap();

        assert_eq!(report.price_trend, Some(PriceTrend::Up));
        // Long below breakeven, price rising: closer to breakeven
        assert_eq!(report.groups[0].trend, Some(DistanceTrend::Improving));
        assert_eq!(state.previous_price(), Some(1898.0));
    }

    #[test]
    fn test_malformed_positions_still_report_health() {
        let engine = AnalyticsEngine::default();

        for raw in [Some(""), Some("{not json"), None] {
            let (report, _) = engine.evaluate(Some(&snapshot(1900.0, raw)), &TrendState::default());
            let report = report.unwrap();

            assert!(!report.has_positions());
            assert!(report.groups.is_empty());
            assert_eq!(report.health.balance, 10_000.0);
            assert_eq!(report.health.equity, 9_500.0);
            assert!((report.health.total_lots - 2.0).abs() < 1e-12);
        }

        let (report, _) = engine.evaluate(Some(&snapshot(1900.0, Some("{not json"))), &TrendState::default());
        assert!(matches!(report.unwrap().diagnostics.as_slice(), [MonitorError::Decode(_)]));
    }

    #[test]
    fn test_no_snapshot_emits_nothing() {
        let engine = AnalyticsEngine::default();
        let state = TrendState::Tracking { previous_price: 1900.0 };
        let (report, next) = engine.evaluate(None, &state);

        assert!(report.is_none());
        assert_eq!(next, state);
    }

    #[test]
    fn test_degenerate_group_is_counted_but_not_priced() {
        let raw = r#"[
            {"s":"XAUUSD","t":"Buy","v":0,"p":1890,"pl":0,"m":1},
            {"s":"XAUUSD","t":"Sell","v":0.5,"p":1920,"pl":-10,"m":2},
            {"s":"XAUUSD","t":"Buy","v":0.1,"p":1880,"pl":2}
        ]"#;

        let engine = AnalyticsEngine::default();
        let state = TrendState::Tracking { previous_price: 1899.0 };
        let (report, _) = engine.evaluate(Some(&snapshot(1900.0, Some(raw))), &state);
        let report = report.unwrap();

        assert_eq!(report.groups.len(), 2);
        let degenerate = &report.groups[0];
        assert!(degenerate.aggregate.degenerate);
        assert_eq!(degenerate.aggregate.count, 1);
        assert!(degenerate.distance.is_none());
        assert!(degenerate.ladder.is_none());
        assert!(degenerate.trend.is_none());

        let short = &report.groups[1];
        assert!((short.distance.unwrap().distance + 20.0).abs() < 1e-9);
        assert_eq!(short.trend, Some(DistanceTrend::Improving));

        assert_eq!(report.ungrouped.count, 1);
        assert_eq!(report.totals.count, 3);
        assert_eq!(
            report.diagnostics,
            vec![MonitorError::DegenerateGroup { key: GroupKey::Number(1) }]
        );
    }

    #[test]
    fn test_tick_overflow_uses_configured_budget() {
        let raw = serde_json::to_string(
            &(0..12)
                .map(|i| serde_json::json!({"s":"XAUUSD","t":"Sell","v":0.01,"p":1900 + i,"pl":0,"m":9}))
                .collect::<Vec<_>>(),
        )
        .unwrap();

        let engine = AnalyticsEngine::new(EngineConfig::default().with_tick_budget(10));
        let (report, _) = engine.evaluate(Some(&snapshot(1900.0, Some(raw.as_str()))), &TrendState::default());
        let ticks = report.unwrap().groups[0].ticks;

        assert_eq!(ticks.active, 10);
        assert!(ticks.overflow);
        assert_eq!(ticks.hidden, 2);
    }

    #[test]
    fn test_report_keeps_orders_in_payload_order() {
        let raw = r#"[
            {"s":"XAUUSD","t":"Sell","v":0.3,"p":1920,"pl":-6,"m":2},
            {"s":"XAUUSD","t":"Buy","v":0.1,"p":1880,"pl":2},
            {"s":"XAUUSD","t":"Buy","v":0.2,"p":1890,"pl":-1,"m":1}
        ]"#;

        let engine = AnalyticsEngine::default();
        let (report, _) = engine.evaluate(Some(&snapshot(1900.0, Some(raw))), &TrendState::default());
        let report = report.unwrap();

        let orders: Vec<_> = report
            .positions
            .iter()
            .map(|position| (position.direction, position.open_price, position.group_key.clone()))
            .collect();
        assert_eq!(
            orders,
            vec![
                (Direction::Short, 1920.0, Some(GroupKey::Number(2))),
                (Direction::Long, 1880.0, None),
                (Direction::Long, 1890.0, Some(GroupKey::Number(1))),
            ]
        );
    }
}
