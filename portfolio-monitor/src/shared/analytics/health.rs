//! Account-level health figures for the top bar

use serde::Serialize;

use crate::shared::types::Snapshot;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthSummary {
    pub balance: f64,
    pub equity: f64,
    pub buy_lots: f64,
    pub sell_lots: f64,
    pub buy_count: u32,
    pub sell_count: u32,
    /// buy_lots + sell_lots
    pub total_lots: f64,
    pub profit: f64,
    /// equity / (max(balance, equity) × headroom)
    pub equity_ratio: f64,
    /// Floating result as % of balance, 0.0 without a balance
    pub floating_pct: f64,
    pub is_profitable: bool,
}

pub fn summarize_health(snapshot: &Snapshot, headroom: f64) -> HealthSummary {
    let scale = snapshot.balance.max(snapshot.equity) * headroom;
    let equity_ratio = if scale > 0.0 { snapshot.equity / scale } else { 0.0 };
    let floating_pct = if snapshot.balance > 0.0 {
        (snapshot.equity - snapshot.balance) / snapshot.balance * 100.0
    } else {
        0.0
    };

    HealthSummary {
        balance: snapshot.balance,
        equity: snapshot.equity,
        buy_lots: snapshot.buy_lots,
        sell_lots: snapshot.sell_lots,
        buy_count: snapshot.buy_count,
        sell_count: snapshot.sell_count,
        total_lots: snapshot.buy_lots + snapshot.sell_lots,
        profit: snapshot.total_profit,
        equity_ratio,
        floating_pct,
        is_profitable: snapshot.total_profit >= 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::analytics::scale::HEALTH_HEADROOM;

    #[test]
    fn test_summarize_health() {
        let snapshot = Snapshot {
            account_id: "1001".to_string(),
            balance: 10_000.0,
            equity: 9_500.0,
            total_profit: -500.0,
            buy_lots: 0.3,
            sell_lots: 0.2,
            buy_count: 3,
            sell_count: 2,
            ..Default::default()
        };

        let health = summarize_health(&snapshot, HEALTH_HEADROOM);
        assert!((health.total_lots - 0.5).abs() < 1e-12);
        assert_eq!(health.profit, -500.0);
        assert!(!health.is_profitable);
        assert!((health.equity_ratio - 9_500.0 / 12_000.0).abs() < 1e-12);
        assert!((health.floating_pct + 5.0).abs() < 1e-12);
        assert_eq!(health.buy_count, 3);
    }

    #[test]
    fn test_break_even_profit_counts_as_profitable() {
        let health = summarize_health(&Snapshot::default(), HEALTH_HEADROOM);
        assert!(health.is_profitable);
        assert_eq!(health.equity_ratio, 0.0);
        assert_eq!(health.floating_pct, 0.0);
        assert_eq!(health.total_lots, 0.0);
    }
}
