//! Ratatui dashboard for the portfolio monitor
//!
//! Layout, top to bottom: account header, health bar, one card per group, order list, footer.

use ratatui::{
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::analytics::{
    DistanceTrend, GroupReport, HealthBars, LadderMarks, PollReport, PriceTrend, TickBar,
};
use super::monitor::{AccountPanel, DashboardFrame};
use super::types::Position;

/// Orders shown before the list is truncated
const MAX_ORDER_ROWS: usize = 12;

const C_BUY: Color = Color::Rgb(100, 220, 100);
const C_SELL: Color = Color::Rgb(220, 100, 100);
const C_NEUTRAL: Color = Color::Rgb(180, 180, 100);
const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 180, 220);

/// Render the whole dashboard for the selected account panel
pub fn render_dashboard(f: &mut Frame, frame: &DashboardFrame, selected: usize) {
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(f.area());

    let panel = frame.panels.get(selected.min(frame.panels.len().saturating_sub(1)));

    match (frame.source_error.as_ref(), panel) {
        (Some(error), _) => {
            render_placeholder(
                f,
                chunks[0].union(chunks[2]),
                " CONNECTING ",
                vec![
                    "Waiting for snapshot source...".to_string(),
                    error.to_string(),
                    "Check the sheet URL and its sharing permission".to_string(),
                ],
            );
        }
        (None, Some(AccountPanel { outcome: Ok(report), .. })) => {
            render_header(f, chunks[0], report);
            render_health(f, chunks[1], report);
            if report.has_positions() {
                let rows = report.positions.len().min(MAX_ORDER_ROWS) as u16;
                let body = Layout::default()
                    .direction(LayoutDirection::Vertical)
                    .constraints([Constraint::Min(6), Constraint::Length(rows + 3)])
                    .split(chunks[2]);
                render_groups(f, body[0], report);
                render_orders(f, body[1], report);
            } else {
                render_groups(f, chunks[2], report);
            }
        }
        (None, Some(AccountPanel { outcome: Err(error), requested })) => {
            let account = requested.as_deref().unwrap_or("latest");
            render_placeholder(
                f,
                chunks[0].union(chunks[2]),
                " ACCOUNT ",
                vec![format!("Account {}: {}", account, error)],
            );
        }
        (None, None) => {
            render_placeholder(f, chunks[0].union(chunks[2]), " ACCOUNT ", vec!["No accounts".to_string()]);
        }
    }

    render_footer(f, chunks[3], frame, selected);
}

fn render_placeholder(f: &mut Frame, area: Rect, title: &str, messages: Vec<String>) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_SELL));
    let lines: Vec<Line> = messages
        .into_iter()
        .map(|message| Line::from(Span::styled(message, Style::default().fg(C_DIM))))
        .collect();
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn render_header(f: &mut Frame, area: Rect, report: &PollReport) {
    let block = Block::default()
        .title(format!(" ACCOUNT {} ", report.account_id))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_ACCENT));

    let health = &report.health;
    let profit_color = if health.is_profitable { C_BUY } else { C_SELL };
    let (arrow, arrow_color) = match report.price_trend {
        Some(PriceTrend::Up) => (PriceTrend::Up.arrow(), C_BUY),
        Some(PriceTrend::Down) => (PriceTrend::Down.arrow(), C_SELL),
        Some(PriceTrend::Flat) => (PriceTrend::Flat.arrow(), C_DIM),
        None => ("·", C_DIM),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("BAL ", Style::default().fg(C_DIM)),
            Span::styled(format_money(health.balance), Style::default().fg(C_BRIGHT)),
            Span::styled("  EQ ", Style::default().fg(C_DIM)),
            Span::styled(format_money(health.equity), Style::default().fg(C_BRIGHT)),
            Span::styled("  P/L ", Style::default().fg(C_DIM)),
            Span::styled(
                format!("{:+.2}", health.profit),
                Style::default().fg(profit_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  PRICE ", Style::default().fg(C_DIM)),
            Span::styled(format_price(report.current_price), Style::default().fg(C_BRIGHT)),
            Span::styled(format!(" {}", arrow), Style::default().fg(arrow_color)),
        ]),
        Line::from(vec![
            Span::styled(
                format!("BUY {} ({:.2} lot)", health.buy_count, health.buy_lots),
                Style::default().fg(C_BUY),
            ),
            Span::raw("  "),
            Span::styled(
                format!("SELL {} ({:.2} lot)", health.sell_count, health.sell_lots),
                Style::default().fg(C_SELL),
            ),
            Span::styled(format!("  updated {}", report.update_time), Style::default().fg(C_DIM)),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_health(f: &mut Frame, area: Rect, report: &PollReport) {
    let block = Block::default()
        .title(" HEALTH ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_DIM));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = (inner.width as usize).saturating_sub(6).max(10);
    let health = &report.health;
    let equity_color = if health.equity >= health.balance { C_BUY } else { C_SELL };

    let lines = vec![
        Line::from(vec![
            Span::styled("EQ  ", Style::default().fg(C_DIM)),
            Span::styled(render_health_bar(&report.health_bars, width), Style::default().fg(equity_color)),
        ]),
        Line::from(vec![
            Span::styled("LOTS ", Style::default().fg(C_DIM)),
            Span::styled(format!("{:.2}", health.total_lots), Style::default().fg(C_BRIGHT)),
            Span::styled("  FLOATING ", Style::default().fg(C_DIM)),
            Span::styled(format!("{:+.2}%", health.floating_pct), Style::default().fg(equity_color)),
            Span::styled(
                format!("  {} orders", report.totals.count),
                Style::default().fg(C_DIM),
            ),
        ]),
    ];

    f.render_widget(Paragraph::new(lines), inner);
}

fn render_groups(f: &mut Frame, area: Rect, report: &PollReport) {
    let block = Block::default()
        .title(" GROUPS ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_DIM));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !report.has_positions() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled("No active positions", Style::default().fg(C_DIM)))),
            inner,
        );
        return;
    }

    let width = (inner.width as usize).saturating_sub(12).max(10);
    let mut lines = Vec::new();

    for group in &report.groups {
        lines.extend(group_lines(group, width));
        lines.push(Line::from(""));
    }

    if report.ungrouped.count > 0 {
        lines.push(Line::from(vec![
            Span::styled("UNGROUPED ", Style::default().fg(C_DIM)),
            Span::styled(
                format!(
                    "{} orders  {:.2} lot  {:+.2}",
                    report.ungrouped.count, report.ungrouped.volume, report.ungrouped.profit
                ),
                Style::default().fg(C_BRIGHT),
            ),
        ]));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn group_lines(group: &GroupReport, width: usize) -> Vec<Line<'static>> {
    let aggregate = &group.aggregate;
    let side_color = if aggregate.direction.is_long() { C_BUY } else { C_SELL };
    let profit_color = if aggregate.total_profit >= 0.0 { C_BUY } else { C_SELL };

    let mut title = vec![
        Span::styled(
            format!("#{} ", aggregate.key),
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{} ", aggregate.direction), Style::default().fg(side_color)),
        Span::styled(
            format!("{} orders {:.2} lot ", aggregate.count, aggregate.total_volume),
            Style::default().fg(C_BRIGHT),
        ),
        Span::styled(format!("{:+.2}", aggregate.total_profit), Style::default().fg(profit_color)),
    ];
    if aggregate.mixed_direction {
        title.push(Span::styled("  MIXED", Style::default().fg(C_NEUTRAL)));
    }

    let mut lines = vec![Line::from(title)];

    lines.push(Line::from(vec![
        Span::styled("P/L   ", Style::default().fg(C_DIM)),
        Span::styled(render_fill_bar(group.profit_bar, width), Style::default().fg(profit_color)),
    ]));

    lines.push(Line::from(vec![
        Span::styled("ORD   ", Style::default().fg(C_DIM)),
        Span::styled(render_tick_row(&group.ticks), Style::default().fg(side_color)),
    ]));

    match (&group.distance, &group.ladder) {
        (Some(distance), Some(ladder)) => {
            let distance_color = if distance.favorable { C_BUY } else { C_SELL };
            let (trend_arrow, trend_color) = match group.trend {
                Some(DistanceTrend::Improving) => (DistanceTrend::Improving.arrow(), C_BUY),
                Some(DistanceTrend::Worsening) => (DistanceTrend::Worsening.arrow(), C_SELL),
                Some(DistanceTrend::Unchanged) => (DistanceTrend::Unchanged.arrow(), C_DIM),
                None => ("·", C_DIM),
            };

            lines.push(Line::from(vec![
                Span::styled("BE    ", Style::default().fg(C_DIM)),
                Span::styled(format_price(distance.breakeven_price), Style::default().fg(C_BRIGHT)),
                Span::styled("  DIST ", Style::default().fg(C_DIM)),
                Span::styled(
                    format!("{:+.2}", distance.distance),
                    Style::default().fg(distance_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {}", trend_arrow), Style::default().fg(trend_color)),
            ]));
            lines.push(Line::from(vec![
                Span::styled(format!("{:<6}", format_price(distance.ladder.lo)), Style::default().fg(C_DIM)),
                Span::styled(render_ladder(ladder, width), Style::default().fg(C_ACCENT)),
                Span::styled(format!(" {}", format_price(distance.ladder.hi)), Style::default().fg(C_DIM)),
            ]));
        }
        _ => {
            lines.push(Line::from(Span::styled(
                "BE    -- (zero volume)",
                Style::default().fg(C_NEUTRAL),
            )));
        }
    }

    lines
}

fn render_orders(f: &mut Frame, area: Rect, report: &PollReport) {
    let block = Block::default()
        .title(format!(" ORDERS ({}) ", report.positions.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_DIM));

    let mut lines = vec![Line::from(Span::styled(
        format!("{:<10} {:<4} {:>7} {:>10} {:>10}  {}", "SYMBOL", "SIDE", "LOTS", "PRICE", "P/L", "GROUP"),
        Style::default().fg(C_DIM),
    ))];

    for position in report.positions.iter().take(MAX_ORDER_ROWS) {
        let side_color = if position.direction.is_long() { C_BUY } else { C_SELL };
        let profit_color = if position.profit >= 0.0 { C_BUY } else { C_SELL };
        let (left, profit, group) = order_cells(position);
        lines.push(Line::from(vec![
            Span::styled(left, Style::default().fg(side_color)),
            Span::styled(profit, Style::default().fg(profit_color)),
            Span::styled(group, Style::default().fg(C_DIM)),
        ]));
    }

    let hidden = report.positions.len().saturating_sub(MAX_ORDER_ROWS);
    if hidden > 0 {
        lines.push(Line::from(Span::styled(
            format!("... {} more", hidden),
            Style::default().fg(C_DIM),
        )));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Order row split into side-coloured, profit-coloured and group cells
fn order_cells(position: &Position) -> (String, String, String) {
    let group = position
        .group_key
        .as_ref()
        .map(|key| format!("  #{}", key))
        .unwrap_or_else(|| "  --".to_string());

    (
        format!(
            "{:<10} {:<4} {:>7.2} {:>10} ",
            position.symbol,
            position.direction.as_str(),
            position.volume,
            format_price(position.open_price)
        ),
        format!("{:>10}", format!("{:+.2}", position.profit)),
        group,
    )
}

fn render_footer(f: &mut Frame, area: Rect, frame: &DashboardFrame, selected: usize) {
    let status = if frame.is_connected() { ("●", C_BUY) } else { ("●", C_SELL) };
    let line = Line::from(vec![
        Span::styled(status.0, Style::default().fg(status.1)),
        Span::styled(
            format!(
                " {}  account {}/{}  [Tab] next  [q] quit",
                frame.polled_at.format("%H:%M:%S UTC"),
                (selected + 1).min(frame.panels.len().max(1)),
                frame.panels.len().max(1),
            ),
            Style::default().fg(C_DIM),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Left-aligned bar: `fraction` of `width` filled
fn render_fill_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Equity bar with a balance marker
fn render_health_bar(bars: &HealthBars, width: usize) -> String {
    if width < 2 {
        return String::new();
    }

    let filled = ((bars.equity_pct / 100.0 * width as f64).round() as usize).min(width);
    let marker = ((bars.balance_pct / 100.0 * width as f64).round() as usize).min(width - 1);

    (0..width)
        .map(|i| {
            if i == marker {
                '│'
            } else if i < filled {
                '█'
            } else {
                '░'
            }
        })
        .collect()
}

/// Active ticks, inactive ticks, then `+N` when orders overflow the budget
fn render_tick_row(ticks: &TickBar) -> String {
    let mut row = format!("{}{}", "■".repeat(ticks.active), "·".repeat(ticks.inactive));
    if ticks.overflow {
        row.push_str(&format!(" +{}", ticks.hidden));
    }
    row
}

/// Price ladder: `|` open prices, `◆` breakeven, `▼` current price (drawn last, wins ties)
fn render_ladder(ladder: &LadderMarks, width: usize) -> String {
    if width < 2 {
        return String::new();
    }

    let slot = |pct: f64| ((pct.clamp(0.0, 100.0) / 100.0) * (width - 1) as f64).round() as usize;
    let mut cells = vec!['─'; width];

    for pct in &ladder.open_prices {
        cells[slot(*pct)] = '|';
    }
    cells[slot(ladder.breakeven)] = '◆';
    cells[slot(ladder.current)] = '▼';

    cells.into_iter().collect()
}

fn format_money(value: f64) -> String {
    let whole = format!("{:.2}", value.abs());
    let (int_part, frac_part) = whole.split_once('.').unwrap_or((&whole, "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn format_price(value: f64) -> String {
    if value > 0.0 {
        format!("{:.2}", value)
    } else {
        "--".to_string()
    }
}
