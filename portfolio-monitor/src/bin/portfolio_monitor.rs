/// Live Portfolio Monitor
///
/// Polls the account snapshot table on a fixed delay and renders balance, equity,
/// per-group breakeven cards and trend arrows. Fetch, compute, render, sleep, repeat:
/// polls never overlap.
///
/// `MONITOR_HEADLESS=1` logs each frame as JSON instead of drawing the terminal UI.
use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use portfolio_monitor::{
    render_dashboard, AccountMonitor, AnalyticsEngine, DashboardFrame, MonitorConfig, SheetSource,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = MonitorConfig::from_env();
    let source = SheetSource::new(&config)?;
    let monitor = AccountMonitor::new(
        AnalyticsEngine::new(config.engine.clone()),
        config.accounts.clone(),
    );

    if config.headless {
        init_logging();
        return run_headless(config, source, monitor).await;
    }

    run_terminal(config, source, monitor).await
}

async fn run_headless(
    config: MonitorConfig,
    source: SheetSource,
    mut monitor: AccountMonitor,
) -> Result<(), Box<dyn Error>> {
    info!(
        "Polling {} every {}s for {} account(s)",
        source.url(),
        config.poll_interval.as_secs(),
        config.accounts.len().max(1)
    );

    loop {
        let frame = monitor.process(source.fetch().await, Utc::now());
        log_frame(&frame);

        tokio::select! {
            _ = tokio::time::sleep(config.poll_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

fn log_frame(frame: &DashboardFrame) {
    if let Some(source_error) = &frame.source_error {
        warn!("Poll at {} produced no snapshot: {}", frame.polled_at, source_error);
        return;
    }

    for panel in &frame.panels {
        match &panel.outcome {
            Ok(report) => {
                for diagnostic in &report.diagnostics {
                    warn!("Account {}: {}", report.account_id, diagnostic);
                }
                match serde_json::to_string(report) {
                    Ok(json) => info!(account = %report.account_id, report = %json, "poll"),
                    Err(e) => error!("Failed to serialise report for {}: {}", report.account_id, e),
                }
            }
            Err(e) => warn!(
                "Account {}: {}",
                panel.requested.as_deref().unwrap_or("latest"),
                e
            ),
        }
    }
}

async fn run_terminal(
    config: MonitorConfig,
    source: SheetSource,
    mut monitor: AccountMonitor,
) -> Result<(), Box<dyn Error>> {
    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut selected = 0usize;

    'poll: loop {
        let frame = monitor.process(source.fetch().await, Utc::now());
        terminal.draw(|f| render_dashboard(f, &frame, selected))?;

        let deadline = Instant::now() + config.poll_interval;
        loop {
            let timeout = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or_else(|| Duration::from_secs(0));
            if timeout.is_zero() {
                break;
            }

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break 'poll,
                        KeyCode::Tab => {
                            selected = (selected + 1) % frame.panels.len().max(1);
                            terminal.draw(|f| render_dashboard(f, &frame, selected))?;
                        }
                        _ => {}
                    },
                    Event::Resize(_, _) => {
                        terminal.draw(|f| render_dashboard(f, &frame, selected))?;
                    }
                    _ => {}
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();
}
