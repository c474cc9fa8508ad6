/// Shared modules for the portfolio monitor
pub mod analytics;
pub mod config;
pub mod error;
pub mod monitor;
pub mod source;
pub mod types;
pub mod widget;
