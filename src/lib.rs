pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod services;

pub use config::AppConfig;
pub use error::{exit_status, PnlError, Result, Stage};
pub use services::DailyPnlJob;
