use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Rolling window size must be at least 1 trade, got {0}")]
    InvalidWindow(usize),

    #[error(transparent)]
    Config(#[from] configuration::error::ConfigError),
}
