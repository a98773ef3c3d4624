use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::AnalyticsConfig;

/// Loads the analytics configuration from a TOML file.
///
/// Every key in the file is optional; missing keys fall back to the documented
/// defaults. The returned configuration has already passed validation, so
/// callers can rely on it before any trade data is read.
pub fn load_config(path: &str) -> Result<AnalyticsConfig, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .build()?;

    let config = builder.try_deserialize::<AnalyticsConfig>()?;
    config.validate()?;

    tracing::debug!(path, "configuration loaded");
    Ok(config)
}
