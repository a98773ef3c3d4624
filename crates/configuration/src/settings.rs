use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for an analytics run.
///
/// Every field carries a serde default, so an empty (or absent) config file
/// yields the documented defaults. All values are validated by [`Self::validate`]
/// before any trade data is processed; a bad configuration is a fatal error,
/// never a per-row one.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// The account balance before the first trade.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Decimal,

    /// Trade-count window sizes used by the rolling calculators.
    #[serde(default = "default_rolling_windows")]
    pub rolling_windows: Vec<usize>,

    /// Number of standard deviations from the population mean beyond which a
    /// P&L value is flagged as an outlier.
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: Decimal,

    /// Multiplier on the interquartile range for the IQR outlier fences.
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: Decimal,

    /// Minimum number of trades a group needs before it is classified as
    /// significantly under- or over-performing. Smaller groups report
    /// "insufficient data".
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,

    /// Periods-per-year constant used to annualize the Sharpe-like ratio.
    #[serde(default = "default_annualization_factor")]
    pub annualization_factor: u32,

    /// Drawdown periods spanning fewer trades than this are not reported.
    /// The default of 2 excludes single-trade dips.
    #[serde(default = "default_min_drawdown_period_trades")]
    pub min_drawdown_period_trades: usize,

    /// |z| above which a group is classified as significantly under- or
    /// over-performing the population.
    #[serde(default = "default_significance_zscore")]
    pub significance_zscore: Decimal,

    /// A trade entered within this many minutes of a losing trade is flagged
    /// as a potential revenge trade. The bound is strict: a gap of exactly
    /// this many minutes is not flagged.
    #[serde(default = "default_revenge_window_minutes")]
    pub revenge_window_minutes: i64,
}

fn default_starting_balance() -> Decimal {
    dec!(10000)
}

fn default_rolling_windows() -> Vec<usize> {
    vec![10, 20, 50]
}

fn default_zscore_threshold() -> Decimal {
    dec!(3)
}

fn default_iqr_multiplier() -> Decimal {
    dec!(1.5)
}

fn default_min_sample_size() -> usize {
    20
}

fn default_annualization_factor() -> u32 {
    252
}

fn default_min_drawdown_period_trades() -> usize {
    2
}

fn default_significance_zscore() -> Decimal {
    dec!(1.96)
}

fn default_revenge_window_minutes() -> i64 {
    60
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            rolling_windows: default_rolling_windows(),
            zscore_threshold: default_zscore_threshold(),
            iqr_multiplier: default_iqr_multiplier(),
            min_sample_size: default_min_sample_size(),
            annualization_factor: default_annualization_factor(),
            min_drawdown_period_trades: default_min_drawdown_period_trades(),
            significance_zscore: default_significance_zscore(),
            revenge_window_minutes: default_revenge_window_minutes(),
        }
    }
}

impl AnalyticsConfig {
    /// Rejects configurations that would make downstream calculations
    /// meaningless. Called once, before any data is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_balance <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "starting_balance must be positive, got {}",
                self.starting_balance
            )));
        }
        if self.rolling_windows.is_empty() {
            return Err(ConfigError::ValidationError(
                "rolling_windows must contain at least one window size".to_string(),
            ));
        }
        if let Some(w) = self.rolling_windows.iter().find(|&&w| w == 0) {
            return Err(ConfigError::ValidationError(format!(
                "rolling window size must be at least 1, got {}",
                w
            )));
        }
        if self.zscore_threshold <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "zscore_threshold must be positive, got {}",
                self.zscore_threshold
            )));
        }
        if self.iqr_multiplier <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "iqr_multiplier must be positive, got {}",
                self.iqr_multiplier
            )));
        }
        if self.annualization_factor == 0 {
            return Err(ConfigError::ValidationError(
                "annualization_factor must be at least 1".to_string(),
            ));
        }
        if self.significance_zscore <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "significance_zscore must be positive, got {}",
                self.significance_zscore
            )));
        }
        if self.revenge_window_minutes <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "revenge_window_minutes must be positive, got {}",
                self.revenge_window_minutes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AnalyticsConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_window() {
        let config = AnalyticsConfig {
            rolling_windows: vec![10, 0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_balance() {
        let config = AnalyticsConfig {
            starting_balance: Decimal::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_window_list() {
        let config = AnalyticsConfig {
            rolling_windows: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
