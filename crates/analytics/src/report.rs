use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A comprehensive, standardized summary of the whole trade journal.
///
/// This struct is the final output of the `AnalyticsEngine`'s summary pass
/// and the data transfer object for results throughout the system. Metrics
/// with no defined value for the given input are `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    // I. Trade counts
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: Option<Decimal>, // Option<> for the zero-trade case

    // II. Profitability
    pub total_net_pnl: Decimal,
    pub average_pnl: Option<Decimal>,
    pub average_win: Option<Decimal>,  // Option<> when there are no wins
    pub average_loss: Option<Decimal>, // Option<> when there are no losses; signed
    pub profit_factor: Option<Decimal>, // Option<> because gross loss can be 0
    /// Average P&L per trade; equal to the win-rate-weighted decomposition.
    pub expectancy: Option<Decimal>,

    // III. Risk and volatility
    pub pnl_std_dev: Option<Decimal>, // Option<> below two trades
    pub sharpe_like: Option<Decimal>, // Option<> when stdev is undefined or zero
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    /// Mean drawdown percentage over trades that were in drawdown.
    pub average_drawdown_pct: Option<Decimal>,
    pub final_balance: Decimal,

    // IV. Streaks and behavior
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub revenge_trade_count: usize,
    pub risk_escalation_count: usize,

    // V. Time span
    pub trading_span_days: i64,
}

impl PerformanceReport {
    /// Creates a new, zeroed-out report, useful as the result for an empty
    /// trade sequence.
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate_pct: None,
            total_net_pnl: Decimal::ZERO,
            average_pnl: None,
            average_win: None,
            average_loss: None,
            profit_factor: None,
            expectancy: None,
            pnl_std_dev: None,
            sharpe_like: None,
            max_drawdown: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            average_drawdown_pct: None,
            final_balance: Decimal::ZERO,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            revenge_trade_count: 0,
            risk_escalation_count: 0,
            trading_span_days: 0,
        }
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}
