use crate::aggregate::{self, GroupDimension, GroupReport, Recommendation};
use crate::drawdown::{self, DrawdownPeriod, RecoveryStats};
use crate::error::AnalyticsError;
use crate::outliers::{self, TradeFlags};
use crate::report::PerformanceReport;
use crate::rolling::{self, Reducer, Window};
use crate::stats;
use configuration::AnalyticsConfig;
use core_types::{EquityPoint, Trade};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// A setup-type group paired with its suggested action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupReview {
    pub report: GroupReport,
    pub recommendation: Recommendation,
}

/// The configured entry point for all analytics calculations.
///
/// The engine holds configuration but no data: every method is a pure
/// function over the trade slice passed in, and nothing persists between
/// calls. Trades must arrive sorted by `trade_id` (the dataset validator
/// enforces this).
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    /// Creates an engine, rejecting invalid configuration before any data
    /// is touched.
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Computes the whole-journal summary report. An empty trade sequence
    /// yields a zeroed report, not an error.
    pub fn summarize(&self, trades: &[Trade]) -> PerformanceReport {
        let mut report = PerformanceReport::new();
        if trades.is_empty() {
            return report;
        }

        debug!(trades = trades.len(), "computing summary report");

        report.total_trades = trades.len();
        let mut win_sum = Decimal::ZERO;
        let mut loss_sum = Decimal::ZERO;
        for trade in trades {
            report.total_net_pnl += trade.pnl;
            if trade.win_loss.is_win() {
                report.winning_trades += 1;
                win_sum += trade.pnl;
            } else {
                report.losing_trades += 1;
                loss_sum += trade.pnl;
            }
        }

        let total = Decimal::from(report.total_trades);
        report.win_rate_pct = Some(
            (Decimal::from(report.winning_trades) / total * Decimal::from(100)).round_dp(2),
        );
        report.average_pnl = Some(report.total_net_pnl / total);
        report.expectancy = report.average_pnl;

        if report.winning_trades > 0 {
            report.average_win = Some(win_sum / Decimal::from(report.winning_trades));
        }
        if report.losing_trades > 0 {
            report.average_loss = Some(loss_sum / Decimal::from(report.losing_trades));
        }
        if loss_sum != Decimal::ZERO {
            report.profit_factor = Some((win_sum / loss_sum).abs());
        }

        let pnls: Vec<Decimal> = trades.iter().map(|t| t.pnl).collect();
        report.pnl_std_dev = stats::sample_stdev(&pnls);
        report.sharpe_like = match (report.average_pnl, report.pnl_std_dev) {
            (Some(mean), Some(sd)) if sd > Decimal::ZERO => Decimal::from(
                self.config.annualization_factor,
            )
            .sqrt()
            .map(|annualizer| mean / sd * annualizer),
            _ => None,
        };

        self.fill_drawdown_metrics(trades, &mut report);
        fill_streaks(trades, &mut report);

        let flags = self.detect_outliers(trades);
        report.revenge_trade_count = flags.iter().filter(|f| f.revenge_trade).count();
        report.risk_escalation_count = flags.iter().filter(|f| f.risk_escalation).count();

        if let (Some(first), Some(last)) = (trades.first(), trades.last()) {
            report.trading_span_days = (last.date - first.date).num_days();
        }

        report
    }

    fn fill_drawdown_metrics(&self, trades: &[Trade], report: &mut PerformanceReport) {
        let curve = self.equity_curve(trades);

        let mut max_dd = Decimal::ZERO;
        let mut max_dd_pct = Decimal::ZERO;
        let mut in_dd_sum = Decimal::ZERO;
        let mut in_dd_count = 0usize;
        for point in &curve {
            let dd = point.peak_balance - point.balance;
            if dd > max_dd {
                max_dd = dd;
            }
            if point.drawdown_pct > max_dd_pct {
                max_dd_pct = point.drawdown_pct;
            }
            if point.drawdown_pct > Decimal::ZERO {
                in_dd_sum += point.drawdown_pct;
                in_dd_count += 1;
            }
        }

        report.max_drawdown = max_dd;
        report.max_drawdown_pct = max_dd_pct;
        if in_dd_count > 0 {
            report.average_drawdown_pct = Some(in_dd_sum / Decimal::from(in_dd_count));
        }
        if let Some(last) = curve.last() {
            report.final_balance = last.balance;
        }
    }

    /// Per-trade balance, running peak, and drawdown percentage.
    pub fn equity_curve(&self, trades: &[Trade]) -> Vec<EquityPoint> {
        drawdown::equity_curve(trades, self.config.starting_balance)
    }

    /// Contiguous drawdown periods, filtered by the configured minimum
    /// length.
    pub fn drawdown_periods(&self, trades: &[Trade]) -> Vec<DrawdownPeriod> {
        let curve = self.equity_curve(trades);
        drawdown::drawdown_periods(trades, &curve, self.config.min_drawdown_period_trades)
    }

    /// Day gaps between successive equity highs.
    pub fn recovery_stats(&self, trades: &[Trade]) -> Option<RecoveryStats> {
        let curve = self.equity_curve(trades);
        drawdown::recovery_stats(trades, &curve)
    }

    /// Rolling statistic over the trailing window at every trade position.
    pub fn rolling(
        &self,
        trades: &[Trade],
        window: Window,
        reducer: Reducer,
    ) -> Result<Vec<Option<Decimal>>, AnalyticsError> {
        rolling::rolling(trades, window, reducer)
    }

    /// Rolling statistic computed independently within each partition.
    pub fn rolling_partitioned<F>(
        &self,
        trades: &[Trade],
        key: F,
        window: Window,
        reducer: Reducer,
    ) -> Result<Vec<Option<Decimal>>, AnalyticsError>
    where
        F: Fn(&Trade) -> String,
    {
        rolling::rolling_partitioned(trades, key, window, reducer)
    }

    /// Group summaries with significance classification along a dimension.
    pub fn group_stats(&self, trades: &[Trade], dimension: GroupDimension) -> Vec<GroupReport> {
        aggregate::group_stats(trades, dimension, &self.config)
    }

    /// Setup-type groups with their priority-rule recommendations.
    pub fn setup_reviews(&self, trades: &[Trade]) -> Vec<SetupReview> {
        self.group_stats(trades, GroupDimension::SetupType)
            .into_iter()
            .map(|report| {
                let recommendation = aggregate::recommendation(&report.stats);
                SetupReview {
                    report,
                    recommendation,
                }
            })
            .collect()
    }

    /// Statistical and behavioral outlier flags, one record per trade.
    pub fn detect_outliers(&self, trades: &[Trade]) -> Vec<TradeFlags> {
        outliers::detect(trades, &self.config)
    }
}

fn fill_streaks(trades: &[Trade], report: &mut PerformanceReport) {
    let mut current_wins = 0usize;
    let mut current_losses = 0usize;
    for trade in trades {
        if trade.win_loss.is_win() {
            current_wins += 1;
            current_losses = 0;
        } else {
            current_losses += 1;
            current_wins = 0;
        }
        report.max_consecutive_wins = report.max_consecutive_wins.max(current_wins);
        report.max_consecutive_losses = report.max_consecutive_losses.max(current_losses);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime};
    use core_types::WinLoss;
    use rust_decimal_macros::dec;

    fn trade(trade_id: u64, minutes: i64, pnl: Decimal) -> Trade {
        let base = NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let ts = base + Duration::minutes(minutes);
        Trade {
            trade_id,
            date: ts.date(),
            time: ts.time(),
            instrument: "EUR/USD".to_string(),
            setup_type: "Breakout".to_string(),
            session: "London".to_string(),
            risk_reward_ratio: dec!(2.0),
            risk_amount: dec!(100),
            win_loss: if pnl > Decimal::ZERO {
                WinLoss::Win
            } else {
                WinLoss::Loss
            },
            pnl,
        }
    }

    fn engine() -> AnalyticsEngine {
        AnalyticsEngine::new(AnalyticsConfig::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_configuration_up_front() {
        let config = AnalyticsConfig {
            rolling_windows: vec![0],
            ..Default::default()
        };
        assert!(AnalyticsEngine::new(config).is_err());
    }

    #[test]
    fn empty_input_yields_zeroed_report() {
        let report = engine().summarize(&[]);
        assert_eq!(report, PerformanceReport::new());
    }

    #[test]
    fn summary_counts_and_ratios() {
        let trades = vec![
            trade(1, 0, dec!(200)),
            trade(2, 24 * 60, dec!(-100)),
            trade(3, 48 * 60, dec!(150)),
            trade(4, 72 * 60, dec!(-50)),
        ];
        let report = engine().summarize(&trades);

        assert_eq!(report.total_trades, 4);
        assert_eq!(report.winning_trades, 2);
        assert_eq!(report.losing_trades, 2);
        assert_eq!(report.win_rate_pct, Some(dec!(50.00)));
        assert_eq!(report.total_net_pnl, dec!(200));
        assert_eq!(report.average_win, Some(dec!(175)));
        assert_eq!(report.average_loss, Some(dec!(-75)));
        // |350 / -150|
        assert_eq!(
            report.profit_factor.map(|pf| pf.round_dp(4)),
            Some(dec!(2.3333))
        );
        assert_eq!(report.expectancy, report.average_pnl);
        assert_eq!(report.final_balance, dec!(10200));
        assert_eq!(report.trading_span_days, 3);
    }

    #[test]
    fn profit_factor_is_none_without_losses() {
        let trades = vec![trade(1, 0, dec!(200)), trade(2, 60, dec!(100))];
        let report = engine().summarize(&trades);
        assert_eq!(report.profit_factor, None);
        assert_eq!(report.average_loss, None);
    }

    #[test]
    fn streaks_track_longest_runs() {
        let trades = vec![
            trade(1, 0, dec!(100)),
            trade(2, 100, dec!(80)),
            trade(3, 200, dec!(70)),
            trade(4, 300, dec!(-50)),
            trade(5, 400, dec!(-60)),
            trade(6, 500, dec!(90)),
        ];
        let report = engine().summarize(&trades);
        assert_eq!(report.max_consecutive_wins, 3);
        assert_eq!(report.max_consecutive_losses, 2);
    }

    #[test]
    fn behavioral_counts_surface_in_summary() {
        let trades = vec![
            trade(1, 0, dec!(-100)),
            // 30 minutes after a loss: revenge trade.
            trade(2, 30, dec!(50)),
            trade(3, 300, dec!(-40)),
        ];
        let report = engine().summarize(&trades);
        assert_eq!(report.revenge_trade_count, 1);
    }

    #[test]
    fn drawdown_metrics_match_the_curve() {
        let trades = vec![
            trade(1, 0, dec!(100)),
            trade(2, 24 * 60, dec!(-50)),
            trade(3, 48 * 60, dec!(200)),
        ];
        let report = engine().summarize(&trades);

        assert_eq!(report.max_drawdown, dec!(50));
        assert_eq!(report.max_drawdown_pct.round_dp(4), dec!(0.4950));
        assert_eq!(report.final_balance, dec!(10250));
    }
}
