//! Statistical and behavioral outlier flags.
//!
//! Each detector is independent and contributes one column to the per-trade
//! flag record; none of them mutates the underlying trade. Flags degrade to
//! unset when their statistic is undefined (e.g. a zero-variance population
//! has no z-score outliers).

use chrono::Duration;
use configuration::AnalyticsConfig;
use core_types::Trade;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::stats;

/// Per-trade anomaly flags, aligned with the input sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeFlags {
    pub trade_id: u64,
    /// Standard score of this trade's P&L against the population; undefined
    /// when the population standard deviation is undefined or zero.
    pub pnl_zscore: Option<Decimal>,
    /// |z| exceeds the configured threshold.
    pub zscore_outlier: bool,
    /// P&L falls outside the IQR fences `[Q1 - m*IQR, Q3 + m*IQR]`.
    pub iqr_outlier: bool,
    /// The immediately preceding trade lost and this one was entered within
    /// the revenge window (strictly less than the configured minutes).
    pub revenge_trade: bool,
    /// The immediately preceding trade lost and this one risks strictly
    /// more than it did.
    pub risk_escalation: bool,
}

/// Runs every detector over the trade sequence.
pub fn detect(trades: &[Trade], config: &AnalyticsConfig) -> Vec<TradeFlags> {
    let pnls: Vec<Decimal> = trades.iter().map(|t| t.pnl).collect();

    let mean = stats::mean(&pnls);
    let stdev = stats::sample_stdev(&pnls).filter(|sd| *sd > Decimal::ZERO);

    let mut sorted = pnls.clone();
    sorted.sort();
    let fences = iqr_fences(&sorted, config.iqr_multiplier);

    let revenge_window = Duration::minutes(config.revenge_window_minutes);

    trades
        .iter()
        .enumerate()
        .map(|(i, trade)| {
            let pnl_zscore = match (mean, stdev) {
                (Some(mean), Some(sd)) => Some((trade.pnl - mean) / sd),
                _ => None,
            };
            let zscore_outlier = pnl_zscore
                .map(|z| z.abs() > config.zscore_threshold)
                .unwrap_or(false);

            let iqr_outlier = fences
                .map(|(low, high)| trade.pnl < low || trade.pnl > high)
                .unwrap_or(false);

            let previous = (i > 0).then(|| &trades[i - 1]);
            let after_loss = previous.map(|p| !p.win_loss.is_win()).unwrap_or(false);

            let revenge_trade = after_loss
                && previous
                    .map(|p| trade.timestamp() - p.timestamp() < revenge_window)
                    .unwrap_or(false);

            let risk_escalation = after_loss
                && previous
                    .map(|p| trade.risk_amount > p.risk_amount)
                    .unwrap_or(false);

            TradeFlags {
                trade_id: trade.trade_id,
                pnl_zscore,
                zscore_outlier,
                iqr_outlier,
                revenge_trade,
                risk_escalation,
            }
        })
        .collect()
}

fn iqr_fences(sorted: &[Decimal], multiplier: Decimal) -> Option<(Decimal, Decimal)> {
    let q1 = stats::quantile(sorted, Decimal::new(25, 2))?;
    let q3 = stats::quantile(sorted, Decimal::new(75, 2))?;
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use core_types::WinLoss;
    use rust_decimal_macros::dec;

    fn trade_at(trade_id: u64, minutes: i64, pnl: Decimal, risk: Decimal) -> Trade {
        let base = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let ts = base + Duration::minutes(minutes);
        Trade {
            trade_id,
            date: ts.date(),
            time: ts.time(),
            instrument: "EUR/USD".to_string(),
            setup_type: "Breakout".to_string(),
            session: "London".to_string(),
            risk_reward_ratio: dec!(2.0),
            risk_amount: risk,
            win_loss: if pnl > Decimal::ZERO {
                WinLoss::Win
            } else {
                WinLoss::Loss
            },
            pnl,
        }
    }

    #[test]
    fn revenge_flag_requires_loss_and_strictly_short_gap() {
        let trades = vec![
            trade_at(1, 0, dec!(-100), dec!(100)),
            // 30 minutes after a loss: flagged.
            trade_at(2, 30, dec!(50), dec!(100)),
            // 90 minutes after a win: not flagged.
            trade_at(3, 120, dec!(-80), dec!(100)),
            // Exactly 60 minutes after a loss: not flagged.
            trade_at(4, 180, dec!(40), dec!(100)),
            // 59 minutes after a win: not flagged (previous trade won).
            trade_at(5, 239, dec!(30), dec!(100)),
        ];
        let flags = detect(&trades, &AnalyticsConfig::default());

        assert!(!flags[0].revenge_trade);
        assert!(flags[1].revenge_trade);
        assert!(!flags[2].revenge_trade);
        assert!(!flags[3].revenge_trade);
        assert!(!flags[4].revenge_trade);
    }

    #[test]
    fn risk_escalation_requires_strict_increase_after_loss() {
        let trades = vec![
            trade_at(1, 0, dec!(-100), dec!(100)),
            // More risk after a loss: flagged.
            trade_at(2, 200, dec!(-120), dec!(120)),
            // Equal risk after a loss: not flagged.
            trade_at(3, 400, dec!(-50), dec!(120)),
            // More risk after a loss: flagged.
            trade_at(4, 600, dec!(200), dec!(150)),
            // More risk after a win: not flagged.
            trade_at(5, 800, dec!(90), dec!(200)),
        ];
        let flags = detect(&trades, &AnalyticsConfig::default());

        assert!(!flags[0].risk_escalation);
        assert!(flags[1].risk_escalation);
        assert!(!flags[2].risk_escalation);
        assert!(flags[3].risk_escalation);
        assert!(!flags[4].risk_escalation);
    }

    #[test]
    fn zscore_flags_extreme_pnl_only() {
        let mut trades: Vec<Trade> = (0..20)
            .map(|i| {
                let pnl = if i % 2 == 0 { dec!(100) } else { dec!(-90) };
                trade_at(i + 1, i as i64 * 120, pnl, dec!(100))
            })
            .collect();
        trades.push(trade_at(21, 4000, dec!(5000), dec!(100)));

        let flags = detect(&trades, &AnalyticsConfig::default());
        let flagged: Vec<u64> = flags
            .iter()
            .filter(|f| f.zscore_outlier)
            .map(|f| f.trade_id)
            .collect();
        assert_eq!(flagged, vec![21]);
    }

    #[test]
    fn iqr_flags_values_outside_fences() {
        let mut trades: Vec<Trade> = (0..12)
            .map(|i| {
                let pnl = Decimal::from(50 + (i as i64 % 4) * 10);
                trade_at(i + 1, i as i64 * 120, pnl, dec!(100))
            })
            .collect();
        trades.push(trade_at(13, 2000, dec!(-1000), dec!(100)));

        let flags = detect(&trades, &AnalyticsConfig::default());
        assert!(flags[12].iqr_outlier);
        assert!(flags.iter().take(12).all(|f| !f.iqr_outlier));
    }

    #[test]
    fn degenerate_population_produces_no_statistical_flags() {
        // Constant P&L: stdev is zero, z-scores undefined, IQR zero width
        // but every value sits on the fence, not outside it.
        let trades: Vec<Trade> = (0..5)
            .map(|i| trade_at(i + 1, i as i64 * 120, dec!(75), dec!(100)))
            .collect();
        let flags = detect(&trades, &AnalyticsConfig::default());

        for flag in &flags {
            assert_eq!(flag.pnl_zscore, None);
            assert!(!flag.zscore_outlier);
            assert!(!flag.iqr_outlier);
        }
    }
}
