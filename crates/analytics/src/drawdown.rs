//! Equity curve, drawdown tracking, and recovery statistics.
//!
//! The balance sequence is always recomputed from the starting balance and
//! the cumulative P&L; the input file's own balance columns are ignored.

use chrono::Duration;
use core_types::{EquityPoint, Trade};
use rust_decimal::Decimal;
use serde::Serialize;

/// A maximal run of consecutive trades whose balance sits below the running
/// peak, ending at the last trade before a new equity high. A drawdown still
/// open at the end of the series is reported with the final trade as its end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownPeriod {
    pub start_index: usize,
    pub end_index: usize,
    pub start_trade_id: u64,
    pub end_trade_id: u64,
    /// Duration in trades.
    pub trade_count: usize,
    /// Duration in calendar days between the first and last trade of the run.
    pub calendar_days: i64,
    /// Lowest balance reached within the period.
    pub trough_balance: Decimal,
    /// Largest drawdown percentage reached within the period.
    pub max_drawdown_pct: Decimal,
}

/// Day gaps between successive new-high trades.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryStats {
    pub new_high_count: usize,
    pub avg_days_between_highs: Decimal,
    pub min_days_between_highs: i64,
    pub max_days_between_highs: i64,
}

/// Computes the per-trade balance, running peak, and drawdown percentage.
///
/// `balance[i]` is `starting_balance` plus the cumulative P&L up to and
/// including trade `i`; `peak_balance[i]` is the running maximum of the
/// balance over the trades seen so far (the starting balance itself is not
/// a peak). The drawdown percentage is zero exactly when the balance sits
/// at its peak.
pub fn equity_curve(trades: &[Trade], starting_balance: Decimal) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(trades.len());
    let mut balance = starting_balance;
    let mut peak = Decimal::MIN;

    for trade in trades {
        balance += trade.pnl;
        if balance > peak {
            peak = balance;
        }

        let drawdown_pct = if peak > Decimal::ZERO {
            (peak - balance) / peak * Decimal::from(100)
        } else {
            // An account that never saw a positive balance has no meaningful
            // percentage drawdown.
            Decimal::ZERO
        };

        curve.push(EquityPoint {
            trade_id: trade.trade_id,
            balance,
            peak_balance: peak,
            drawdown_pct,
        });
    }

    curve
}

/// Identifies contiguous drawdown periods from a computed equity curve.
///
/// A period starts at the first trade whose balance falls below the current
/// peak and ends at the last consecutive trade before a new high. Periods
/// spanning fewer than `min_trades` trades are dropped from the report.
pub fn drawdown_periods(
    trades: &[Trade],
    curve: &[EquityPoint],
    min_trades: usize,
) -> Vec<DrawdownPeriod> {
    let mut periods = Vec::new();
    let mut open: Option<usize> = None;

    for (i, point) in curve.iter().enumerate() {
        let in_drawdown = point.balance < point.peak_balance;
        match (open, in_drawdown) {
            (None, true) => open = Some(i),
            (Some(start), false) => {
                push_period(&mut periods, trades, curve, start, i - 1, min_trades);
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        push_period(&mut periods, trades, curve, start, curve.len() - 1, min_trades);
    }

    periods
}

fn push_period(
    periods: &mut Vec<DrawdownPeriod>,
    trades: &[Trade],
    curve: &[EquityPoint],
    start: usize,
    end: usize,
    min_trades: usize,
) {
    let trade_count = end - start + 1;
    if trade_count < min_trades {
        return;
    }

    let run = &curve[start..=end];
    let trough_balance = run
        .iter()
        .map(|p| p.balance)
        .min()
        .unwrap_or(curve[start].balance);
    let max_drawdown_pct = run
        .iter()
        .map(|p| p.drawdown_pct)
        .max()
        .unwrap_or(Decimal::ZERO);

    periods.push(DrawdownPeriod {
        start_index: start,
        end_index: end,
        start_trade_id: trades[start].trade_id,
        end_trade_id: trades[end].trade_id,
        trade_count,
        calendar_days: (trades[end].date - trades[start].date).num_days(),
        trough_balance,
        max_drawdown_pct,
    });
}

/// Aggregates the day gaps between successive new-high trades. A new high
/// is a trade whose balance exceeds every earlier balance. Undefined with
/// fewer than two new highs.
pub fn recovery_stats(trades: &[Trade], curve: &[EquityPoint]) -> Option<RecoveryStats> {
    let mut previous_high: Option<usize> = None;
    let mut best = Decimal::MIN;
    let mut gaps: Vec<Duration> = Vec::new();
    let mut new_high_count = 0;

    for (i, point) in curve.iter().enumerate() {
        if point.balance > best {
            best = point.balance;
            new_high_count += 1;
            if let Some(prev) = previous_high {
                gaps.push(trades[i].timestamp() - trades[prev].timestamp());
            }
            previous_high = Some(i);
        }
    }

    if gaps.is_empty() {
        return None;
    }

    let days: Vec<i64> = gaps.iter().map(|d| d.num_days()).collect();
    let total: i64 = days.iter().sum();

    Some(RecoveryStats {
        new_high_count,
        avg_days_between_highs: Decimal::from(total) / Decimal::from(days.len()),
        min_days_between_highs: days.iter().min().copied().unwrap_or_default(),
        max_days_between_highs: days.iter().max().copied().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use core_types::WinLoss;
    use rust_decimal_macros::dec;

    fn trade(trade_id: u64, day: u32, pnl: Decimal) -> Trade {
        Trade {
            trade_id,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
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

    fn sequence(pnls: &[Decimal]) -> Vec<Trade> {
        pnls.iter()
            .enumerate()
            .map(|(i, &pnl)| trade(i as u64 + 1, i as u32 + 1, pnl))
            .collect()
    }

    #[test]
    fn worked_example_from_three_trades() {
        let trades = sequence(&[dec!(100), dec!(-50), dec!(200)]);
        let curve = equity_curve(&trades, dec!(1000));

        let balances: Vec<Decimal> = curve.iter().map(|p| p.balance).collect();
        assert_eq!(balances, vec![dec!(1100), dec!(1050), dec!(1250)]);

        let peaks: Vec<Decimal> = curve.iter().map(|p| p.peak_balance).collect();
        assert_eq!(peaks, vec![dec!(1100), dec!(1100), dec!(1250)]);

        assert_eq!(curve[0].drawdown_pct, Decimal::ZERO);
        // (1100 - 1050) / 1100 * 100 = 4.5454...
        assert_eq!(curve[1].drawdown_pct.round_dp(4), dec!(4.5455));
        assert_eq!(curve[2].drawdown_pct, Decimal::ZERO);
    }

    #[test]
    fn balance_is_cumulative_and_peak_is_monotonic() {
        let trades = sequence(&[
            dec!(150),
            dec!(-90),
            dec!(-40),
            dec!(300),
            dec!(-10),
            dec!(25),
        ]);
        let starting = dec!(10000);
        let curve = equity_curve(&trades, starting);

        let mut cumulative = starting;
        let mut last_peak = Decimal::MIN;
        for (point, trade) in curve.iter().zip(&trades) {
            cumulative += trade.pnl;
            assert_eq!(point.balance, cumulative);
            assert!(point.peak_balance >= last_peak);
            last_peak = point.peak_balance;

            assert!(point.drawdown_pct >= Decimal::ZERO);
            let at_peak = point.balance == point.peak_balance;
            assert_eq!(point.drawdown_pct == Decimal::ZERO, at_peak);
        }
    }

    #[test]
    fn single_trade_dips_are_excluded_by_default_threshold() {
        // One losing trade immediately recovered: a length-1 period.
        let trades = sequence(&[dec!(100), dec!(-50), dec!(200)]);
        let curve = equity_curve(&trades, dec!(1000));

        assert!(drawdown_periods(&trades, &curve, 2).is_empty());
        let included = drawdown_periods(&trades, &curve, 1);
        assert_eq!(included.len(), 1);
        assert_eq!(included[0].start_index, 1);
        assert_eq!(included[0].end_index, 1);
    }

    #[test]
    fn period_spans_until_new_high() {
        let trades = sequence(&[dec!(100), dec!(-50), dec!(-25), dec!(30), dec!(300)]);
        let curve = equity_curve(&trades, dec!(1000));
        let periods = drawdown_periods(&trades, &curve, 2);

        // Balances: 1100, 1050, 1025, 1055, 1355. The drawdown runs from
        // trade 2 through trade 4; trade 5 sets the new high.
        assert_eq!(periods.len(), 1);
        let period = &periods[0];
        assert_eq!(period.start_trade_id, 2);
        assert_eq!(period.end_trade_id, 4);
        assert_eq!(period.trade_count, 3);
        assert_eq!(period.calendar_days, 2);
        assert_eq!(period.trough_balance, dec!(1025));
        assert_eq!(
            period.max_drawdown_pct.round_dp(4),
            (dec!(75) / dec!(1100) * dec!(100)).round_dp(4)
        );
    }

    #[test]
    fn open_drawdown_is_reported_to_the_last_trade() {
        let trades = sequence(&[dec!(100), dec!(-50), dec!(-25)]);
        let curve = equity_curve(&trades, dec!(1000));
        let periods = drawdown_periods(&trades, &curve, 2);

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].start_trade_id, 2);
        assert_eq!(periods[0].end_trade_id, 3);
    }

    #[test]
    fn recovery_gaps_between_new_highs() {
        // New highs on days 1, 2, and 5.
        let trades = sequence(&[dec!(100), dec!(50), dec!(-30), dec!(-10), dec!(100)]);
        let curve = equity_curve(&trades, dec!(1000));
        let stats = recovery_stats(&trades, &curve).unwrap();

        assert_eq!(stats.new_high_count, 3);
        assert_eq!(stats.min_days_between_highs, 1);
        assert_eq!(stats.max_days_between_highs, 3);
        assert_eq!(stats.avg_days_between_highs, dec!(2));
    }

    #[test]
    fn recovery_undefined_with_single_high() {
        let trades = sequence(&[dec!(100), dec!(-50)]);
        let curve = equity_curve(&trades, dec!(1000));
        assert!(recovery_stats(&trades, &curve).is_none());
    }
}
