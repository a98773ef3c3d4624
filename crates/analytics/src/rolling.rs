//! Rolling-window statistics over the trade sequence.
//!
//! Each reducer is computed with an incremental accumulator (running count,
//! win count, sum, and sum of squares): the trade entering the window is
//! added and the trade leaving it is subtracted, so a full pass is O(n)
//! regardless of window size. `Decimal` arithmetic keeps the subtraction
//! exact, so the incremental result matches a from-scratch recomputation.
//!
//! Window policy: trade-count windows report `None` until the window is
//! full. Calendar windows always contain at least the trade itself and
//! report a value whenever the reducer is defined; the window covers the
//! half-open interval `(t - unit, t]` ending at each trade's timestamp.

use crate::error::AnalyticsError;
use chrono::{Duration, Months, NaiveDateTime};
use core_types::Trade;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The statistic computed over each trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Percentage of winning trades, rounded to 2 decimal places.
    WinRate,
    SumPnl,
    MeanPnl,
    /// Sample standard deviation of P&L (n-1 denominator); undefined for
    /// windows of fewer than two trades.
    StdevPnl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarUnit {
    Day,
    Week,
    Month,
}

/// A trailing window, sized either by trade count or by calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Trades(usize),
    Calendar(CalendarUnit),
}

/// Running sums for one window. Adding and removing trades is O(1); every
/// reducer is derived from these four numbers.
#[derive(Debug, Clone, Default)]
struct WindowAccumulator {
    count: usize,
    wins: usize,
    sum: Decimal,
    sum_sq: Decimal,
}

impl WindowAccumulator {
    fn add(&mut self, trade: &Trade) {
        self.count += 1;
        if trade.win_loss.is_win() {
            self.wins += 1;
        }
        self.sum += trade.pnl;
        self.sum_sq += trade.pnl * trade.pnl;
    }

    fn remove(&mut self, trade: &Trade) {
        self.count -= 1;
        if trade.win_loss.is_win() {
            self.wins -= 1;
        }
        self.sum -= trade.pnl;
        self.sum_sq -= trade.pnl * trade.pnl;
    }

    fn reduce(&self, reducer: Reducer) -> Option<Decimal> {
        match reducer {
            Reducer::WinRate => {
                if self.count == 0 {
                    None
                } else {
                    let rate =
                        Decimal::from(self.wins) / Decimal::from(self.count) * Decimal::from(100);
                    Some(rate.round_dp(2))
                }
            }
            Reducer::SumPnl => (self.count > 0).then_some(self.sum),
            Reducer::MeanPnl => {
                (self.count > 0).then(|| self.sum / Decimal::from(self.count))
            }
            Reducer::StdevPnl => {
                if self.count < 2 {
                    return None;
                }
                let n = Decimal::from(self.count);
                let variance = (self.sum_sq - self.sum * self.sum / n) / (n - Decimal::ONE);
                // Exact-arithmetic variance can only go negative through the
                // final rounding step; clamp before the square root.
                variance.max(Decimal::ZERO).sqrt()
            }
        }
    }
}

/// Computes `reducer` over the trailing `window` at every position of the
/// trade sequence. The output has one entry per input trade, `None` where
/// the statistic is undefined at that position.
pub fn rolling(
    trades: &[Trade],
    window: Window,
    reducer: Reducer,
) -> Result<Vec<Option<Decimal>>, AnalyticsError> {
    validate_window(window)?;
    let indices: Vec<usize> = (0..trades.len()).collect();
    let mut out = vec![None; trades.len()];
    rolling_over(trades, &indices, window, reducer, &mut out);
    Ok(out)
}

/// The partitioned variant: the same computation restricted to trades
/// sharing a categorical key, applied independently per partition while
/// preserving each partition's own chronological order. The output stays
/// aligned with the input sequence.
pub fn rolling_partitioned<F>(
    trades: &[Trade],
    key: F,
    window: Window,
    reducer: Reducer,
) -> Result<Vec<Option<Decimal>>, AnalyticsError>
where
    F: Fn(&Trade) -> String,
{
    validate_window(window)?;

    let mut partitions: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, trade) in trades.iter().enumerate() {
        partitions.entry(key(trade)).or_default().push(i);
    }

    let mut out = vec![None; trades.len()];
    for indices in partitions.values() {
        rolling_over(trades, indices, window, reducer, &mut out);
    }
    Ok(out)
}

fn validate_window(window: Window) -> Result<(), AnalyticsError> {
    if let Window::Trades(0) = window {
        return Err(AnalyticsError::InvalidWindow(0));
    }
    Ok(())
}

/// Runs one incremental pass over the subsequence given by `indices`,
/// scattering results into `out` at the original positions.
fn rolling_over(
    trades: &[Trade],
    indices: &[usize],
    window: Window,
    reducer: Reducer,
    out: &mut [Option<Decimal>],
) {
    let mut acc = WindowAccumulator::default();

    match window {
        Window::Trades(w) => {
            for (pos, &i) in indices.iter().enumerate() {
                acc.add(&trades[i]);
                if pos >= w {
                    acc.remove(&trades[indices[pos - w]]);
                }
                out[i] = if acc.count == w {
                    acc.reduce(reducer)
                } else {
                    None
                };
            }
        }
        Window::Calendar(unit) => {
            let mut start = 0;
            for &i in indices {
                acc.add(&trades[i]);
                let cutoff = window_start(trades[i].timestamp(), unit);
                while trades[indices[start]].timestamp() <= cutoff {
                    acc.remove(&trades[indices[start]]);
                    start += 1;
                }
                out[i] = acc.reduce(reducer);
            }
        }
    }
}

fn window_start(end: NaiveDateTime, unit: CalendarUnit) -> NaiveDateTime {
    match unit {
        CalendarUnit::Day => end - Duration::days(1),
        CalendarUnit::Week => end - Duration::weeks(1),
        CalendarUnit::Month => end
            .checked_sub_months(Months::new(1))
            .unwrap_or(NaiveDateTime::MIN),
    }
}
