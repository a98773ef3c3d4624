//! Group-level summaries and the named ratio battery.
//!
//! Grouping is a single pass over the trade sequence: each trade is routed
//! to its group's accumulator, and the ratios are derived from the running
//! sums afterwards. No raw values are retained per group beyond what the
//! ratios need.

use configuration::AnalyticsConfig;
use core_types::Trade;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::stats;

/// The categorical dimension a grouping runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDimension {
    SetupType,
    Session,
    Instrument,
    Hour,
    DayOfWeek,
    Month,
    Year,
    Quarter,
    /// Combined setup-type and session key.
    SetupSession,
}

impl GroupDimension {
    fn key(&self, trade: &Trade) -> String {
        match self {
            GroupDimension::SetupType => trade.setup_type.clone(),
            GroupDimension::Session => trade.session.clone(),
            GroupDimension::Instrument => trade.instrument.clone(),
            GroupDimension::Hour => format!("{:02}:00", trade.hour()),
            GroupDimension::DayOfWeek => trade.day_of_week().to_string(),
            GroupDimension::Month => trade.date.format("%B").to_string(),
            GroupDimension::Year => trade.year().to_string(),
            GroupDimension::Quarter => format!("Q{}", trade.quarter()),
            GroupDimension::SetupSession => {
                format!("{} / {}", trade.setup_type, trade.session)
            }
        }
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupDimension::SetupType => "setup type",
            GroupDimension::Session => "session",
            GroupDimension::Instrument => "instrument",
            GroupDimension::Hour => "hour",
            GroupDimension::DayOfWeek => "day of week",
            GroupDimension::Month => "month",
            GroupDimension::Year => "year",
            GroupDimension::Quarter => "quarter",
            GroupDimension::SetupSession => "setup / session",
        };
        write!(f, "{}", name)
    }
}

/// Summary statistics for one group of trades.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: String,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    /// `wins / total * 100`, rounded to 2 decimal places.
    pub win_rate_pct: Decimal,
    pub total_pnl: Decimal,
    pub avg_pnl: Decimal,
    /// Mean P&L over winning trades only; undefined with no wins.
    pub avg_win: Option<Decimal>,
    /// Mean P&L over losing trades only (signed, typically negative);
    /// undefined with no losses.
    pub avg_loss: Option<Decimal>,
    /// |gross profit / gross loss|; undefined when the group has no losing
    /// P&L to divide by. Never reported as infinity.
    pub profit_factor: Option<Decimal>,
    /// Average P&L per trade. Numerically equal to
    /// `win_rate/100 * avg_win + (1 - win_rate/100) * avg_loss`.
    pub expectancy: Decimal,
    /// `mean(pnl) / stdev(pnl) * sqrt(annualization_factor)`; undefined
    /// when the standard deviation is undefined or zero.
    pub sharpe_like: Option<Decimal>,
}

/// Significance classification of a group against the whole population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Significance {
    Underperforming,
    Overperforming,
    WithinNormalRange,
    InsufficientData,
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Significance::Underperforming => "significantly under-performing",
            Significance::Overperforming => "significantly over-performing",
            Significance::WithinNormalRange => "within normal range",
            Significance::InsufficientData => "insufficient data",
        };
        write!(f, "{}", label)
    }
}

/// A group's statistics together with its population significance test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub stats: GroupStats,
    /// `(group_mean - population_mean) / (group_stdev / sqrt(n))`; undefined
    /// when the group's standard deviation is undefined or zero.
    pub z_score: Option<Decimal>,
    pub significance: Significance,
}

/// Action suggested for a setup-type group. Rules are checked in priority
/// order and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    Stop,
    Caution,
    Review,
    Continue,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Recommendation::Stop => "STOP",
            Recommendation::Caution => "CAUTION",
            Recommendation::Review => "REVIEW",
            Recommendation::Continue => "CONTINUE",
        };
        write!(f, "{}", label)
    }
}

/// Running sums for one group. Ratios are derived after the single pass.
#[derive(Debug, Default)]
struct GroupAccumulator {
    total: usize,
    wins: usize,
    sum: Decimal,
    sum_sq: Decimal,
    win_sum: Decimal,
    loss_sum: Decimal,
}

impl GroupAccumulator {
    fn add(&mut self, trade: &Trade) {
        self.total += 1;
        self.sum += trade.pnl;
        self.sum_sq += trade.pnl * trade.pnl;
        if trade.win_loss.is_win() {
            self.wins += 1;
            self.win_sum += trade.pnl;
        } else {
            self.loss_sum += trade.pnl;
        }
    }

    fn stdev(&self) -> Option<Decimal> {
        if self.total < 2 {
            return None;
        }
        let n = Decimal::from(self.total);
        let variance = (self.sum_sq - self.sum * self.sum / n) / (n - Decimal::ONE);
        variance.max(Decimal::ZERO).sqrt()
    }

    fn into_stats(self, key: String, annualization_factor: u32) -> GroupStats {
        let total = Decimal::from(self.total);
        let losses = self.total - self.wins;
        let avg_pnl = self.sum / total;

        let win_rate_pct =
            (Decimal::from(self.wins) / total * Decimal::from(100)).round_dp(2);

        let avg_win = (self.wins > 0).then(|| self.win_sum / Decimal::from(self.wins));
        let avg_loss = (losses > 0).then(|| self.loss_sum / Decimal::from(losses));

        // Zero gross loss means the denominator is zero: explicitly
        // undefined rather than infinity.
        let profit_factor = (self.loss_sum != Decimal::ZERO)
            .then(|| (self.win_sum / self.loss_sum).abs());

        let sharpe_like = self.stdev().and_then(|sd| {
            if sd == Decimal::ZERO {
                return None;
            }
            let annualizer = Decimal::from(annualization_factor).sqrt()?;
            Some(avg_pnl / sd * annualizer)
        });

        GroupStats {
            key,
            total: self.total,
            wins: self.wins,
            losses,
            win_rate_pct,
            total_pnl: self.sum,
            avg_pnl,
            avg_win,
            avg_loss,
            profit_factor,
            expectancy: avg_pnl,
            sharpe_like,
        }
    }
}

/// Computes per-group statistics and the significance test for every group
/// along `dimension`, in one pass over the trades. Groups are returned in
/// key order.
pub fn group_stats(
    trades: &[Trade],
    dimension: GroupDimension,
    config: &AnalyticsConfig,
) -> Vec<GroupReport> {
    let mut groups: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
    for trade in trades {
        groups.entry(dimension.key(trade)).or_default().add(trade);
    }

    let pnls: Vec<Decimal> = trades.iter().map(|t| t.pnl).collect();
    let population_mean = stats::mean(&pnls);

    groups
        .into_iter()
        .map(|(key, acc)| {
            let group_stdev = acc.stdev();
            let stats = acc.into_stats(key, config.annualization_factor);
            let (z_score, significance) =
                significance(&stats, population_mean, group_stdev, config);
            GroupReport {
                stats,
                z_score,
                significance,
            }
        })
        .collect()
}

fn significance(
    stats: &GroupStats,
    population_mean: Option<Decimal>,
    group_stdev: Option<Decimal>,
    config: &AnalyticsConfig,
) -> (Option<Decimal>, Significance) {
    let z_score = match (population_mean, group_stdev) {
        (Some(pop_mean), Some(sd)) if sd > Decimal::ZERO => {
            Decimal::from(stats.total)
                .sqrt()
                .map(|sqrt_n| (stats.avg_pnl - pop_mean) / (sd / sqrt_n))
        }
        _ => None,
    };

    if stats.total < config.min_sample_size {
        return (z_score, Significance::InsufficientData);
    }

    let significance = match z_score {
        None => Significance::InsufficientData,
        Some(z) if z > config.significance_zscore => Significance::Overperforming,
        Some(z) if z < -config.significance_zscore => Significance::Underperforming,
        Some(_) => Significance::WithinNormalRange,
    };

    (z_score, significance)
}

/// Applies the priority-ordered recommendation rules to a setup group.
/// The first matching rule wins; later rules are not consulted.
pub fn recommendation(stats: &GroupStats) -> Recommendation {
    if stats.avg_pnl < Decimal::ZERO {
        return if stats.total >= 30 {
            Recommendation::Stop
        } else {
            Recommendation::Caution
        };
    }
    if let Some(pf) = stats.profit_factor {
        if pf < Decimal::ONE {
            return Recommendation::Review;
        }
        if stats.win_rate_pct < Decimal::from(40) && pf < Decimal::new(15, 1) {
            return Recommendation::Review;
        }
    }
    Recommendation::Continue
}
