use crate::enums::WinLoss;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single executed trade, as recorded in the journal.
///
/// Field renames match the exact, case-sensitive column headers of the
/// trade log CSV. `trade_id` is the primary ordering key; by invariant its
/// order equals chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "Trade_ID")]
    pub trade_id: u64,

    #[serde(rename = "Date")]
    pub date: NaiveDate,

    #[serde(rename = "Time", with = "hour_minute")]
    pub time: NaiveTime,

    #[serde(rename = "Instrument")]
    pub instrument: String,

    #[serde(rename = "Setup_Type")]
    pub setup_type: String,

    #[serde(rename = "Session")]
    pub session: String,

    #[serde(rename = "Risk_Reward_Ratio")]
    pub risk_reward_ratio: Decimal,

    #[serde(rename = "Risk_Amount")]
    pub risk_amount: Decimal,

    #[serde(rename = "Win_Loss")]
    pub win_loss: WinLoss,

    #[serde(rename = "PnL")]
    pub pnl: Decimal,
}

/// The trade log records execution time as `HH:MM`, without seconds.
mod hour_minute {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

impl Trade {
    /// Combines the trade's date and time into a single timestamp.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Whether the recorded outcome agrees with the sign of the P&L:
    /// a Win must have strictly positive P&L, a Loss zero or negative.
    pub fn outcome_matches_pnl(&self) -> bool {
        match self.win_loss {
            WinLoss::Win => self.pnl > Decimal::ZERO,
            WinLoss::Loss => self.pnl <= Decimal::ZERO,
        }
    }

    // Calendar attributes are pure functions of the timestamp and carry no
    // independent state.

    pub fn day_of_week(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn quarter(&self) -> u32 {
        (self.date.month() - 1) / 3 + 1
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }
}

/// Point-in-time account state after a trade, derived from the cumulative
/// P&L. These are always recomputed by the analytics engine, never trusted
/// from the input file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub trade_id: u64,
    /// Account value after this trade: starting balance plus cumulative P&L.
    pub balance: Decimal,
    /// Running maximum of `balance` up to and including this trade.
    pub peak_balance: Decimal,
    /// `(peak_balance - balance) / peak_balance * 100`; zero exactly when
    /// the balance sits at its peak.
    pub drawdown_pct: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal, win_loss: WinLoss) -> Trade {
        Trade {
            trade_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            instrument: "EUR/USD".to_string(),
            setup_type: "Breakout".to_string(),
            session: "London".to_string(),
            risk_reward_ratio: dec!(2.0),
            risk_amount: dec!(100),
            win_loss,
            pnl,
        }
    }

    #[test]
    fn calendar_attributes_derive_from_timestamp() {
        let t = trade(dec!(200), WinLoss::Win);
        assert_eq!(t.day_of_week(), Weekday::Fri);
        assert_eq!(t.month(), 5);
        assert_eq!(t.year(), 2024);
        assert_eq!(t.quarter(), 2);
        assert_eq!(t.hour(), 14);
    }

    #[test]
    fn outcome_sign_agreement() {
        assert!(trade(dec!(200), WinLoss::Win).outcome_matches_pnl());
        assert!(trade(dec!(-100), WinLoss::Loss).outcome_matches_pnl());
        // A zero-P&L trade counts as a loss, not a win.
        assert!(trade(Decimal::ZERO, WinLoss::Loss).outcome_matches_pnl());
        assert!(!trade(Decimal::ZERO, WinLoss::Win).outcome_matches_pnl());
        assert!(!trade(dec!(-50), WinLoss::Win).outcome_matches_pnl());
    }
}
