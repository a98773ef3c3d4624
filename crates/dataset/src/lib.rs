//! Trade log ingestion and up-front validation.
//!
//! This crate is the only place that touches the input file. It reads the
//! CSV trade log into `core_types::Trade` records and checks the cross-field
//! invariants once, before any statistics are computed. Corrupt input is a
//! fatal error identifying the offending row; it is never silently skipped.

use core_types::Trade;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::debug;

pub mod error;

pub use error::DatasetError;

/// Reads the trade log at `path` into memory.
///
/// The file must carry a header row with the exact, case-sensitive column
/// names of the trade log format (`Trade_ID`, `Date`, `Time`, ...). A missing
/// required column or an unparseable field aborts the read with the CSV line
/// of the first bad record. Extra columns are ignored.
pub fn read_trades<P: AsRef<Path>>(path: P) -> Result<Vec<Trade>, DatasetError> {
    let mut reader = csv::Reader::from_path(path.as_ref()).map_err(wrap_csv_error)?;

    let mut trades = Vec::new();
    for result in reader.deserialize() {
        let trade: Trade = result.map_err(wrap_csv_error)?;
        trades.push(trade);
    }

    debug!(count = trades.len(), "loaded trade log");
    Ok(trades)
}

fn wrap_csv_error(error: csv::Error) -> DatasetError {
    let line = error.position().map(|p| p.line());
    DatasetError::Parse {
        line,
        source: error,
    }
}

/// Checks the cross-field and ordering invariants of the trade sequence.
///
/// Validation runs once, up front. The checks are:
/// - `trade_id` strictly increasing;
/// - timestamps non-decreasing in `trade_id` order (the two orders must agree);
/// - `pnl` sign consistent with `win_loss` (Win > 0, Loss <= 0);
/// - `risk_amount` and `risk_reward_ratio` strictly positive.
pub fn validate(trades: &[Trade]) -> Result<(), DatasetError> {
    for (i, trade) in trades.iter().enumerate() {
        if i > 0 {
            let previous = &trades[i - 1];
            if trade.trade_id <= previous.trade_id {
                return Err(DatasetError::NonMonotonicTradeId {
                    trade_id: trade.trade_id,
                    previous_id: previous.trade_id,
                });
            }
            if trade.timestamp() < previous.timestamp() {
                return Err(DatasetError::OutOfOrderTimestamp {
                    trade_id: trade.trade_id,
                });
            }
        }

        if !trade.outcome_matches_pnl() {
            return Err(DatasetError::PnlSignMismatch {
                trade_id: trade.trade_id,
                pnl: trade.pnl.to_string(),
                outcome: trade.win_loss.to_string(),
            });
        }

        if trade.risk_amount <= Decimal::ZERO {
            return Err(DatasetError::NonPositiveField {
                trade_id: trade.trade_id,
                field: "Risk_Amount",
                value: trade.risk_amount.to_string(),
            });
        }
        if trade.risk_reward_ratio <= Decimal::ZERO {
            return Err(DatasetError::NonPositiveField {
                trade_id: trade.trade_id,
                field: "Risk_Reward_Ratio",
                value: trade.risk_reward_ratio.to_string(),
            });
        }
    }

    Ok(())
}

/// Convenience wrapper: read the trade log and validate it in one step.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Trade>, DatasetError> {
    let trades = read_trades(path)?;
    validate(&trades)?;
    Ok(trades)
}
