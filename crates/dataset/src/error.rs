use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read trade log: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse trade log{}: {}", row_context(.line), .source)]
    Parse {
        /// 1-based CSV line of the offending record, when known.
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },

    #[error("Trade {trade_id}: trade IDs must be strictly increasing (previous was {previous_id})")]
    NonMonotonicTradeId { trade_id: u64, previous_id: u64 },

    #[error("Trade {trade_id}: timestamp precedes the previous trade's; trade ID order must equal chronological order")]
    OutOfOrderTimestamp { trade_id: u64 },

    #[error("Trade {trade_id}: P&L {pnl} does not agree with outcome '{outcome}'")]
    PnlSignMismatch {
        trade_id: u64,
        pnl: String,
        outcome: String,
    },

    #[error("Trade {trade_id}: {field} must be strictly positive, got {value}")]
    NonPositiveField {
        trade_id: u64,
        field: &'static str,
        value: String,
    },
}

fn row_context(line: &Option<u64>) -> String {
    match line {
        Some(line) => format!(" at line {}", line),
        None => String::new(),
    }
}
