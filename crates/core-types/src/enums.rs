use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The outcome of a single trade. There are no draws: every trade resolves
/// to exactly one of these two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinLoss {
    Win,
    Loss,
}

impl WinLoss {
    pub fn is_win(&self) -> bool {
        matches!(self, WinLoss::Win)
    }
}

impl fmt::Display for WinLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinLoss::Win => write!(f, "Win"),
            WinLoss::Loss => write!(f, "Loss"),
        }
    }
}

impl FromStr for WinLoss {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Win" => Ok(WinLoss::Win),
            "Loss" => Ok(WinLoss::Loss),
            other => Err(CoreError::InvalidWinLoss(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_labels_only() {
        assert_eq!("Win".parse::<WinLoss>().unwrap(), WinLoss::Win);
        assert_eq!("Loss".parse::<WinLoss>().unwrap(), WinLoss::Loss);
        assert!("win".parse::<WinLoss>().is_err());
        assert!("Draw".parse::<WinLoss>().is_err());
    }
}
