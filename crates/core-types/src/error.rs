use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid Win_Loss value '{0}': expected 'Win' or 'Loss'")]
    InvalidWinLoss(String),
}
