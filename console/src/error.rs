use thiserror::Error;

/// Errors crossing the venue boundary.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Network, auth, or timeout failure reaching the venue.
    #[error("venue unreachable: {0}")]
    Connectivity(String),
    /// The venue rejected a close-position order.
    #[error("close order rejected: {0}")]
    Action(String),
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        BrokerError::Connectivity(err.to_string())
    }
}

/// Close-command failures surfaced synchronously to the operator.
#[derive(Debug, Error)]
pub enum CloseError {
    /// A close for this symbol is already in flight; no second order was issued.
    #[error("close already pending for {0}")]
    Busy(String),
    #[error(transparent)]
    Broker(#[from] BrokerError),
}
