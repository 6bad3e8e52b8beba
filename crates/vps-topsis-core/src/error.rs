use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopsisError {
    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("invalid decision matrix: {0}")]
    InvalidMatrix(String),

    #[error("invalid sensitivity sweep: {0}")]
    InvalidSweep(String),
}

impl TopsisError {
    /// Stable machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidWeights(_) => "invalid_weights",
            Self::InvalidMatrix(_) => "invalid_matrix",
            Self::InvalidSweep(_) => "invalid_sweep",
        }
    }
}
