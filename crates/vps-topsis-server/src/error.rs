use serde_json::json;
use thiserror::Error;
use vps_topsis_core::TopsisError;
use vps_topsis_storage::StorageError;

use crate::http::HttpResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Topsis(#[from] TopsisError),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("method {0} not allowed on this path")]
    MethodNotAllowed(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::Topsis(_) | Self::BadRequest(_) => 400,
            Self::Storage(StorageError::InvalidInput(_)) => 400,
            Self::Storage(_) => 500,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Topsis(err) => err.code(),
            Self::BadRequest(_) | Self::Storage(StorageError::InvalidInput(_)) => "invalid_request",
            Self::Storage(_) => "internal_error",
            Self::NotFound(_) => "not_found",
            Self::MethodNotAllowed(_) => "method_not_allowed",
        }
    }

    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::json(
            self.status(),
            json!({"error": self.code(), "message": self.to_string()}),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code_mapping() {
        let cases = [
            (
                ApiError::from(TopsisError::InvalidWeights("w".into())),
                400,
                "invalid_weights",
            ),
            (
                ApiError::from(TopsisError::InvalidSweep("s".into())),
                400,
                "invalid_sweep",
            ),
            (
                ApiError::from(StorageError::InvalidInput("vendor".into())),
                400,
                "invalid_request",
            ),
            (
                ApiError::from(StorageError::Io(std::io::Error::other("disk"))),
                500,
                "internal_error",
            ),
            (ApiError::NotFound("x".into()), 404, "not_found"),
            (
                ApiError::MethodNotAllowed("PATCH".into()),
                405,
                "method_not_allowed",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status(), status, "{err}");
            assert_eq!(err.code(), code, "{err}");
        }
    }
}
