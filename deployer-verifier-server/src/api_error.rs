use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use deployer_verifier::Error;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Library error as returned from the HTTP handlers.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidAddress(_) | Error::InvalidHash(_) | Error::UnsupportedChain(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::VerificationFailed | Error::StaleSignature => StatusCode::FORBIDDEN,
            Error::DuplicateContract { .. } | Error::DeployerNotVerified(_) => StatusCode::CONFLICT,
            Error::ContractNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match &self.0 {
            Error::Store(err) => {
                tracing::error!(err = %format!("{err:#}"), "record store failure");
                "internal server error".to_string()
            }
            err => err.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { message })
    }
}
