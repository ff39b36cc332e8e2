use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::billing::{PurchaseError, ReconcileError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("{0}")]
    Message(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Message(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(?self);
        (status, self.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match &err {
            ReconcileError::LookupFailed(_) | ReconcileError::RetryFailed(_) => {
                AppError::BadGateway(err.to_string())
            }
            // Charged but still restricted: a 500, not a gateway error, so
            // operators can tell the residue apart from a plain failed retry.
            ReconcileError::UnfreezeFailed { .. } => AppError::Message(err.to_string()),
        }
    }
}

impl From<PurchaseError> for AppError {
    fn from(err: PurchaseError) -> Self {
        match &err {
            PurchaseError::PlanNotFound(_) => AppError::NotFound,
            PurchaseError::Unauthorized => AppError::Forbidden,
            PurchaseError::DuplicateCard => AppError::BadRequest(err.to_string()),
            PurchaseError::Gateway { .. } => AppError::BadGateway(err.to_string()),
            PurchaseError::CreditApplicationFailed(_) => AppError::Message(err.to_string()),
        }
    }
}
