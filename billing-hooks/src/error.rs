//! Service-layer error type
//!
//! `ServiceError` bridges storage errors (`StoreError`) and the API-layer
//! error (`AppError`) so handlers and the reconciler can use `?` throughout.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::StoreError;

/// Service-layer error.
///
/// - `Store`: storage failure (logged, reported as a retryable `DatabaseError`)
/// - `App`: business-rule error, passed through to the client
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    App(AppError),
}

impl ServiceError {
    /// The error code this maps to
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Store(_) => ErrorCode::DatabaseError,
            ServiceError::App(e) => e.code,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(store_err) => {
                tracing::error!(error = %store_err, "Service storage error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
