use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel_async::pooled_connection::PoolError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Errors surfaced by HTTP handlers.
///
/// Client mistakes map to 4xx with their own message. Anything that went
/// wrong upstream is logged here and answered with a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Payment(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("login required")]
    Unauthorized { redirect_to: String },
    #[error("admin access required")]
    Forbidden { redirect_to: String },
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] bb8::RunError<PoolError>),
    #[error("failed to create order after payment {payment_key}: {source}")]
    OrderCreation {
        payment_key: String,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Payment(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Database(_)
            | ApiError::Pool(_)
            | ApiError::OrderCreation { .. }
            | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, redirect) = match &self {
            ApiError::Validation(_) | ApiError::Payment(_) | ApiError::NotFound(_) => {
                (self.to_string(), None)
            }
            ApiError::Unauthorized { redirect_to } | ApiError::Forbidden { redirect_to } => {
                (self.to_string(), Some(redirect_to.clone()))
            }
            ApiError::OrderCreation { .. } => {
                error!("{:#}", self);
                (
                    "Payment was approved but the order could not be saved. Please contact support."
                        .to_string(),
                    None,
                )
            }
            ApiError::Database(_) | ApiError::Pool(_) | ApiError::Upstream(_) => {
                error!("Request failed: {:#}", self);
                ("Internal server error".to_string(), None)
            }
        };

        (status, Json(ErrorResponse { error: message, redirect })).into_response()
    }
}

impl From<shared::PricingError> for ApiError {
    fn from(err: shared::PricingError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_class() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Payment("declined".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("Product".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Upstream(anyhow::anyhow!("bucket unreachable")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Database(diesel::result::Error::NotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_resource() {
        assert_eq!(ApiError::NotFound("Product".into()).to_string(), "Product not found");
    }
}
