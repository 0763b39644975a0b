use axum::http::StatusCode;
use axum::response::IntoResponse;
use thiserror::Error;

use crate::external::catalog_provider::CatalogProviderError;
use crate::store::favorites::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Upstream { message, .. } => (StatusCode::BAD_GATEWAY, message).into_response(),
            AppError::MalformedPayload(msg) => {
                (StatusCode::BAD_GATEWAY, format!("Malformed upstream payload: {}", msg)).into_response()
            }
            AppError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<CatalogProviderError> for AppError {
    fn from(value: CatalogProviderError) -> Self {
        match value {
            CatalogProviderError::Status(code) => AppError::Upstream {
                status: Some(code),
                message: format!("upstream returned status {}", code),
            },
            CatalogProviderError::Malformed(msg) => AppError::MalformedPayload(msg),
            e @ (CatalogProviderError::InvalidUrl(_) | CatalogProviderError::Network(_)) => {
                AppError::Upstream {
                    status: None,
                    message: e.to_string(),
                }
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Persistence(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_keeps_code() {
        let err: AppError = CatalogProviderError::Status(500).into();
        assert!(matches!(err, AppError::Upstream { status: Some(500), .. }));
    }

    #[test]
    fn test_decode_error_maps_to_malformed_payload() {
        let err: AppError = CatalogProviderError::Malformed("missing field `price`".into()).into();
        assert!(matches!(err, AppError::MalformedPayload(_)));
    }

    #[test]
    fn test_http_status_mapping() {
        let upstream = AppError::Upstream { status: Some(500), message: "boom".into() }.into_response();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let persistence = AppError::Persistence("disk full".into()).into_response();
        assert_eq!(persistence.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let validation = AppError::Validation("bad".into()).into_response();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
    }
}
