//! Sistema de manejo de errores
//!
//! Este módulo define los errores que llegan a la capa HTTP
//! y su conversión a respuestas opacas. El detalle interno solo va al log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::card_service::CardServiceError;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid date parameter")]
    InvalidDate,

    #[error("Invalid month parameter")]
    InvalidMonth,

    #[error("Card generation failed: {0}")]
    Generation(#[source] CardServiceError),

    #[error("Card generation timed out")]
    GenerationTimedOut,

    #[error("Store error: {0}")]
    Store(#[source] CardServiceError),
}

impl From<CardServiceError> for AppError {
    fn from(err: CardServiceError) -> Self {
        match err {
            CardServiceError::TimedOut(_) => AppError::GenerationTimedOut,
            CardServiceError::Store(_) => AppError::Store(err),
            other => AppError::Generation(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidDate => (StatusCode::BAD_REQUEST, "Invalid date parameter"),
            AppError::InvalidMonth => (StatusCode::BAD_REQUEST, "Invalid month parameter"),
            AppError::Generation(e) => {
                error!("❌ Error generating card: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate card")
            }
            AppError::GenerationTimedOut => {
                error!("⌛ Card generation timed out");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Card generation timed out, retry later",
                )
            }
            AppError::Store(e) => {
                error!("❌ Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate card")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ImageGenerationError;
    use chrono::NaiveDate;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidDate.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidMonth.into_response().status(), StatusCode::BAD_REQUEST);

        let timeout: AppError =
            CardServiceError::TimedOut(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()).into();
        assert_eq!(timeout.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let failed: AppError =
            CardServiceError::ImageGeneration(ImageGenerationError::MissingData).into();
        assert_eq!(failed.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
