//! Классификация ошибок сервиса и их отображение в JSON-ответ

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Результат, используемый во всём сервисе
pub type AppResult<T> = Result<T, AppError>;

/// Ошибки обработки запроса
#[derive(Debug, Error)]
pub enum AppError {
    /// Клиент передал некорректные данные
    #[error("{0}")]
    InvalidInput(String),

    /// Запрос корректен, но данных для документа нет
    #[error("{0}")]
    NotFound(String),

    /// Портал недоступен или вернул ошибку
    #[error("Bitrix24 error: {0}")]
    Remote(String),

    /// У вебхука нет нужных прав (скоупов)
    #[error("{0}")]
    Configuration(String),

    /// Превышен лимит запросов
    #[error("Rate limit exceeded, retry in {retry_after_secs} s")]
    RateLimited { retry_after_secs: u64 },

    /// Внутренняя ошибка, детали только в логах
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Remote(format!("request timed out: {err}"))
        } else {
            AppError::Remote(format!("transport failure: {err}"))
        }
    }
}

/// Тело ответа при ошибке
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Remote(_) | AppError::Configuration(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = match self {
            AppError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let mut builder = HttpResponse::build(status);
        if let AppError::RateLimited { retry_after_secs } = self {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
        }

        builder.json(ErrorEnvelope {
            status: "error",
            code: status.as_u16(),
            message,
        })
    }
}
