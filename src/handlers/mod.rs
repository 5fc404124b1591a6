//! HTTP слой: маршруты, заголовки, ограничение частоты

mod rate_limit;
mod webhook;

pub use rate_limit::RateLimiter;
pub use webhook::{health, process_docs_external, AppState};

use actix_web::middleware::DefaultHeaders;
use actix_web::web;
use std::sync::Arc;

use crate::errors::AppError;

/// Заголовки безопасности для всех ответов (без CSP)
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "no-referrer"))
        .add(("X-XSS-Protection", "0"))
        .add((
            "Strict-Transport-Security",
            "max-age=15552000; includeSubDomains",
        ))
}

/// Маршруты и общие данные приложения
pub fn configure(state: Arc<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::InvalidInput(err.to_string()).into()
            }))
            .service(
                web::scope("")
                    .wrap(security_headers())
                    .route("/health", web::get().to(health))
                    .service(
                        web::scope("/robots")
                            .route("/process_docs_external", web::route().to(process_docs_external)),
                    ),
            );
    }
}
