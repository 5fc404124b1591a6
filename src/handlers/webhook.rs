//! Обработчики HTTP запросов

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::Settings;
use crate::errors::AppError;
use crate::models::{DocType, StoreAssignment};
use crate::processing::{DocumentPipeline, ProcessOutcome, RawDocsQuery};

use super::RateLimiter;

/// Состояние приложения
pub struct AppState {
    pub settings: Settings,
    pub pipeline: DocumentPipeline,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(settings: Settings, pipeline: DocumentPipeline) -> Self {
        let rate_limiter = RateLimiter::new(settings.rate_limit_max, settings.rate_limit_window);
        Self {
            settings,
            pipeline,
            rate_limiter,
        }
    }
}

/// Тело успешного ответа
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub status: &'static str,
    pub owner: &'static str,
    pub elem_id: u64,
    pub doc_type: DocType,
    pub stores: StoreAssignment,
    pub rows_found: usize,
    pub rows_processed: usize,
    pub message: String,
}

impl From<ProcessOutcome> for ProcessResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        Self {
            status: "ok",
            owner: outcome.owner.label(),
            elem_id: outcome.owner.element_id(),
            doc_type: outcome.doc_type,
            stores: outcome.stores,
            rows_found: outcome.rows_found,
            rows_processed: outcome.rows_processed,
            message: format!("Document created: {}", outcome.document_id),
        }
    }
}

/// Health check endpoint
pub async fn health(state: web::Data<Arc<AppState>>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "b24-inventory-docs",
        "mock": state.settings.mock_mode,
    }))
}

/// Создание складского документа по товарным строкам сделки или смарт-процесса
pub async fn process_docs_external(
    state: web::Data<Arc<AppState>>,
    req: HttpRequest,
    query: web::Query<RawDocsQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let span = info_span!(
        "process_docs_external",
        request_id = %Uuid::new_v4(),
        method = %req.method(),
    );

    async move {
        let client = req
            .peer_addr()
            .map(|addr| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        state.rate_limiter.check(client).await?;

        let start = Instant::now();
        let result = state.pipeline.process(&query).await;

        match &result {
            Ok(outcome) => info!(document_id = outcome.document_id, "Request succeeded"),
            Err(e) => error!(error = %e, query = ?query, "Failed to process /process_docs_external request"),
        }

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            route = "/process_docs_external",
            doc_type = query.doc_type.as_deref().unwrap_or(""),
            elem_id = query.elem_id.as_deref().unwrap_or(""),
            "Processed /process_docs_external"
        );

        let outcome = result?;
        Ok::<_, AppError>(HttpResponse::Ok().json(ProcessResponse::from(outcome)))
    }
    .instrument(span)
    .await
}
