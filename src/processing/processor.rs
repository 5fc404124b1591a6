//! Обработка запроса: проверка, товарные строки, документ, отправка

use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{BitrixClient, CrmGateway, MockGateway};
use crate::config::Settings;
use crate::errors::{AppError, AppResult};
use crate::models::*;

use super::documents::{build_document, DocumentParams};
use super::fetcher::fetch_product_rows;
use super::signature::SignatureVerifier;
use super::submitter::DocumentSubmitter;
use super::validator::{validate_request, RawDocsQuery};
use super::{CapabilityCache, Clock, InMemoryCapabilityCache, SystemClock};

/// Итог обработки одного запроса
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub owner: Owner,
    pub doc_type: DocType,
    pub stores: StoreAssignment,
    pub rows_found: usize,
    pub rows_processed: usize,
    pub document_id: u64,
}

/// Конвейер создания складского документа
pub struct DocumentPipeline {
    gateway: Arc<dyn CrmGateway>,
    submitter: DocumentSubmitter,
    verifier: Option<SignatureVerifier>,
    default_currency: String,
}

impl DocumentPipeline {
    /// Создать конвейер из готовых частей
    pub fn new(
        gateway: Arc<dyn CrmGateway>,
        cache: Arc<dyn CapabilityCache>,
        verifier: Option<SignatureVerifier>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            submitter: DocumentSubmitter::new(gateway.clone(), cache),
            gateway,
            verifier,
            default_currency: default_currency.into(),
        }
    }

    /// Создать конвейер по настройкам
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let gateway: Arc<dyn CrmGateway> = if settings.mock_mode {
            warn!("B24_MOCK=1: Bitrix24 calls are simulated");
            Arc::new(MockGateway)
        } else {
            let url = settings
                .webhook_url
                .as_deref()
                .context("B24_WEBHOOK_URL is not configured")?;
            Arc::new(BitrixClient::new(url)?)
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = Arc::new(InMemoryCapabilityCache::new(clock.clone()));
        let verifier = settings
            .sign_key
            .as_ref()
            .map(|key| SignatureVerifier::new(key.clone(), clock));

        Ok(Self::new(
            gateway,
            cache,
            verifier,
            settings.default_currency.clone(),
        ))
    }

    /// Проверить подпись, если задан секрет и клиент прислал подпись
    fn check_signature(&self, params: &SignatureParams) -> AppResult<()> {
        let Some(verifier) = &self.verifier else {
            return Ok(());
        };

        if !params.is_present() {
            debug!("No signature supplied, check skipped");
            return Ok(());
        }

        if verifier.verify(params.sig.as_deref(), params.ts.as_deref()) {
            Ok(())
        } else {
            Err(AppError::InvalidInput("Invalid signature".to_string()))
        }
    }

    /// Обработать запрос целиком
    pub async fn process(&self, query: &RawDocsQuery) -> AppResult<ProcessOutcome> {
        let request = validate_request(query)?;
        self.check_signature(&request.signature)?;

        // 1) Товарные строки владельца
        let rows = fetch_product_rows(self.gateway.as_ref(), &request.owner).await?;

        // 2) Складской документ
        let payload = build_document(
            &DocumentParams::from_request(&request, &rows),
            &self.default_currency,
        )?;

        // 3) Шапка и строки на портале
        let outcome = self.submitter.submit(&payload).await?;

        info!(
            owner = request.owner.label(),
            doc_type = %request.doc_type,
            elem_id = request.owner.element_id(),
            stores = ?request.stores,
            rows_found = rows.len(),
            rows_processed = outcome.items_processed,
            document_id = outcome.document_id,
            "Inventory document created"
        );

        Ok(ProcessOutcome {
            owner: request.owner,
            doc_type: request.doc_type,
            stores: request.stores,
            rows_found: rows.len(),
            rows_processed: outcome.items_processed,
            document_id: outcome.document_id,
        })
    }
}
