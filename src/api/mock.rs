//! Заглушка портала для режима B24_MOCK=1

use crate::errors::AppResult;
use crate::models::*;
use crate::processing::REQUIRED_METHODS;
use async_trait::async_trait;
use tracing::info;

use super::CrmGateway;

/// ID документа, который «создаёт» заглушка
const MOCK_DOCUMENT_ID: u64 = 999;

/// Портал без сети: фиксированные строки, все методы доступны
#[derive(Debug, Default)]
pub struct MockGateway;

#[async_trait]
impl CrmGateway for MockGateway {
    fn endpoint(&self) -> &str {
        "mock"
    }

    async fn deal_product_rows(&self, deal_id: u64) -> AppResult<Vec<ProductRow>> {
        info!(deal_id, "Mock mode: returning canned deal rows");
        Ok(vec![ProductRow::new(101, 2.0)])
    }

    async fn item_product_rows(
        &self,
        entity_type_id: u64,
        owner_id: u64,
    ) -> AppResult<Vec<ProductRow>> {
        info!(entity_type_id, owner_id, "Mock mode: returning canned SPA rows");
        Ok(vec![ProductRow::new(202, 5.0)])
    }

    async fn list_methods(&self) -> AppResult<Vec<String>> {
        Ok(REQUIRED_METHODS.iter().map(|m| m.to_string()).collect())
    }

    async fn add_document(&self, _fields: &DocumentFields) -> AppResult<u64> {
        Ok(MOCK_DOCUMENT_ID)
    }

    async fn add_document_product(&self, _fields: &DocumentProductFields) -> AppResult<()> {
        Ok(())
    }
}
