//! Доступ к порталу Битрикс24

mod bitrix;
mod mock;

pub use bitrix::BitrixClient;
pub use mock::MockGateway;

use crate::errors::AppResult;
use crate::models::{DocumentFields, DocumentProductFields, ProductRow};
use async_trait::async_trait;

/// Удалённые методы портала, которыми пользуется сервис
#[async_trait]
pub trait CrmGateway: Send + Sync {
    /// Идентичность точки входа, ключ кэша доступных методов
    fn endpoint(&self) -> &str;

    /// Товарные строки сделки (`crm.deal.productrows.get`)
    async fn deal_product_rows(&self, deal_id: u64) -> AppResult<Vec<ProductRow>>;

    /// Товарные строки элемента смарт-процесса (`crm.item.productrow.list`)
    async fn item_product_rows(
        &self,
        entity_type_id: u64,
        owner_id: u64,
    ) -> AppResult<Vec<ProductRow>>;

    /// Методы, доступные вебхуку (`methods`)
    async fn list_methods(&self) -> AppResult<Vec<String>>;

    /// Создать шапку документа, вернуть его ID (`catalog.document.add`)
    async fn add_document(&self, fields: &DocumentFields) -> AppResult<u64>;

    /// Добавить строку документа (`catalog.document.product.add`)
    async fn add_document_product(&self, fields: &DocumentProductFields) -> AppResult<()>;
}
