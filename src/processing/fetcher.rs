//! Получение товарных строк владельца

use tracing::info;

use crate::api::CrmGateway;
use crate::errors::{AppError, AppResult};
use crate::models::{Owner, ProductRow};

/// Получить товарные строки сделки или элемента смарт-процесса
pub async fn fetch_product_rows(
    gateway: &dyn CrmGateway,
    owner: &Owner,
) -> AppResult<Vec<ProductRow>> {
    let rows = match *owner {
        Owner::Deal { element_id } => gateway.deal_product_rows(element_id).await?,
        Owner::DynamicEntity {
            element_id,
            entity_type_id,
        } => gateway.item_product_rows(entity_type_id, element_id).await?,
    };

    if rows.is_empty() {
        return Err(AppError::NotFound("No product rows for element".to_string()));
    }

    info!(
        owner = owner.label(),
        elem_id = owner.element_id(),
        rows = rows.len(),
        "Fetched product rows"
    );

    Ok(rows)
}
