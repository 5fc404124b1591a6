//! Сборка складского документа из товарных строк

use crate::errors::{AppError, AppResult};
use crate::models::*;

use super::validator::resolve_stores;

/// Исходные данные для сборки документа
#[derive(Debug, Clone)]
pub struct DocumentParams<'a> {
    pub doc_type: DocType,
    pub rows: &'a [ProductRow],
    pub store_id: Option<u64>,
    pub store_from: Option<u64>,
    pub store_to: Option<u64>,
    pub comment: Option<&'a str>,
    pub responsible_id: Option<u64>,
}

impl<'a> DocumentParams<'a> {
    /// Параметры из проверенного запроса
    pub fn from_request(request: &'a InventoryDocumentRequest, rows: &'a [ProductRow]) -> Self {
        let (store_id, store_from, store_to) = match request.stores {
            StoreAssignment::Single { store_id } => (Some(store_id), None, None),
            StoreAssignment::Transfer { from, to } => (None, Some(from), Some(to)),
        };

        Self {
            doc_type: request.doc_type,
            rows,
            store_id,
            store_from,
            store_to,
            comment: request.comment.as_deref(),
            responsible_id: request.responsible_id,
        }
    }
}

/// Собрать документ.
///
/// Склады проверяются здесь повторно: сборка может вызываться
/// в обход валидатора запроса.
pub fn build_document(
    params: &DocumentParams<'_>,
    default_currency: &str,
) -> AppResult<InventoryPayload> {
    if params.rows.is_empty() {
        return Err(AppError::NotFound("No product rows".to_string()));
    }

    let stores = resolve_stores(
        params.doc_type,
        params.store_id.filter(|id| *id > 0),
        params.store_from.filter(|id| *id > 0),
        params.store_to.filter(|id| *id > 0),
    )?;

    let products = params
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index + 1, row, default_currency))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(InventoryPayload {
        doc_type: params.doc_type,
        stores,
        comment: params.comment.map(str::to_string),
        responsible_id: params.responsible_id,
        currency: default_currency.to_string(),
        products,
    })
}

/// Привести строку к числам; `position` считается с единицы
fn normalize_row(
    position: usize,
    row: &ProductRow,
    default_currency: &str,
) -> AppResult<PayloadProduct> {
    let product_id = row
        .product_id
        .as_ref()
        .and_then(Numeric::as_positive_id)
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "product row {}: productId must be a positive integer",
                position
            ))
        })?;

    let quantity = row
        .quantity
        .as_ref()
        .and_then(Numeric::as_f64)
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "product row {}: quantity is not a number",
                position
            ))
        })?;

    let currency = row
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default_currency)
        .to_string();

    Ok(PayloadProduct {
        product_id,
        quantity,
        price: row.price.as_ref().and_then(Numeric::as_f64),
        currency,
        measure_code: row.measure_code.as_ref().and_then(Numeric::as_i64),
    })
}
