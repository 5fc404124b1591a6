//! Разбор и проверка параметров входящего запроса

use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::models::*;

/// Максимальная длина комментария, символов
pub const MAX_COMMENT_CHARS: usize = 500;

/// Параметры запроса в том виде, как пришли в query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocsQuery {
    pub elem_id: Option<String>,
    pub owner_type_short: Option<String>,
    pub elem_type: Option<String>,
    pub spa_type_id: Option<String>,
    pub doc_type: Option<String>,
    pub store_id: Option<String>,
    pub store_from: Option<String>,
    pub store_to: Option<String>,
    pub responsible_id: Option<String>,
    pub comment: Option<String>,
    pub ts: Option<String>,
    pub sig: Option<String>,
}

/// Пустое или из одних пробелов значение считается отсутствующим
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn positive_int(name: &str, value: &Option<String>) -> AppResult<Option<u64>> {
    let Some(raw) = present(value) else {
        return Ok(None);
    };

    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(AppError::InvalidInput(format!(
            "{} must be a positive integer, got '{}'",
            name, raw
        ))),
    }
}

/// Проверить запрос и собрать из него параметры документа.
///
/// Все проверки выполняются до любых обращений к порталу.
pub fn validate_request(query: &RawDocsQuery) -> AppResult<InventoryDocumentRequest> {
    let elem_id = positive_int("elemId", &query.elem_id)?
        .ok_or_else(|| AppError::InvalidInput("elemId is required".to_string()))?;

    let doc_type = match present(&query.doc_type) {
        Some(code) => DocType::from_code(code).ok_or_else(|| {
            AppError::InvalidInput(format!("docType must be one of A, D, M, got '{}'", code))
        })?,
        None => return Err(AppError::InvalidInput("docType is required".to_string())),
    };

    let comment = query
        .comment
        .as_ref()
        .filter(|c| !c.trim().is_empty())
        .cloned();
    if let Some(ref comment) = comment {
        let length = comment.chars().count();
        if length > MAX_COMMENT_CHARS {
            return Err(AppError::InvalidInput(format!(
                "comment must be at most {} characters, got {}",
                MAX_COMMENT_CHARS, length
            )));
        }
    }

    let spa_type_id = positive_int("spaTypeId", &query.spa_type_id)?;
    let store_id = positive_int("storeId", &query.store_id)?;
    let store_from = positive_int("storeFrom", &query.store_from)?;
    let store_to = positive_int("storeTo", &query.store_to)?;
    let responsible_id = positive_int("responsibleId", &query.responsible_id)?;

    let stores = resolve_stores(doc_type, store_id, store_from, store_to)?;

    let owner = resolve_owner(
        elem_id,
        present(&query.owner_type_short),
        present(&query.elem_type),
        spa_type_id,
    )?;

    Ok(InventoryDocumentRequest {
        doc_type,
        owner,
        stores,
        responsible_id,
        comment,
        signature: SignatureParams {
            ts: query.ts.clone(),
            sig: query.sig.clone(),
        },
    })
}

/// Склады, обязательные для данного типа документа
pub fn resolve_stores(
    doc_type: DocType,
    store_id: Option<u64>,
    store_from: Option<u64>,
    store_to: Option<u64>,
) -> AppResult<StoreAssignment> {
    match doc_type {
        DocType::Transfer => match (store_from, store_to) {
            (Some(from), Some(to)) => Ok(StoreAssignment::Transfer { from, to }),
            _ => Err(AppError::InvalidInput(
                "storeFrom and storeTo are required for docType=M".to_string(),
            )),
        },
        DocType::Receipt | DocType::WriteOff => store_id
            .map(|store_id| StoreAssignment::Single { store_id })
            .ok_or_else(|| {
                AppError::InvalidInput("storeId is required for docType=A|D".to_string())
            }),
    }
}

/// Определить владельца товарных строк.
///
/// Краткий код `ownerTypeShort` важнее пары `elemType` + `spaTypeId`.
pub fn resolve_owner(
    element_id: u64,
    owner_type_short: Option<&str>,
    elem_type: Option<&str>,
    spa_type_id: Option<u64>,
) -> AppResult<Owner> {
    let spa = |entity_type_id| Owner::DynamicEntity {
        element_id,
        entity_type_id,
    };

    match owner_type_short {
        Some("D") => return Ok(Owner::Deal { element_id }),
        Some("S") => {
            return spa_type_id.map(spa).ok_or_else(|| {
                AppError::InvalidInput("spaTypeId is required for ownerTypeShort=S".to_string())
            });
        }
        Some(other) => {
            return Err(AppError::InvalidInput(format!(
                "ownerTypeShort must be D or S, got '{}'",
                other
            )));
        }
        None => {}
    }

    match (elem_type, spa_type_id) {
        (Some("D"), _) => Ok(Owner::Deal { element_id }),
        (Some("S"), Some(entity_type_id)) => Ok(spa(entity_type_id)),
        (Some(other), _) if other != "S" => Err(AppError::InvalidInput(format!(
            "elemType must be D or S, got '{}'",
            other
        ))),
        _ => Err(AppError::InvalidInput(
            "Owner not specified. Provide ownerTypeShort=D|S or elemType+spaTypeId for SPA"
                .to_string(),
        )),
    }
}
