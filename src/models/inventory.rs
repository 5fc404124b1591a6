//! Складские документы: параметры запроса и нормализованный документ

use serde::{Serialize, Serializer};
use std::fmt;

/// Тип складского документа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    /// Приход (A)
    Receipt,
    /// Списание (D)
    WriteOff,
    /// Перемещение (M)
    Transfer,
}

impl DocType {
    /// Код типа в API Битрикс24
    pub fn code(self) -> &'static str {
        match self {
            DocType::Receipt => "A",
            DocType::WriteOff => "D",
            DocType::Transfer => "M",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(DocType::Receipt),
            "D" => Some(DocType::WriteOff),
            "M" => Some(DocType::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for DocType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Владелец товарных строк
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Сделка
    Deal { element_id: u64 },
    /// Элемент смарт-процесса
    DynamicEntity { element_id: u64, entity_type_id: u64 },
}

impl Owner {
    pub fn element_id(&self) -> u64 {
        match self {
            Owner::Deal { element_id } | Owner::DynamicEntity { element_id, .. } => *element_id,
        }
    }

    /// Метка владельца в ответе и логах
    pub fn label(&self) -> &'static str {
        match self {
            Owner::Deal { .. } => "deal",
            Owner::DynamicEntity { .. } => "spa",
        }
    }
}

/// Склады документа: один для прихода/списания, пара для перемещения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StoreAssignment {
    Single {
        #[serde(rename = "id")]
        store_id: u64,
    },
    Transfer {
        from: u64,
        to: u64,
    },
}

/// Необязательная подпись запроса
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureParams {
    pub ts: Option<String>,
    pub sig: Option<String>,
}

impl SignatureParams {
    /// Передал ли клиент хоть что-то из пары
    pub fn is_present(&self) -> bool {
        self.ts.is_some() || self.sig.is_some()
    }
}

/// Проверенные параметры входящего запроса
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryDocumentRequest {
    pub doc_type: DocType,
    pub owner: Owner,
    pub stores: StoreAssignment,
    pub responsible_id: Option<u64>,
    pub comment: Option<String>,
    pub signature: SignatureParams,
}

/// Строка складского документа
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadProduct {
    pub product_id: u64,
    pub quantity: f64,
    /// Не подставляется нулём до отправки
    pub price: Option<f64>,
    pub currency: String,
    pub measure_code: Option<i64>,
}

/// Нормализованный складской документ, готовый к отправке
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryPayload {
    pub doc_type: DocType,
    pub stores: StoreAssignment,
    pub comment: Option<String>,
    pub responsible_id: Option<u64>,
    pub currency: String,
    pub products: Vec<PayloadProduct>,
}

/// Итог отправки документа
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub document_id: u64,
    pub items_processed: usize,
}
