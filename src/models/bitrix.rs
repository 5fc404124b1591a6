//! Типы данных для REST API Битрикс24

use serde::{Deserialize, Serialize};

/// Числовое значение, которое портал может прислать строкой
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Конечное число или `None`
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Целое число (дробная часть должна быть нулевой)
    pub fn as_i64(&self) -> Option<i64> {
        let value = self.as_f64()?;
        if value.fract() != 0.0 || value < i64::MIN as f64 || value > i64::MAX as f64 {
            return None;
        }
        Some(value as i64)
    }

    /// Положительный идентификатор
    pub fn as_positive_id(&self) -> Option<u64> {
        self.as_i64().filter(|v| *v > 0).map(|v| v as u64)
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Number(value)
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_string())
    }
}

/// Товарная строка сделки или элемента смарт-процесса.
///
/// `crm.deal.productrows.get` отдаёт ключи в верхнем регистре,
/// `crm.item.productrow.list` — в camelCase; принимаются оба варианта.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    #[serde(default, alias = "PRODUCT_ID")]
    pub product_id: Option<Numeric>,
    #[serde(default, alias = "QUANTITY")]
    pub quantity: Option<Numeric>,
    #[serde(default, alias = "PRICE", skip_serializing_if = "Option::is_none")]
    pub price: Option<Numeric>,
    #[serde(default, alias = "MEASURE_CODE", skip_serializing_if = "Option::is_none")]
    pub measure_code: Option<Numeric>,
    #[serde(
        default,
        alias = "CURRENCY_ID",
        alias = "currencyId",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency: Option<String>,
}

impl ProductRow {
    /// Строка с заданным товаром и количеством
    pub fn new(product_id: u64, quantity: impl Into<Numeric>) -> Self {
        Self {
            product_id: Some(Numeric::Number(product_id as f64)),
            quantity: Some(quantity.into()),
            ..Self::default()
        }
    }
}

/// Результат `crm.item.productrow.list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRowList {
    #[serde(default, alias = "items")]
    pub product_rows: Vec<ProductRow>,
}

/// Ссылка на созданный документ
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRef {
    pub id: Numeric,
}

/// Результат `catalog.document.add`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentAddResult {
    Wrapped { document: DocumentRef },
    Bare(Numeric),
}

impl DocumentAddResult {
    /// Идентификатор созданного документа
    pub fn document_id(&self) -> Option<u64> {
        match self {
            DocumentAddResult::Wrapped { document } => document.id.as_positive_id(),
            DocumentAddResult::Bare(id) => id.as_positive_id(),
        }
    }
}

/// Поля шапки складского документа для `catalog.document.add`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFields {
    pub doc_type: &'static str,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_to: Option<u64>,
}

/// Поля строки документа для `catalog.document.product.add`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProductFields {
    pub doc_id: u64,
    pub product_id: u64,
    pub quantity: f64,
    pub price: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_code: Option<i64>,
}

/// Обёртка `{ "fields": ... }`, которую ждут методы `*.add`
#[derive(Debug, Serialize)]
pub struct FieldsBody<'a, T: Serialize> {
    pub fields: &'a T,
}
