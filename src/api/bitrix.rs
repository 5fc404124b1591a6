//! Клиент REST API Битрикс24 (входящий вебхук)

use crate::errors::{AppError, AppResult};
use crate::models::*;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::CrmGateway;

/// Клиент API Битрикс24
pub struct BitrixClient {
    client: Client,
    base_url: String,
}

impl BitrixClient {
    /// Создать новый клиент для адреса вебхука
    pub fn new(webhook_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: webhook_url.trim_end_matches('/').to_string(),
        })
    }

    /// Вызвать метод REST API и вернуть ответ целиком.
    ///
    /// Ошибкой считается как статус не 2xx, так и поле `error` в ответе.
    async fn send<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> AppResult<Value> {
        let url = format!("{}/{}", self.base_url, method);

        debug!(method, "POST request to Bitrix24");

        let response = self
            .client
            .post(&url)
            .header("Accept-Encoding", "gzip")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let data: Value = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(_) if !status.is_success() => {
                warn!(method, status = status.as_u16(), "API error response without JSON body");
                return Err(AppError::Remote(format!("HTTP {}", status.as_u16())));
            }
            Err(e) => {
                return Err(AppError::Remote(format!(
                    "malformed response to {}: {}",
                    method, e
                )));
            }
        };

        let has_error = data.get("error").is_some_and(|e| !e.is_null());
        if !status.is_success() || has_error {
            let message = platform_error_message(&data)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(method, status = status.as_u16(), %message, "API error response");
            return Err(AppError::Remote(message));
        }

        Ok(data)
    }

    /// Вызвать метод REST API и разобрать содержимое `result`
    async fn call<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> AppResult<T> {
        let data = self.send(method, body).await?;
        take_result(method, data)
    }
}

/// Содержимое `result`, а если его нет, весь ответ
fn take_result<T: DeserializeOwned>(method: &str, mut data: Value) -> AppResult<T> {
    let result = if data.get("result").is_some() {
        data["result"].take()
    } else {
        data
    };

    serde_json::from_value(result)
        .map_err(|e| AppError::Remote(format!("unexpected response to {}: {}", method, e)))
}

/// Смещение следующей страницы списка, если портал отдал не всё
fn next_page(data: &Value) -> Option<u64> {
    data.get("next").and_then(|next| match next {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Текст ошибки портала: `error_description`, иначе `error`
fn platform_error_message(data: &Value) -> Option<String> {
    let text = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    text("error_description").or_else(|| text("error"))
}

#[async_trait]
impl CrmGateway for BitrixClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn deal_product_rows(&self, deal_id: u64) -> AppResult<Vec<ProductRow>> {
        info!(deal_id, "Getting deal product rows");

        self.call("crm.deal.productrows.get", &json!({ "id": deal_id }))
            .await
    }

    async fn item_product_rows(
        &self,
        entity_type_id: u64,
        owner_id: u64,
    ) -> AppResult<Vec<ProductRow>> {
        info!(entity_type_id, owner_id, "Getting SPA item product rows");

        let method = "crm.item.productrow.list";
        let data = self
            .send(
                method,
                &json!({
                    "filter": { "ownerId": owner_id, "entityTypeId": entity_type_id },
                    "select": ["productId", "quantity", "price", "measureCode", "currencyId"],
                }),
            )
            .await?;

        if let Some(next) = next_page(&data) {
            warn!(
                entity_type_id,
                owner_id,
                next,
                total = ?data.get("total"),
                "Product rows span several pages, only the first page is used"
            );
        }

        let list: ProductRowList = take_result(method, data)?;
        Ok(list.product_rows)
    }

    async fn list_methods(&self) -> AppResult<Vec<String>> {
        debug!("Listing available REST methods");

        self.call("methods", &json!({})).await
    }

    async fn add_document(&self, fields: &DocumentFields) -> AppResult<u64> {
        info!(doc_type = fields.doc_type, "Creating inventory document");

        let result: DocumentAddResult = self
            .call("catalog.document.add", &FieldsBody { fields })
            .await?;

        result.document_id().ok_or_else(|| {
            AppError::Remote("catalog.document.add returned no document id".to_string())
        })
    }

    async fn add_document_product(&self, fields: &DocumentProductFields) -> AppResult<()> {
        debug!(
            doc_id = fields.doc_id,
            product_id = fields.product_id,
            "Adding product to inventory document"
        );

        let _: Value = self
            .call("catalog.document.product.add", &FieldsBody { fields })
            .await?;

        Ok(())
    }
}
