//! Отправка складского документа на портал

use chrono::TimeDelta;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::CrmGateway;
use crate::errors::{AppError, AppResult};
use crate::models::*;

use super::capabilities::{CapabilityCache, MethodSet};

/// Методы, без которых документ не создать
pub const REQUIRED_METHODS: [&str; 3] = [
    "catalog.document.add",
    "catalog.document.product.add",
    "catalog.store.list",
];

/// Срок жизни списка методов в кэше, секунд
pub const CAPABILITY_TTL_SECS: i64 = 5 * 60;

/// Отправщик документов: проверка прав, шапка, строки
pub struct DocumentSubmitter {
    gateway: Arc<dyn CrmGateway>,
    cache: Arc<dyn CapabilityCache>,
}

impl DocumentSubmitter {
    pub fn new(gateway: Arc<dyn CrmGateway>, cache: Arc<dyn CapabilityCache>) -> Self {
        Self { gateway, cache }
    }

    /// Методы вебхука: из кэша или с портала
    async fn available_methods(&self) -> AppResult<MethodSet> {
        let endpoint = self.gateway.endpoint();

        if let Some(methods) = self.cache.get(endpoint).await {
            return Ok(methods);
        }

        debug!("Capability cache miss, listing methods");

        let methods: HashSet<String> = self
            .gateway
            .list_methods()
            .await?
            .into_iter()
            .map(|m| m.to_lowercase())
            .collect();
        let methods = Arc::new(methods);

        self.cache
            .put(
                endpoint,
                methods.clone(),
                TimeDelta::seconds(CAPABILITY_TTL_SECS),
            )
            .await;

        Ok(methods)
    }

    /// Убедиться, что вебхуку доступны все нужные методы
    pub async fn ensure_capabilities(&self) -> AppResult<()> {
        let methods = self.available_methods().await?;

        let missing: Vec<&str> = REQUIRED_METHODS
            .iter()
            .copied()
            .filter(|m| !methods.contains(*m))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        warn!(missing = ?missing, "Webhook lacks required inventory methods");

        Err(AppError::Configuration(format!(
            "Bitrix24 webhook cannot call {}. Grant the 'catalog' scope to the incoming webhook and retry",
            missing.join(", ")
        )))
    }

    /// Создать документ и все его строки.
    ///
    /// Строки отправляются по одной, в исходном порядке. При ошибке на
    /// строке уже созданные шапка и строки остаются на портале.
    pub async fn submit(&self, payload: &InventoryPayload) -> AppResult<SubmissionOutcome> {
        self.ensure_capabilities().await?;

        let document_id = self.gateway.add_document(&header_fields(payload)).await?;

        info!(
            document_id,
            doc_type = %payload.doc_type,
            products = payload.products.len(),
            "Inventory document header created"
        );

        let total = payload.products.len();
        for (processed, product) in payload.products.iter().enumerate() {
            let fields = product_fields(document_id, product, &payload.currency);

            if let Err(e) = self.gateway.add_document_product(&fields).await {
                error!(
                    document_id,
                    product_id = product.product_id,
                    processed,
                    total,
                    error = %e,
                    "Failed to add product line, document left incomplete"
                );

                return Err(match e {
                    AppError::Remote(message) => AppError::Remote(format!(
                        "{} (document {} kept {} of {} lines)",
                        message, document_id, processed, total
                    )),
                    other => other,
                });
            }
        }

        Ok(SubmissionOutcome {
            document_id,
            items_processed: total,
        })
    }
}

/// Поля шапки: ровно один из вариантов складов
pub fn header_fields(payload: &InventoryPayload) -> DocumentFields {
    let (store_id, store_from, store_to) = match payload.stores {
        StoreAssignment::Single { store_id } => (Some(store_id), None, None),
        StoreAssignment::Transfer { from, to } => (None, Some(from), Some(to)),
    };

    DocumentFields {
        doc_type: payload.doc_type.code(),
        currency: payload.currency.clone(),
        comment: payload.comment.clone(),
        responsible_id: payload.responsible_id,
        store_id,
        store_from,
        store_to,
    }
}

/// Поля строки: своя валюта товара, иначе валюта документа; цена по умолчанию 0
pub fn product_fields(
    document_id: u64,
    product: &PayloadProduct,
    document_currency: &str,
) -> DocumentProductFields {
    let currency = if product.currency.is_empty() {
        document_currency
    } else {
        &product.currency
    };

    DocumentProductFields {
        doc_id: document_id,
        product_id: product.product_id,
        quantity: product.quantity,
        price: product.price.unwrap_or(0.0),
        currency: currency.to_string(),
        measure_code: product.measure_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::InMemoryCapabilityCache;
    use crate::testing::{FakeGateway, GatewayCall, ManualClock};

    fn payload(stores: StoreAssignment, doc_type: DocType) -> InventoryPayload {
        InventoryPayload {
            doc_type,
            stores,
            comment: Some("тест".to_string()),
            responsible_id: None,
            currency: "RUB".to_string(),
            products: vec![
                PayloadProduct {
                    product_id: 101,
                    quantity: 2.0,
                    price: None,
                    currency: "RUB".to_string(),
                    measure_code: None,
                },
                PayloadProduct {
                    product_id: 102,
                    quantity: 1.5,
                    price: Some(10.0),
                    currency: "EUR".to_string(),
                    measure_code: Some(796),
                },
            ],
        }
    }

    fn submitter(gateway: &Arc<FakeGateway>, clock: &Arc<ManualClock>) -> DocumentSubmitter {
        DocumentSubmitter::new(
            gateway.clone(),
            Arc::new(InMemoryCapabilityCache::new(clock.clone())),
        )
    }

    #[tokio::test]
    async fn creates_header_then_lines_in_order() {
        let gateway = Arc::new(FakeGateway::with_rows(vec![]));
        let clock = Arc::new(ManualClock::default());

        let outcome = submitter(&gateway, &clock)
            .submit(&payload(
                StoreAssignment::Single { store_id: 5 },
                DocType::Receipt,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.document_id, gateway.document_id);
        assert_eq!(outcome.items_processed, 2);

        let calls = gateway.calls();
        assert_eq!(calls[0], GatewayCall::ListMethods);

        let GatewayCall::AddDocument(ref header) = calls[1] else {
            panic!("expected header call, got {:?}", calls[1]);
        };
        assert_eq!(header.doc_type, "A");
        assert_eq!(header.store_id, Some(5));
        assert_eq!(header.store_from, None);
        assert_eq!(header.store_to, None);
        assert_eq!(header.comment.as_deref(), Some("тест"));

        let lines: Vec<&DocumentProductFields> = calls
            .iter()
            .filter_map(|c| match c {
                GatewayCall::AddProduct(fields) => Some(fields),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, 101);
        assert_eq!(lines[0].price, 0.0);
        assert_eq!(lines[0].currency, "RUB");
        assert_eq!(lines[1].product_id, 102);
        assert_eq!(lines[1].currency, "EUR");
        assert_eq!(lines[1].measure_code, Some(796));
        assert!(lines.iter().all(|l| l.doc_id == gateway.document_id));
    }

    #[tokio::test]
    async fn transfer_header_carries_both_stores_only() {
        let gateway = Arc::new(FakeGateway::with_rows(vec![]));
        let clock = Arc::new(ManualClock::default());

        submitter(&gateway, &clock)
            .submit(&payload(
                StoreAssignment::Transfer { from: 1, to: 2 },
                DocType::Transfer,
            ))
            .await
            .unwrap();

        let header = gateway.headers().remove(0);
        assert_eq!(header.doc_type, "M");
        assert_eq!(header.store_id, None);
        assert_eq!(header.store_from, Some(1));
        assert_eq!(header.store_to, Some(2));
    }

    #[tokio::test]
    async fn missing_method_is_configuration_error_without_header_call() {
        let gateway =
            Arc::new(FakeGateway::with_rows(vec![]).without_method("catalog.document.product.add"));
        let clock = Arc::new(ManualClock::default());

        let err = submitter(&gateway, &clock)
            .submit(&payload(
                StoreAssignment::Single { store_id: 5 },
                DocType::Receipt,
            ))
            .await
            .unwrap_err();

        match err {
            AppError::Configuration(message) => {
                assert!(message.contains("catalog.document.product.add"));
                assert!(message.contains("catalog"));
            }
            other => panic!("expected Configuration, got {:?}", other),
        }
        assert_eq!(gateway.calls(), vec![GatewayCall::ListMethods]);
    }

    #[tokio::test]
    async fn method_list_is_cached_until_ttl() {
        let gateway = Arc::new(FakeGateway::with_rows(vec![]));
        let clock = Arc::new(ManualClock::default());
        let submitter = submitter(&gateway, &clock);

        submitter.ensure_capabilities().await.unwrap();
        clock.advance(TimeDelta::minutes(4));
        submitter.ensure_capabilities().await.unwrap();
        assert_eq!(gateway.count(|c| matches!(c, GatewayCall::ListMethods)), 1);

        clock.advance(TimeDelta::minutes(2));
        submitter.ensure_capabilities().await.unwrap();
        assert_eq!(gateway.count(|c| matches!(c, GatewayCall::ListMethods)), 2);
    }

    #[tokio::test]
    async fn method_names_are_compared_case_insensitively() {
        let gateway = Arc::new(FakeGateway {
            methods: REQUIRED_METHODS.iter().map(|m| m.to_uppercase()).collect(),
            ..FakeGateway::with_rows(vec![])
        });
        let clock = Arc::new(ManualClock::default());

        submitter(&gateway, &clock).ensure_capabilities().await.unwrap();
    }

    #[tokio::test]
    async fn line_failure_stops_remaining_lines_without_rollback() {
        let gateway = Arc::new(FakeGateway::with_rows(vec![]).failing_product_at(1));
        let clock = Arc::new(ManualClock::default());

        let err = submitter(&gateway, &clock)
            .submit(&payload(
                StoreAssignment::Single { store_id: 5 },
                DocType::WriteOff,
            ))
            .await
            .unwrap_err();

        match err {
            AppError::Remote(message) => assert!(message.contains("kept 1 of 2 lines")),
            other => panic!("expected Remote, got {:?}", other),
        }
        assert_eq!(gateway.headers().len(), 1);
        assert_eq!(gateway.count(|c| matches!(c, GatewayCall::AddProduct(_))), 2);
    }

    #[tokio::test]
    async fn header_failure_aborts_before_lines() {
        let gateway = Arc::new(FakeGateway::with_rows(vec![]).failing_header("QUERY_LIMIT_EXCEEDED"));
        let clock = Arc::new(ManualClock::default());

        let err = submitter(&gateway, &clock)
            .submit(&payload(
                StoreAssignment::Single { store_id: 5 },
                DocType::Receipt,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Remote(ref m) if m == "QUERY_LIMIT_EXCEEDED"));
        assert_eq!(gateway.count(|c| matches!(c, GatewayCall::AddProduct(_))), 0);
    }
}
