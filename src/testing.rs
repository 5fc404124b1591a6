//! Подделки для тестов: записывающий портал и ручные часы

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::sync::Mutex;

use crate::api::CrmGateway;
use crate::errors::{AppError, AppResult};
use crate::models::*;
use crate::processing::{Clock, REQUIRED_METHODS};

/// Вызов портала, записанный подделкой
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    DealRows(u64),
    ItemRows { entity_type_id: u64, owner_id: u64 },
    ListMethods,
    AddDocument(DocumentFields),
    AddProduct(DocumentProductFields),
}

/// Портал в памяти, запоминающий все вызовы
pub struct FakeGateway {
    pub rows: Vec<ProductRow>,
    pub methods: Vec<String>,
    pub document_id: u64,
    pub fail_rows: Option<String>,
    pub fail_header: Option<String>,
    /// Номер строки (с нуля), на которой `add_document_product` упадёт
    pub fail_product_at: Option<usize>,
    pub calls: Mutex<Vec<GatewayCall>>,
}

impl FakeGateway {
    pub fn with_rows(rows: Vec<ProductRow>) -> Self {
        Self {
            rows,
            methods: REQUIRED_METHODS.iter().map(|m| m.to_string()).collect(),
            document_id: 4242,
            fail_rows: None,
            fail_header: None,
            fail_product_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_method(mut self, method: &str) -> Self {
        self.methods.retain(|m| m != method);
        self
    }

    pub fn failing_rows(mut self, message: &str) -> Self {
        self.fail_rows = Some(message.to_string());
        self
    }

    pub fn failing_header(mut self, message: &str) -> Self {
        self.fail_header = Some(message.to_string());
        self
    }

    pub fn failing_product_at(mut self, index: usize) -> Self {
        self.fail_product_at = Some(index);
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&GatewayCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn headers(&self) -> Vec<DocumentFields> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::AddDocument(fields) => Some(fields),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn rows_result(&self) -> AppResult<Vec<ProductRow>> {
        match &self.fail_rows {
            Some(message) => Err(AppError::Remote(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}

#[async_trait]
impl CrmGateway for FakeGateway {
    fn endpoint(&self) -> &str {
        "https://fake.bitrix24.test/rest/1/token"
    }

    async fn deal_product_rows(&self, deal_id: u64) -> AppResult<Vec<ProductRow>> {
        self.record(GatewayCall::DealRows(deal_id));
        self.rows_result()
    }

    async fn item_product_rows(
        &self,
        entity_type_id: u64,
        owner_id: u64,
    ) -> AppResult<Vec<ProductRow>> {
        self.record(GatewayCall::ItemRows {
            entity_type_id,
            owner_id,
        });
        self.rows_result()
    }

    async fn list_methods(&self) -> AppResult<Vec<String>> {
        self.record(GatewayCall::ListMethods);
        Ok(self.methods.clone())
    }

    async fn add_document(&self, fields: &DocumentFields) -> AppResult<u64> {
        self.record(GatewayCall::AddDocument(fields.clone()));
        match &self.fail_header {
            Some(message) => Err(AppError::Remote(message.clone())),
            None => Ok(self.document_id),
        }
    }

    async fn add_document_product(&self, fields: &DocumentProductFields) -> AppResult<()> {
        let index = self.count(|c| matches!(c, GatewayCall::AddProduct(_)));
        self.record(GatewayCall::AddProduct(fields.clone()));

        if self.fail_product_at == Some(index) {
            return Err(AppError::Remote("ERROR_CORE".to_string()));
        }
        Ok(())
    }
}

/// Часы, которые двигаются только вручную
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
