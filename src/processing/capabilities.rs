//! Кэш методов REST API, доступных вебхуку

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::Clock;

/// Набор имён методов (в нижнем регистре)
pub type MethodSet = Arc<HashSet<String>>;

/// Хранилище списков методов по точкам входа
#[async_trait]
pub trait CapabilityCache: Send + Sync {
    /// Список методов, если запись есть и не устарела
    async fn get(&self, endpoint: &str) -> Option<MethodSet>;

    /// Сохранить список на `ttl`
    async fn put(&self, endpoint: &str, methods: MethodSet, ttl: TimeDelta);
}

#[derive(Debug, Clone)]
struct CapabilityEntry {
    methods: MethodSet,
    expires_at: DateTime<Utc>,
}

/// Кэш в памяти процесса
pub struct InMemoryCapabilityCache {
    entries: RwLock<HashMap<String, CapabilityEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCapabilityCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl CapabilityCache for InMemoryCapabilityCache {
    async fn get(&self, endpoint: &str) -> Option<MethodSet> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            match entries.get(endpoint) {
                Some(entry) if entry.expires_at > now => return Some(entry.methods.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(endpoint)
            .is_some_and(|entry| entry.expires_at <= now)
        {
            entries.remove(endpoint);
        }

        None
    }

    async fn put(&self, endpoint: &str, methods: MethodSet, ttl: TimeDelta) {
        if ttl <= TimeDelta::zero() {
            return;
        }

        let expires_at = self.clock.now() + ttl;

        self.entries
            .write()
            .await
            .insert(endpoint.to_string(), CapabilityEntry { methods, expires_at });
    }
}
