//! Ограничение частоты запросов с одного адреса

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Фиксированное окно на каждый адрес клиента
pub struct RateLimiter {
    max: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// `max = 0` отключает ограничение
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, client: IpAddr) -> AppResult<()> {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: IpAddr, now: Instant) -> AppResult<()> {
        if self.max == 0 {
            return Ok(());
        }

        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| now.saturating_duration_since(w.started) < self.window);

        let window = windows.entry(client).or_insert(Window {
            started: now,
            hits: 0,
        });

        if window.hits >= self.max {
            let elapsed = now.saturating_duration_since(window.started);
            let retry_after = self.window.saturating_sub(elapsed);
            return Err(AppError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        window.hits += 1;
        Ok(())
    }
}
