//! Проверка подписи запроса (HMAC-SHA256 от метки времени)

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use super::Clock;

type HmacSha256 = Hmac<Sha256>;

/// Допустимое расхождение часов клиента и сервера, мс
pub const SIGNATURE_WINDOW_MS: u64 = 5 * 60_000;

/// Проверка подписи `sig` над меткой `ts` (Unix, миллисекунды)
pub struct SignatureVerifier {
    secret: String,
    clock: Arc<dyn Clock>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret.into(),
            clock,
        }
    }

    /// `true`, только если обе части есть, метка свежая и подпись совпала
    pub fn verify(&self, signature: Option<&str>, timestamp: Option<&str>) -> bool {
        let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
            return false;
        };

        let Ok(ts_ms) = timestamp.trim().parse::<i64>() else {
            return false;
        };

        let now_ms = self.clock.now().timestamp_millis();
        if now_ms.abs_diff(ts_ms) > SIGNATURE_WINDOW_MS {
            return false;
        }

        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.as_bytes());

        // verify_slice сравнивает за постоянное время
        mac.verify_slice(&expected).is_ok()
    }
}

/// Подписать метку времени (hex в нижнем регистре)
#[cfg(test)]
pub fn sign(secret: &str, timestamp: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
