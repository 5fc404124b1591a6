//! Конфигурация приложения

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Формат вывода логов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Настройки приложения
#[derive(Debug, Clone)]
pub struct Settings {
    /// Входящий вебхук портала Битрикс24 (с токеном в пути)
    pub webhook_url: Option<String>,

    /// Работа без портала, с фиктивными ответами
    pub mock_mode: bool,

    /// Общий секрет для подписи запросов
    pub sign_key: Option<String>,

    /// Валюта документа по умолчанию
    pub default_currency: String,

    /// Максимум запросов с одного адреса за окно
    pub rate_limit_max: u32,

    /// Длина окна лимита запросов
    pub rate_limit_window: Duration,

    /// Уровень логирования (директива EnvFilter)
    pub log_level: String,

    /// Формат логов
    pub log_format: LogFormat,

    /// Порт веб-сервера
    pub server_port: u16,

    /// Хост веб-сервера
    pub server_host: String,
}

impl Settings {
    /// Загрузить настройки из переменных окружения
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Загрузить настройки из произвольного источника
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| strip_quotes(&v))
                .filter(|v| !v.is_empty())
        };

        let mock_mode = get("B24_MOCK").is_some_and(|v| v == "1");

        let webhook_url = get("B24_WEBHOOK_URL");
        if webhook_url.is_none() && !mock_mode {
            bail!("B24_WEBHOOK_URL is not configured");
        }

        let sign_key = get("SIGN_KEY");

        let default_currency = get("DEFAULT_CURRENCY")
            .map(|v| v.to_uppercase())
            .unwrap_or_else(|| "RUB".to_string());

        let rate_limit_max = match get("RATE_LIMIT_MAX") {
            Some(v) => v.parse().context("RATE_LIMIT_MAX must be a positive integer")?,
            None => 120,
        };

        let rate_limit_window_ms: u64 = match get("RATE_LIMIT_WINDOW_MS") {
            Some(v) => v
                .parse()
                .context("RATE_LIMIT_WINDOW_MS must be a positive integer")?,
            None => 60_000,
        };

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        };

        let server_port = match get("PORT") {
            Some(v) => v.parse().context("PORT must be a valid port number")?,
            None => 3000,
        };

        let server_host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        Ok(Self {
            webhook_url,
            mock_mode,
            sign_key,
            default_currency,
            rate_limit_max,
            rate_limit_window: Duration::from_millis(rate_limit_window_ms.max(1)),
            log_level,
            log_format,
            server_port,
            server_host,
        })
    }
}

/// Remove surrounding quotes from a string value
/// Handles both single and double quotes
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();

    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            mock_mode: true,
            sign_key: None,
            default_currency: "RUB".to_string(),
            rate_limit_max: 120,
            rate_limit_window: Duration::from_secs(60),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            server_port: 3000,
            server_host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn webhook_url_is_required_outside_mock_mode() {
        let err = settings(&[]).unwrap_err();
        assert!(err.to_string().contains("B24_WEBHOOK_URL"));

        let s = settings(&[("B24_MOCK", "1")]).unwrap();
        assert!(s.mock_mode);
        assert!(s.webhook_url.is_none());
    }

    #[test]
    fn defaults_are_applied() {
        let s = settings(&[("B24_WEBHOOK_URL", "https://example.bitrix24.ru/rest/1/abc/")])
            .unwrap();

        assert_eq!(s.server_port, 3000);
        assert_eq!(s.rate_limit_max, 120);
        assert_eq!(s.rate_limit_window, Duration::from_secs(60));
        assert_eq!(s.default_currency, "RUB");
        assert_eq!(s.log_format, LogFormat::Pretty);
        assert!(s.sign_key.is_none());
    }

    #[test]
    fn quoted_values_are_unwrapped() {
        let s = settings(&[
            ("B24_WEBHOOK_URL", "\"https://example.bitrix24.ru/rest/1/abc/\""),
            ("SIGN_KEY", "'secret'"),
            ("DEFAULT_CURRENCY", "usd"),
        ])
        .unwrap();

        assert_eq!(
            s.webhook_url.as_deref(),
            Some("https://example.bitrix24.ru/rest/1/abc/")
        );
        assert_eq!(s.sign_key.as_deref(), Some("secret"));
        assert_eq!(s.default_currency, "USD");
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = settings(&[("B24_MOCK", "1"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn empty_sign_key_counts_as_absent() {
        let s = settings(&[("B24_MOCK", "1"), ("SIGN_KEY", "  ")]).unwrap();
        assert!(s.sign_key.is_none());
    }
}
