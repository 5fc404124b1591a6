//! Складские документы Битрикс24 по товарным строкам
//!
//! Сервис принимает вебхук с идентификатором сделки или элемента смарт-процесса,
//! забирает его товарные строки и создаёт по ним складской документ
//! (приход, списание или перемещение) через REST API того же портала.

use actix_web::{App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod errors;
mod handlers;
mod models;
mod processing;
#[cfg(test)]
mod testing;

use config::{LogFormat, Settings};
use handlers::AppState;
use processing::DocumentPipeline;

fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&settings.log_level)
        .with_context(|| format!("Invalid LOG_LEVEL '{}'", settings.log_level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    match settings.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }

    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Загрузка конфигурации
    dotenvy::dotenv().ok();
    let settings = Settings::from_env().context("Failed to load settings")?;

    init_tracing(&settings)?;

    info!("Starting b24-inventory-docs service");
    info!("Mock mode: {}", settings.mock_mode);
    info!("Default currency: {}", settings.default_currency);
    info!("Request signatures: {}", if settings.sign_key.is_some() { "enabled" } else { "disabled" });
    info!(
        "Rate limit: {} requests per {} ms",
        settings.rate_limit_max,
        settings.rate_limit_window.as_millis()
    );

    let pipeline = DocumentPipeline::from_settings(&settings)?;
    let app_state = Arc::new(AppState::new(settings.clone(), pipeline));

    let host = settings.server_host.clone();
    let port = settings.server_port;

    info!("Starting HTTP server on {}:{}", host, port);

    // Запуск HTTP сервера
    HttpServer::new(move || App::new().configure(handlers::configure(app_state.clone())))
        .bind((host.as_str(), port))
        .with_context(|| format!("Failed to bind {}:{}", host, port))?
        .run()
        .await
        .context("HTTP server failed")?;

    Ok(())
}
