//! Конфигурация приложения

mod settings;

pub use settings::{LogFormat, Settings};
