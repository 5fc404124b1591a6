//! Модели данных

mod bitrix;
mod inventory;

pub use bitrix::*;
pub use inventory::*;
