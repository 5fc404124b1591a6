//! Создание складских документов

mod capabilities;
mod clock;
mod documents;
mod fetcher;
mod processor;
mod signature;
mod submitter;
mod validator;

pub use capabilities::{CapabilityCache, InMemoryCapabilityCache};
pub use clock::{Clock, SystemClock};
pub use processor::{DocumentPipeline, ProcessOutcome};
pub use submitter::REQUIRED_METHODS;
pub use validator::RawDocsQuery;
