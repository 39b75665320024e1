//! Infrastructure layer: in-memory repositories, the lot journal, application
//! services and configuration.

pub mod config;
pub mod journal;
pub mod lot_service;
pub mod matching_service;
pub mod store;

mod integration_tests;

pub use config::{ConfigError, Settings};
pub use journal::{JournalError, LotJournal};
pub use lot_service::{LotService, ServiceError};
pub use matching_service::MatchingService;
pub use store::{InMemoryStore, KeyedStore, StoreError};
