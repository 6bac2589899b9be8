pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod services;
pub mod state;

pub use config::{Config, EngineConfig};
pub use db::{InMemoryStore, RecordStore, SqliteStore, StoreError};
pub use error::{EngineError, EngineResult};
pub use state::PracticeEngine;
