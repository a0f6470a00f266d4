//! Core access-control and visibility model for multi-user notes.
//! This crate is the single source of truth for who may see, change, share
//! and search which note.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use access::evaluator::{AccessError, AccessEvaluator, AccessResult, Action};
pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LogLevel,
};
pub use model::note::{Note, NoteContent, NoteId, NoteValidationError, PrincipalId};
pub use model::share::{Principal, Provenance, ShareGrant, VisibleNote};
pub use repo::memory_repo::MemoryStore;
pub use repo::note_repo::{NoteStore, RepoError, RepoResult, SqliteNoteStore};
pub use repo::principal_repo::{PrincipalDirectory, SqlitePrincipalDirectory};
pub use repo::share_repo::{ShareRegistry, SqliteShareRegistry};
pub use search::keyword::{SearchEngine, SearchQuery};
pub use service::note_service::{
    ErrorKind, NoteService, NoteServiceError, ServiceResult, SqliteNoteService,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
