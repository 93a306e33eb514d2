//! Shared types, error model, configuration, and collaborator contracts.
//!
//! This crate is the foundation depended on by all other workspace members.
//! It provides:
//! - [`EntidadesError`] — the unified error type
//! - Domain types ([`EntityStub`], [`DetailInfo`], [`OutputRecord`], [`WorkRange`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)
//! - Collaborator contracts ([`Session`], [`RecordSink`])

pub mod config;
pub mod error;
pub mod session;
pub mod sink;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, RetryConfig, RunConfig, RunDefaults, TargetConfig, TimeoutsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{EntidadesError, Result};
pub use session::{SelectorOutcome, Session, SessionFactory};
pub use sink::RecordSink;
pub use types::{
    DetailInfo, EntityStub, FETCH_FAILED, NOT_AVAILABLE, OutputRecord, WorkRange,
};
