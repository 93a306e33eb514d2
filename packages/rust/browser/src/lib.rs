//! Chromium implementation of the browsing-session contract.
//!
//! The contract itself ([`Session`], [`SessionFactory`]) lives in
//! `entidades-shared`; this crate provides the production implementation:
//! - [`ChromeFactory`] — launches one Chromium process per worker
//! - [`ChromeSession`] — drives that process over CDP with per-call timeouts

pub mod chrome;

pub use chrome::{ChromeFactory, ChromeSession};

// Re-exported so callers can name the contract without a second import.
pub use entidades_shared::session::{SelectorOutcome, Session, SessionFactory};
