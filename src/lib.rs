//! Dataroom - access-control engine for a virtual data room
//!
//! This crate provides the authorization core of a virtual data room
//! document-sharing platform: room-level role semantics, per-resource ACL
//! aggregation with override semantics, and session-level access gating.
//! It is an internal library; HTTP handlers, storage of file content,
//! email and billing live elsewhere and consume it.
//!
//! A request first passes through the [`session::SessionValidator`]
//! (room-level gate); resource-level operations then consult the
//! [`resolver::PermissionResolver`], which internally calls the
//! [`roles::RoomRoleModel`].

// Allow dead code for reserved/future-use structures in entity modules
#![allow(dead_code)]

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use resolver::{PermissionResolver, PermissionSet, PermissionUpdate};
pub use roles::RoomRoleModel;
pub use session::{AccessContext, AccessDecision, SessionValidator};
pub use state::AppState;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging for embedding binaries.
///
/// Priority: RUST_LOG env var > supplied level.
pub fn init_tracing(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}
