//! # sitor-server
//!
//! REST backend for collaborative study sessions with emotion detection.
//!
//! This crate provides:
//! - **Accounts**: registration, login and profile edits with Argon2id
//!   password hashes and HS256 bearer tokens
//! - **Groups**: leader-owned membership guarded by a hashed join code
//! - **Session lifecycle**: start/end transitions that reset camera status and
//!   archive the live emotion readings of the group
//! - **Detections**: one live emotion vector per member per group and a
//!   per-user summary over them
//! - **Chat history**: a per-user transcript
//!
//! All persistent state lives in one SQLite document store opened at startup.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod password;
pub mod services;
pub mod store;

pub use api::{build_router, serve, serve_until, AppState};
pub use config::ServerConfig;
pub use error::ServerError;
pub use store::Store;
