//! # sitor-store
//!
//! Document storage for the Sitor backend, backed by an embedded SQLite file.
//!
//! Documents are JSON objects grouped into named collections. The
//! [`DocumentStore`] trait exposes collection-scoped CRUD with equality
//! filters; [`Database`] implements it over a `rusqlite::Connection`. Each
//! entity module layers a typed extension trait on top of `DocumentStore`, so
//! any implementation (including test doubles) gets the typed helpers for free.

pub mod camera_status;
pub mod chat_history;
pub mod database;
pub mod detections;
pub mod documents;
pub mod groups;
pub mod history;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use camera_status::CameraStatusStore;
pub use chat_history::ChatHistoryStore;
pub use database::Database;
pub use detections::DetectionStore;
pub use documents::{Document, DocumentStore, Filter, Update, UpdateOutcome};
pub use error::{Result, StoreError};
pub use groups::GroupStore;
pub use history::HistoryStore;
pub use models::*;
pub use users::UserStore;
