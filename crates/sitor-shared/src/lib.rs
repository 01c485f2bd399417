//! # sitor-shared
//!
//! Domain types shared by the store and the HTTP server: document
//! identities, the six-label emotion vector, and the per-user summary
//! aggregation. Nothing in this crate performs I/O.

pub mod constants;
pub mod emotion;
pub mod error;
pub mod summary;
pub mod types;

pub use emotion::{Emotion, EmotionCounts, EmotionScores};
pub use error::SharedError;
pub use summary::{summarize, EmotionSummary, RecentReading};
pub use types::ObjectId;
