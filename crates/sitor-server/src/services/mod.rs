//! Business logic behind the HTTP handlers.
//!
//! Every function here is synchronous and generic over the document store,
//! so it runs inside [`crate::store::Store::run`] in production and against
//! an in-memory database (or a fault-injecting wrapper) in tests.

pub mod accounts;
pub mod camera;
pub mod chat;
pub mod detections;
pub mod groups;
pub mod session;
