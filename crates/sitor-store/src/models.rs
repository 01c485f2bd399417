//! Domain model structs persisted as JSON documents.
//!
//! Field names are camelCase on disk and on the wire, except chat history
//! which keeps its snake_case layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sitor_shared::{EmotionScores, ObjectId};

/// Collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GROUPS: &str = "groups";
    pub const CAMERA_STATUS: &str = "camera_status";
    pub const DETECTIONS: &str = "detections";
    pub const DETECTION_HISTORY: &str = "detection_history";
    pub const CHAT_HISTORIES: &str = "chat_histories";
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account. `email` is stored lowercased.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub joined_groups: Vec<ObjectId>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A named set of users sharing one session at a time.
///
/// The leader is always in `members`. `session_active` starts `true`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Argon2 PHC string of the join secret.
    pub security_code: String,
    pub leader_id: ObjectId,
    #[serde(default)]
    pub members: Vec<ObjectId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub session_active: bool,
    /// Set at creation and by every session start.
    #[serde(default)]
    pub session_started_at: Option<DateTime<Utc>>,
}

impl Group {
    pub fn is_member(&self, user_id: ObjectId) -> bool {
        self.members.contains(&user_id)
    }
}

// ---------------------------------------------------------------------------
// Camera status
// ---------------------------------------------------------------------------

/// Liveness flag for one user in one group. Keyed by `(group_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CameraStatus {
    pub id: ObjectId,
    pub group_id: ObjectId,
    pub user_id: ObjectId,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Latest emotion reading for one user in one group. Keyed by
/// `(group_id, user_id)`; at most one live row per key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub id: ObjectId,
    pub group_id: ObjectId,
    pub user_id: ObjectId,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
    /// Calendar day of `timestamp`, `YYYY-MM-DD`.
    pub date: String,
    pub emotions: EmotionScores,
}

/// Snapshot of every live detection of a group at the moment its session
/// ended. Never modified after insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionHistory {
    pub id: ObjectId,
    pub group_id: ObjectId,
    pub session_id: ObjectId,
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub sender: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// All chat messages of one user, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatHistory {
    pub id: ObjectId,
    pub user_id: ObjectId,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}
