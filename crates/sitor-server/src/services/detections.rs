//! Live emotion readings, their archive, and the per-user summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sitor_shared::{summarize, EmotionScores, EmotionSummary, ObjectId};
use sitor_store::{Detection, DetectionHistory, DetectionStore, DocumentStore, HistoryStore, UserStore};

use crate::error::{ServerError, StoreContext};

/// Body of `POST /api/detections`.
///
/// Clients send either a full `emotions` vector or, in the older format, a
/// single `emotion` label with a `probability`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionInput {
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub emotion: Option<String>,
    /// Accepted for compatibility; not stored.
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub emotions: Option<EmotionScores>,
}

impl DetectionInput {
    /// A non-zero `emotions` vector wins; otherwise the label becomes a
    /// one-hot vector, all zeros when the label is unknown or absent.
    pub fn scores(&self) -> EmotionScores {
        match self.emotions {
            Some(vector) if !vector.is_zero() => vector,
            _ => EmotionScores::one_hot(self.emotion.as_deref().unwrap_or_default()),
        }
    }
}

pub fn submit_detection<S>(
    db: &S,
    group_id: ObjectId,
    user_id: ObjectId,
    scores: &EmotionScores,
    now: DateTime<Utc>,
) -> Result<(), ServerError>
where
    S: DocumentStore + ?Sized,
{
    let user = db.get_user(user_id).context("Failed to get user name")?;
    db.upsert_detection(group_id, user_id, &user.name, scores, now)
        .context("Failed to save detection")?;
    Ok(())
}

pub fn detections_for_group<S>(db: &S, group_id: ObjectId) -> Result<Vec<Detection>, ServerError>
where
    S: DocumentStore + ?Sized,
{
    db.list_detections_for_group(group_id)
        .context("Failed to fetch detections")
}

pub fn history_for_group<S>(
    db: &S,
    group_id: ObjectId,
) -> Result<Vec<DetectionHistory>, ServerError>
where
    S: DocumentStore + ?Sized,
{
    db.list_history_for_group(group_id)
        .context("Failed to fetch history")
}

/// Summary of a user's live readings across all groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(flatten)]
    pub summary: EmotionSummary,
    /// Last reading in store order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<Detection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

pub fn summarize_user<S>(db: &S, user_id: ObjectId) -> Result<UserSummary, ServerError>
where
    S: DocumentStore + ?Sized,
{
    let rows = db
        .list_detections_for_user(user_id)
        .context("Failed to fetch detections")?;

    let summary = summarize(rows.iter().map(|d| (d.timestamp, &d.emotions)));
    let message = summary.is_empty().then_some("No detection data");

    Ok(UserSummary {
        summary,
        latest: rows.last().cloned(),
        message,
    })
}
