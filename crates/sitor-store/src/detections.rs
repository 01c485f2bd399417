//! Typed access to the live `detections` collection.

use chrono::{DateTime, Utc};
use serde_json::json;

use sitor_shared::constants::DETECTION_DATE_FORMAT;
use sitor_shared::{EmotionScores, ObjectId};

use crate::documents::{from_document, DocumentStore, Filter, Update};
use crate::error::Result;
use crate::models::{collections::DETECTIONS, Detection};

pub trait DetectionStore: DocumentStore {
    /// Replace the live reading for `(group_id, user_id)`, creating it if
    /// absent. Returns `true` when a new row was created.
    fn upsert_detection(
        &self,
        group_id: ObjectId,
        user_id: ObjectId,
        user_name: &str,
        emotions: &EmotionScores,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let filter = Filter::all().eq("groupId", group_id).eq("userId", user_id);
        let update = Update::new()
            .set("groupId", group_id)
            .set("userId", user_id)
            .set("userName", user_name)
            .set("timestamp", json!(now))
            .set("date", now.format(DETECTION_DATE_FORMAT).to_string())
            .set("emotions", json!(emotions));
        let outcome = self.update_one(DETECTIONS, &filter, &update, true)?;
        Ok(outcome.upserted_id.is_some())
    }

    fn list_detections_for_group(&self, group_id: ObjectId) -> Result<Vec<Detection>> {
        self.find(DETECTIONS, &Filter::all().eq("groupId", group_id))?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Live rows of one user across all groups, in store order.
    fn list_detections_for_user(&self, user_id: ObjectId) -> Result<Vec<Detection>> {
        self.find(DETECTIONS, &Filter::all().eq("userId", user_id))?
            .into_iter()
            .map(from_document)
            .collect()
    }

    fn clear_detections(&self, group_id: ObjectId) -> Result<u64> {
        self.delete_many(DETECTIONS, &Filter::all().eq("groupId", group_id))
    }
}

impl<S: DocumentStore + ?Sized> DetectionStore for S {}
