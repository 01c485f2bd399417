//! Typed access to the `detection_history` archive.

use sitor_shared::ObjectId;

use crate::documents::{from_document, to_document, DocumentStore, Filter};
use crate::error::Result;
use crate::models::{collections::DETECTION_HISTORY, DetectionHistory};

pub trait HistoryStore: DocumentStore {
    fn insert_history(&self, record: &DetectionHistory) -> Result<()> {
        self.insert_one(DETECTION_HISTORY, to_document(record)?)?;
        Ok(())
    }

    /// Archive records of a group, oldest session first.
    fn list_history_for_group(&self, group_id: ObjectId) -> Result<Vec<DetectionHistory>> {
        self.find(DETECTION_HISTORY, &Filter::all().eq("groupId", group_id))?
            .into_iter()
            .map(from_document)
            .collect()
    }
}

impl<S: DocumentStore + ?Sized> HistoryStore for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Detection;
    use crate::Database;
    use chrono::Utc;
    use sitor_shared::EmotionScores;

    #[test]
    fn records_round_trip_with_snapshots() {
        let db = Database::open_in_memory().unwrap();
        let group_id = ObjectId::new();
        let detection = Detection {
            id: ObjectId::new(),
            group_id,
            user_id: ObjectId::new(),
            user_name: "Ayu".to_string(),
            timestamp: Utc::now(),
            date: "2025-01-01".to_string(),
            emotions: EmotionScores::one_hot("angry"),
        };
        let record = DetectionHistory {
            id: ObjectId::new(),
            group_id,
            session_id: ObjectId::new(),
            detections: vec![detection],
            started_at: None,
            ended_at: Utc::now(),
        };
        db.insert_history(&record).unwrap();

        assert_eq!(db.list_history_for_group(group_id).unwrap(), vec![record]);
        assert!(db.list_history_for_group(ObjectId::new()).unwrap().is_empty());
    }
}
