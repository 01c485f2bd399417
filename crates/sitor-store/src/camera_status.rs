//! Typed access to the `camera_status` collection.

use chrono::{DateTime, Utc};
use serde_json::json;

use sitor_shared::ObjectId;

use crate::documents::{from_document, to_document, DocumentStore, Filter, Update};
use crate::error::Result;
use crate::models::{collections::CAMERA_STATUS, CameraStatus};

fn pair_filter(group_id: ObjectId, user_id: ObjectId) -> Filter {
    Filter::all().eq("groupId", group_id).eq("userId", user_id)
}

pub trait CameraStatusStore: DocumentStore {
    /// Upsert on `(group_id, user_id)`.
    fn upsert_camera_status(
        &self,
        group_id: ObjectId,
        user_id: ObjectId,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let update = Update::new()
            .set("isActive", is_active)
            .set("updatedAt", json!(now));
        self.update_one(CAMERA_STATUS, &pair_filter(group_id, user_id), &update, true)?;
        Ok(())
    }

    fn insert_camera_status(&self, status: &CameraStatus) -> Result<()> {
        self.insert_one(CAMERA_STATUS, to_document(status)?)?;
        Ok(())
    }

    /// Rows for a group in store order.
    fn list_camera_statuses(&self, group_id: ObjectId) -> Result<Vec<CameraStatus>> {
        self.find(CAMERA_STATUS, &Filter::all().eq("groupId", group_id))?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Returns the number of rows removed.
    fn clear_camera_statuses(&self, group_id: ObjectId) -> Result<u64> {
        self.delete_many(CAMERA_STATUS, &Filter::all().eq("groupId", group_id))
    }
}

impl<S: DocumentStore + ?Sized> CameraStatusStore for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn upsert_keeps_one_row_per_pair() {
        let db = Database::open_in_memory().unwrap();
        let (g, u) = (ObjectId::new(), ObjectId::new());

        db.upsert_camera_status(g, u, true, Utc::now()).unwrap();
        db.upsert_camera_status(g, u, false, Utc::now()).unwrap();
        db.upsert_camera_status(g, u, true, Utc::now()).unwrap();

        let rows = db.list_camera_statuses(g).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_active);
        assert_eq!(rows[0].user_id, u);
    }

    #[test]
    fn clear_only_touches_one_group() {
        let db = Database::open_in_memory().unwrap();
        let (g1, g2) = (ObjectId::new(), ObjectId::new());
        for _ in 0..3 {
            db.upsert_camera_status(g1, ObjectId::new(), false, Utc::now()).unwrap();
        }
        db.upsert_camera_status(g2, ObjectId::new(), true, Utc::now()).unwrap();

        assert_eq!(db.clear_camera_statuses(g1).unwrap(), 3);
        assert!(db.list_camera_statuses(g1).unwrap().is_empty());
        assert_eq!(db.list_camera_statuses(g2).unwrap().len(), 1);
    }
}
