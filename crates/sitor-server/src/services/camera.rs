//! Per-member camera liveness within a group.

use chrono::{DateTime, Utc};

use sitor_shared::ObjectId;
use sitor_store::{CameraStatus, CameraStatusStore, DocumentStore, GroupStore};

use crate::error::{ServerError, StoreContext};

/// Record the caller's camera state. Writes are accepted whether or not the
/// group's session is active.
pub fn update_camera_status<S>(
    db: &S,
    group_id: ObjectId,
    user_id: ObjectId,
    is_active: bool,
    now: DateTime<Utc>,
) -> Result<(), ServerError>
where
    S: DocumentStore + ?Sized,
{
    db.upsert_camera_status(group_id, user_id, is_active, now)
        .context("Failed to update camera status")
}

pub fn camera_statuses<S>(db: &S, group_id: ObjectId) -> Result<Vec<CameraStatus>, ServerError>
where
    S: DocumentStore + ?Sized,
{
    let group = db
        .find_group(group_id)
        .context("Failed to fetch group")?
        .ok_or_else(|| ServerError::NotFound("Group not found".into()))?;

    if !group.session_active {
        return Err(ServerError::Gone("Session has ended".into()));
    }

    db.list_camera_statuses(group_id)
        .context("Failed to fetch camera status")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session;
    use crate::services::testing::{FaultyStore, Op};
    use axum::http::StatusCode;
    use sitor_store::{Database, Group};

    fn group(db: &Database) -> Group {
        let leader = ObjectId::new();
        let group = Group {
            id: ObjectId::new(),
            name: "Kelas B".to_string(),
            description: String::new(),
            security_code: "$argon2id$fake".to_string(),
            leader_id: leader,
            members: vec![leader],
            created_at: Utc::now(),
            session_active: true,
            session_started_at: None,
        };
        db.insert_group(&group).unwrap();
        group
    }

    #[test]
    fn test_toggle_keeps_single_row() {
        let db = Database::open_in_memory().unwrap();
        let g = group(&db);

        update_camera_status(&db, g.id, g.leader_id, true, Utc::now()).unwrap();
        update_camera_status(&db, g.id, g.leader_id, false, Utc::now()).unwrap();

        let rows = camera_statuses(&db, g.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_active);
    }

    #[test]
    fn test_missing_group_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = camera_statuses(&db, ObjectId::new()).unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[test]
    fn test_ended_session_is_gone_but_writes_still_land() {
        let db = Database::open_in_memory().unwrap();
        let g = group(&db);
        session::end_session(&db, g.id, Utc::now()).unwrap();

        update_camera_status(&db, g.id, g.leader_id, true, Utc::now()).unwrap();

        let err = camera_statuses(&db, g.id).unwrap_err();
        assert!(matches!(err, ServerError::Gone(ref m) if m == "Session has ended"));
        assert_eq!(db.list_camera_statuses(g.id).unwrap().len(), 1);
    }

    #[test]
    fn test_store_failure_is_internal() {
        let db = FaultyStore::new().fail(Op::Find, "groups");
        let err = camera_statuses(&db, ObjectId::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to fetch group");
    }
}
