//! Group session lifecycle: `Active -> Ended -> Active`.
//!
//! Ending a session is an ordered sequence of store writes with no enclosing
//! transaction. The first two steps decide the response; the archive and
//! cleanup steps that follow only log their failures. Each step's outcome is
//! collected in an [`EndSessionReport`].

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use sitor_shared::ObjectId;
use sitor_store::{
    CameraStatus, CameraStatusStore, DetectionHistory, DetectionStore, DocumentStore, GroupStore,
    HistoryStore,
};

use crate::error::{ServerError, StoreContext};

/// Outcome of archiving the live detections.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveStep {
    /// No live rows, nothing written.
    Skipped,
    Archived { session_id: ObjectId, detections: usize },
    Failed(String),
}

/// Outcome of deleting the live detections.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearStep {
    Cleared(u64),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndSessionReport {
    pub group_id: ObjectId,
    pub camera_rows_removed: u64,
    /// `false` when the id named no group; the request still succeeds.
    pub group_matched: bool,
    pub archive: ArchiveStep,
    pub clear: ClearStep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartSessionReport {
    pub group_id: ObjectId,
    pub camera_rows_removed: u64,
    pub camera_rows_seeded: usize,
}

pub fn end_session<S>(
    db: &S,
    group_id: ObjectId,
    now: DateTime<Utc>,
) -> Result<EndSessionReport, ServerError>
where
    S: DocumentStore + ?Sized,
{
    let camera_rows_removed = db
        .clear_camera_statuses(group_id)
        .context("Failed to end session")?;

    let group_matched = db
        .set_session_active(group_id, false, None)
        .context("Failed to update group session status")?;
    if !group_matched {
        debug!(group = %group_id, "End session on unknown group");
    }

    let archive = archive_detections(db, group_id, now);

    // Runs even when archiving failed.
    let clear = match db.clear_detections(group_id) {
        Ok(n) => ClearStep::Cleared(n),
        Err(e) => {
            warn!(group = %group_id, error = %e, "Failed to clear live detections");
            ClearStep::Failed(e.to_string())
        }
    };

    let report = EndSessionReport {
        group_id,
        camera_rows_removed,
        group_matched,
        archive,
        clear,
    };
    info!(
        group = %group_id,
        cameras = report.camera_rows_removed,
        archive = ?report.archive,
        clear = ?report.clear,
        "Session ended"
    );
    Ok(report)
}

fn archive_detections<S>(db: &S, group_id: ObjectId, now: DateTime<Utc>) -> ArchiveStep
where
    S: DocumentStore + ?Sized,
{
    let detections = match db.list_detections_for_group(group_id) {
        Ok(rows) if rows.is_empty() => return ArchiveStep::Skipped,
        Ok(rows) => rows,
        Err(e) => {
            warn!(group = %group_id, error = %e, "Failed to read live detections");
            return ArchiveStep::Failed(e.to_string());
        }
    };

    let started_at = match db.find_group(group_id) {
        Ok(group) => group.and_then(|g| g.session_started_at),
        Err(e) => {
            warn!(group = %group_id, error = %e, "Failed to read session start time");
            None
        }
    };

    let record = DetectionHistory {
        id: ObjectId::new(),
        group_id,
        session_id: ObjectId::new(),
        detections,
        started_at,
        ended_at: now,
    };
    match db.insert_history(&record) {
        Ok(()) => ArchiveStep::Archived {
            session_id: record.session_id,
            detections: record.detections.len(),
        },
        Err(e) => {
            warn!(group = %group_id, error = %e, "Failed to archive detections");
            ArchiveStep::Failed(e.to_string())
        }
    }
}

/// Reactivate the session and seed one inactive camera row per member.
pub fn start_session<S>(
    db: &S,
    group_id: ObjectId,
    now: DateTime<Utc>,
) -> Result<StartSessionReport, ServerError>
where
    S: DocumentStore + ?Sized,
{
    db.set_session_active(group_id, true, Some(now))
        .context("Failed to update group sessionActive")?;

    let group = db
        .get_group(group_id)
        .context("Failed to fetch group after update")?;

    let camera_rows_removed = db
        .clear_camera_statuses(group_id)
        .context("Failed to reset camera status")?;

    for &user_id in &group.members {
        let row = CameraStatus {
            id: ObjectId::new(),
            group_id,
            user_id,
            is_active: false,
            updated_at: now,
        };
        db.insert_camera_status(&row)
            .context("Failed to reset camera status")?;
    }

    info!(group = %group_id, members = group.members.len(), "Session started");
    Ok(StartSessionReport {
        group_id,
        camera_rows_removed,
        camera_rows_seeded: group.members.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{FaultyStore, Op};
    use sitor_shared::EmotionScores;
    use sitor_store::collections::{DETECTIONS, DETECTION_HISTORY};
    use sitor_store::{Database, Group};

    fn seed_group<S: DocumentStore + ?Sized>(db: &S, members: usize) -> Group {
        let leader = ObjectId::new();
        let mut ids = vec![leader];
        ids.extend((1..members).map(|_| ObjectId::new()));
        let group = Group {
            id: ObjectId::new(),
            name: "Kelas A".to_string(),
            description: String::new(),
            security_code: "$argon2id$fake".to_string(),
            leader_id: leader,
            members: ids,
            created_at: Utc::now(),
            session_active: true,
            session_started_at: Some(Utc::now()),
        };
        db.insert_group(&group).unwrap();
        group
    }

    fn seed_detections<S: DocumentStore + ?Sized>(db: &S, group: &Group) {
        for (i, &user) in group.members.iter().enumerate() {
            let scores = EmotionScores {
                happy: 0.1 * i as f64,
                ..Default::default()
            };
            db.upsert_detection(group.id, user, "member", &scores, Utc::now())
                .unwrap();
        }
    }

    #[test]
    fn test_end_session_archives_and_clears() {
        let db = Database::open_in_memory().unwrap();
        let group = seed_group(&db, 3);
        seed_detections(&db, &group);
        db.upsert_camera_status(group.id, group.leader_id, true, Utc::now())
            .unwrap();

        let report = end_session(&db, group.id, Utc::now()).unwrap();

        assert!(report.group_matched);
        assert_eq!(report.camera_rows_removed, 1);
        assert!(matches!(report.archive, ArchiveStep::Archived { detections: 3, .. }));
        assert_eq!(report.clear, ClearStep::Cleared(3));

        let history = db.list_history_for_group(group.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].detections.len(), 3);
        assert_eq!(history[0].started_at, group.session_started_at);
        assert!(db.list_detections_for_group(group.id).unwrap().is_empty());
        assert!(db.list_camera_statuses(group.id).unwrap().is_empty());
        assert!(!db.get_group(group.id).unwrap().session_active);
    }

    #[test]
    fn test_end_session_without_detections_writes_no_history() {
        let db = Database::open_in_memory().unwrap();
        let group = seed_group(&db, 2);

        let report = end_session(&db, group.id, Utc::now()).unwrap();

        assert_eq!(report.archive, ArchiveStep::Skipped);
        assert!(db.list_history_for_group(group.id).unwrap().is_empty());
    }

    #[test]
    fn test_end_session_unknown_group_succeeds() {
        let db = Database::open_in_memory().unwrap();
        let report = end_session(&db, ObjectId::new(), Utc::now()).unwrap();
        assert!(!report.group_matched);
        assert_eq!(report.archive, ArchiveStep::Skipped);
    }

    #[test]
    fn test_archive_failure_still_clears_live_rows() {
        let db = FaultyStore::new().fail(Op::Insert, DETECTION_HISTORY);
        let group = seed_group(&db, 4);
        seed_detections(&db, &group);

        let report = end_session(&db, group.id, Utc::now()).unwrap();

        assert!(matches!(report.archive, ArchiveStep::Failed(_)));
        assert_eq!(report.clear, ClearStep::Cleared(4));
        assert!(db.list_detections_for_group(group.id).unwrap().is_empty());
        assert!(!db.get_group(group.id).unwrap().session_active);
    }

    #[test]
    fn test_clear_failure_is_swallowed() {
        let db = FaultyStore::new().fail(Op::DeleteMany, DETECTIONS);
        let group = seed_group(&db, 2);
        seed_detections(&db, &group);

        let report = end_session(&db, group.id, Utc::now()).unwrap();

        assert!(matches!(report.archive, ArchiveStep::Archived { detections: 2, .. }));
        assert!(matches!(report.clear, ClearStep::Failed(_)));
    }

    #[test]
    fn test_group_update_failure_is_fatal() {
        let db = FaultyStore::new().fail(Op::Update, "groups");
        let group = seed_group(&db, 2);
        seed_detections(&db, &group);

        let err = end_session(&db, group.id, Utc::now()).unwrap_err();

        assert_eq!(err.to_string(), "Failed to update group session status");
        assert_eq!(db.list_detections_for_group(group.id).unwrap().len(), 2);
    }

    #[test]
    fn test_start_session_seeds_one_row_per_member() {
        let db = Database::open_in_memory().unwrap();
        let group = seed_group(&db, 5);
        end_session(&db, group.id, Utc::now()).unwrap();
        // A stale row from a previous session and one from a non-member.
        db.upsert_camera_status(group.id, group.leader_id, true, Utc::now())
            .unwrap();
        db.upsert_camera_status(group.id, ObjectId::new(), true, Utc::now())
            .unwrap();

        let restarted = Utc::now();
        let report = start_session(&db, group.id, restarted).unwrap();

        assert_eq!(report.camera_rows_removed, 2);
        assert_eq!(report.camera_rows_seeded, 5);
        let rows = db.list_camera_statuses(group.id).unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| !r.is_active));
        let seeded: Vec<_> = rows.iter().map(|r| r.user_id).collect();
        assert_eq!(seeded, group.members);

        let group = db.get_group(group.id).unwrap();
        assert!(group.session_active);
        assert_eq!(group.session_started_at, Some(restarted));
    }

    #[test]
    fn test_start_session_unknown_group_fails() {
        let db = Database::open_in_memory().unwrap();
        let err = start_session(&db, ObjectId::new(), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch group after update");
    }
}
