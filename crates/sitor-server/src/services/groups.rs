//! Group membership rules.
//!
//! Join codes are verified by the caller before [`join_group`] runs, so the
//! slow hash check never holds the store lock.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use sitor_shared::ObjectId;
use sitor_store::{DocumentStore, Group, GroupStore, UserStore};

use crate::error::{ServerError, StoreContext};

pub fn list_groups<S>(db: &S) -> Result<Vec<Group>, ServerError>
where
    S: DocumentStore + ?Sized,
{
    db.list_groups().context("Failed to fetch groups")
}

pub fn require_group<S>(db: &S, group_id: ObjectId) -> Result<Group, ServerError>
where
    S: DocumentStore + ?Sized,
{
    db.find_group(group_id)
        .context("Failed to fetch group")?
        .ok_or_else(|| ServerError::NotFound("Group not found".into()))
}

/// `security_code_hash` is the already-hashed join code.
pub fn create_group<S>(
    db: &S,
    leader_id: ObjectId,
    name: String,
    description: String,
    security_code_hash: String,
    now: DateTime<Utc>,
) -> Result<Group, ServerError>
where
    S: DocumentStore + ?Sized,
{
    let group = Group {
        id: ObjectId::new(),
        name,
        description,
        security_code: security_code_hash,
        leader_id,
        members: vec![leader_id],
        created_at: now,
        session_active: true,
        session_started_at: Some(now),
    };
    db.insert_group(&group).context("Failed to create group")?;
    db.add_joined_group(leader_id, group.id)
        .context("Failed to create group")?;

    info!(group = %group.id, leader = %leader_id, "Group created");
    Ok(group)
}

/// Add `user_id` to the group's members. The join code must already have
/// been checked against `require_group`'s result.
pub fn join_group<S>(db: &S, group_id: ObjectId, user_id: ObjectId) -> Result<(), ServerError>
where
    S: DocumentStore + ?Sized,
{
    let group = require_group(db, group_id)?;
    if group.is_member(user_id) {
        return Err(ServerError::BadRequest("Already joined".into()));
    }

    db.add_member(group_id, user_id)
        .context("Failed to join group")?;
    db.add_joined_group(user_id, group_id)
        .context("Failed to join group")?;

    info!(group = %group_id, user = %user_id, "Member joined");
    Ok(())
}

pub fn group_members<S>(db: &S, group_id: ObjectId) -> Result<Vec<ObjectId>, ServerError>
where
    S: DocumentStore + ?Sized,
{
    Ok(require_group(db, group_id)?.members)
}

/// Leader only. Every user loses the group from their `joinedGroups`.
pub fn delete_group<S>(db: &S, group_id: ObjectId, caller: ObjectId) -> Result<(), ServerError>
where
    S: DocumentStore + ?Sized,
{
    let group = require_group(db, group_id)?;
    if group.leader_id != caller {
        return Err(ServerError::Forbidden(
            "Only the group leader can delete the group".into(),
        ));
    }

    db.delete_group(group_id)
        .context("Failed to delete group")?;

    if let Err(e) = db.unlink_group_from_users(group_id) {
        warn!(group = %group_id, error = %e, "Failed to unlink deleted group");
    }

    info!(group = %group_id, "Group deleted");
    Ok(())
}

pub fn leave_group<S>(db: &S, group_id: ObjectId, caller: ObjectId) -> Result<(), ServerError>
where
    S: DocumentStore + ?Sized,
{
    let group = require_group(db, group_id)?;
    if group.leader_id == caller {
        return Err(ServerError::Forbidden(
            "Leader cannot leave the group. Please delete the group instead.".into(),
        ));
    }

    db.remove_member(group_id, caller)
        .context("Failed to leave group")?;
    db.remove_joined_group(caller, group_id)
        .context("Failed to leave group")?;

    info!(group = %group_id, user = %caller, "Member left");
    Ok(())
}
