use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sitor_shared::ObjectId;
use sitor_store::Group;

use super::{parse_id, Ack, AppState, JsonBody};
use crate::auth::AuthUser;
use crate::error::ServerError;
use crate::password;
use crate::services::groups;

/// Public view of a group. The join-code hash is never exposed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupView {
    id: ObjectId,
    name: String,
    description: String,
    leader_id: ObjectId,
    members: Vec<ObjectId>,
    created_at: DateTime<Utc>,
    session_active: bool,
}

impl From<Group> for GroupView {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            leader_id: group.leader_id,
            members: group.members,
            created_at: group.created_at,
            session_active: group.session_active,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct GroupsResponse {
    success: bool,
    groups: Vec<GroupView>,
}

#[derive(Serialize)]
pub(crate) struct GroupResponse {
    success: bool,
    group: GroupView,
}

#[derive(Serialize)]
pub(crate) struct MembersResponse {
    success: bool,
    members: Vec<ObjectId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateGroupRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    security_code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JoinGroupRequest {
    #[serde(default)]
    group_id: String,
    #[serde(default)]
    security_code: String,
}

pub(crate) async fn list(State(state): State<AppState>) -> Result<Json<GroupsResponse>, ServerError> {
    let groups = state.store.run(|db| groups::list_groups(db)).await?;
    Ok(Json(GroupsResponse {
        success: true,
        groups: groups.into_iter().map(GroupView::from).collect(),
    }))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<CreateGroupRequest>,
) -> Result<Json<GroupResponse>, ServerError> {
    let name = req.name.trim().to_string();
    if name.is_empty() || req.security_code.is_empty() {
        return Err(ServerError::BadRequest(
            "Name and security code required".into(),
        ));
    }

    let code_hash = password::hash(req.security_code).await?;
    let now = Utc::now();
    let group = state
        .store
        .run(move |db| {
            groups::create_group(db, auth.user_id, name, req.description, code_hash, now)
        })
        .await?;

    Ok(Json(GroupResponse {
        success: true,
        group: group.into(),
    }))
}

pub(crate) async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<JoinGroupRequest>,
) -> Result<Json<Ack>, ServerError> {
    let group_id = parse_id(&req.group_id, "groupId")?;

    let group = state
        .store
        .run(move |db| groups::require_group(db, group_id))
        .await?;

    if !password::verify(req.security_code, group.security_code).await? {
        return Err(ServerError::Forbidden("Invalid security code".into()));
    }

    state
        .store
        .run(move |db| groups::join_group(db, group_id, auth.user_id))
        .await?;

    Ok(Ack::ok())
}

pub(crate) async fn members(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    let members = state
        .store
        .run(move |db| groups::group_members(db, group_id))
        .await?;
    Ok(Json(MembersResponse {
        success: true,
        members,
    }))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    state
        .store
        .run(move |db| groups::delete_group(db, group_id, auth.user_id))
        .await?;
    Ok(Ack::ok())
}

pub(crate) async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    state
        .store
        .run(move |db| groups::leave_group(db, group_id, auth.user_id))
        .await?;
    Ok(Ack::ok())
}
