use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use sitor_store::CameraStatus;

use super::{parse_id, Ack, AppState, JsonBody};
use crate::auth::AuthUser;
use crate::error::ServerError;
use crate::services::{camera, session};

#[derive(Serialize)]
pub(crate) struct CameraStatusResponse {
    success: bool,
    statuses: Vec<CameraStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CameraStatusRequest {
    #[serde(default)]
    is_active: bool,
}

pub(crate) async fn start(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    let now = Utc::now();
    state
        .store
        .run(move |db| session::start_session(db, group_id, now))
        .await?;
    Ok(Ack::with_message("Session started"))
}

pub(crate) async fn end(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    let now = Utc::now();
    state
        .store
        .run(move |db| session::end_session(db, group_id, now))
        .await?;
    Ok(Ack::with_message("Session ended. All users disconnected."))
}

pub(crate) async fn update_camera_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<CameraStatusRequest>,
) -> Result<Json<Ack>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    let now = Utc::now();
    state
        .store
        .run(move |db| {
            camera::update_camera_status(db, group_id, auth.user_id, req.is_active, now)
        })
        .await?;
    Ok(Ack::ok())
}

pub(crate) async fn camera_status(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CameraStatusResponse>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    let statuses = state
        .store
        .run(move |db| camera::camera_statuses(db, group_id))
        .await?;
    Ok(Json(CameraStatusResponse {
        success: true,
        statuses,
    }))
}
