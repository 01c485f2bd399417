use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use sitor_store::{Detection, DetectionHistory};

use super::{parse_id, Ack, AppState, JsonBody};
use crate::auth::AuthUser;
use crate::error::ServerError;
use crate::services::detections::{self, DetectionInput, UserSummary};

#[derive(Serialize)]
pub(crate) struct DetectionsResponse {
    success: bool,
    detections: Vec<Detection>,
}

#[derive(Serialize)]
pub(crate) struct HistoryResponse {
    success: bool,
    history: Vec<DetectionHistory>,
}

#[derive(Serialize)]
pub(crate) struct SummaryResponse {
    success: bool,
    #[serde(flatten)]
    summary: UserSummary,
}

pub(crate) async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(input): JsonBody<DetectionInput>,
) -> Result<Json<Ack>, ServerError> {
    let group_id = parse_id(&input.group_id, "groupId")?;
    let scores = input.scores();
    let now = Utc::now();
    state
        .store
        .run(move |db| detections::submit_detection(db, group_id, auth.user_id, &scores, now))
        .await?;
    Ok(Ack::ok())
}

pub(crate) async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DetectionsResponse>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    let detections = state
        .store
        .run(move |db| detections::detections_for_group(db, group_id))
        .await?;
    Ok(Json(DetectionsResponse {
        success: true,
        detections,
    }))
}

pub(crate) async fn history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let group_id = parse_id(&id, "groupId")?;
    let history = state
        .store
        .run(move |db| detections::history_for_group(db, group_id))
        .await?;
    Ok(Json(HistoryResponse {
        success: true,
        history,
    }))
}

pub(crate) async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SummaryResponse>, ServerError> {
    let summary = state
        .store
        .run(move |db| detections::summarize_user(db, auth.user_id))
        .await?;
    Ok(Json(SummaryResponse {
        success: true,
        summary,
    }))
}
