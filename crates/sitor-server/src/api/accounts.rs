use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sitor_shared::ObjectId;
use sitor_store::User;

use super::{Ack, AppState, JsonBody};
use crate::auth::AuthUser;
use crate::error::ServerError;
use crate::password;
use crate::services::accounts;

/// Public view of a user. The password hash never leaves the server.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserView {
    id: ObjectId,
    email: String,
    name: String,
    joined_groups: Vec<ObjectId>,
    created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            joined_groups: user.joined_groups,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct AuthResponse {
    success: bool,
    user: UserView,
    token: String,
}

#[derive(Serialize)]
pub(crate) struct UserResponse {
    success: bool,
    user: UserView,
}

#[derive(Deserialize)]
pub(crate) struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub(crate) struct ProfileRequest {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordRequest {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
}

pub(crate) async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Json<AuthResponse>, ServerError> {
    let name = req.name.trim().to_string();
    let email = accounts::normalize_email(&req.email);
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ServerError::BadRequest("All fields required".into()));
    }

    let hash = password::hash(req.password).await?;
    let now = Utc::now();
    let user = state
        .store
        .run(move |db| accounts::register(db, name, email, hash, now))
        .await?;

    let token = state.tokens.issue(user.id, &user.email)?;
    Ok(Json(AuthResponse {
        success: true,
        user: user.into(),
        token,
    }))
}

pub(crate) async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ServerError> {
    let invalid = || ServerError::Unauthorized("Invalid email or password".into());

    let email = accounts::normalize_email(&req.email);
    let user = state
        .store
        .run(move |db| accounts::find_by_email(db, &email))
        .await?
        .ok_or_else(invalid)?;

    if !password::verify(req.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id, &user.email)?;
    Ok(Json(AuthResponse {
        success: true,
        user: user.into(),
        token,
    }))
}

pub(crate) async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ServerError> {
    let user = state
        .store
        .run(move |db| accounts::require_user(db, auth.user_id))
        .await?;
    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}

pub(crate) async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<ProfileRequest>,
) -> Result<Json<UserResponse>, ServerError> {
    let user = state
        .store
        .run(move |db| accounts::update_profile(db, auth.user_id, req.name, req.email))
        .await?;
    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}

pub(crate) async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<PasswordRequest>,
) -> Result<Json<Ack>, ServerError> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(ServerError::BadRequest(
            "Current and new password required".into(),
        ));
    }

    let user_id = auth.user_id;
    let user = state
        .store
        .run(move |db| accounts::require_user(db, user_id))
        .await?;

    if !password::verify(req.current_password, user.password_hash).await? {
        return Err(ServerError::Forbidden("Current password is incorrect".into()));
    }

    let hash = password::hash(req.new_password).await?;
    state
        .store
        .run(move |db| accounts::set_password(db, user_id, &hash))
        .await?;

    Ok(Ack::with_message("Password updated"))
}
