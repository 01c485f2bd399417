//! Account registration and profile changes.
//!
//! Emails are compared and stored lowercased. Uniqueness is a check before
//! the write, not a store constraint.

use chrono::{DateTime, Utc};
use tracing::info;

use sitor_shared::ObjectId;
use sitor_store::{DocumentStore, StoreError, User, UserStore};

use crate::error::{ServerError, StoreContext};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `email` must be normalized and `password_hash` already computed.
pub fn register<S>(
    db: &S,
    name: String,
    email: String,
    password_hash: String,
    now: DateTime<Utc>,
) -> Result<User, ServerError>
where
    S: DocumentStore + ?Sized,
{
    if db.email_taken(&email).context("Failed to register")? {
        return Err(ServerError::BadRequest("Email already registered".into()));
    }

    let user = User {
        id: ObjectId::new(),
        name,
        email,
        password_hash,
        joined_groups: Vec::new(),
        created_at: now,
    };
    db.insert_user(&user).context("Failed to register")?;

    info!(user = %user.id, "User registered");
    Ok(user)
}

pub fn find_by_email<S>(db: &S, email: &str) -> Result<Option<User>, ServerError>
where
    S: DocumentStore + ?Sized,
{
    db.find_user_by_email(email).context("Server error")
}

pub fn require_user<S>(db: &S, user_id: ObjectId) -> Result<User, ServerError>
where
    S: DocumentStore + ?Sized,
{
    match db.get_user(user_id) {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound) => Err(ServerError::NotFound("User not found".into())),
        Err(source) => Err(ServerError::Store {
            message: "Failed to fetch user",
            source,
        }),
    }
}

/// Blank fields are treated as absent. At least one field must remain.
pub fn update_profile<S>(
    db: &S,
    user_id: ObjectId,
    name: Option<String>,
    email: Option<String>,
) -> Result<User, ServerError>
where
    S: DocumentStore + ?Sized,
{
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let email = email
        .map(|e| normalize_email(&e))
        .filter(|e| !e.is_empty());
    if name.is_none() && email.is_none() {
        return Err(ServerError::BadRequest("Nothing to update".into()));
    }

    let current = require_user(db, user_id)?;

    if let Some(email) = email.as_deref().filter(|e| *e != current.email) {
        if db.email_taken(email).context("Failed to update profile")? {
            return Err(ServerError::BadRequest("Email already registered".into()));
        }
    }

    db.update_user_profile(user_id, name.as_deref(), email.as_deref())
        .context("Failed to update profile")?;
    require_user(db, user_id)
}

pub fn set_password<S>(db: &S, user_id: ObjectId, password_hash: &str) -> Result<(), ServerError>
where
    S: DocumentStore + ?Sized,
{
    let matched = db
        .set_password_hash(user_id, password_hash)
        .context("Failed to update password")?;
    if !matched {
        return Err(ServerError::NotFound("User not found".into()));
    }
    info!(user = %user_id, "Password changed");
    Ok(())
}
