//! Typed access to the `users` collection.

use sitor_shared::ObjectId;

use crate::documents::{from_document, to_document, DocumentStore, Filter, Update};
use crate::error::{Result, StoreError};
use crate::models::{collections::USERS, User};

pub trait UserStore: DocumentStore {
    fn insert_user(&self, user: &User) -> Result<()> {
        self.insert_one(USERS, to_document(user)?)?;
        Ok(())
    }

    fn get_user(&self, id: ObjectId) -> Result<User> {
        self.find_one(USERS, &Filter::by_id(id))?
            .map(from_document)
            .transpose()?
            .ok_or(StoreError::NotFound)
    }

    /// `email` must already be lowercased.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one(USERS, &Filter::all().eq("email", email))?
            .map(from_document)
            .transpose()
    }

    fn email_taken(&self, email: &str) -> Result<bool> {
        Ok(self.count(USERS, &Filter::all().eq("email", email))? > 0)
    }

    /// Returns `true` if the user exists.
    fn update_user_profile(
        &self,
        id: ObjectId,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool> {
        let mut update = Update::new();
        if let Some(name) = name {
            update = update.set("name", name);
        }
        if let Some(email) = email {
            update = update.set("email", email);
        }
        Ok(self.update_one(USERS, &Filter::by_id(id), &update, false)?.matched > 0)
    }

    fn set_password_hash(&self, id: ObjectId, password_hash: &str) -> Result<bool> {
        let update = Update::new().set("password", password_hash);
        Ok(self.update_one(USERS, &Filter::by_id(id), &update, false)?.matched > 0)
    }

    fn add_joined_group(&self, user_id: ObjectId, group_id: ObjectId) -> Result<()> {
        let update = Update::new().add_to_set("joinedGroups", group_id);
        self.update_one(USERS, &Filter::by_id(user_id), &update, false)?;
        Ok(())
    }

    fn remove_joined_group(&self, user_id: ObjectId, group_id: ObjectId) -> Result<()> {
        let update = Update::new().pull("joinedGroups", group_id);
        self.update_one(USERS, &Filter::by_id(user_id), &update, false)?;
        Ok(())
    }

    /// Pull `group_id` from every user's `joinedGroups`. Returns how many
    /// users changed.
    fn unlink_group_from_users(&self, group_id: ObjectId) -> Result<u64> {
        let update = Update::new().pull("joinedGroups", group_id);
        self.update_many(USERS, &Filter::all(), &update)
    }
}

impl<S: DocumentStore + ?Sized> UserStore for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::Utc;

    fn user(email: &str) -> User {
        User {
            id: ObjectId::new(),
            name: "Ayu".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            joined_groups: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_lookup() {
        let db = Database::open_in_memory().unwrap();
        let u = user("ayu@example.com");
        db.insert_user(&u).unwrap();

        assert_eq!(db.get_user(u.id).unwrap(), u);
        assert_eq!(db.find_user_by_email("ayu@example.com").unwrap(), Some(u));
        assert!(db.email_taken("ayu@example.com").unwrap());
        assert!(!db.email_taken("other@example.com").unwrap());
        assert!(matches!(db.get_user(ObjectId::new()), Err(StoreError::NotFound)));
    }

    #[test]
    fn password_field_is_stored_as_password() {
        let db = Database::open_in_memory().unwrap();
        let u = user("a@b.c");
        db.insert_user(&u).unwrap();

        let raw = db.find_one(USERS, &Filter::by_id(u.id)).unwrap().unwrap();
        assert_eq!(raw["password"], serde_json::json!("$argon2id$fake"));
    }

    #[test]
    fn profile_and_groups_updates() {
        let db = Database::open_in_memory().unwrap();
        let u = user("a@b.c");
        db.insert_user(&u).unwrap();

        assert!(db.update_user_profile(u.id, Some("Budi"), None).unwrap());
        assert!(!db.update_user_profile(ObjectId::new(), Some("x"), None).unwrap());

        let g = ObjectId::new();
        db.add_joined_group(u.id, g).unwrap();
        db.add_joined_group(u.id, g).unwrap();
        let fetched = db.get_user(u.id).unwrap();
        assert_eq!(fetched.name, "Budi");
        assert_eq!(fetched.email, "a@b.c");
        assert_eq!(fetched.joined_groups, vec![g]);

        db.remove_joined_group(u.id, g).unwrap();
        assert!(db.get_user(u.id).unwrap().joined_groups.is_empty());
    }

    #[test]
    fn unlink_group_touches_only_linked_users() {
        let db = Database::open_in_memory().unwrap();
        let a = user("a@example.com");
        let b = user("b@example.com");
        let c = user("c@example.com");
        for u in [&a, &b, &c] {
            db.insert_user(u).unwrap();
        }
        let gone = ObjectId::new();
        let kept = ObjectId::new();
        db.add_joined_group(a.id, gone).unwrap();
        db.add_joined_group(a.id, kept).unwrap();
        db.add_joined_group(b.id, gone).unwrap();

        assert_eq!(db.unlink_group_from_users(gone).unwrap(), 2);
        assert_eq!(db.get_user(a.id).unwrap().joined_groups, vec![kept]);
        assert!(db.get_user(b.id).unwrap().joined_groups.is_empty());
        assert!(db.get_user(c.id).unwrap().joined_groups.is_empty());
    }
}
