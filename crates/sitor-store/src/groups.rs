//! Typed access to the `groups` collection.

use chrono::{DateTime, Utc};
use serde_json::json;

use sitor_shared::ObjectId;

use crate::documents::{from_document, to_document, DocumentStore, Filter, Update};
use crate::error::{Result, StoreError};
use crate::models::{collections::GROUPS, Group};

pub trait GroupStore: DocumentStore {
    fn insert_group(&self, group: &Group) -> Result<()> {
        self.insert_one(GROUPS, to_document(group)?)?;
        Ok(())
    }

    fn find_group(&self, id: ObjectId) -> Result<Option<Group>> {
        self.find_one(GROUPS, &Filter::by_id(id))?
            .map(from_document)
            .transpose()
    }

    fn get_group(&self, id: ObjectId) -> Result<Group> {
        self.find_group(id)?.ok_or(StoreError::NotFound)
    }

    /// Every group, in creation order.
    fn list_groups(&self) -> Result<Vec<Group>> {
        self.find(GROUPS, &Filter::all())?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Returns `true` if the group exists. A user already in `members` is not
    /// added twice.
    fn add_member(&self, group_id: ObjectId, user_id: ObjectId) -> Result<bool> {
        let update = Update::new().add_to_set("members", user_id);
        Ok(self.update_one(GROUPS, &Filter::by_id(group_id), &update, false)?.matched > 0)
    }

    fn remove_member(&self, group_id: ObjectId, user_id: ObjectId) -> Result<bool> {
        let update = Update::new().pull("members", user_id);
        Ok(self.update_one(GROUPS, &Filter::by_id(group_id), &update, false)?.matched > 0)
    }

    fn delete_group(&self, id: ObjectId) -> Result<bool> {
        Ok(self.delete_one(GROUPS, &Filter::by_id(id))? > 0)
    }

    /// Flip the session flag. `started_at` is recorded when given. Returns
    /// whether a group matched; callers decide whether a miss matters.
    fn set_session_active(
        &self,
        id: ObjectId,
        active: bool,
        started_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let mut update = Update::new().set("sessionActive", active);
        if let Some(at) = started_at {
            update = update.set("sessionStartedAt", json!(at));
        }
        Ok(self.update_one(GROUPS, &Filter::by_id(id), &update, false)?.matched > 0)
    }
}

impl<S: DocumentStore + ?Sized> GroupStore for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn group(leader: ObjectId) -> Group {
        Group {
            id: ObjectId::new(),
            name: "Kelompok 1".to_string(),
            description: "study group".to_string(),
            security_code: "$argon2id$fake".to_string(),
            leader_id: leader,
            members: vec![leader],
            created_at: Utc::now(),
            session_active: true,
            session_started_at: Some(Utc::now()),
        }
    }

    #[test]
    fn insert_get_list_delete() {
        let db = Database::open_in_memory().unwrap();
        let g1 = group(ObjectId::new());
        let g2 = group(ObjectId::new());
        db.insert_group(&g1).unwrap();
        db.insert_group(&g2).unwrap();

        assert_eq!(db.get_group(g1.id).unwrap(), g1);
        let ids: Vec<_> = db.list_groups().unwrap().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![g1.id, g2.id]);

        assert!(db.delete_group(g1.id).unwrap());
        assert!(!db.delete_group(g1.id).unwrap());
        assert!(db.find_group(g1.id).unwrap().is_none());
    }

    #[test]
    fn membership_has_no_duplicates() {
        let db = Database::open_in_memory().unwrap();
        let leader = ObjectId::new();
        let g = group(leader);
        db.insert_group(&g).unwrap();

        let member = ObjectId::new();
        assert!(db.add_member(g.id, member).unwrap());
        assert!(db.add_member(g.id, member).unwrap());
        assert_eq!(db.get_group(g.id).unwrap().members, vec![leader, member]);

        assert!(db.remove_member(g.id, member).unwrap());
        assert_eq!(db.get_group(g.id).unwrap().members, vec![leader]);
        assert!(!db.add_member(ObjectId::new(), member).unwrap());
    }

    #[test]
    fn session_flag_toggles() {
        let db = Database::open_in_memory().unwrap();
        let g = group(ObjectId::new());
        db.insert_group(&g).unwrap();

        assert!(db.set_session_active(g.id, false, None).unwrap());
        let ended = db.get_group(g.id).unwrap();
        assert!(!ended.session_active);
        assert_eq!(ended.session_started_at, g.session_started_at);

        let restart = Utc::now();
        db.set_session_active(g.id, true, Some(restart)).unwrap();
        let active = db.get_group(g.id).unwrap();
        assert!(active.session_active);
        assert_eq!(active.session_started_at, Some(restart));

        assert!(!db.set_session_active(ObjectId::new(), false, None).unwrap());
    }
}
