//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`], guarantees that
//! migrations are run before any other operation, and implements
//! [`DocumentStore`] over the `documents` table.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;

use sitor_shared::constants::STORE_TIMEOUT_SECS;
use sitor_shared::ObjectId;

use crate::documents::{document_id, Document, DocumentStore, Filter, Update, UpdateOutcome, ID_FIELD};
use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at an explicit path, creating parent
    /// directories as needed.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::init(conn)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // A statement waiting on a lock gives up after the store timeout.
        conn.busy_timeout(Duration::from_secs(STORE_TIMEOUT_SECS))?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Matching documents with their row sequence, in store order.
    fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<(i64, Document)>> {
        // String clauses are pushed down to SQLite; every row is re-checked
        // against the full filter below.
        let mut sql = String::from("SELECT seq, body FROM documents WHERE collection = ?");
        let mut args: Vec<String> = vec![collection.to_string()];
        for (field, value) in filter.clauses() {
            if let (Value::String(s), true) = (value, is_plain_field(field)) {
                // Literal path so the v002 expression indexes apply.
                sql.push_str(&format!(" AND json_extract(body, '$.\"{field}\"') = ?"));
                args.push(s.clone());
            }
        }
        sql.push_str(" ORDER BY seq ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            let seq: i64 = row.get(0)?;
            let body: String = row.get(1)?;
            Ok((seq, body))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (seq, body) = row?;
            let doc = parse_body(&body)?;
            if filter.matches(&doc) {
                docs.push((seq, doc));
            }
        }
        Ok(docs)
    }

    fn write_body(&self, seq: i64, doc: &Document) -> Result<()> {
        self.conn.execute(
            "UPDATE documents SET body = ?1 WHERE seq = ?2",
            params![serde_json::to_string(doc)?, seq],
        )?;
        Ok(())
    }

    fn insert_body(&self, collection: &str, mut doc: Document) -> Result<ObjectId> {
        let id = match doc.get(ID_FIELD) {
            Some(Value::Null) | None => {
                let id = ObjectId::new();
                doc.insert(ID_FIELD.to_string(), id.into());
                id
            }
            Some(_) => document_id(&doc)?,
        };

        self.conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id.to_hex(), serde_json::to_string(&doc)?],
        )?;
        Ok(id)
    }

    fn delete_seqs(&self, seqs: impl IntoIterator<Item = i64>) -> Result<u64> {
        let mut deleted = 0u64;
        let mut stmt = self.conn.prepare("DELETE FROM documents WHERE seq = ?1")?;
        for seq in seqs {
            deleted += stmt.execute(params![seq])? as u64;
        }
        Ok(deleted)
    }
}

fn is_plain_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_body(body: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidDocument(
            "stored body is not a JSON object".to_string(),
        )),
    }
}

impl DocumentStore for Database {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        Ok(self
            .select(collection, filter)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect())
    }

    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self
            .select(collection, filter)?
            .into_iter()
            .next()
            .map(|(_, doc)| doc))
    }

    fn insert_one(&self, collection: &str, doc: Document) -> Result<ObjectId> {
        self.insert_body(collection, doc)
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome> {
        let tx = self.conn.unchecked_transaction()?;

        let outcome = match self.select(collection, filter)?.into_iter().next() {
            Some((seq, mut doc)) => {
                let modified = update.apply(&mut doc)?;
                if modified {
                    self.write_body(seq, &doc)?;
                }
                UpdateOutcome {
                    matched: 1,
                    modified: modified as u64,
                    upserted_id: None,
                }
            }
            None if upsert => {
                let mut doc = filter.seed();
                update.apply(&mut doc)?;
                let id = self.insert_body(collection, doc)?;
                UpdateOutcome {
                    matched: 0,
                    modified: 0,
                    upserted_id: Some(id),
                }
            }
            None => UpdateOutcome::default(),
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn update_many(&self, collection: &str, filter: &Filter, update: &Update) -> Result<u64> {
        let tx = self.conn.unchecked_transaction()?;
        let mut modified = 0u64;
        for (seq, mut doc) in self.select(collection, filter)? {
            if update.apply(&mut doc)? {
                self.write_body(seq, &doc)?;
                modified += 1;
            }
        }
        tx.commit()?;
        Ok(modified)
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let first = self
            .select(collection, filter)?
            .into_iter()
            .next()
            .map(|(seq, _)| seq);
        self.delete_seqs(first)
    }

    fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let tx = self.conn.unchecked_transaction()?;
        let seqs: Vec<i64> = self
            .select(collection, filter)?
            .into_iter()
            .map(|(seq, _)| seq)
            .collect();
        let deleted = self.delete_seqs(seqs)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        if filter.clauses().is_empty() {
            let n: i64 = self
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                    params![collection],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or(0);
            return Ok(n as u64);
        }
        Ok(self.select(collection, filter)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());
        db.insert_one("groups", doc(json!({"name": "a"}))).unwrap();
        drop(db);

        let reopened = Database::open_at(&path).unwrap();
        assert_eq!(reopened.count("groups", &Filter::all()).unwrap(), 1);
    }

    #[test]
    fn insert_assigns_id_and_find_by_id() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_one("groups", doc(json!({"name": "study"}))).unwrap();

        let found = db.find_one("groups", &Filter::by_id(id)).unwrap().unwrap();
        assert_eq!(found["name"], json!("study"));
        assert_eq!(found["id"], json!(id.to_hex()));
        assert!(db.find_one("groups", &Filter::by_id(ObjectId::new())).unwrap().is_none());
    }

    #[test]
    fn duplicate_id_in_collection_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let id = ObjectId::new();
        db.insert_one("users", doc(json!({"id": id}))).unwrap();
        assert!(db.insert_one("users", doc(json!({"id": id}))).is_err());
        // same id in another collection is fine
        db.insert_one("groups", doc(json!({"id": id}))).unwrap();
    }

    #[test]
    fn collections_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        db.insert_one("a", doc(json!({"k": "v"}))).unwrap();
        db.insert_one("b", doc(json!({"k": "v"}))).unwrap();

        assert_eq!(db.find("a", &Filter::all()).unwrap().len(), 1);
        assert_eq!(db.delete_many("a", &Filter::all().eq("k", "v")).unwrap(), 1);
        assert_eq!(db.count("b", &Filter::all()).unwrap(), 1);
    }

    #[test]
    fn find_preserves_insertion_order_across_updates() {
        let db = Database::open_in_memory().unwrap();
        for n in 0..3 {
            db.insert_one("rows", doc(json!({"g": "x", "n": n}))).unwrap();
        }
        db.update_one("rows", &Filter::all().eq("n", 0), &Update::new().set("touched", true), false)
            .unwrap();

        let ns: Vec<_> = db
            .find("rows", &Filter::all().eq("g", "x"))
            .unwrap()
            .into_iter()
            .map(|d| d["n"].clone())
            .collect();
        assert_eq!(ns, vec![json!(0), json!(1), json!(2)]);
    }

    #[test]
    fn upsert_by_filter_keeps_one_row() {
        let db = Database::open_in_memory().unwrap();
        let filter = Filter::all().eq("groupId", "g").eq("userId", "u");

        let first = db
            .update_one("camera_status", &filter, &Update::new().set("isActive", true), true)
            .unwrap();
        assert_eq!(first.matched, 0);
        assert!(first.upserted_id.is_some());

        let second = db
            .update_one("camera_status", &filter, &Update::new().set("isActive", false), true)
            .unwrap();
        assert_eq!(second.matched, 1);
        assert_eq!(second.modified, 1);
        assert!(second.upserted_id.is_none());

        let rows = db.find("camera_status", &filter).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["isActive"], json!(false));
        assert_eq!(rows[0]["groupId"], json!("g"));
    }

    #[test]
    fn update_without_upsert_on_miss_matches_nothing() {
        let db = Database::open_in_memory().unwrap();
        let outcome = db
            .update_one("groups", &Filter::by_id(ObjectId::new()), &Update::new().set("x", 1), false)
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
        assert_eq!(db.count("groups", &Filter::all()).unwrap(), 0);
    }

    #[test]
    fn non_string_clauses_filter_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.insert_one("c", doc(json!({"g": "x", "on": true}))).unwrap();
        db.insert_one("c", doc(json!({"g": "x", "on": false}))).unwrap();

        let on = db.find("c", &Filter::all().eq("g", "x").eq("on", true)).unwrap();
        assert_eq!(on.len(), 1);
    }

    #[test]
    fn update_many_and_delete_one() {
        let db = Database::open_in_memory().unwrap();
        for _ in 0..3 {
            db.insert_one("u", doc(json!({"groups": ["g1", "g2"]}))).unwrap();
        }
        let modified = db
            .update_many("u", &Filter::all(), &Update::new().pull("groups", "g1"))
            .unwrap();
        assert_eq!(modified, 3);
        for d in db.find("u", &Filter::all()).unwrap() {
            assert_eq!(d["groups"], json!(["g2"]));
        }

        assert_eq!(db.delete_one("u", &Filter::all()).unwrap(), 1);
        assert_eq!(db.count("u", &Filter::all()).unwrap(), 2);
    }
}
