//! Collection-scoped document CRUD.
//!
//! A document is a JSON object carrying its identity in the `id` field
//! (24-char hex [`ObjectId`]). Filters are conjunctions of top-level field
//! equalities. Updates combine `set`, `push`, `add_to_set` and `pull`
//! operations on top-level fields.
//!
//! Uniqueness of composite keys (e.g. one camera status per group and user) is
//! not enforced by an index. It rests on callers always writing through
//! [`DocumentStore::update_one`] with `upsert = true` and the same filter:
//! last write wins on that filter.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use sitor_shared::ObjectId;

use crate::error::{Result, StoreError};

/// Name of the identity field in every document.
pub const ID_FIELD: &str = "id";

pub type Document = Map<String, Value>;

/// Conjunction of `field == value` clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every document in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: ObjectId) -> Self {
        Self::all().eq(ID_FIELD, id)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, value)| doc.get(field).unwrap_or(&Value::Null) == value)
    }

    /// Seed document for an upsert that matched nothing.
    pub(crate) fn seed(&self) -> Document {
        self.clauses.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum UpdateOp {
    Set(Value),
    Push(Value),
    AddToSet(Value),
    Pull(Value),
}

/// Field modifications applied by [`DocumentStore::update_one`] and
/// [`DocumentStore::update_many`], in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<(String, UpdateOp)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push((field.to_string(), UpdateOp::Set(value.into())));
        self
    }

    /// Append to an array field, creating it if missing.
    pub fn push(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push((field.to_string(), UpdateOp::Push(value.into())));
        self
    }

    /// Append unless an equal element is already present.
    pub fn add_to_set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops
            .push((field.to_string(), UpdateOp::AddToSet(value.into())));
        self
    }

    /// Remove every element equal to `value` from an array field.
    pub fn pull(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push((field.to_string(), UpdateOp::Pull(value.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply to `doc` in place. Returns whether anything changed.
    pub fn apply(&self, doc: &mut Document) -> Result<bool> {
        let before = doc.clone();
        for (field, op) in &self.ops {
            if field == ID_FIELD {
                return Err(StoreError::InvalidDocument(
                    "the id field cannot be updated".to_string(),
                ));
            }
            match op {
                UpdateOp::Set(value) => {
                    doc.insert(field.clone(), value.clone());
                }
                UpdateOp::Push(value) => array_field(doc, field)?.push(value.clone()),
                UpdateOp::AddToSet(value) => {
                    let items = array_field(doc, field)?;
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
                UpdateOp::Pull(value) => {
                    if doc.contains_key(field) {
                        array_field(doc, field)?.retain(|item| item != value);
                    }
                }
            }
        }
        Ok(*doc != before)
    }
}

fn array_field<'a>(doc: &'a mut Document, field: &str) -> Result<&'a mut Vec<Value>> {
    let slot = doc
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut().ok_or_else(|| {
        StoreError::InvalidDocument(format!("field '{field}' is not an array"))
    })
}

/// Result of a single-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<ObjectId>,
}

/// Collection-scoped CRUD over JSON documents.
///
/// Reads return documents in store order: insertion order, which an update
/// does not change.
pub trait DocumentStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Insert a document, assigning an `id` if it has none. Returns the id.
    fn insert_one(&self, collection: &str, doc: Document) -> Result<ObjectId>;

    /// Update the first matching document. With `upsert`, a miss inserts the
    /// filter's fields with the update applied and a fresh id.
    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome>;

    /// Update every matching document. Returns the number modified.
    fn update_many(&self, collection: &str, filter: &Filter, update: &Update) -> Result<u64>;

    /// Delete the first matching document. Returns the number deleted.
    fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Delete every matching document. Returns the number deleted.
    fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64>;

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        Ok(self.find(collection, filter)?.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// Typed conversion helpers
// ---------------------------------------------------------------------------

pub fn to_document<T: Serialize>(entity: &T) -> Result<Document> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Read the identity of a document, if it has a well-formed one.
pub fn document_id(doc: &Document) -> Result<ObjectId> {
    let raw = doc
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument("missing id".to_string()))?;
    ObjectId::from_hex(raw).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}
