//! Document store abstraction.
//!
//! Collections hold schema-flexible JSON objects addressed by a generated `_id`.
//! Operations mirror the find / insert / update / delete-by-filter surface the
//! handlers need, and mutation summaries keep the store's camelCase shape so
//! they can be returned to clients unchanged.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::ServiceError;

pub mod memory;
pub mod seaorm;

pub use memory::InMemoryDocumentStore;
pub use seaorm::SeaOrmDocumentStore;

/// A stored record, always rendered with its `_id`.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Services,
    Bookings,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Services => "services",
            Collection::Bookings => "bookings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conjunction of an optional id match and string equality on top-level fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    id: Option<Uuid>,
    fields: Vec<(String, String)>,
}

impl Filter {
    pub fn all() -> Self { Self::default() }

    pub fn by_id(id: Uuid) -> Self { Self { id: Some(id), fields: Vec::new() } }

    pub fn with_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    pub fn id(&self) -> Option<Uuid> { self.id }

    pub fn fields(&self) -> &[(String, String)] { &self.fields }

    pub fn matches(&self, id: Uuid, doc: &Document) -> bool {
        if self.id.is_some_and(|want| want != id) {
            return false;
        }
        self.fields
            .iter()
            .all(|(field, value)| doc.get(field).and_then(Value::as_str) == Some(value.as_str()))
    }
}

/// Keeps `_id` plus the named top-level fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }

    pub fn apply(&self, doc: Document) -> Document {
        doc.into_iter()
            .filter(|(k, _)| k == ID_FIELD || self.fields.iter().any(|f| f == k))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self { acknowledged: true, matched_count, modified_count, upserted_count: 0, upserted_id: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self { Self { acknowledged: true, deleted_count } }
}

/// Repository abstraction over the external document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents matching `filter`, in insertion order.
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, ServiceError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Document>, ServiceError>;

    /// Store a new document; any client supplied `_id` is replaced.
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertOneResult, ServiceError>;

    /// `$set` the given fields on the first matching document.
    async fn update_one(&self, collection: Collection, filter: &Filter, set: Document) -> Result<UpdateResult, ServiceError>;

    /// Remove the first matching document.
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, ServiceError>;

    /// Connectivity check used at startup.
    async fn ping(&self) -> Result<(), ServiceError> { Ok(()) }
}

pub(crate) fn render(id: Uuid, mut doc: Document) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc
}

pub(crate) fn strip_id(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    doc
}

/// Apply `$set` semantics; returns whether anything changed.
pub(crate) fn apply_set(doc: &mut Document, set: &Document) -> bool {
    let mut changed = false;
    for (k, v) in set {
        if k == ID_FIELD {
            continue;
        }
        if doc.get(k) != Some(v) {
            doc.insert(k.clone(), v.clone());
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn filter_matches_id_and_fields() {
        let id = Uuid::new_v4();
        let d = doc(json!({"email": "a@x.com", "status": "pending", "price": 20}));
        assert!(Filter::all().matches(id, &d));
        assert!(Filter::by_id(id).matches(id, &d));
        assert!(!Filter::by_id(Uuid::new_v4()).matches(id, &d));
        assert!(Filter::all().with_eq("email", "a@x.com").matches(id, &d));
        assert!(!Filter::all().with_eq("email", "b@x.com").matches(id, &d));
        // non-string values never equal a string predicate
        assert!(!Filter::all().with_eq("price", "20").matches(id, &d));
        assert!(!Filter::all().with_eq("missing", "x").matches(id, &d));
    }

    #[test]
    fn projection_keeps_id_and_named_fields() {
        let d = render(Uuid::nil(), doc(json!({"title": "Oil", "price": 20, "description": "long", "img": "i.png"})));
        let p = Projection::fields(["title", "price", "service_id", "img"]);
        let out = p.apply(d);
        assert_eq!(out.len(), 4);
        assert!(out.contains_key("_id"));
        assert!(!out.contains_key("description"));
    }

    #[test]
    fn apply_set_reports_changes_and_protects_id() {
        let mut d = render(Uuid::nil(), doc(json!({"status": "pending"})));
        assert!(!apply_set(&mut d, &doc(json!({"status": "pending"}))));
        assert!(apply_set(&mut d, &doc(json!({"status": "confirm", "_id": "x"}))));
        assert_eq!(d["status"], "confirm");
        assert_eq!(d["_id"], Uuid::nil().to_string());
    }

    #[test]
    fn results_serialize_camel_case() {
        let v = serde_json::to_value(UpdateResult::new(1, 1)).unwrap();
        assert_eq!(v, json!({"acknowledged": true, "matchedCount": 1, "modifiedCount": 1, "upsertedCount": 0, "upsertedId": null}));
        let v = serde_json::to_value(DeleteResult::new(0)).unwrap();
        assert_eq!(v, json!({"acknowledged": true, "deletedCount": 0}));
    }
}
