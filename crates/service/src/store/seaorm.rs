use async_trait::async_trait;
use models::document::{self, Criteria};
use sea_orm::DatabaseConnection;
use serde_json::Value;

use super::{apply_set, render, strip_id, Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, Projection, UpdateResult, ID_FIELD};
use crate::errors::ServiceError;

/// PostgreSQL JSONB-backed store; every collection lives in the `document` table.
pub struct SeaOrmDocumentStore {
    pub db: DatabaseConnection,
}

impl SeaOrmDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn matching(&self, collection: Collection, filter: &Filter, limit: Option<u64>) -> Result<Vec<document::Model>, ServiceError> {
        let criteria = Criteria { id: filter.id(), fields: filter.fields(), limit };
        Ok(document::find_matching(&self.db, collection.as_str(), &criteria).await?)
    }
}

fn body(doc: Value) -> Document {
    match doc {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, ServiceError> {
        let rows = self.matching(collection, filter, None).await?;
        Ok(rows.into_iter().map(|m| render(m.id, body(m.doc))).collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Document>, ServiceError> {
        let found = self
            .matching(collection, filter, Some(1))
            .await?
            .into_iter()
            .next()
            .map(|m| render(m.id, body(m.doc)));
        Ok(match (found, projection) {
            (Some(doc), Some(p)) => Some(p.apply(doc)),
            (found, _) => found,
        })
    }

    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertOneResult, ServiceError> {
        let created = document::insert(&self.db, collection.as_str(), Value::Object(strip_id(doc))).await?;
        Ok(InsertOneResult { acknowledged: true, inserted_id: created.id.to_string() })
    }

    async fn update_one(&self, collection: Collection, filter: &Filter, set: Document) -> Result<UpdateResult, ServiceError> {
        let Some(found) = self.matching(collection, filter, Some(1)).await?.into_iter().next() else {
            return Ok(UpdateResult::new(0, 0));
        };
        let mut doc = body(found.doc);
        if !apply_set(&mut doc, &set) {
            return Ok(UpdateResult::new(1, 0));
        }
        let patch: Document = set.into_iter().filter(|(k, _)| k != ID_FIELD).collect();
        // 0 rows means the document went away after the lookup
        match document::merge_doc(&self.db, collection.as_str(), found.id, Value::Object(patch)).await? {
            0 => Ok(UpdateResult::new(0, 0)),
            _ => Ok(UpdateResult::new(1, 1)),
        }
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, ServiceError> {
        let Some(found) = self.matching(collection, filter, Some(1)).await?.into_iter().next() else {
            return Ok(DeleteResult::new(0));
        };
        let deleted = document::hard_delete(&self.db, found.id).await?;
        Ok(DeleteResult::new(deleted))
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        Ok(document::ping(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn seaorm_store_scopes_by_email() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = match get_db().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };
        let store = SeaOrmDocumentStore::new(db);
        store.ping().await?;

        // unique owner so parallel runs do not see each other's rows
        let owner = format!("owner_{}@x.com", Uuid::new_v4().simple());
        let doc = json!({"email": owner, "status": "pending"}).as_object().cloned().unwrap();
        let inserted = store.insert_one(Collection::Bookings, doc).await?;
        let id = Uuid::parse_str(&inserted.inserted_id)?;

        let mine = store.find(Collection::Bookings, &Filter::all().with_eq("email", owner.clone())).await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["_id"], inserted.inserted_id.as_str());

        let set = json!({"status": "confirm"}).as_object().cloned().unwrap();
        let res = store.update_one(Collection::Bookings, &Filter::by_id(id), set).await?;
        assert_eq!((res.matched_count, res.modified_count), (1, 1));
        let after = store.find_one(Collection::Bookings, &Filter::by_id(id), None).await?.unwrap();
        assert_eq!((after["status"].as_str(), after["email"].as_str()), (Some("confirm"), Some(owner.as_str())));

        let deleted = store.delete_one(Collection::Bookings, &Filter::by_id(id)).await?;
        assert_eq!(deleted.deleted_count, 1);
        let set = json!({"status": "late"}).as_object().cloned().unwrap();
        let res = store.update_one(Collection::Bookings, &Filter::by_id(id), set).await?;
        assert_eq!((res.matched_count, res.modified_count), (0, 0));
        Ok(())
    }
}
