use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{apply_set, render, strip_id, Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, Projection, UpdateResult};
use crate::errors::ServiceError;

/// Process-local store for development and tests. Documents keep insertion order.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<(Uuid, Document)>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self { Self::default() }

    /// Number of documents currently held in `collection`.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections.read().await.get(&collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, ServiceError> {
        let map = self.collections.read().await;
        let docs = map
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|(id, doc)| filter.matches(*id, doc))
                    .map(|(id, doc)| render(*id, doc.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Document>, ServiceError> {
        let map = self.collections.read().await;
        let found = map
            .get(&collection)
            .and_then(|rows| rows.iter().find(|(id, doc)| filter.matches(*id, doc)))
            .map(|(id, doc)| render(*id, doc.clone()));
        Ok(match (found, projection) {
            (Some(doc), Some(p)) => Some(p.apply(doc)),
            (found, _) => found,
        })
    }

    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertOneResult, ServiceError> {
        let id = Uuid::new_v4();
        let mut map = self.collections.write().await;
        map.entry(collection).or_default().push((id, strip_id(doc)));
        Ok(InsertOneResult { acknowledged: true, inserted_id: id.to_string() })
    }

    async fn update_one(&self, collection: Collection, filter: &Filter, set: Document) -> Result<UpdateResult, ServiceError> {
        let mut map = self.collections.write().await;
        let target = map
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|(id, doc)| filter.matches(*id, doc)));
        Ok(match target {
            Some((_, doc)) => {
                let modified = apply_set(doc, &set);
                UpdateResult::new(1, u64::from(modified))
            }
            None => UpdateResult::new(0, 0),
        })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, ServiceError> {
        let mut map = self.collections.write().await;
        let Some(rows) = map.get_mut(&collection) else {
            return Ok(DeleteResult::new(0));
        };
        match rows.iter().position(|(id, doc)| filter.matches(*id, doc)) {
            Some(idx) => {
                rows.remove(idx);
                Ok(DeleteResult::new(1))
            }
            None => Ok(DeleteResult::new(0)),
        }
    }
}
