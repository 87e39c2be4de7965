use std::sync::Arc;

use tracing::instrument;

use crate::errors::ServiceError;
use crate::store::{Collection, Document, DocumentStore, Filter, Projection};

/// Fields exposed by the single-service view.
pub const SERVICE_SUMMARY_FIELDS: [&str; 4] = ["title", "price", "service_id", "img"];

/// Read-only access to the public service catalog.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self { Self { store } }

    pub async fn list(&self) -> Result<Vec<Document>, ServiceError> {
        self.store.find(Collection::Services, &Filter::all()).await
    }

    /// One service projected to its summary fields; `None` when no such id exists.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<Document>, ServiceError> {
        let id = ServiceError::parse_id(id)?;
        let projection = Projection::fields(SERVICE_SUMMARY_FIELDS);
        self.store.find_one(Collection::Services, &Filter::by_id(id), Some(&projection)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDocumentStore;
    use serde_json::json;

    async fn seeded() -> (CatalogService, String) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let doc = json!({"title": "Engine Oil Change", "price": "20.00", "service_id": "01", "img": "a.jpg", "description": "full"});
        let res = store.insert_one(Collection::Services, doc.as_object().cloned().unwrap()).await.unwrap();
        (CatalogService::new(store), res.inserted_id)
    }

    #[tokio::test]
    async fn list_returns_full_documents() {
        let (svc, id) = seeded().await;
        let all = svc.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["_id"], id.as_str());
        assert_eq!(all[0]["description"], "full");
    }

    #[tokio::test]
    async fn get_projects_summary_fields() {
        let (svc, id) = seeded().await;
        let one = svc.get(&id).await.unwrap().unwrap();
        let mut keys: Vec<_> = one.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["_id", "img", "price", "service_id", "title"]);
    }

    #[tokio::test]
    async fn get_unknown_or_malformed_id() {
        let (svc, _) = seeded().await;
        assert!(svc.get(&uuid::Uuid::new_v4().to_string()).await.unwrap().is_none());
        assert!(matches!(svc.get("not-an-id").await, Err(ServiceError::Validation(_))));
    }
}
