use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::auth::BookingScope;
use crate::errors::ServiceError;
use crate::store::{Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, UpdateResult};

/// Booking records. Ownership is decided by the caller through [`BookingScope`];
/// create, delete and status updates are not owner-checked.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn DocumentStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self { Self { store } }

    #[instrument(skip(self))]
    pub async fn list(&self, scope: &BookingScope) -> Result<Vec<Document>, ServiceError> {
        self.store.find(Collection::Bookings, &scope.filter()).await
    }

    /// Store the body as given. It must be a JSON object; `_id` is always generated.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::services::BookingService;
    /// use service::store::InMemoryDocumentStore;
    ///
    /// let bookings = BookingService::new(Arc::new(InMemoryDocumentStore::new()));
    /// let res = tokio_test::block_on(bookings.create(serde_json::json!({"email": "a@x.com", "_id": "x"}))).unwrap();
    /// assert!(res.acknowledged);
    /// assert_ne!(res.inserted_id, "x");
    /// ```
    pub async fn create(&self, body: Value) -> Result<InsertOneResult, ServiceError> {
        let Value::Object(doc) = body else {
            return Err(ServiceError::Validation("booking must be a JSON object".into()));
        };
        let res = self.store.insert_one(Collection::Bookings, doc).await?;
        info!(id = %res.inserted_id, "booking_created");
        Ok(res)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<DeleteResult, ServiceError> {
        let id = ServiceError::parse_id(id)?;
        self.store.delete_one(Collection::Bookings, &Filter::by_id(id)).await
    }

    /// Set `status` from the body; every other field of the body is ignored.
    #[instrument(skip(self, body))]
    pub async fn update_status(&self, id: &str, body: Value) -> Result<UpdateResult, ServiceError> {
        let id = ServiceError::parse_id(id)?;
        let status = match body.get("status") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(ServiceError::Validation("`status` must be a string".into())),
        };
        let mut set = Document::new();
        set.insert("status".into(), Value::String(status));
        self.store.update_one(Collection::Bookings, &Filter::by_id(id), set).await
    }
}
