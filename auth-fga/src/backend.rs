use crate::{
    context::RequestScope,
    error::{FgaError, Result},
    model::ModelDefinition,
    models::{Tuple, WriteRequest},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub mod http;

pub use http::HttpBackend;

/// Remote authorization engine as seen by the dispatcher.
///
/// Every call is one round trip. Implementations do not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationBackend: Send + Sync {
    /// Apply inserts and deletes as one batch
    async fn write(&self, scope: &RequestScope, request: WriteRequest) -> Result<()>;

    /// Point check; `None` when the engine gives no definite answer
    async fn check(&self, scope: &RequestScope, tuple: &Tuple) -> Result<Option<bool>>;

    /// One decision per tuple, in request order.
    ///
    /// Sent as a single request. Engines cap the number of checks per batch
    /// (OpenFGA defaults to 50, `OPENFGA_MAX_CHECKS_PER_BATCH_CHECK`); a larger
    /// batch is rejected with a remote error rather than split.
    async fn batch_check(&self, scope: &RequestScope, tuples: &[Tuple]) -> Result<Vec<bool>>;

    async fn list_objects(
        &self,
        scope: &RequestScope,
        subject: &str,
        relation: &str,
        object_type: &str,
    ) -> Result<Vec<String>>;

    /// The candidate relations `subject` holds on `object`
    async fn list_relations(
        &self,
        scope: &RequestScope,
        subject: &str,
        relations: &[String],
        object: &str,
    ) -> Result<Vec<String>>;

    async fn create_store(&self, name: &str) -> Result<String>;

    async fn write_authorization_model(&self, store_id: &str, model: &ModelDefinition) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct StoreRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Tuple scoped to its store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StoredTuple {
    store_id: String,
    tuple: Tuple,
}

impl StoredTuple {
    fn new(store_id: &str, tuple: Tuple) -> Self {
        Self {
            store_id: store_id.to_string(),
            tuple,
        }
    }
}

/// Direct-tuple backend for tests and local development.
///
/// Answers checks by tuple existence only; there is no rewrite or userset
/// evaluation.
pub struct InMemoryBackend {
    tuples: Arc<DashSet<StoredTuple>>,
    stores: Arc<DashMap<String, StoreRecord>>,
    models: Arc<DashMap<String, (String, ModelDefinition)>>,
    write_log: Mutex<Vec<(RequestScope, WriteRequest)>>,
    unavailable: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            tuples: Arc::new(DashSet::new()),
            stores: Arc::new(DashMap::new()),
            models: Arc::new(DashMap::new()),
            write_log: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every call fail with a transport error until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Write batches accepted so far, in arrival order
    pub fn write_batches(&self) -> Vec<(RequestScope, WriteRequest)> {
        self.write_log.lock().clone()
    }

    pub fn store(&self, store_id: &str) -> Option<StoreRecord> {
        self.stores.get(store_id).map(|entry| entry.value().clone())
    }

    pub fn model(&self, model_id: &str) -> Option<ModelDefinition> {
        self.models.get(model_id).map(|entry| entry.value().1.clone())
    }

    pub fn tuple_count(&self, store_id: &str) -> usize {
        self.tuples
            .iter()
            .filter(|entry| entry.key().store_id == store_id)
            .count()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FgaError::Transport("in-memory backend marked unavailable".to_string()));
        }
        Ok(())
    }

    fn exists(&self, store_id: &str, tuple: &Tuple) -> bool {
        self.tuples.contains(&StoredTuple::new(store_id, tuple.clone()))
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationBackend for InMemoryBackend {
    async fn write(&self, scope: &RequestScope, request: WriteRequest) -> Result<()> {
        self.ensure_available()?;
        self.write_log.lock().push((scope.clone(), request.clone()));

        for tuple in request.writes {
            self.tuples.insert(StoredTuple::new(&scope.store_id, tuple));
        }

        for tuple in request.deletes {
            self.tuples.remove(&StoredTuple::new(&scope.store_id, tuple));
        }

        Ok(())
    }

    async fn check(&self, scope: &RequestScope, tuple: &Tuple) -> Result<Option<bool>> {
        self.ensure_available()?;
        Ok(Some(self.exists(&scope.store_id, tuple)))
    }

    async fn batch_check(&self, scope: &RequestScope, tuples: &[Tuple]) -> Result<Vec<bool>> {
        self.ensure_available()?;
        Ok(tuples
            .iter()
            .map(|tuple| self.exists(&scope.store_id, tuple))
            .collect())
    }

    async fn list_objects(
        &self,
        scope: &RequestScope,
        subject: &str,
        relation: &str,
        object_type: &str,
    ) -> Result<Vec<String>> {
        self.ensure_available()?;
        let mut objects: Vec<String> = self
            .tuples
            .iter()
            .filter(|entry| {
                let stored = entry.key();
                stored.store_id == scope.store_id
                    && stored.tuple.subject() == subject
                    && stored.tuple.relation() == relation
                    && stored.tuple.object_type() == Some(object_type)
            })
            .map(|entry| entry.key().tuple.object().to_string())
            .collect();

        objects.sort();
        objects.dedup();
        Ok(objects)
    }

    async fn list_relations(
        &self,
        scope: &RequestScope,
        subject: &str,
        relations: &[String],
        object: &str,
    ) -> Result<Vec<String>> {
        self.ensure_available()?;
        Ok(relations
            .iter()
            .filter(|relation| self.exists(&scope.store_id, &Tuple::new(subject, relation.as_str(), object)))
            .cloned()
            .collect())
    }

    async fn create_store(&self, name: &str) -> Result<String> {
        self.ensure_available()?;
        let id = Uuid::new_v4().to_string();
        self.stores.insert(
            id.clone(),
            StoreRecord {
                id: id.clone(),
                name: name.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn write_authorization_model(&self, store_id: &str, model: &ModelDefinition) -> Result<String> {
        self.ensure_available()?;
        if !self.stores.contains_key(store_id) {
            return Err(FgaError::remote(404, format!("store {} not found", store_id)));
        }
        let id = Uuid::new_v4().to_string();
        self.models.insert(id.clone(), (store_id.to_string(), model.clone()));
        Ok(id)
    }
}
