use crate::{
    backend::{AuthorizationBackend, HttpBackend},
    bootstrap::bootstrap,
    config::FgaConfig,
    context::AuthorizationContext,
    error::{FgaError, Result},
    expand::{check_triples, write_tuples},
    models::{BatchCheckResponse, Tuple, WriteRequest},
    policy::{FailSafePolicy, Operation},
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Relationship client: expands caller lists into engine requests and applies
/// the fail-safe policy to every result.
///
/// Cheap to clone; all state is shared and read-only after construction.
#[derive(Clone)]
pub struct RelationshipClient {
    backend: Arc<dyn AuthorizationBackend>,
    context: Arc<AuthorizationContext>,
    policy: FailSafePolicy,
}

impl RelationshipClient {
    pub fn new(backend: Arc<dyn AuthorizationBackend>, context: AuthorizationContext) -> Self {
        Self {
            backend,
            context: Arc::new(context),
            policy: FailSafePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailSafePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the HTTP transport, provision the store and model, and return a
    /// ready client.
    ///
    /// # Errors
    ///
    /// Fails when the transport cannot be built or provisioning fails.
    pub async fn connect(config: FgaConfig) -> Result<Self> {
        let backend: Arc<dyn AuthorizationBackend> = Arc::new(HttpBackend::new(&config)?);
        Self::bootstrap_with(backend, config).await
    }

    /// Provision through an existing backend.
    pub async fn bootstrap_with(backend: Arc<dyn AuthorizationBackend>, config: FgaConfig) -> Result<Self> {
        let context = bootstrap(backend.as_ref(), &config).await?;
        Ok(Self::new(backend, context).with_policy(config.failure_policy))
    }

    pub fn context(&self) -> &AuthorizationContext {
        &self.context
    }

    pub fn policy(&self) -> &FailSafePolicy {
        &self.policy
    }

    // =============================================================================
    // Tuple Management
    // =============================================================================

    /// Grant every relation to every subject on every object, as one batch.
    ///
    /// Mutations are best-effort: under the default policy an engine failure
    /// is logged and swallowed, and a batch the engine applies only in part is
    /// not detected here. Callers must not assume the relation state changed.
    pub async fn add_relations<S, R, O>(
        &self,
        subjects: &[S],
        relations: &[R],
        objects: &[O],
        model_id: Option<&str>,
    ) -> Result<()>
    where
        S: AsRef<str>,
        R: AsRef<str>,
        O: AsRef<str>,
    {
        let request = WriteRequest::inserts(write_tuples(subjects, relations, objects).collect());
        self.submit(Operation::AddRelations, request, model_id).await
    }

    /// Revoke the full cross-product, as one batch. Same guarantees as
    /// [`Self::add_relations`].
    pub async fn remove_relations<S, R, O>(
        &self,
        subjects: &[S],
        relations: &[R],
        objects: &[O],
        model_id: Option<&str>,
    ) -> Result<()>
    where
        S: AsRef<str>,
        R: AsRef<str>,
        O: AsRef<str>,
    {
        let request = WriteRequest::removals(write_tuples(subjects, relations, objects).collect());
        self.submit(Operation::RemoveRelations, request, model_id).await
    }

    async fn submit(&self, operation: Operation, request: WriteRequest, model_id: Option<&str>) -> Result<()> {
        if request.is_empty() {
            debug!(operation = %operation, "Empty cross-product; nothing to submit");
            return Ok(());
        }

        let scope = self.context.scope(model_id);
        debug!(
            operation = %operation,
            model_id = %scope.model_id,
            tuples = request.len(),
            "Dispatching write batch"
        );
        let result = self.backend.write(&scope, request).await;
        self.policy.apply(operation, result, || ())
    }

    // =============================================================================
    // Authorization Queries
    // =============================================================================

    /// Point check.
    ///
    /// `Some(true)` / `Some(false)` are definite answers and `None` means the
    /// engine gave none. Under the default policy an engine failure reads as
    /// `Some(false)`, indistinguishable from a deny.
    pub async fn check(
        &self,
        subject: &str,
        relation: &str,
        object: &str,
        model_id: Option<&str>,
    ) -> Result<Option<bool>> {
        let scope = self.context.scope(model_id);
        let tuple = Tuple::new(subject, relation, object);
        debug!(tuple = %tuple, model_id = %scope.model_id, "Dispatching check");

        let result = self.backend.check(&scope, &tuple).await;
        self.policy.apply(Operation::Check, result, || Some(false))
    }

    /// Check every (subject, relation, object) combination in one request.
    ///
    /// # Errors
    ///
    /// Unlike the other queries, engine failures are returned to the caller
    /// under the default policy.
    ///
    /// # Limits
    ///
    /// The full cross-product goes out as one request and is not chunked.
    /// OpenFGA rejects batches over its per-request check limit (50 by
    /// default), so callers with larger products split the subject, relation
    /// or object lists themselves. `list_relations` with many candidates is
    /// bounded the same way on the HTTP backend.
    pub async fn batch_check<S, R, O>(
        &self,
        subjects: &[S],
        relations: &[R],
        objects: &[O],
        model_id: Option<&str>,
    ) -> Result<BatchCheckResponse>
    where
        S: AsRef<str>,
        R: AsRef<str>,
        O: AsRef<str>,
    {
        let triples: Vec<Tuple> = check_triples(subjects, relations, objects).collect();
        if triples.is_empty() {
            return Ok(BatchCheckResponse::default());
        }

        let scope = self.context.scope(model_id);
        debug!(model_id = %scope.model_id, checks = triples.len(), "Dispatching batch check");

        let result = match self.backend.batch_check(&scope, &triples).await {
            Ok(decisions) if decisions.len() != triples.len() => Err(FgaError::UnexpectedResponse(format!(
                "Expected {} batch check results, got {}",
                triples.len(),
                decisions.len()
            ))),
            other => other.map(Some),
        };

        // `None` marks the fail-closed fallback
        match self.policy.apply(Operation::BatchCheck, result, || None)? {
            Some(decisions) => Ok(BatchCheckResponse::from_decisions(triples, decisions)),
            None => Ok(BatchCheckResponse::denied(triples)),
        }
    }

    /// Objects of `object_type` on which `subject` holds `relation`.
    pub async fn list_objects(
        &self,
        subject: &str,
        relation: &str,
        object_type: &str,
        model_id: Option<&str>,
    ) -> Result<HashSet<String>> {
        let scope = self.context.scope(model_id);
        debug!(subject, relation, object_type, model_id = %scope.model_id, "Dispatching list objects");

        let result = self
            .backend
            .list_objects(&scope, subject, relation, object_type)
            .await
            .map(|objects| objects.into_iter().collect());
        self.policy.apply(Operation::ListObjects, result, HashSet::new)
    }

    /// The subset of `relations` that `subject` holds on `object`.
    pub async fn list_relations<R>(
        &self,
        subject: &str,
        relations: &[R],
        object: &str,
        model_id: Option<&str>,
    ) -> Result<HashSet<String>>
    where
        R: AsRef<str>,
    {
        let candidates: Vec<String> = relations.iter().map(|r| r.as_ref().to_string()).collect();
        let scope = self.context.scope(model_id);
        debug!(subject, object, candidates = candidates.len(), model_id = %scope.model_id, "Dispatching list relations");

        let result = self
            .backend
            .list_relations(&scope, subject, &candidates, object)
            .await
            .map(|held| {
                held.into_iter()
                    .filter(|relation| candidates.contains(relation))
                    .collect()
            });
        self.policy.apply(Operation::ListRelations, result, HashSet::new)
    }
}
