use serde::{Deserialize, Serialize};
use tracing::warn;

/// Store and default model captured once at bootstrap.
///
/// Shared read-only by every operation; a per-call model override never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationContext {
    store_id: String,
    model_id: String,
}

impl AuthorizationContext {
    pub fn new(store_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            model_id: model_id.into(),
        }
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Process-wide default model id; may be empty
    pub fn default_model_id(&self) -> &str {
        &self.model_id
    }

    pub fn resolve_model_id(&self, model_override: Option<&str>) -> String {
        resolve_model_id(&self.model_id, model_override)
    }

    /// Fix the store and model for one operation.
    pub fn scope(&self, model_override: Option<&str>) -> RequestScope {
        let model_id = self.resolve_model_id(model_override);
        if model_id.is_empty() {
            warn!(
                store_id = %self.store_id,
                "No authorization model id configured or supplied; the engine will reject this request"
            );
        }
        RequestScope {
            store_id: self.store_id.clone(),
            model_id,
        }
    }
}

/// Store and model targeted by a single operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestScope {
    pub store_id: String,
    pub model_id: String,
}

impl RequestScope {
    pub fn new(store_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            model_id: model_id.into(),
        }
    }
}

/// A non-empty override wins verbatim; otherwise the default is used.
pub fn resolve_model_id(default_model_id: &str, model_override: Option<&str>) -> String {
    match model_override {
        Some(model_id) if !model_id.is_empty() => model_id.to_string(),
        _ => default_model_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_verbatim() {
        assert_eq!(resolve_model_id("default", Some("01HOVERRIDE")), "01HOVERRIDE");
        assert_eq!(resolve_model_id("default", Some(" spaced ")), " spaced ");
    }

    #[test]
    fn test_default_when_no_override() {
        assert_eq!(resolve_model_id("default", None), "default");
        assert_eq!(resolve_model_id("default", Some("")), "default");
    }

    #[test]
    fn test_missing_default_passes_through_empty() {
        assert_eq!(resolve_model_id("", None), "");
    }

    #[test]
    fn test_resolution_is_independent_of_call_order() {
        let context = AuthorizationContext::new("store", "default");

        assert_eq!(context.resolve_model_id(Some("first")), "first");
        assert_eq!(context.resolve_model_id(None), "default");
        assert_eq!(context.resolve_model_id(Some("second")), "second");
        assert_eq!(context.resolve_model_id(None), "default");
        assert_eq!(context.default_model_id(), "default");
    }

    #[test]
    fn test_scope_carries_store() {
        let context = AuthorizationContext::new("store-1", "model-1");
        assert_eq!(context.scope(None), RequestScope::new("store-1", "model-1"));
        assert_eq!(context.scope(Some("model-2")), RequestScope::new("store-1", "model-2"));
    }
}
