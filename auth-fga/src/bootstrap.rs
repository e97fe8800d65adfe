//! Store and model provisioning.
//!
//! Runs once before steady-state traffic. Two concurrent bootstraps against an
//! unconfigured engine would each create a store.

use crate::{
    backend::AuthorizationBackend, config::FgaConfig, context::AuthorizationContext, error::Result,
};
use tracing::{info, warn};

/// Resolve the store and default model, creating whichever is missing.
///
/// # Errors
///
/// Store or model creation failures are returned as-is; bootstrap is not
/// covered by the fail-safe policy.
pub async fn bootstrap(backend: &dyn AuthorizationBackend, config: &FgaConfig) -> Result<AuthorizationContext> {
    let store_id = match non_empty(config.store_id.as_deref()) {
        Some(store_id) => {
            info!(store_id = %store_id, "Using configured authorization store");
            store_id.to_string()
        }
        None => {
            let store_id = backend.create_store(&config.store_name).await?;
            info!(store_id = %store_id, name = %config.store_name, "Created authorization store");
            store_id
        }
    };

    let model_id = match (non_empty(config.model_id.as_deref()), &config.model_definition) {
        (Some(model_id), _) => {
            info!(model_id = %model_id, "Using configured authorization model");
            model_id.to_string()
        }
        (None, Some(model)) => {
            let model_id = backend.write_authorization_model(&store_id, model).await?;
            info!(
                model_id = %model_id,
                types = model.type_names().len(),
                "Wrote authorization model"
            );
            model_id
        }
        (None, None) => {
            warn!("No authorization model id or definition configured; requests must supply a model id");
            String::new()
        }
    };

    Ok(AuthorizationContext::new(store_id, model_id))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::model::ModelDefinition;

    fn model() -> ModelDefinition {
        ModelDefinition::parse(r#"{"schema_version": "1.1", "type_definitions": [{"type": "user"}]}"#).unwrap()
    }

    #[tokio::test]
    async fn test_provisions_store_and_model() {
        let backend = InMemoryBackend::new();
        let config = FgaConfig::default().with_model_definition(model());

        let context = bootstrap(&backend, &config).await.unwrap();

        let store = backend.store(context.store_id()).unwrap();
        assert_eq!(store.name, "rustcare");
        assert_eq!(backend.model(context.default_model_id()), Some(model()));
    }

    #[tokio::test]
    async fn test_configured_ids_skip_provisioning() {
        let backend = InMemoryBackend::new();
        backend.set_unavailable(true);
        let config = FgaConfig::default()
            .with_store_id("store-1")
            .with_model_id("model-1")
            .with_model_definition(model());

        // No engine call is made, so an unreachable engine does not matter
        let context = bootstrap(&backend, &config).await.unwrap();
        assert_eq!(context, AuthorizationContext::new("store-1", "model-1"));
    }

    #[tokio::test]
    async fn test_missing_model_leaves_default_empty() {
        let backend = InMemoryBackend::new();
        let config = FgaConfig::default().with_store_id("store-1");

        let context = bootstrap(&backend, &config).await.unwrap();
        assert_eq!(context.default_model_id(), "");
    }

    #[tokio::test]
    async fn test_store_creation_failure_propagates() {
        let backend = InMemoryBackend::new();
        backend.set_unavailable(true);

        assert!(bootstrap(&backend, &FgaConfig::default()).await.is_err());
    }
}
