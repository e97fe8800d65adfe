//! OpenFGA HTTP API transport

use super::AuthorizationBackend;
use crate::{
    config::FgaConfig,
    context::RequestScope,
    error::{FgaError, Result},
    model::ModelDefinition,
    models::{Tuple, WriteRequest},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct TupleKeys<'a> {
    tuple_keys: &'a [Tuple],
}

#[derive(Debug, Serialize)]
struct WriteBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    writes: Option<TupleKeys<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deletes: Option<TupleKeys<'a>>,
    authorization_model_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckBody<'a> {
    tuple_key: &'a Tuple,
    authorization_model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckResponseBody {
    allowed: Option<bool>,
}

#[derive(Debug, Serialize)]
struct BatchCheckItem<'a> {
    tuple_key: &'a Tuple,
    correlation_id: String,
}

#[derive(Debug, Serialize)]
struct BatchCheckBody<'a> {
    checks: Vec<BatchCheckItem<'a>>,
    authorization_model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchCheckResponseBody {
    #[serde(default)]
    result: HashMap<String, BatchCheckSingleResult>,
}

#[derive(Debug, Deserialize)]
struct BatchCheckSingleResult {
    allowed: Option<bool>,
    error: Option<RemoteErrorBody>,
}

#[derive(Debug, Serialize)]
struct ListObjectsBody<'a> {
    authorization_model_id: &'a str,
    #[serde(rename = "type")]
    object_type: &'a str,
    relation: &'a str,
    user: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListObjectsResponseBody {
    #[serde(default)]
    objects: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateStoreBody<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateStoreResponseBody {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WriteModelResponseBody {
    authorization_model_id: String,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RemoteErrorBody {
    fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unspecified error".to_string(),
        }
    }
}

impl HttpBackend {
    /// Create a transport for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(config: &FgaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| FgaError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url().to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn store_url(&self, store_id: &str, endpoint: &str) -> String {
        self.url(&format!("stores/{}/{}", store_id, endpoint))
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FgaError::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RemoteErrorBody>(&text)
                .map(|body| body.describe())
                .unwrap_or(text);
            return Err(FgaError::remote(status.as_u16(), message));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| FgaError::UnexpectedResponse(format!("Response parse error: {}", e)))
    }
}

#[async_trait]
impl AuthorizationBackend for HttpBackend {
    async fn write(&self, scope: &RequestScope, request: WriteRequest) -> Result<()> {
        let body = WriteBody {
            writes: (!request.writes.is_empty()).then(|| TupleKeys {
                tuple_keys: &request.writes,
            }),
            deletes: (!request.deletes.is_empty()).then(|| TupleKeys {
                tuple_keys: &request.deletes,
            }),
            authorization_model_id: &scope.model_id,
        };

        debug!(
            store_id = %scope.store_id,
            writes = request.writes.len(),
            deletes = request.deletes.len(),
            "Submitting write batch"
        );
        let _: serde_json::Value = self.post(&self.store_url(&scope.store_id, "write"), &body).await?;
        Ok(())
    }

    async fn check(&self, scope: &RequestScope, tuple: &Tuple) -> Result<Option<bool>> {
        let body = CheckBody {
            tuple_key: tuple,
            authorization_model_id: &scope.model_id,
        };
        let response: CheckResponseBody = self.post(&self.store_url(&scope.store_id, "check"), &body).await?;
        Ok(response.allowed)
    }

    /// One `batch-check` request, unchunked. Past the engine's per-request
    /// check limit the whole call fails with [`FgaError::Remote`].
    async fn batch_check(&self, scope: &RequestScope, tuples: &[Tuple]) -> Result<Vec<bool>> {
        // The index into `tuples` doubles as the correlation id.
        let checks = tuples
            .iter()
            .enumerate()
            .map(|(index, tuple)| BatchCheckItem {
                tuple_key: tuple,
                correlation_id: index.to_string(),
            })
            .collect();
        let body = BatchCheckBody {
            checks,
            authorization_model_id: &scope.model_id,
        };

        let response: BatchCheckResponseBody = self
            .post(&self.store_url(&scope.store_id, "batch-check"), &body)
            .await?;

        let mut decisions: Vec<Option<bool>> = vec![None; tuples.len()];
        for (correlation_id, outcome) in response.result {
            let index = correlation_id
                .parse::<usize>()
                .ok()
                .filter(|index| *index < tuples.len())
                .ok_or_else(|| {
                    FgaError::UnexpectedResponse(format!("Unknown correlation id '{}'", correlation_id))
                })?;

            if let Some(error) = outcome.error {
                return Err(FgaError::BatchItem {
                    correlation_id,
                    message: error.describe(),
                });
            }
            if let Some(slot) = decisions.get_mut(index) {
                *slot = Some(outcome.allowed.unwrap_or(false));
            }
        }

        decisions
            .into_iter()
            .enumerate()
            .map(|(index, decision)| {
                decision.ok_or_else(|| {
                    FgaError::UnexpectedResponse(format!("Batch check result missing for item {}", index))
                })
            })
            .collect()
    }

    async fn list_objects(
        &self,
        scope: &RequestScope,
        subject: &str,
        relation: &str,
        object_type: &str,
    ) -> Result<Vec<String>> {
        let body = ListObjectsBody {
            authorization_model_id: &scope.model_id,
            object_type,
            relation,
            user: subject,
        };
        let response: ListObjectsResponseBody = self
            .post(&self.store_url(&scope.store_id, "list-objects"), &body)
            .await?;
        Ok(response.objects)
    }

    async fn list_relations(
        &self,
        scope: &RequestScope,
        subject: &str,
        relations: &[String],
        object: &str,
    ) -> Result<Vec<String>> {
        if relations.is_empty() {
            return Ok(Vec::new());
        }

        let tuples: Vec<Tuple> = relations
            .iter()
            .map(|relation| Tuple::new(subject, relation.as_str(), object))
            .collect();
        let decisions = self.batch_check(scope, &tuples).await?;

        Ok(relations
            .iter()
            .zip(decisions)
            .filter(|(_, allowed)| *allowed)
            .map(|(relation, _)| relation.clone())
            .collect())
    }

    async fn create_store(&self, name: &str) -> Result<String> {
        let response: CreateStoreResponseBody = self.post(&self.url("stores"), &CreateStoreBody { name }).await?;
        Ok(response.id)
    }

    async fn write_authorization_model(&self, store_id: &str, model: &ModelDefinition) -> Result<String> {
        let response: WriteModelResponseBody = self
            .post(&self.store_url(store_id, "authorization-models"), model)
            .await?;
        Ok(response.authorization_model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let backend = HttpBackend::new(&FgaConfig::new("http://fga.local:8080/")).unwrap();
        assert_eq!(backend.url("stores"), "http://fga.local:8080/stores");
        assert_eq!(
            backend.store_url("01HSTORE", "batch-check"),
            "http://fga.local:8080/stores/01HSTORE/batch-check"
        );
    }

    #[test]
    fn test_write_body_omits_empty_halves() {
        let writes = vec![Tuple::new("user:1", "editor", "doc:42")];
        let body = WriteBody {
            writes: Some(TupleKeys { tuple_keys: &writes }),
            deletes: None,
            authorization_model_id: "model-1",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "writes": {"tuple_keys": [{"user": "user:1", "relation": "editor", "object": "doc:42"}]},
                "authorization_model_id": "model-1"
            })
        );
    }

    #[test]
    fn test_remote_error_description() {
        let body: RemoteErrorBody =
            serde_json::from_str(r#"{"code": "validation_error", "message": "invalid model id"}"#).unwrap();
        assert_eq!(body.describe(), "validation_error: invalid model id");
    }
}
