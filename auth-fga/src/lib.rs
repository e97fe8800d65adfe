//! Relationship-based authorization facade for RustCare Engine
//!
//! This crate prepares and dispatches requests to an OpenFGA-compatible
//! authorization engine. It does not evaluate relationships itself:
//! - Expands subject / relation / object lists into full cross-products
//! - Submits every write or delete cross-product as a single batch
//! - Resolves which store and authorization model each call targets
//! - Applies a per-operation fail-safe policy when the engine is unreachable
//! - Provisions a store and model on first run
//!
//! # Fail-safe behavior
//!
//! | Operation | On engine failure |
//! |---|---|
//! | `add_relations` / `remove_relations` | completes silently (fail-open) |
//! | `check` | `Some(false)` (fail-closed) |
//! | `list_objects` / `list_relations` | empty set (fail-closed) |
//! | `batch_check` | error returned to the caller |
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_fga::{FgaConfig, RelationshipClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FgaConfig::new("http://localhost:8080")
//!         .with_model_file("model.json")?
//!         .with_env()?;
//!     let client = RelationshipClient::connect(config).await?;
//!
//!     client
//!         .add_relations(&["user:alice"], &["editor"], &["document:doc1"], None)
//!         .await?;
//!
//!     let allowed = client
//!         .check("user:alice", "editor", "document:doc1", None)
//!         .await?;
//!     assert_eq!(allowed, Some(true));
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod expand;
pub mod model;
pub mod models;
pub mod policy;

pub use backend::{AuthorizationBackend, HttpBackend, InMemoryBackend};
pub use bootstrap::bootstrap;
pub use client::RelationshipClient;
pub use config::FgaConfig;
pub use context::{resolve_model_id, AuthorizationContext, RequestScope};
pub use error::*;
pub use expand::{expand_check_triples, expand_deletes, expand_writes};
pub use model::ModelDefinition;
pub use models::*;
pub use policy::{FailSafePolicy, FailureMode, Operation};
