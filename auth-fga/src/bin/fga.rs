//! Relationship administration tool
//!
//! Usage:
//!   cargo run --bin fga -- --api-url http://localhost:8080 bootstrap --model-file model.json
//!   cargo run --bin fga -- add -s user:1 -r editor -o doc:42
//!   cargo run --bin fga -- check -s user:1 -r editor -o doc:42

use anyhow::Context;
use auth_fga::{FgaConfig, RelationshipClient};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fga")]
#[command(about = "Manage and query relationship tuples in the authorization engine")]
struct Cli {
    /// Authorization engine base URL
    #[arg(long, env = "FGA_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Existing store id; a store is created when omitted
    #[arg(long, env = "FGA_STORE_ID")]
    store_id: Option<String>,

    /// Default authorization model id
    #[arg(long, env = "FGA_MODEL_ID")]
    model_id: Option<String>,

    /// Bearer token for the engine API
    #[arg(long, env = "FGA_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Authorization model document written when no model id is configured
    #[arg(long)]
    model_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision the store and model, then print their ids
    Bootstrap,
    /// Write the subject x relation x object cross-product
    Add(CrossProduct),
    /// Delete the subject x relation x object cross-product
    Remove(CrossProduct),
    /// Check a single tuple
    Check(Single),
    /// Check the subject x relation x object cross-product
    BatchCheck(CrossProduct),
    /// List objects of a type the subject holds a relation on
    ListObjects {
        #[arg(short, long)]
        subject: String,
        #[arg(short, long)]
        relation: String,
        #[arg(short = 't', long = "type")]
        object_type: String,
        #[arg(long = "for-model")]
        for_model: Option<String>,
    },
    /// List which of the given relations the subject holds on the object
    ListRelations {
        #[arg(short, long)]
        subject: String,
        #[arg(short, long, value_delimiter = ',', required = true)]
        relation: Vec<String>,
        #[arg(short, long)]
        object: String,
        #[arg(long = "for-model")]
        for_model: Option<String>,
    },
}

#[derive(Args, Debug)]
struct CrossProduct {
    #[arg(short, long, value_delimiter = ',', required = true)]
    subject: Vec<String>,
    #[arg(short, long, value_delimiter = ',', required = true)]
    relation: Vec<String>,
    #[arg(short, long, value_delimiter = ',', required = true)]
    object: Vec<String>,
    /// Model id for this call only
    #[arg(long = "for-model")]
    for_model: Option<String>,
}

#[derive(Args, Debug)]
struct Single {
    #[arg(short, long)]
    subject: String,
    #[arg(short, long)]
    relation: String,
    #[arg(short, long)]
    object: String,
    #[arg(long = "for-model")]
    for_model: Option<String>,
}

impl Cli {
    fn config(&self) -> anyhow::Result<FgaConfig> {
        let mut config = FgaConfig::new(&self.api_url);
        if let Some(ref store_id) = self.store_id {
            config = config.with_store_id(store_id);
        }
        if let Some(ref model_id) = self.model_id {
            config = config.with_model_id(model_id);
        }
        if let Some(ref token) = self.api_token {
            config = config.with_api_token(token);
        }
        if let Some(ref path) = self.model_file {
            config = config
                .with_model_file(path)
                .with_context(|| format!("Failed to load model from {}", path.display()))?;
        }
        Ok(config.with_env()?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    info!("Authorization engine: {}", config.api_url());

    let client = RelationshipClient::connect(config)
        .await
        .context("Failed to initialize authorization client")?;

    let output = match cli.command {
        Command::Bootstrap => json!({
            "store_id": client.context().store_id(),
            "model_id": client.context().default_model_id(),
        }),
        Command::Add(args) => {
            client
                .add_relations(&args.subject, &args.relation, &args.object, args.for_model.as_deref())
                .await?;
            json!({ "submitted": args.subject.len() * args.relation.len() * args.object.len() })
        }
        Command::Remove(args) => {
            client
                .remove_relations(&args.subject, &args.relation, &args.object, args.for_model.as_deref())
                .await?;
            json!({ "submitted": args.subject.len() * args.relation.len() * args.object.len() })
        }
        Command::Check(args) => {
            let allowed = client
                .check(&args.subject, &args.relation, &args.object, args.for_model.as_deref())
                .await?;
            json!({ "allowed": allowed })
        }
        Command::BatchCheck(args) => {
            let response = client
                .batch_check(&args.subject, &args.relation, &args.object, args.for_model.as_deref())
                .await?;
            serde_json::to_value(response)?
        }
        Command::ListObjects {
            subject,
            relation,
            object_type,
            for_model,
        } => {
            let mut objects: Vec<_> = client
                .list_objects(&subject, &relation, &object_type, for_model.as_deref())
                .await?
                .into_iter()
                .collect();
            objects.sort();
            json!({ "objects": objects })
        }
        Command::ListRelations {
            subject,
            relation,
            object,
            for_model,
        } => {
            let mut relations: Vec<_> = client
                .list_relations(&subject, &relation, &object, for_model.as_deref())
                .await?
                .into_iter()
                .collect();
            relations.sort();
            json!({ "relations": relations })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_product_lists_split_on_commas() {
        let cli = Cli::try_parse_from([
            "fga", "add", "-s", "user:a,user:b", "-r", "viewer", "-r", "editor", "-o", "doc:1",
        ])
        .unwrap();

        match cli.command {
            Command::Add(args) => {
                assert_eq!(args.subject, vec!["user:a", "user:b"]);
                assert_eq!(args.relation, vec!["viewer", "editor"]);
                assert_eq!(args.object, vec!["doc:1"]);
                assert!(args.for_model.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_batch_check_with_model_override() {
        let cli = Cli::try_parse_from([
            "fga", "batch-check", "-s", "user:a", "-r", "viewer", "-o", "doc:1,doc:2", "--for-model", "01HMODEL",
        ])
        .unwrap();

        match cli.command {
            Command::BatchCheck(args) => {
                assert_eq!(args.object, vec!["doc:1", "doc:2"]);
                assert_eq!(args.for_model.as_deref(), Some("01HMODEL"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_list_commands() {
        let cli = Cli::try_parse_from(["fga", "list-objects", "-s", "user:a", "-r", "viewer", "-t", "document"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::ListObjects { ref object_type, .. } if object_type == "document"
        ));

        let cli = Cli::try_parse_from([
            "fga", "list-relations", "-s", "user:a", "-r", "viewer,editor,owner", "-o", "doc:1",
        ])
        .unwrap();
        match cli.command {
            Command::ListRelations { relation, .. } => assert_eq!(relation, vec!["viewer", "editor", "owner"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cross_product_requires_every_axis() {
        assert!(Cli::try_parse_from(["fga", "add", "-s", "user:a", "-r", "viewer"]).is_err());
    }

    #[test]
    fn test_global_flags_and_model_file() {
        let cli = Cli::try_parse_from([
            "fga", "--store-id", "01HSTORE", "--model-file", "model.json", "bootstrap",
        ])
        .unwrap();
        assert_eq!(cli.store_id.as_deref(), Some("01HSTORE"));
        assert_eq!(cli.model_file, Some(PathBuf::from("model.json")));
        assert!(matches!(cli.command, Command::Bootstrap));
    }
}
