//! What each dispatcher operation returns when the engine call fails.
//!
//! Mutations fail open, point checks and list queries fail closed, and batch
//! checks propagate the error. The table lives in [`FailSafePolicy::default`]
//! so the asymmetry is visible in one place.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

/// Dispatcher operations governed by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AddRelations,
    RemoveRelations,
    Check,
    BatchCheck,
    ListObjects,
    ListRelations,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::AddRelations,
        Operation::RemoveRelations,
        Operation::Check,
        Operation::BatchCheck,
        Operation::ListObjects,
        Operation::ListRelations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AddRelations => "add_relations",
            Operation::RemoveRelations => "remove_relations",
            Operation::Check => "check",
            Operation::BatchCheck => "batch_check",
            Operation::ListObjects => "list_objects",
            Operation::ListRelations => "list_relations",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Complete as if the call succeeded
    FailOpen,
    /// Return the deny / empty value
    FailClosed,
    /// Hand the error to the caller
    Propagate,
}

/// Per-operation failure modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailSafePolicy {
    pub add_relations: FailureMode,
    pub remove_relations: FailureMode,
    pub check: FailureMode,
    pub batch_check: FailureMode,
    pub list_objects: FailureMode,
    pub list_relations: FailureMode,
}

impl Default for FailSafePolicy {
    fn default() -> Self {
        Self {
            add_relations: FailureMode::FailOpen,
            remove_relations: FailureMode::FailOpen,
            check: FailureMode::FailClosed,
            // Unlike the other reads, batch check surfaces engine failures.
            batch_check: FailureMode::Propagate,
            list_objects: FailureMode::FailClosed,
            list_relations: FailureMode::FailClosed,
        }
    }
}

impl FailSafePolicy {
    pub fn mode(&self, operation: Operation) -> FailureMode {
        match operation {
            Operation::AddRelations => self.add_relations,
            Operation::RemoveRelations => self.remove_relations,
            Operation::Check => self.check,
            Operation::BatchCheck => self.batch_check,
            Operation::ListObjects => self.list_objects,
            Operation::ListRelations => self.list_relations,
        }
    }

    pub fn with_mode(mut self, operation: Operation, mode: FailureMode) -> Self {
        let slot = match operation {
            Operation::AddRelations => &mut self.add_relations,
            Operation::RemoveRelations => &mut self.remove_relations,
            Operation::Check => &mut self.check,
            Operation::BatchCheck => &mut self.batch_check,
            Operation::ListObjects => &mut self.list_objects,
            Operation::ListRelations => &mut self.list_relations,
        };
        *slot = mode;
        self
    }

    /// Resolve an engine result for `operation`.
    ///
    /// Successful results pass through untouched. On failure the configured
    /// mode either substitutes `fallback()` or returns the error.
    pub fn apply<T>(
        &self,
        operation: Operation,
        result: Result<T>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match self.mode(operation) {
            FailureMode::FailOpen => {
                warn!(
                    operation = %operation,
                    error = %err,
                    "Authorization engine call failed; completing as if it succeeded"
                );
                Ok(fallback())
            }
            FailureMode::FailClosed => {
                warn!(
                    operation = %operation,
                    error = %err,
                    "Authorization engine call failed; denying by default"
                );
                Ok(fallback())
            }
            FailureMode::Propagate => {
                error!(operation = %operation, error = %err, "Authorization engine call failed");
                Err(err)
            }
        }
    }
}
