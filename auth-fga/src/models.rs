use serde::{Deserialize, Serialize};
use std::fmt;

/// A relationship fact: `subject` has `relation` to `object`.
///
/// Subjects and objects are opaque `"type:id"` strings owned by the remote
/// engine; this crate never parses them except to read the type prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuple {
    #[serde(rename = "user")]
    subject: String,
    relation: String,
    object: String,
}

impl Tuple {
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    /// Type prefix of the object (`"doc"` for `"doc:42"`), if it has one.
    pub fn object_type(&self) -> Option<&str> {
        self.object.split_once(':').map(|(object_type, _)| object_type)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.relation, self.object)
    }
}

/// Batch write request: inserts and deletes applied together by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub writes: Vec<Tuple>,
    pub deletes: Vec<Tuple>,
}

impl WriteRequest {
    pub fn inserts(writes: Vec<Tuple>) -> Self {
        Self {
            writes,
            deletes: Vec::new(),
        }
    }

    pub fn removals(deletes: Vec<Tuple>) -> Self {
        Self {
            writes: Vec::new(),
            deletes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len() + self.deletes.len()
    }
}

/// Outcome of one triple inside a batch check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCheckResult {
    pub tuple: Tuple,
    pub allowed: bool,
}

/// Batch check outcomes, kept in request order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCheckResponse {
    pub results: Vec<BatchCheckResult>,
}

impl BatchCheckResponse {
    /// Pair each requested triple with the engine's answer.
    ///
    /// `tuples` and `decisions` must be the same length; callers check this
    /// before building the response.
    pub fn from_decisions(tuples: Vec<Tuple>, decisions: Vec<bool>) -> Self {
        let results = tuples
            .into_iter()
            .zip(decisions)
            .map(|(tuple, allowed)| BatchCheckResult { tuple, allowed })
            .collect();
        Self { results }
    }

    /// Every triple denied
    pub fn denied(tuples: Vec<Tuple>) -> Self {
        let decisions = vec![false; tuples.len()];
        Self::from_decisions(tuples, decisions)
    }

    /// Look up the decision for a triple
    pub fn allowed(&self, tuple: &Tuple) -> Option<bool> {
        self.results
            .iter()
            .find(|result| &result.tuple == tuple)
            .map(|result| result.allowed)
    }

    pub fn allowed_tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.results
            .iter()
            .filter(|result| result.allowed)
            .map(|result| &result.tuple)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_serializes_subject_as_user() {
        let tuple = Tuple::new("user:1", "editor", "doc:42");
        let json = serde_json::to_value(&tuple).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"user": "user:1", "relation": "editor", "object": "doc:42"})
        );
    }

    #[test]
    fn test_object_type() {
        assert_eq!(Tuple::new("user:1", "viewer", "doc:42").object_type(), Some("doc"));
        assert_eq!(Tuple::new("user:1", "viewer", "doc").object_type(), None);
    }

    #[test]
    fn test_batch_check_lookup() {
        let allowed = Tuple::new("user:a", "viewer", "doc:1");
        let denied = Tuple::new("user:b", "viewer", "doc:1");
        let response =
            BatchCheckResponse::from_decisions(vec![allowed.clone(), denied.clone()], vec![true, false]);

        assert_eq!(response.allowed(&allowed), Some(true));
        assert_eq!(response.allowed(&denied), Some(false));
        assert_eq!(response.allowed(&Tuple::new("user:c", "viewer", "doc:1")), None);
        assert_eq!(response.allowed_tuples().collect::<Vec<_>>(), vec![&allowed]);
    }

    #[test]
    fn test_denied_keeps_order() {
        let tuples = vec![Tuple::new("user:a", "viewer", "doc:1"), Tuple::new("user:b", "viewer", "doc:1")];
        let response = BatchCheckResponse::denied(tuples.clone());

        let order: Vec<_> = response.results.iter().map(|r| r.tuple.clone()).collect();
        assert_eq!(order, tuples);
        assert!(response.results.iter().all(|r| !r.allowed));
    }

    #[test]
    fn test_write_request_len() {
        let request = WriteRequest::removals(vec![Tuple::new("user:1", "editor", "doc:42")]);
        assert_eq!(request.len(), 1);
        assert!(request.writes.is_empty());
        assert!(WriteRequest::default().is_empty());
    }
}
