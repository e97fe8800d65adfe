//! Cross-product expansion of subject / relation / object lists.
//!
//! Expansion never deduplicates: N subjects x M relations x K objects always
//! yields N·M·K tuples, and an empty list on any axis yields nothing.

use crate::models::Tuple;
use itertools::iproduct;

/// Tuples to insert, subject outermost, then relation, then object.
pub fn write_tuples<'a, S, R, O>(
    subjects: &'a [S],
    relations: &'a [R],
    objects: &'a [O],
) -> impl Iterator<Item = Tuple> + 'a
where
    S: AsRef<str>,
    R: AsRef<str>,
    O: AsRef<str>,
{
    iproduct!(subjects, relations, objects)
        .map(|(subject, relation, object)| Tuple::new(subject.as_ref(), relation.as_ref(), object.as_ref()))
}

/// Check triples, relation outermost, then object, then subject.
///
/// Callers that chunk or rate-limit batch submissions rely on this order.
pub fn check_triples<'a, S, R, O>(
    subjects: &'a [S],
    relations: &'a [R],
    objects: &'a [O],
) -> impl Iterator<Item = Tuple> + 'a
where
    S: AsRef<str>,
    R: AsRef<str>,
    O: AsRef<str>,
{
    iproduct!(relations, objects, subjects)
        .map(|(relation, object, subject)| Tuple::new(subject.as_ref(), relation.as_ref(), object.as_ref()))
}

pub fn expand_writes<S, R, O>(subjects: &[S], relations: &[R], objects: &[O]) -> Vec<Tuple>
where
    S: AsRef<str>,
    R: AsRef<str>,
    O: AsRef<str>,
{
    write_tuples(subjects, relations, objects).collect()
}

/// Same shape as [`expand_writes`]; the result goes into the delete half of a batch.
pub fn expand_deletes<S, R, O>(subjects: &[S], relations: &[R], objects: &[O]) -> Vec<Tuple>
where
    S: AsRef<str>,
    R: AsRef<str>,
    O: AsRef<str>,
{
    write_tuples(subjects, relations, objects).collect()
}

pub fn expand_check_triples<S, R, O>(subjects: &[S], relations: &[R], objects: &[O]) -> Vec<Tuple>
where
    S: AsRef<str>,
    R: AsRef<str>,
    O: AsRef<str>,
{
    check_triples(subjects, relations, objects).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_check_triples_iterate_subjects_innermost() {
        let triples = expand_check_triples(&["a", "b"], &["viewer"], &["doc1"]);
        assert_eq!(
            triples,
            vec![Tuple::new("a", "viewer", "doc1"), Tuple::new("b", "viewer", "doc1")]
        );
    }

    #[test]
    fn test_check_triples_full_nesting() {
        let triples = expand_check_triples(&["a", "b"], &["viewer", "editor"], &["doc1", "doc2"]);
        let order: Vec<_> = triples
            .iter()
            .map(|t| format!("{}/{}/{}", t.relation(), t.object(), t.subject()))
            .collect();
        assert_eq!(
            order,
            vec![
                "viewer/doc1/a",
                "viewer/doc1/b",
                "viewer/doc2/a",
                "viewer/doc2/b",
                "editor/doc1/a",
                "editor/doc1/b",
                "editor/doc2/a",
                "editor/doc2/b",
            ]
        );
    }

    #[test]
    fn test_write_order_subject_outermost() {
        let tuples = expand_writes(&["user:1", "user:2"], &["editor"], &["doc:1", "doc:2"]);
        assert_eq!(
            tuples,
            vec![
                Tuple::new("user:1", "editor", "doc:1"),
                Tuple::new("user:1", "editor", "doc:2"),
                Tuple::new("user:2", "editor", "doc:1"),
                Tuple::new("user:2", "editor", "doc:2"),
            ]
        );
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        assert!(expand_writes(&NONE, &["editor"], &["doc:1"]).is_empty());
        assert!(expand_deletes(&["user:1"], &NONE, &["doc:1"]).is_empty());
        assert!(expand_check_triples(&["user:1"], &["editor"], &NONE).is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let tuples = expand_writes(&["user:1", "user:1"], &["editor"], &["doc:1"]);
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0], tuples[1]);
    }

    #[test]
    fn test_owned_strings_accepted() {
        let subjects = vec!["user:1".to_string()];
        let relations = vec![String::from("viewer")];
        let tuples = expand_deletes(&subjects, &relations, &["doc:9"]);
        assert_eq!(tuples, vec![Tuple::new("user:1", "viewer", "doc:9")]);
    }

    proptest! {
        #[test]
        fn prop_cardinality_is_product(
            subjects in prop::collection::vec("[a-z]{1,4}", 0..5),
            relations in prop::collection::vec("[a-z]{1,4}", 0..4),
            objects in prop::collection::vec("[a-z]{1,4}", 0..5),
        ) {
            let expected = subjects.len() * relations.len() * objects.len();

            let writes = expand_writes(&subjects, &relations, &objects);
            prop_assert_eq!(writes.len(), expected);
            prop_assert_eq!(expand_check_triples(&subjects, &relations, &objects).len(), expected);

            for tuple in &writes {
                prop_assert!(subjects.iter().any(|s| s == tuple.subject()));
                prop_assert!(relations.iter().any(|r| r == tuple.relation()));
                prop_assert!(objects.iter().any(|o| o == tuple.object()));
            }
        }
    }
}
