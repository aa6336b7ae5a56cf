use crate::rules::{AccessLevel, PermissionRecord};

use super::endpoint::EndpointHit;

/// Reduce endpoint hits to the highest access level per scope. Hits without
/// a scope are dropped; hits without a verb count as reads.
pub fn normalize(hits: &[EndpointHit]) -> PermissionRecord {
    let mut record = PermissionRecord::new();
    for hit in hits {
        let Some(scope) = hit.scope else {
            tracing::debug!(api_path = %hit.api_path, "no scope for endpoint, dropping");
            continue;
        };
        let level = hit.verb.map(|v| v.access()).unwrap_or(AccessLevel::Read);
        record.grant(scope, level, hit.label());
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{HttpVerb, PermissionScope};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn hit(file: &str, verb: Option<HttpVerb>, scope: Option<PermissionScope>) -> EndpointHit {
        EndpointHit {
            file: PathBuf::from(file),
            line: 1,
            api_path: "/repos/{owner}/{repo}/issues".into(),
            verb,
            scope,
        }
    }

    #[test]
    fn max_level_across_files() {
        let hits = vec![
            hit("a.js", Some(HttpVerb::Get), Some(PermissionScope::Issues)),
            hit("b.js", Some(HttpVerb::Post), Some(PermissionScope::Issues)),
        ];
        let record = normalize(&hits);
        assert_eq!(record.get(PermissionScope::Issues), Some(AccessLevel::Write));
    }

    #[test]
    fn verbless_hit_is_read() {
        let record = normalize(&[hit("a.js", None, Some(PermissionScope::Contents))]);
        assert_eq!(record.get(PermissionScope::Contents), Some(AccessLevel::Read));
    }

    #[test]
    fn unmapped_hits_are_dropped() {
        let record = normalize(&[hit("a.js", Some(HttpVerb::Delete), None)]);
        assert!(record.is_empty());
    }

    fn verb_strategy() -> impl Strategy<Value = Option<HttpVerb>> {
        prop_oneof![
            Just(None),
            Just(Some(HttpVerb::Get)),
            Just(Some(HttpVerb::Head)),
            Just(Some(HttpVerb::Post)),
            Just(Some(HttpVerb::Put)),
            Just(Some(HttpVerb::Patch)),
            Just(Some(HttpVerb::Delete)),
        ]
    }

    proptest! {
        #[test]
        fn record_level_is_max_of_hits(verbs in proptest::collection::vec(verb_strategy(), 1..20)) {
            let hits: Vec<_> = verbs
                .iter()
                .enumerate()
                .map(|(i, v)| hit(&format!("f{i}.js"), *v, Some(PermissionScope::Issues)))
                .collect();
            let expected = verbs
                .iter()
                .map(|v| v.map(|v| v.access()).unwrap_or(AccessLevel::Read))
                .max();
            prop_assert_eq!(normalize(&hits).get(PermissionScope::Issues), expected);
        }
    }
}
