//! Property-based tests for argument flattening and payload extraction

use super::routes::{flatten_arguments, retrieval_query};
use super::*;
use proptest::prelude::*;
use serde_json::Map;

fn arguments() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z_]{1,10}", "[a-zA-Z0-9 ]{0,12}"), 0..6)
}

proptest! {
    #[test]
    fn flatten_follows_argument_order(pairs in arguments()) {
        let mut args = Map::new();
        for (k, v) in &pairs {
            args.insert(k.clone(), Value::String(v.clone()));
        }
        let expected = args
            .iter()
            .map(|(k, v)| format!("{k}={}", v.as_str().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(", ");
        prop_assert_eq!(flatten_arguments(&args), expected);
    }

    #[test]
    fn flatten_is_deterministic(pairs in arguments()) {
        let args: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        prop_assert_eq!(flatten_arguments(&args), flatten_arguments(&args.clone()));
    }

    #[test]
    fn query_field_is_used_verbatim(query in "[a-zA-Z0-9 ?]{1,40}", pairs in arguments()) {
        let mut args: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        args.insert("query".to_string(), Value::String(query.clone()));
        prop_assert_eq!(retrieval_query(Some("query"), &args), query);
    }

    #[test]
    fn extract_payload_never_panics(body in ".{0,120}") {
        let _ = extract_payload(&body);
    }
}
