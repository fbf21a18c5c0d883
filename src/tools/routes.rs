//! Static routing table: tool name -> backend call shape and endpoint
//!
//! Built once at startup and shared by reference; never mutated afterwards.

use super::BackendCall;
use crate::tool_call::ToolInvocation;
use reqwest::Url;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Number of passages requested from the knowledge base
pub const RETRIEVAL_TOP_K: u32 = 3;

/// How a routed tool is called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallShape {
    /// POST with the arguments as JSON body
    JsonPost,
    /// GET with the arguments as query parameters
    QueryGet,
    /// Free-text query against the policy knowledge base
    RagQuery,
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallShape::JsonPost => "json_post",
            CallShape::QueryGet => "query_get",
            CallShape::RagQuery => "rag_query",
        })
    }
}

/// Retrieval tools answered by the knowledge base. The second column names
/// the argument used verbatim as the query; otherwise all arguments are
/// flattened into `key=value` pairs.
const RETRIEVAL_TOOLS: &[(&str, Option<&str>)] = &[
    ("query_policy_rag_db", Some("query")),
    ("check_baggage_allowance", None),
    ("check_cancellation_policy", None),
    ("check_refund_policy", None),
    ("check_change_fee_policy", None),
    ("check_pet_policy", None),
    ("check_special_assistance_policy", None),
    ("check_travel_document_requirements", None),
    ("check_loyalty_program_rules", None),
];

/// Direct tools backed by structured APIs, with their default path under
/// the tool API base URL.
const DIRECT_TOOLS: &[(&str, CallShape, &str)] = &[
    ("search_flight", CallShape::JsonPost, "flights/search"),
    ("check_flight_offers", CallShape::JsonPost, "flights/offers"),
    ("book_flight", CallShape::JsonPost, "bookings"),
    ("get_booking_details", CallShape::JsonPost, "bookings/details"),
    ("modify_booking", CallShape::JsonPost, "bookings/modify"),
    ("cancel_booking", CallShape::JsonPost, "bookings/cancel"),
    ("select_seat", CallShape::JsonPost, "seats/select"),
    ("add_extra_baggage", CallShape::JsonPost, "baggage/add"),
    ("request_refund", CallShape::JsonPost, "refunds"),
    ("online_check_in", CallShape::JsonPost, "checkin"),
    ("search_hotel", CallShape::JsonPost, "hotels/search"),
    ("book_hotel", CallShape::JsonPost, "hotels/book"),
    ("search_car_rental", CallShape::JsonPost, "cars/search"),
    ("book_car_rental", CallShape::JsonPost, "cars/book"),
    ("check_flight_status", CallShape::QueryGet, "flights/status"),
    ("check_booking_status", CallShape::QueryGet, "bookings/status"),
    ("check_baggage_status", CallShape::QueryGet, "baggage/status"),
    ("check_refund_status", CallShape::QueryGet, "refunds/status"),
    ("check_in_status", CallShape::QueryGet, "checkin/status"),
];

/// Every tool name in the standard table
pub fn standard_tool_names() -> impl Iterator<Item = &'static str> {
    RETRIEVAL_TOOLS
        .iter()
        .map(|(name, _)| *name)
        .chain(DIRECT_TOOLS.iter().map(|(name, _, _)| *name))
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Invalid endpoint for tool {tool}: {reason}")]
    InvalidEndpoint { tool: String, reason: String },
}

/// Endpoint inputs for the standard table
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Base for relative direct-tool paths
    pub tool_base_url: String,
    /// Knowledge-base endpoint shared by retrieval tools
    pub rag_url: String,
    /// Per-tool endpoint overrides, absolute or relative to the base
    pub overrides: HashMap<String, String>,
}

/// One routed tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRoute {
    pub shape: CallShape,
    pub endpoint: Url,
    /// Argument used verbatim as a retrieval query
    pub query_field: Option<String>,
}

/// Immutable name -> route mapping
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, ToolRoute>,
}

impl RouteTable {
    /// The standard travel tool set
    pub fn standard(config: &RouteConfig) -> Result<Self, RouteError> {
        let base = normalize_base(&config.tool_base_url).map_err(|reason| {
            RouteError::InvalidEndpoint {
                tool: "<base>".to_string(),
                reason,
            }
        })?;

        let mut routes = HashMap::new();

        for (name, query_field) in RETRIEVAL_TOOLS {
            let target = config
                .overrides
                .get(*name)
                .map_or(config.rag_url.as_str(), String::as_str);
            let endpoint = resolve_endpoint(&base, target).map_err(|reason| {
                RouteError::InvalidEndpoint {
                    tool: (*name).to_string(),
                    reason,
                }
            })?;
            routes.insert(
                (*name).to_string(),
                ToolRoute {
                    shape: CallShape::RagQuery,
                    endpoint,
                    query_field: query_field.map(str::to_string),
                },
            );
        }

        for (name, shape, path) in DIRECT_TOOLS {
            let target = config.overrides.get(*name).map_or(*path, String::as_str);
            let endpoint = resolve_endpoint(&base, target).map_err(|reason| {
                RouteError::InvalidEndpoint {
                    tool: (*name).to_string(),
                    reason,
                }
            })?;
            routes.insert(
                (*name).to_string(),
                ToolRoute {
                    shape: *shape,
                    endpoint,
                    query_field: None,
                },
            );
        }

        Ok(Self { routes })
    }

    pub fn get(&self, name: &str) -> Option<&ToolRoute> {
        self.routes.get(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Describe the backend call for an invocation; `None` for unrouted names
    pub fn plan(&self, invocation: &ToolInvocation) -> Option<BackendCall> {
        let route = self.get(&invocation.name)?;
        let url = route.endpoint.clone();
        let args = &invocation.arguments;

        Some(match route.shape {
            CallShape::JsonPost => BackendCall::Json {
                url,
                body: Value::Object(args.clone()),
            },
            CallShape::QueryGet => BackendCall::Query {
                url,
                params: args
                    .iter()
                    .map(|(k, v)| (k.clone(), scalar_text(v)))
                    .collect(),
            },
            CallShape::RagQuery => BackendCall::Retrieval {
                url,
                query: retrieval_query(route.query_field.as_deref(), args),
                top_k: RETRIEVAL_TOP_K,
            },
        })
    }
}

/// Query text for a retrieval tool
pub fn retrieval_query(query_field: Option<&str>, args: &Map<String, Value>) -> String {
    if let Some(Value::String(query)) = query_field.and_then(|field| args.get(field)) {
        return query.clone();
    }
    flatten_arguments(args)
}

/// `key=value, key=value` in argument order
pub fn flatten_arguments(args: &Map<String, Value>) -> String {
    args.iter()
        .map(|(k, v)| format!("{k}={}", scalar_text(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Strings verbatim, null as empty, everything else as compact JSON
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn normalize_base(base: &str) -> Result<Url, String> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| format!("{base}: {e}"))
}

/// Absolute http(s) endpoints are used as-is; anything else joins against
/// the base
fn resolve_endpoint(base: &Url, target: &str) -> Result<Url, String> {
    let target = target.trim();
    match Url::parse(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        // "./" keeps a colon in the first segment from reading as a scheme
        _ => base
            .join(&format!("./{}", target.trim_start_matches('/')))
            .map_err(|e| format!("{target}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> RouteConfig {
        RouteConfig {
            tool_base_url: "http://tools.internal/api".to_string(),
            rag_url: "http://rag.internal/query".to_string(),
            overrides: HashMap::from([
                (
                    "book_flight".to_string(),
                    "https://booking.example.com/v2/book".to_string(),
                ),
                ("search_hotel".to_string(), "/lodging/search".to_string()),
            ]),
        }
    }

    fn invocation(value: serde_json::Value) -> ToolInvocation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_standard_table_covers_all_names() {
        let table = RouteTable::standard(&config()).unwrap();
        assert_eq!(table.len(), standard_tool_names().count());
        for name in standard_tool_names() {
            assert!(table.get(name).is_some(), "missing route for {name}");
        }
    }

    #[test]
    fn test_endpoint_resolution() {
        let table = RouteTable::standard(&config()).unwrap();
        assert_eq!(
            table.get("search_flight").unwrap().endpoint.as_str(),
            "http://tools.internal/api/flights/search"
        );
        assert_eq!(
            table.get("book_flight").unwrap().endpoint.as_str(),
            "https://booking.example.com/v2/book"
        );
        assert_eq!(
            table.get("search_hotel").unwrap().endpoint.as_str(),
            "http://tools.internal/api/lodging/search"
        );
        assert_eq!(
            table.get("check_pet_policy").unwrap().endpoint.as_str(),
            "http://rag.internal/query"
        );
    }

    #[test]
    fn test_schemeless_override_joins_base() {
        let base = normalize_base("http://tools.internal/api").unwrap();
        assert_eq!(
            resolve_endpoint(&base, "localhost:9000/x").unwrap().as_str(),
            "http://tools.internal/api/localhost:9000/x"
        );
        assert_eq!(
            resolve_endpoint(&base, "https://other.example.com/y").unwrap().as_str(),
            "https://other.example.com/y"
        );

        let mut cfg = config();
        cfg.overrides
            .insert("cancel_booking".to_string(), "localhost:9000/cancel".to_string());
        let table = RouteTable::standard(&cfg).unwrap();
        assert_eq!(table.get("cancel_booking").unwrap().endpoint.scheme(), "http");
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        let mut cfg = config();
        cfg.tool_base_url = "not a url".to_string();
        assert!(RouteTable::standard(&cfg).is_err());
    }

    #[test]
    fn test_shapes() {
        let table = RouteTable::standard(&config()).unwrap();
        assert_eq!(table.get("book_flight").unwrap().shape, CallShape::JsonPost);
        assert_eq!(
            table.get("check_flight_status").unwrap().shape,
            CallShape::QueryGet
        );
        assert_eq!(
            table.get("check_baggage_allowance").unwrap().shape,
            CallShape::RagQuery
        );
    }

    #[test]
    fn test_plan_json_post() {
        let table = RouteTable::standard(&config()).unwrap();
        let call = table
            .plan(&invocation(json!({"name": "search_flight", "arguments": {"origin": "LHR"}})))
            .unwrap();
        match call {
            BackendCall::Json { body, .. } => assert_eq!(body, json!({"origin": "LHR"})),
            other => panic!("expected JSON call, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_query_get() {
        let table = RouteTable::standard(&config()).unwrap();
        let call = table
            .plan(&invocation(json!({
                "name": "check_flight_status",
                "arguments": {"flight": "BA123", "day": 3, "live": true}
            })))
            .unwrap();
        match call {
            BackendCall::Query { params, .. } => assert_eq!(
                params,
                vec![
                    ("flight".to_string(), "BA123".to_string()),
                    ("day".to_string(), "3".to_string()),
                    ("live".to_string(), "true".to_string()),
                ]
            ),
            other => panic!("expected query call, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_retrieval_flattens_arguments() {
        let table = RouteTable::standard(&config()).unwrap();
        let call = table
            .plan(&invocation(json!({
                "name": "check_baggage_allowance",
                "arguments": {"flight": "BA123"}
            })))
            .unwrap();
        assert_eq!(
            call,
            BackendCall::Retrieval {
                url: Url::parse("http://rag.internal/query").unwrap(),
                query: "flight=BA123".to_string(),
                top_k: RETRIEVAL_TOP_K,
            }
        );
    }

    #[test]
    fn test_plan_retrieval_uses_query_field_verbatim() {
        let table = RouteTable::standard(&config()).unwrap();
        let call = table
            .plan(&invocation(json!({
                "name": "query_policy_rag_db",
                "arguments": {"topic": "pets", "query": "Can I fly with my cat?"}
            })))
            .unwrap();
        match call {
            BackendCall::Retrieval { query, .. } => assert_eq!(query, "Can I fly with my cat?"),
            other => panic!("expected retrieval call, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_unknown_tool() {
        let table = RouteTable::standard(&config()).unwrap();
        assert!(table
            .plan(&invocation(json!({"name": "unknown_x", "arguments": {}})))
            .is_none());
    }

    #[test]
    fn test_flatten_mixed_values() {
        let args = json!({"from": "LHR", "pax": 2, "note": null, "tags": ["a"]});
        let Value::Object(args) = args else {
            unreachable!()
        };
        assert_eq!(
            flatten_arguments(&args),
            "from=LHR, pax=2, note=, tags=[\"a\"]"
        );
    }
}
