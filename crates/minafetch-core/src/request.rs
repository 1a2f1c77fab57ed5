//! GraphQL-over-HTTP wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `{operationName, query}` envelope POSTed to a GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub operation_name: String,
    pub query: String,
}

impl GraphQlRequest {
    pub fn new(operation_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            query: query.into(),
        }
    }
}

/// A single entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Value>,
}

impl std::fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A GraphQL response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// Returns `true` if the response carries a non-null `data` member.
    pub fn has_data(&self) -> bool {
        matches!(&self.data, Some(v) if !v.is_null())
    }

    /// Unwrap `data`, or turn the upstream error payload into a `FetchError`.
    ///
    /// Errors that accompany a present `data` member are not inspected.
    pub fn into_data(self) -> Result<Value, crate::FetchError> {
        match self.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => match self.errors.into_iter().next() {
                Some(err) => Err(crate::FetchError::GraphQl(err.message)),
                None => Err(crate::FetchError::MissingField("data".into())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;
    use serde_json::json;

    #[test]
    fn request_serialization() {
        let req = GraphQlRequest::new("Query", "query Query { version }");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            json!({ "operationName": "Query", "query": "query Query { version }" })
        );
    }

    #[test]
    fn response_into_data_ok() {
        let resp: GraphQlResponse =
            serde_json::from_value(json!({ "data": { "blocks": [] } })).unwrap();
        assert!(resp.has_data());
        assert_eq!(resp.into_data().unwrap(), json!({ "blocks": [] }));
    }

    #[test]
    fn response_missing_data() {
        let resp: GraphQlResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!resp.has_data());
        match resp.into_data().unwrap_err() {
            FetchError::MissingField(field) => assert_eq!(field, "data"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn response_error_payload() {
        let resp: GraphQlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Cannot query field \"foo\"" }]
        }))
        .unwrap();
        match resp.into_data().unwrap_err() {
            FetchError::GraphQl(msg) => assert!(msg.contains("foo")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
