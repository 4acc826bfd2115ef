use serde::Serialize;
use serde_json::Value;

use crate::error::{Auto24Error, Result};

/// Parsed result of a listing search. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    #[serde(skip)]
    raw: Value,
    stats: Value,
    search_results: Vec<Value>,
}

impl SearchResponse {
    /// Build from the full initial-state document, which must hold
    /// `search.stats` and a `searchResults` array.
    pub fn from_state(raw: Value) -> Result<Self> {
        let stats = raw
            .get("search")
            .and_then(|s| s.get("stats"))
            .cloned()
            .ok_or_else(|| Auto24Error::MalformedPayload("missing search.stats".to_string()))?;

        let search_results = match raw.get("searchResults") {
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(Auto24Error::MalformedPayload(format!(
                    "searchResults is not an array: {}",
                    type_name(other)
                )))
            }
            None => {
                return Err(Auto24Error::MalformedPayload(
                    "missing searchResults".to_string(),
                ))
            }
        };

        Ok(Self {
            raw,
            stats,
            search_results,
        })
    }

    /// The whole initial-state document
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn stats(&self) -> &Value {
        &self.stats
    }

    pub fn search_results(&self) -> &[Value] {
        &self.search_results
    }

    /// `stats.count` when the site reports it
    pub fn total_count(&self) -> Option<u64> {
        self.stats.get("count").and_then(Value::as_u64)
    }

    pub fn is_empty(&self) -> bool {
        self.search_results.is_empty()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_state() {
        let raw = json!({
            "search": {"stats": {"count": 5}},
            "searchResults": [{"id": 1}],
            "other": true
        });
        let response = SearchResponse::from_state(raw.clone()).unwrap();
        assert_eq!(response.stats(), &json!({"count": 5}));
        assert_eq!(response.search_results(), &[json!({"id": 1})]);
        assert_eq!(response.raw(), &raw);
        assert_eq!(response.total_count(), Some(5));
    }

    #[test]
    fn test_missing_fields() {
        for raw in [
            json!({"searchResults": []}),
            json!({"search": {}, "searchResults": []}),
            json!({"search": {"stats": {}}}),
            json!({"search": {"stats": {}}, "searchResults": {"id": 1}}),
        ] {
            assert!(matches!(
                SearchResponse::from_state(raw),
                Err(Auto24Error::MalformedPayload(_))
            ));
        }
    }
}
