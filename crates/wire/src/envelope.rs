use serde::{Deserialize, Serialize};

/// Body of one signed call to the upstream query endpoint.
///
/// Declared field order is the canonical serialization: the integrity tag is
/// computed over exactly these bytes, so reordering fields breaks signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub operation_name: String,
    pub variables: serde_json::Value,
    pub extensions: Extensions,
}

/// Extensions block carried by every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extensions {
    /// Version tag of the operation, from the query catalog.
    pub hash: String,
}

impl OperationRequest {
    pub fn new(operation_name: &str, variables: serde_json::Value, hash: &str) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            variables,
            extensions: Extensions { hash: hash.to_string() },
        }
    }

    /// The canonical bytes the integrity tag covers.
    pub fn canonical_body(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Response envelope of the query endpoint.
///
/// The upstream signals success only implicitly: a call succeeded when
/// `success` is not `false` and `data` is present and non-null.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub message: String,
}

impl OperationResponse {
    pub fn is_success(&self) -> bool {
        self.success != Some(false) && self.data.is_some()
    }

    /// First upstream error message, if any was supplied.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

/// One page of conversation history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    /// Cursor for the next (older) page; `None` when exhausted.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_body_keeps_field_order() {
        let req = OperationRequest::new("AskQuery", json!({"text": "hi"}), "abc123");
        let body = req.canonical_body().unwrap();
        let name_at = body.find("operationName").unwrap();
        let vars_at = body.find("variables").unwrap();
        let ext_at = body.find("extensions").unwrap();
        assert!(name_at < vars_at);
        assert!(vars_at < ext_at);
    }

    #[test]
    fn missing_success_with_data_is_success() {
        let resp: OperationResponse =
            serde_json::from_value(json!({"data": {"viewer": {}}})).unwrap();
        assert!(resp.is_success());
    }

    #[test]
    fn null_data_is_failure() {
        let resp: OperationResponse = serde_json::from_value(
            json!({"success": true, "data": null, "errors": [{"message": "boom"}]}),
        )
        .unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.first_error(), Some("boom"));
    }

    #[test]
    fn explicit_false_success_beats_present_data() {
        let resp: OperationResponse =
            serde_json::from_value(json!({"success": false, "data": {"x": 1}})).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.first_error(), None);
    }
}
