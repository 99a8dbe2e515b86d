use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Audit record for login attempts, imports and approval actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub actor: Option<String>,
    pub action: String,
    pub resource: String,
    pub detail: Value,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AuditEntry {
    pub fn success(actor: Option<String>, action: &str, resource: &str, detail: Value) -> Self {
        Self {
            actor,
            action: action.to_string(),
            resource: resource.to_string(),
            detail,
            success: true,
            error_message: None,
        }
    }

    pub fn failure(
        actor: Option<String>,
        action: &str,
        resource: &str,
        detail: Value,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            actor,
            action: action.to_string(),
            resource: resource.to_string(),
            detail,
            success: false,
            error_message: Some(error_message.into()),
        }
    }
}
