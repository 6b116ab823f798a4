//! Normalized dispatch result.
//!
//! Every dispatch returns an [`Envelope`] serializing to
//! `{success, data?, error?, message?, reason?}`. `reason` is only set when the
//! framework produced the failure itself; a handler that returns a well-formed
//! `success: false` result is forwarded without one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Why the framework refused or failed a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No module with the requested id is loaded
    UnknownModule,
    /// The module is loaded but disabled
    ModuleDisabled,
    /// The module has no handler for the requested action
    UnknownAction,
    /// The handler raised an error or panicked
    HandlerError,
    /// The handler returned something other than a map with a boolean `success`
    MalformedResponse,
}

impl FailureReason {
    /// Wire name of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::UnknownModule => "unknown_module",
            FailureReason::ModuleDisabled => "module_disabled",
            FailureReason::UnknownAction => "unknown_action",
            FailureReason::HandlerError => "handler_error",
            FailureReason::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a dispatch, ready to be serialized for the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the action succeeded
    pub success: bool,
    /// Handler payload on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Short error; the reason code for resolution failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set on framework-generated failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl Envelope {
    /// Successful envelope carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            reason: None,
        }
    }

    /// Framework failure whose `error` is the reason code.
    pub fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(reason.as_str().to_string()),
            message: Some(message.into()),
            reason: Some(reason),
        }
    }

    /// Handler failure whose `error` is the raised message.
    pub fn handler_error(module_id: &str, action: &str, raised: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(raised.into()),
            message: Some(format!("handler {}.{} failed", module_id, action)),
            reason: Some(FailureReason::HandlerError),
        }
    }

    /// Normalize a handler's raw result.
    ///
    /// The result must be a map with a boolean `success`. `data` is kept as
    /// is; `error` and `message` are rendered as text when they are not
    /// already strings. Any other keys are dropped.
    ///
    /// # Errors
    ///
    /// Returns a description of the contract violation when the result is not
    /// a map or lacks a boolean `success`.
    pub fn from_handler_output(output: Value) -> Result<Self, String> {
        let mut map = match output {
            Value::Object(map) => map,
            other => {
                return Err(format!(
                    "handler returned {} instead of a map",
                    json_type_name(&other)
                ))
            }
        };

        let success = match map.get("success") {
            Some(Value::Bool(flag)) => *flag,
            Some(other) => {
                return Err(format!(
                    "`success` must be a boolean, found {}",
                    json_type_name(other)
                ))
            }
            None => return Err("handler result lacks a `success` field".to_string()),
        };

        Ok(Self {
            success,
            data: map.remove("data").filter(|data| !data.is_null()),
            error: take_text(&mut map, "error"),
            message: take_text(&mut map, "message"),
            reason: None,
        })
    }

    /// The failure reason, if the framework produced this envelope.
    pub fn reason(&self) -> Option<FailureReason> {
        self.reason
    }
}

fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_serializes_without_empty_fields() {
        let envelope = Envelope::ok(json!("pong"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"success": true, "data": "pong"})
        );
    }

    #[test]
    fn test_failure_uses_reason_as_error() {
        let envelope = Envelope::failure(FailureReason::UnknownModule, "module 'b' is not loaded");
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["success"], json!(false));
        assert_eq!(wire["error"], json!("unknown_module"));
        assert_eq!(wire["reason"], json!("unknown_module"));
    }

    #[test]
    fn test_handler_failure_result_is_forwarded() {
        let envelope = Envelope::from_handler_output(json!({
            "success": false,
            "error": "table locked",
            "message": "retry later",
            "extra": 1
        }))
        .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("table locked"));
        assert_eq!(envelope.message.as_deref(), Some("retry later"));
        assert_eq!(envelope.reason(), None);
    }

    #[test]
    fn test_non_string_error_is_rendered() {
        let envelope =
            Envelope::from_handler_output(json!({"success": false, "error": {"code": 7}})).unwrap();
        assert_eq!(envelope.error.as_deref(), Some(r#"{"code":7}"#));
    }

    #[test]
    fn test_contract_violations() {
        assert!(Envelope::from_handler_output(json!({"data": 1})).is_err());
        assert!(Envelope::from_handler_output(json!({"success": "yes"})).is_err());
        assert!(Envelope::from_handler_output(json!("pong")).is_err());
        assert!(Envelope::from_handler_output(Value::Null).is_err());
    }
}
