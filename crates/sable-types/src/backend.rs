use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body sent to `/api/query`, `/api/mutation` and `/api/action` on the
/// managed backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRequest {
    /// Function path, e.g. `messages:list`.
    pub path: String,
    pub args: Value,
    pub format: String,
}

impl FunctionRequest {
    pub fn new(path: impl Into<String>, args: Value) -> Self {
        Self {
            path: path.into(),
            args,
            format: "json".into(),
        }
    }
}

/// Envelope every backend function call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FunctionResponse {
    Success {
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage")]
        error_message: String,
        #[serde(rename = "errorData", default, skip_serializing_if = "Option::is_none")]
        error_data: Option<Value>,
    },
}

/// Which generated endpoint a function lives behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Query,
    Mutation,
    Action,
}

impl FunctionKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Query => "api/query",
            Self::Mutation => "api/mutation",
            Self::Action => "api/action",
        }
    }
}
