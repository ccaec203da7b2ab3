//! Tagged result envelope returned across the public boundary.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// `{ "success": true, "data": ... }` or `{ "success": false, "error": "..." }`.
/// Errors never escape the public API as anything other than this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> AgentResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AgentResponse<U> {
        AgentResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for AgentResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}
