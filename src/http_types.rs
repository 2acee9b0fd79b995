//! Shared HTTP response types
//!
//! Error payloads returned by the dashboard API. Schema failures get their
//! own shape so the client can show the missing or inconsistent columns.

use crate::validation::{SchemaError, CONSTANT_COLUMNS, REQUIRED_COLUMNS};
use serde::{Deserialize, Serialize};

/// Standard error response format for HTTP API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response with error code and message
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Create an internal server error response
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new("internal_server_error", message)
    }
}

/// Rejected upload: the error, the follow-up guidance, and the offending columns
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    pub guidance: String,
    pub required_columns: Vec<String>,
    pub constant_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inconsistent_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

impl From<&SchemaError> for ValidationErrorResponse {
    fn from(err: &SchemaError) -> Self {
        let mut response = Self {
            error: err.code().to_string(),
            message: err.to_string(),
            guidance: err.guidance(),
            required_columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            constant_columns: CONSTANT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            missing_columns: None,
            inconsistent_columns: None,
            row: None,
        };
        match err {
            SchemaError::MissingColumns { missing } => {
                response.missing_columns = Some(missing.clone())
            }
            SchemaError::InconsistentConstants { columns } => {
                response.inconsistent_columns = Some(columns.clone())
            }
            SchemaError::InvalidKpiValue { row, .. } => response.row = Some(*row),
            SchemaError::MalformedCsv { .. } => {}
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convenience_methods() {
        let internal = ErrorResponse::internal_server_error("Server error");
        assert_eq!(internal.error, "internal_server_error");

        let no_dataset = ErrorResponse::new("no_dataset", "No dataset uploaded");
        assert_eq!(no_dataset.error, "no_dataset");
        assert_eq!(no_dataset.message, "No dataset uploaded");
    }

    #[test]
    fn test_missing_columns_response() {
        let err = SchemaError::MissingColumns {
            missing: vec!["Load".to_string()],
        };
        let response = ValidationErrorResponse::from(&err);
        assert_eq!(response.error, "missing_columns");
        assert_eq!(response.missing_columns, Some(vec!["Load".to_string()]));
        assert_eq!(response.required_columns.len(), 8);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("inconsistent_columns").is_none());
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("missing the following required columns: Load"));
    }

    #[test]
    fn test_invalid_value_response_carries_row() {
        let err = SchemaError::InvalidKpiValue {
            row: 7,
            value: "abc".to_string(),
        };
        let response = ValidationErrorResponse::from(&err);
        assert_eq!(response.row, Some(7));
        assert!(response.guidance.contains("KPI Value"));
    }
}
