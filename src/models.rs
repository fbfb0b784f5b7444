use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::store::Record;

/// Body of a store request
///
/// Both fields are optional at the schema level so that a missing field
/// surfaces as a validation error rather than a body rejection.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct StoreRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl StoreRequest {
    /// Both `key` and `value` must be present and non-empty.
    pub fn validate(self) -> Result<Record, ApiError> {
        match (self.key, self.value) {
            (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
                Ok(Record { key, value })
            }
            _ => Err(ApiError::Validation(
                "Both 'key' and 'value' are required".to_string(),
            )),
        }
    }
}

/// Response type for successful store operations
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct StoreResponse {
    pub key: String,
    pub message: String,
}

/// A key-value pair as returned by lookups and listings
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct KvEntryResponse {
    pub key: String,
    pub value: String,
}

impl From<Record> for KvEntryResponse {
    fn from(record: Record) -> Self {
        Self {
            key: record.key,
            value: record.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> StoreRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let record = parse(r#"{"key":"a","value":"1"}"#).validate().unwrap();
        assert_eq!(record.key, "a");
        assert_eq!(record.value, "1");
    }

    #[test]
    fn test_missing_or_empty_fields_rejected() {
        for body in [
            r#"{}"#,
            r#"{"key":"a"}"#,
            r#"{"value":"1"}"#,
            r#"{"key":"","value":"1"}"#,
            r#"{"key":"a","value":""}"#,
            r#"{"key":null,"value":"1"}"#,
        ] {
            let err = parse(body).validate().unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "body {}", body);
        }
    }

    #[test]
    fn test_non_string_value_is_not_a_store_request() {
        assert!(serde_json::from_str::<StoreRequest>(r#"{"key":"a","value":0}"#).is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let record = parse(r#"{"key":"a","value":"1","ttl":5}"#).validate().unwrap();
        assert_eq!(record.value, "1");
    }
}
