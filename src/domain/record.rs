use serde::Deserialize;
use serde_json::Value;

use crate::app::RecordError;

/// One response body as it travels from a feed walker to the dedup filter.
#[derive(Debug, Clone)]
pub struct Page {
    /// Base URL of the feed that produced the page.
    pub source: String,
    pub body: Vec<u8>,
}

impl Page {
    pub fn new(source: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            body,
        }
    }
}

/// Wire shape of a page: `{"data": [ ... ]}`.
#[derive(Debug, Deserialize)]
pub struct LocationPage {
    #[serde(default)]
    pub data: Vec<Value>,
}

impl LocationPage {
    pub fn parse(body: &[u8]) -> Result<Self, RecordError> {
        serde_json::from_slice(body).map_err(RecordError::Page)
    }
}

/// A location entity together with the identity used for deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub identity: String,
    pub value: Value,
}

impl Record {
    /// The string value of `identity_field`.
    pub fn identity_of(value: &Value, identity_field: &str) -> Result<String, RecordError> {
        value
            .get(identity_field)
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| RecordError::MissingIdentity {
                field: identity_field.to_string(),
            })
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_with_records() {
        let page = LocationPage::parse(br#"{"data": [{"id": "A1"}, {"id": "B2"}]}"#).unwrap();
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn test_parse_page_without_data_is_empty() {
        let page = LocationPage::parse(br#"{"status_code": 1000}"#).unwrap();
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_parse_page_rejects_garbage() {
        let err = LocationPage::parse(b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, RecordError::Page(_)));
    }

    #[test]
    fn test_record_identity_extracted() {
        let value = json!({"id": "A1", "name": "Depot"});
        assert_eq!(Record::identity_of(&value, "id").unwrap(), "A1");
    }

    #[test]
    fn test_record_custom_identity_field() {
        let value = json!({"id": "A1", "uid": "X9"});
        assert_eq!(Record::identity_of(&value, "uid").unwrap(), "X9");
    }

    #[test]
    fn test_record_missing_or_non_string_identity() {
        let missing = Record::identity_of(&json!({"name": "Depot"}), "id").unwrap_err();
        assert!(matches!(missing, RecordError::MissingIdentity { .. }));

        let numeric = Record::identity_of(&json!({"id": 17}), "id").unwrap_err();
        assert!(matches!(numeric, RecordError::MissingIdentity { .. }));
    }

    #[test]
    fn test_record_serializes_whole_object() {
        let record = Record {
            identity: "A1".into(),
            value: json!({"id": "A1", "evses": [1, 2]}),
        };
        let bytes = record.to_json().unwrap();
        let back: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, json!({"id": "A1", "evses": [1, 2]}));
    }
}
