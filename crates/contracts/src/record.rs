//! Record - Record Extractor output
//!
//! One line of a retrieved object, the atomic unit of dispatch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured form of a record (a JSON object)
pub type RecordFields = Map<String, Value>;

/// A single line-record
///
/// The raw content never changes after extraction. Decoding is done on
/// demand and a failure only marks the record unusable for enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Zero-based line position in the source object
    pub index: usize,

    /// Line content without its terminator
    pub raw: String,
}

impl Record {
    /// Create a record
    pub fn new(index: usize, raw: impl Into<String>) -> Self {
        Self {
            index,
            raw: raw.into(),
        }
    }

    /// Decode the raw line as a JSON object
    ///
    /// # Errors
    /// Returns the parse error when the line is not a JSON object.
    pub fn decode(&self) -> Result<RecordFields, serde_json::Error> {
        serde_json::from_str(&self.raw)
    }
}

/// Flatten decoded fields into query parameters
///
/// Strings are used as-is, numbers and booleans are rendered. Nulls, arrays
/// and nested objects are skipped.
pub fn query_pairs(fields: &RecordFields) -> Vec<(String, String)> {
    fields
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_object() {
        let record = Record::new(0, r#"{"id": 7, "name": "a"}"#);
        let fields = record.decode().unwrap();
        assert_eq!(fields["id"], 7);
        assert_eq!(fields["name"], "a");
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(Record::new(0, "not json").decode().is_err());
        assert!(Record::new(1, "[1, 2, 3]").decode().is_err());
        assert!(Record::new(2, "").decode().is_err());
    }

    #[test]
    fn test_query_pairs_skips_non_scalars() {
        let record = Record::new(
            0,
            r#"{"s": "x", "n": 1.5, "b": true, "z": null, "a": [1], "o": {"k": 1}}"#,
        );
        let mut pairs = query_pairs(&record.decode().unwrap());
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("b".to_string(), "true".to_string()),
                ("n".to_string(), "1.5".to_string()),
                ("s".to_string(), "x".to_string()),
            ]
        );
    }
}
