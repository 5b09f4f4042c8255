//! Wire shapes for records, pages and batched writes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leadpipe_shared::LeadPipeError;

/// One row of a table: service-assigned identity plus a typed fields payload.
///
/// An empty `id` marks a record that has not been created yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(
        default,
        rename = "createdTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_time: Option<DateTime<Utc>>,

    pub fields: T,
}

impl<T> Record<T> {
    /// A record that does not exist remotely yet.
    pub fn new(fields: T) -> Self {
        Self {
            id: String::new(),
            created_time: None,
            fields,
        }
    }

    /// A fields delta addressed to an existing record.
    pub fn existing(id: impl Into<String>, fields: T) -> Self {
        Self {
            id: id.into(),
            created_time: None,
            fields,
        }
    }

    pub fn is_created(&self) -> bool {
        !self.id.is_empty()
    }
}

/// One page of a list response. An empty `offset` ends the sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<Record<T>>,

    #[serde(default)]
    pub offset: String,
}

/// Body of a batched create or update.
#[derive(Debug, Serialize)]
pub(crate) struct RecordsBody<'a, T> {
    pub records: &'a [Record<T>],
}

/// Body of a single-record create.
#[derive(Debug, Serialize)]
pub(crate) struct FieldsBody<'a, T> {
    pub fields: &'a T,
}

/// A multi-request operation that stopped part-way.
///
/// `records` holds everything that completed before `error`.
pub struct PartialFailure<T> {
    pub records: Vec<Record<T>>,
    pub error: LeadPipeError,
}

impl<T> PartialFailure<T> {
    pub fn into_parts(self) -> (Vec<Record<T>>, LeadPipeError) {
        (self.records, self.error)
    }
}

impl<T> fmt::Debug for PartialFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialFailure")
            .field("completed", &self.records.len())
            .field("error", &self.error)
            .finish()
    }
}

impl<T> fmt::Display for PartialFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} records completed before the failure)",
            self.error,
            self.records.len()
        )
    }
}

impl<T> From<PartialFailure<T>> for LeadPipeError {
    fn from(partial: PartialFailure<T>) -> Self {
        partial.error
    }
}

/// Result of an operation that can keep partial progress.
pub type PartialResult<T> = std::result::Result<Vec<Record<T>>, PartialFailure<T>>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        #[serde(rename = "Name")]
        name: String,
    }

    #[test]
    fn new_record_omits_identity() {
        let record = Record::new(Row { name: "a".into() });
        assert!(!record.is_created());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"fields": {"Name": "a"}}));
    }

    #[test]
    fn existing_record_carries_id_only() {
        let value = serde_json::to_value(Record::existing("rec1", Row { name: "b".into() })).unwrap();
        assert_eq!(value, json!({"id": "rec1", "fields": {"Name": "b"}}));
    }

    #[test]
    fn page_parses_service_response() {
        let page: Page<Row> = serde_json::from_value(json!({
            "records": [
                {"id": "rec1", "createdTime": "2023-05-01T10:00:00.000Z", "fields": {"Name": "a"}}
            ],
            "offset": "itrX/rec1"
        }))
        .unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(page.records[0].created_time.is_some());
        assert_eq!(page.offset, "itrX/rec1");
    }

    #[test]
    fn last_page_has_empty_offset() {
        let page: Page<Row> = serde_json::from_value(json!({"records": []})).unwrap();
        assert!(page.offset.is_empty());
    }

    #[test]
    fn partial_failure_converts_to_error() {
        let partial = PartialFailure {
            records: vec![Record::existing("rec1", Row { name: "a".into() })],
            error: LeadPipeError::Status {
                url: "https://x".into(),
                status: 500,
            },
        };
        assert!(partial.to_string().contains("1 records completed"));
        let err: LeadPipeError = partial.into();
        assert_eq!(err.status(), Some(500));
    }
}
