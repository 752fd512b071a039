//! The single boundary where loader output becomes canonical chunks.
//!
//! Loaders hand over loosely typed records; everything downstream of this
//! module only sees [`DocumentChunk`] and [`ChunkMetadata`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{synthetic_id, ChunkMetadata, DocumentChunk, Visibility};

use super::rbac_inference::{value_to_string, AccessRules};

/// A record as produced by a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Loader-assigned id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Extracted text.
    pub text: String,
    /// Origin path or URL. Falls back to `metadata.source`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Loader metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RawRecord {
    /// Create a record from text and a source.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            source: Some(source.into()),
            metadata: Map::new(),
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Effective source path.
    pub fn source_path(&self) -> Option<String> {
        self.source
            .clone()
            .or_else(|| self.metadata.get("source").and_then(value_to_string))
    }

    /// Effective id: the record's own, else `source#prefix`.
    pub fn resolved_id(&self) -> String {
        self.id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| synthetic_id(self.source_path().as_deref(), &self.text))
    }
}

/// Format an ingestion timestamp.
pub fn ingestion_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Build canonical metadata for a record.
///
/// Merges `extra` over the loader metadata, stamps `dataset`, infers
/// visibility and owner, and fills `ingested_at` when it is missing.
pub fn normalize_metadata(
    record: &RawRecord,
    dataset: &str,
    extra: Option<&Map<String, Value>>,
    rules: &AccessRules,
    now: DateTime<Utc>,
) -> ChunkMetadata {
    let mut raw = record.metadata.clone();
    if let Some(extra) = extra {
        for (k, v) in extra {
            raw.insert(k.clone(), v.clone());
        }
    }
    raw.insert("dataset".to_string(), Value::String(dataset.to_string()));

    let source = record.source_path();
    let access = rules.infer(source.as_deref().unwrap_or_default(), dataset, &raw);

    let mut take = |key: &str| raw.remove(key).as_ref().and_then(value_to_string);
    let ingested_at = take("ingested_at")
        .filter(|ts| !ts.is_empty())
        .unwrap_or_else(|| ingestion_timestamp(now));
    let source_field = take("source");
    take("dataset");
    take("visibility");
    take("owner_user_id");

    ChunkMetadata {
        source: source.or(source_field),
        ingested_at: Some(ingested_at),
        dataset: Some(dataset.to_string()),
        visibility: Some(access.visibility),
        owner_user_id: access.owner_user_id,
        extra: raw,
    }
}

/// Normalize a record into a single chunk without splitting it.
pub fn normalize_record(
    record: RawRecord,
    dataset: &str,
    rules: &AccessRules,
    now: DateTime<Utc>,
) -> DocumentChunk {
    let metadata = normalize_metadata(&record, dataset, None, rules, now);
    let id = record.resolved_id();
    DocumentChunk::new(id, record.text, metadata)
}

/// Whether a chunk's metadata is internally consistent: private chunks must
/// name an owner.
pub fn has_consistent_access(metadata: &ChunkMetadata) -> bool {
    metadata.effective_visibility() != Visibility::Private || metadata.owner_user_id.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let record = RawRecord::new("How to request a laptop", "kb/hardware.md")
            .with_meta("file_type", "md");
        let chunk = normalize_record(record, "hr_local", &AccessRules::default(), now());

        assert_eq!(chunk.id, "kb/hardware.md#How to request a laptop");
        assert_eq!(chunk.metadata.source.as_deref(), Some("kb/hardware.md"));
        assert_eq!(chunk.metadata.dataset.as_deref(), Some("hr_local"));
        assert_eq!(chunk.metadata.visibility, Some(Visibility::Public));
        assert_eq!(
            chunk.metadata.ingested_at.as_deref(),
            Some("2025-03-01T09:30:00.000000Z")
        );
        assert_eq!(chunk.metadata.get_str("file_type"), Some("md"));
    }

    #[test]
    fn test_existing_timestamp_and_id_are_kept() {
        let record = RawRecord::new("t", "s")
            .with_id("row-1")
            .with_meta("ingested_at", "2024-01-01T00:00:00");
        let chunk = normalize_record(record, "it_assets", &AccessRules::default(), now());
        assert_eq!(chunk.id, "row-1");
        assert_eq!(chunk.metadata.ingested_at.as_deref(), Some("2024-01-01T00:00:00"));
    }

    #[test]
    fn test_extra_metadata_overrides_and_drives_inference() {
        let record = RawRecord::new("salary", "/data/hr/employee_data.csv")
            .with_meta("employee_id", "E9");
        let extra = json!({ "team": "payroll" });
        let meta = normalize_metadata(
            &record,
            "hr_data",
            extra.as_object(),
            &AccessRules::default(),
            now(),
        );
        assert_eq!(meta.visibility, Some(Visibility::Private));
        assert_eq!(meta.owner_user_id.as_deref(), Some("E9"));
        assert_eq!(meta.get_str("team"), Some("payroll"));
        assert_eq!(meta.get_str("employee_id"), Some("E9"));
        assert!(has_consistent_access(&meta));
    }

    #[test]
    fn test_source_from_metadata() {
        let record = RawRecord {
            text: "x".into(),
            metadata: json!({ "source": "a/b.txt" }).as_object().cloned().unwrap(),
            ..Default::default()
        };
        assert_eq!(record.source_path().as_deref(), Some("a/b.txt"));
        assert_eq!(record.resolved_id(), "a/b.txt#x");
    }

    #[test]
    fn test_private_without_owner_is_inconsistent() {
        let meta = ChunkMetadata::default().with_visibility(Visibility::Private);
        assert!(!has_consistent_access(&meta));
    }
}
