//! Document chunk types.

use serde::{Deserialize, Deserializer, Serialize};

/// Number of leading characters of a chunk's text used in synthetic ids.
pub const SYNTHETIC_ID_PREFIX_CHARS: usize = 32;

/// Visibility class stamped on every chunk at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    /// Visible to every role.
    #[default]
    Public,
    /// HR staff and admins.
    Hr,
    /// Admins only.
    Admin,
    /// The owning user, HR staff and admins.
    Private,
}

impl Visibility {
    /// Parse a visibility label, case-insensitively.
    ///
    /// Empty labels mean public. Labels that name no known class are mapped to
    /// [`Visibility::Admin`], the most restrictive class.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "public" => Self::Public,
            "hr" => Self::Hr,
            "private" => Self::Private,
            _ => Self::Admin,
        }
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Canonical chunk metadata.
///
/// The well-known keys are typed; anything a loader adds on top is kept in
/// `extra` and round-trips through serde unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Origin file path or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// ISO-8601 ingestion timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<String>,
    /// Logical collection name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Visibility class. `None` is treated as public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    /// Owning user for private chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    /// Loader-specific keys.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChunkMetadata {
    /// Effective visibility, defaulting to public.
    pub fn effective_visibility(&self) -> Visibility {
        self.visibility.unwrap_or_default()
    }

    /// Look up a string-valued key, typed fields first, then `extra`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match key {
            "source" => self.source.as_deref(),
            "ingested_at" => self.ingested_at.as_deref(),
            "dataset" => self.dataset.as_deref(),
            "owner_user_id" => self.owner_user_id.as_deref(),
            _ => self.extra.get(key).and_then(|v| v.as_str()),
        }
    }

    /// Set the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the ingestion timestamp.
    pub fn with_ingested_at(mut self, ingested_at: impl Into<String>) -> Self {
        self.ingested_at = Some(ingested_at.into());
        self
    }

    /// Set the dataset.
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Set the owning user.
    pub fn with_owner(mut self, owner_user_id: impl Into<String>) -> Self {
        self.owner_user_id = Some(owner_user_id.into());
        self
    }
}

/// Immutable unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable identifier, unique within a corpus snapshot.
    pub id: String,
    /// Text payload.
    pub text: String,
    /// Chunk metadata.
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    /// Create a new chunk.
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }

    /// Create a chunk without an id, deriving one from source and text.
    pub fn derived(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        let text = text.into();
        let id = synthetic_id(metadata.source.as_deref(), &text);
        Self { id, text, metadata }
    }
}

/// Deterministic id for records that arrive without one:
/// `source + '#' + first 32 characters of text`.
///
/// Two records only collapse onto the same id when both source and text
/// prefix coincide.
pub fn synthetic_id(source: Option<&str>, text: &str) -> String {
    let prefix: String = text.chars().take(SYNTHETIC_ID_PREFIX_CHARS).collect();
    format!("{}#{}", source.unwrap_or_default(), prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_labels() {
        assert_eq!(Visibility::from_label("PUBLIC"), Visibility::Public);
        assert_eq!(Visibility::from_label(" Hr "), Visibility::Hr);
        assert_eq!(Visibility::from_label("private"), Visibility::Private);
        assert_eq!(Visibility::from_label("admin"), Visibility::Admin);
        assert_eq!(Visibility::from_label(""), Visibility::Public);
        // Unknown classes are locked down, not opened up.
        assert_eq!(Visibility::from_label("finance"), Visibility::Admin);
    }

    #[test]
    fn test_metadata_round_trip_keeps_extra_keys() {
        let json = serde_json::json!({
            "source": "kb/vpn.md",
            "visibility": "HR",
            "file_type": "md",
            "row": 3
        });
        let meta: ChunkMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(meta.source.as_deref(), Some("kb/vpn.md"));
        assert_eq!(meta.visibility, Some(Visibility::Hr));
        assert_eq!(meta.get_str("file_type"), Some("md"));
        assert_eq!(meta.extra.get("row"), Some(&serde_json::json!(3)));

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["visibility"], "hr");
        assert_eq!(back["file_type"], "md");
    }

    #[test]
    fn test_missing_visibility_is_public() {
        let meta = ChunkMetadata::default();
        assert_eq!(meta.effective_visibility(), Visibility::Public);
    }

    #[test]
    fn test_synthetic_id_uses_char_prefix() {
        let text = "é".repeat(40);
        let id = synthetic_id(Some("a.txt"), &text);
        assert_eq!(id, format!("a.txt#{}", "é".repeat(32)));
        assert_eq!(synthetic_id(None, "short"), "#short");
    }

    #[test]
    fn test_derived_chunk() {
        let chunk = DocumentChunk::derived("hello world", ChunkMetadata::default().with_source("s"));
        assert_eq!(chunk.id, "s#hello world");
    }
}
