//! Ingestion pipeline: normalize → chunk → embed → upsert.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::DocentResult;
use crate::retrieval::{Clock, SystemClock};
use crate::traits::{check_batch_shape, Embedder, VectorIndex};
use crate::types::DocumentChunk;

use super::chunker::Chunker;
use super::normalize::{has_consistent_access, normalize_metadata, RawRecord};
use super::rbac_inference::{value_to_string, AccessRules};

/// Outcome status of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    /// Chunks were written.
    Ok,
    /// Nothing to write.
    Empty,
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Outcome status.
    pub status: IngestStatus,
    /// Number of chunks written.
    pub count: usize,
}

impl IngestReport {
    /// Report for a run that wrote nothing.
    pub fn empty() -> Self {
        Self {
            status: IngestStatus::Empty,
            count: 0,
        }
    }
}

/// Turns loader records into indexed chunks.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    vector_index: Arc<dyn VectorIndex>,
    chunker: Chunker,
    rules: AccessRules,
    clock: Arc<dyn Clock>,
}

impl IngestionPipeline {
    /// Create a pipeline with default chunking and access rules.
    pub fn new(embedder: Arc<dyn Embedder>, vector_index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            vector_index,
            chunker: Chunker::default(),
            rules: AccessRules::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Override the chunker.
    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Override the access inference rules.
    pub fn with_rules(mut self, rules: AccessRules) -> Self {
        self.rules = rules;
        self
    }

    /// Override the clock used for `ingested_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build chunks for `records` without touching any collaborator.
    ///
    /// Chunk ids are `{record_id}-chunk-{i}`. A record's `file_type`
    /// metadata overrides `file_type` for chunking.
    pub fn prepare(
        &self,
        records: Vec<RawRecord>,
        dataset: &str,
        extra_metadata: Option<&Map<String, Value>>,
        file_type: Option<&str>,
    ) -> Vec<DocumentChunk> {
        let now = self.clock.now();
        let mut chunks = Vec::new();

        for record in records {
            let metadata = normalize_metadata(&record, dataset, extra_metadata, &self.rules, now);
            let record_type = record.metadata.get("file_type").and_then(value_to_string);
            let record_id = record.resolved_id();
            if !has_consistent_access(&metadata) {
                warn!(
                    record = %record_id,
                    dataset,
                    "Private record has no owner; only HR and admins will see it"
                );
            }
            let pieces = self
                .chunker
                .split(&record.text, record_type.as_deref().or(file_type));

            chunks.extend(pieces.into_iter().enumerate().map(|(i, text)| {
                DocumentChunk::new(format!("{record_id}-chunk-{i}"), text, metadata.clone())
            }));
        }
        chunks
    }

    /// Chunk, embed in one batch, and upsert `records`.
    pub async fn ingest(
        &self,
        records: Vec<RawRecord>,
        dataset: &str,
        extra_metadata: Option<&Map<String, Value>>,
        file_type: Option<&str>,
    ) -> DocentResult<IngestReport> {
        let record_count = records.len();
        let chunks = self.prepare(records, dataset, extra_metadata, file_type);

        if chunks.is_empty() {
            warn!(dataset, records = record_count, "No chunks to ingest");
            return Ok(IngestReport::empty());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts).await?;
        check_batch_shape(texts.len(), &embeddings)?;

        self.vector_index.upsert(&chunks, &embeddings).await?;

        info!(
            dataset,
            records = record_count,
            chunks = chunks.len(),
            collection = self.vector_index.collection_name(),
            "Ingested chunks"
        );
        Ok(IngestReport {
            status: IngestStatus::Ok,
            count: chunks.len(),
        })
    }
}
