//! Retrieval engine orchestrating dense, lexical and hybrid search.
//!
//! The engine is assembled once by [`RetrievalEngineBuilder`]. Capability
//! decisions (is there a usable term index, is there a reranker) are made at
//! build time and fixed for the lifetime of the engine; nothing on the query
//! path re-checks them.
//!
//! Per query the pipeline is:
//!
//! ```text
//! query → candidates (dense | lexical | hybrid) → rank/filter/truncate
//!       → rerank (optional, best-effort) → RBAC filter → caller
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::DocentResult;
use crate::rbac::{AccessContext, RbacFilter};
use crate::traits::{CrossEncoder, DocumentSource, Embedder, VectorIndex};
use crate::types::{MetadataFilter, ScoredCandidate};

use super::fusion::HybridRetriever;
use super::modes::{RetrievalConfig, RetrievalMode};
use super::ranking::{rank_dense, rank_lexical};
use super::recency::{Clock, SystemClock};
use super::rerank::Reranker;
use super::term_index::TermIndex;

/// Builder for [`RetrievalEngine`].
pub struct RetrievalEngineBuilder {
    config: RetrievalConfig,
    embedder: Arc<dyn Embedder>,
    vector_index: Arc<dyn VectorIndex>,
    document_source: Option<Arc<dyn DocumentSource>>,
    corpus_filter: Option<MetadataFilter>,
    corpus_limit: Option<usize>,
    term_index: Option<Arc<TermIndex>>,
    cross_encoder: Option<Arc<dyn CrossEncoder>>,
    clock: Arc<dyn Clock>,
}

impl RetrievalEngineBuilder {
    /// Start a builder with the required collaborators.
    pub fn new(
        config: RetrievalConfig,
        embedder: Arc<dyn Embedder>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            config,
            embedder,
            vector_index,
            document_source: None,
            corpus_filter: None,
            corpus_limit: None,
            term_index: None,
            cross_encoder: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Snapshot source for building the term index.
    pub fn with_document_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.document_source = Some(source);
        self
    }

    /// Restrict the term index snapshot.
    pub fn with_corpus_filter(mut self, filter: MetadataFilter, limit: Option<usize>) -> Self {
        self.corpus_filter = Some(filter);
        self.corpus_limit = limit;
        self
    }

    /// Use a prebuilt term index instead of reading the document source.
    pub fn with_term_index(mut self, index: Arc<TermIndex>) -> Self {
        self.term_index = Some(index);
        self
    }

    /// Enable reranking with a cross-encoder.
    pub fn with_cross_encoder(mut self, encoder: Arc<dyn CrossEncoder>) -> Self {
        self.cross_encoder = Some(encoder);
        self
    }

    /// Override the clock used for recency scoring.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the configuration, build the term index if the mode needs
    /// one, and resolve the effective mode.
    ///
    /// A lexical or hybrid request without a usable term index falls back to
    /// dense mode with a warning. Only configuration validation fails.
    pub async fn build(self) -> DocentResult<RetrievalEngine> {
        self.config.validate()?;

        let requested = self.config.mode;
        let mut term_index = None;
        let mut effective_mode = requested;

        if requested.uses_lexical() {
            match self.resolve_term_index().await {
                Some(index) => term_index = Some(index),
                None => {
                    warn!(
                        requested = %requested,
                        "No usable term index; falling back to dense retrieval"
                    );
                    effective_mode = RetrievalMode::Dense;
                }
            }
        }

        let hybrid = match (&term_index, effective_mode) {
            (Some(index), RetrievalMode::Hybrid) => Some(HybridRetriever::new(
                Arc::clone(&self.vector_index),
                Arc::clone(index),
                Arc::clone(&self.clock),
            )),
            _ => None,
        };

        let reranker = self.cross_encoder.map(Reranker::new);

        info!(
            mode = %effective_mode,
            top_k = self.config.top_k,
            reranker = reranker.is_some(),
            indexed = term_index.as_ref().map(|i| i.len()).unwrap_or(0),
            "Retrieval engine ready"
        );

        Ok(RetrievalEngine {
            config: self.config,
            effective_mode,
            embedder: self.embedder,
            vector_index: self.vector_index,
            term_index,
            hybrid,
            reranker,
            rbac: RbacFilter,
            clock: self.clock,
        })
    }

    async fn resolve_term_index(&self) -> Option<Arc<TermIndex>> {
        let index = match (&self.term_index, &self.document_source) {
            (Some(index), _) => Arc::clone(index),
            (None, Some(source)) => {
                let docs = match source
                    .get_all_documents(self.corpus_filter.as_ref(), self.corpus_limit)
                    .await
                {
                    Ok(docs) => docs,
                    Err(e) => {
                        warn!(error = %e, "Failed to load corpus snapshot for term index");
                        return None;
                    }
                };
                debug!(documents = docs.len(), "Building term index");
                Arc::new(TermIndex::build(docs))
            }
            (None, None) => return None,
        };

        if index.is_empty() {
            warn!("Term index has no tokens");
            return None;
        }
        Some(index)
    }
}

/// Hybrid retrieval orchestrator.
pub struct RetrievalEngine {
    config: RetrievalConfig,
    effective_mode: RetrievalMode,
    embedder: Arc<dyn Embedder>,
    vector_index: Arc<dyn VectorIndex>,
    term_index: Option<Arc<TermIndex>>,
    hybrid: Option<HybridRetriever>,
    reranker: Option<Reranker>,
    rbac: RbacFilter,
    clock: Arc<dyn Clock>,
}

impl RetrievalEngine {
    /// Mode resolved at build time.
    pub fn effective_mode(&self) -> RetrievalMode {
        self.effective_mode
    }

    /// Whether a reranker is attached.
    pub fn has_reranker(&self) -> bool {
        self.reranker.is_some()
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Number of documents in the term index, if one was built.
    pub fn indexed_documents(&self) -> Option<usize> {
        self.term_index.as_ref().map(|i| i.len())
    }

    /// Retrieve the chunks `access` may see for `query`.
    ///
    /// Collaborator failures (embedding, vector store) propagate. Empty
    /// corpora, empty term indexes, relevance floors and RBAC exclusions all
    /// yield `Ok(vec![])`.
    pub async fn retrieve(
        &self,
        query: &str,
        access: &AccessContext,
    ) -> DocentResult<Vec<ScoredCandidate>> {
        if !self.effective_mode.uses_dense() {
            let ranked = self.lexical(query);
            return Ok(self.finish(query, ranked, access).await);
        }

        let embedding = self.embedder.embed_query(query).await?;
        self.retrieve_with_embedding(query, &embedding, access).await
    }

    /// Same as [`RetrievalEngine::retrieve`] for callers that already hold
    /// the query embedding. Lexical mode ignores the embedding.
    pub async fn retrieve_with_embedding(
        &self,
        query: &str,
        embedding: &[f32],
        access: &AccessContext,
    ) -> DocentResult<Vec<ScoredCandidate>> {
        let ranked = match (self.effective_mode, &self.hybrid) {
            (RetrievalMode::Hybrid, Some(hybrid)) => {
                hybrid.retrieve(query, embedding, &self.config).await?
            }
            (RetrievalMode::Lexical, _) => self.lexical(query),
            _ => self.dense(embedding).await?,
        };
        Ok(self.finish(query, ranked, access).await)
    }

    async fn dense(&self, embedding: &[f32]) -> DocentResult<Vec<ScoredCandidate>> {
        let hits = self
            .vector_index
            .similarity_search(embedding, self.config.dense_k(), None)
            .await?;
        Ok(rank_dense(
            hits,
            self.clock.now(),
            self.config.min_relevance,
            self.config.top_k,
        ))
    }

    fn lexical(&self, query: &str) -> Vec<ScoredCandidate> {
        let Some(index) = &self.term_index else {
            return Vec::new();
        };
        let candidates = index.search(query, self.config.lexical_k());
        rank_lexical(candidates, self.clock.now(), self.config.top_k)
    }

    async fn finish(
        &self,
        query: &str,
        ranked: Vec<ScoredCandidate>,
        access: &AccessContext,
    ) -> Vec<ScoredCandidate> {
        let ranked = match &self.reranker {
            Some(reranker) => reranker.rerank(query, ranked).await,
            None => ranked,
        };
        let ranked_count = ranked.len();
        let visible = self.rbac.filter(ranked, access);
        debug!(
            mode = %self.effective_mode,
            ranked = ranked_count,
            returned = visible.len(),
            "Retrieval complete"
        );
        visible
    }
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("config", &self.config)
            .field("effective_mode", &self.effective_mode)
            .field("indexed_documents", &self.indexed_documents())
            .field("reranker", &self.reranker.is_some())
            .finish()
    }
}
