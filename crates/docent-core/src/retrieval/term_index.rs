//! In-memory BM25 (Okapi) index over a fixed corpus snapshot.
//!
//! The index is built once from a snapshot of chunks and never mutated.
//! Scoring follows the classic Okapi formulation with an IDF floor for terms
//! that appear in more than half of the corpus:
//!
//! ```text
//! idf(t)      = ln(N - n(t) + 0.5) - ln(n(t) + 0.5)
//! idf(t) < 0  → epsilon * mean(idf over the vocabulary)
//! score(d, q) = Σ_{t in q} idf(t) * tf * (k1 + 1) / (tf + k1 * (1 - b + b * |d| / avgdl))
//! ```
//!
//! Repeated query tokens contribute once per occurrence.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;

use crate::types::{DocumentChunk, ScoredCandidate};

/// Term frequency saturation.
pub const BM25_K1: f64 = 1.5;
/// Length normalization.
pub const BM25_B: f64 = 0.75;
/// Floor multiplier for negative IDFs.
pub const BM25_EPSILON: f64 = 0.25;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Lowercase the text and split it into maximal runs of word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Per-document term statistics.
#[derive(Debug, Clone)]
struct DocStats {
    term_freqs: HashMap<String, u32>,
    len: usize,
}

/// BM25 term index.
#[derive(Debug, Clone)]
pub struct TermIndex {
    docs: Vec<DocumentChunk>,
    stats: Vec<DocStats>,
    doc_freqs: HashMap<String, usize>,
    idf: HashMap<String, f64>,
    avgdl: f64,
    total_tokens: usize,
}

impl TermIndex {
    /// Build an index from a corpus snapshot. Snapshot order is the tie order.
    pub fn build(docs: Vec<DocumentChunk>) -> Self {
        let mut stats = Vec::with_capacity(docs.len());
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        let mut total_tokens = 0usize;

        for doc in &docs {
            let tokens = tokenize(&doc.text);
            total_tokens += tokens.len();
            let mut term_freqs: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *term_freqs.entry(token.clone()).or_insert(0) += 1;
            }
            for term in term_freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            stats.push(DocStats {
                term_freqs,
                len: tokens.len(),
            });
        }

        let avgdl = if docs.is_empty() {
            0.0
        } else {
            total_tokens as f64 / docs.len() as f64
        };
        let idf = compute_idf(docs.len(), &doc_freqs);

        Self {
            docs,
            stats,
            doc_freqs,
            idf,
            avgdl,
            total_tokens,
        }
    }

    /// True when there are no documents or the corpus has zero tokens.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty() || self.total_tokens == 0
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Number of documents containing `term` (already tokenized form).
    pub fn document_frequency(&self, term: &str) -> usize {
        self.doc_freqs.get(term).copied().unwrap_or(0)
    }

    /// Score the whole corpus against `query`.
    ///
    /// Returns an empty vector when the index is empty, otherwise one score
    /// per document in snapshot order.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        if self.is_empty() {
            return Vec::new();
        }
        let query_tokens = tokenize(query);
        self.stats
            .iter()
            .map(|doc| {
                let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * doc.len as f64 / self.avgdl);
                query_tokens
                    .iter()
                    .map(|token| {
                        let tf = f64::from(doc.term_freqs.get(token).copied().unwrap_or(0));
                        let idf = self.idf.get(token).copied().unwrap_or(0.0);
                        idf * (tf * (BM25_K1 + 1.0) / (tf + norm))
                    })
                    .sum::<f64>()
            })
            .collect()
    }

    /// Return the `top_k` best documents with `bm25_score` set.
    ///
    /// Zero scores are not filtered. Equal scores keep snapshot order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredCandidate> {
        let scores = self.scores(query);
        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| OrderedFloat(b.1).cmp(&OrderedFloat(a.1)));

        ranked
            .into_iter()
            .take(top_k)
            .map(|(idx, score)| {
                let mut candidate = ScoredCandidate::from(self.docs[idx].clone());
                candidate.bm25_score = Some(score);
                candidate
            })
            .collect()
    }
}

fn compute_idf(corpus_size: usize, doc_freqs: &HashMap<String, usize>) -> HashMap<String, f64> {
    if doc_freqs.is_empty() {
        return HashMap::new();
    }

    let n = corpus_size as f64;
    let mut idf: HashMap<String, f64> = doc_freqs
        .iter()
        .map(|(term, &df)| {
            let df = df as f64;
            (term.clone(), (n - df + 0.5).ln() - (df + 0.5).ln())
        })
        .collect();

    let average_idf = idf.values().sum::<f64>() / idf.len() as f64;
    let floor = BM25_EPSILON * average_idf;
    for value in idf.values_mut() {
        if *value < 0.0 {
            *value = floor;
        }
    }
    idf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    fn chunk(id: &str, text: &str) -> DocumentChunk {
        DocumentChunk::new(id, text, ChunkMetadata::default())
    }

    fn corpus() -> Vec<DocumentChunk> {
        vec![
            chunk("doc1", "vpn vpn vpn vpn vpn setup guide"),
            chunk("doc2", "vpn access request form"),
            chunk("doc3", "printer toner replacement"),
        ]
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Hello, World! VPN_setup 2024"),
            vec!["hello", "world", "vpn_setup", "2024"]
        );
        assert!(tokenize("  ...  ").is_empty());
        assert_eq!(tokenize("Café naïve"), vec!["café", "naïve"]);
    }

    #[test]
    fn test_empty_index() {
        let index = TermIndex::build(vec![]);
        assert!(index.is_empty());
        assert!(index.search("vpn", 5).is_empty());

        let blank = TermIndex::build(vec![chunk("a", "  "), chunk("b", "!!")]);
        assert!(blank.is_empty());
        assert_eq!(blank.len(), 2);
        assert!(blank.search("anything", 5).is_empty());
    }

    #[test]
    fn test_vpn_ranking() {
        let index = TermIndex::build(corpus());
        assert_eq!(index.document_frequency("vpn"), 2);

        let results = index.search("vpn", 3);
        let ids: Vec<_> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["doc1", "doc2", "doc3"]);
        assert!(results[0].bm25_score.unwrap() > results[1].bm25_score.unwrap());
        assert!(results[1].bm25_score.unwrap() > 0.0);
        // Zero scores are kept.
        assert_eq!(results[2].bm25_score, Some(0.0));
    }

    #[test]
    fn test_scores_match_okapi_formula() {
        let index = TermIndex::build(corpus());
        // N=3, n(vpn)=2: idf = ln(1.5) - ln(2.5) < 0, so it is floored.
        // Vocabulary: vpn(2), setup, guide, access, request, form, printer, toner, replacement (1 each).
        let idf_rare = (2.5f64).ln() - (1.5f64).ln();
        let idf_vpn_raw = (1.5f64).ln() - (2.5f64).ln();
        let average = (idf_vpn_raw + 8.0 * idf_rare) / 9.0;
        let idf_vpn = BM25_EPSILON * average;

        let avgdl = 14.0 / 3.0;
        let tf = 5.0;
        let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * 7.0 / avgdl);
        let expected = idf_vpn * tf * (BM25_K1 + 1.0) / (tf + norm);

        let scores = index.scores("vpn");
        assert!((scores[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_query_tokens_count_twice() {
        let index = TermIndex::build(corpus());
        let once = index.scores("toner")[2];
        let twice = index.scores("toner toner")[2];
        assert!((twice - 2.0 * once).abs() < 1e-5);
    }

    #[test]
    fn test_ties_keep_snapshot_order() {
        let index = TermIndex::build(vec![
            chunk("x", "alpha beta"),
            chunk("y", "alpha beta"),
            chunk("z", "gamma delta"),
        ]);
        let ids: Vec<_> = index
            .search("unrelated", 3)
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["x", "y", "z"]);

        let ids: Vec<_> = index.search("beta", 2).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn test_top_k_truncates() {
        let index = TermIndex::build(corpus());
        assert_eq!(index.search("vpn", 1).len(), 1);
        assert_eq!(index.search("vpn", 0).len(), 0);
        assert_eq!(index.search("vpn", 10).len(), 3);
    }
}
