//! Retrieval mode definitions and configuration.
//!
//! Three modes select which candidate generators feed the ranker:
//! - Dense: vector similarity only (default)
//! - Lexical: BM25 only
//! - Hybrid: vector + BM25 with max-normalized convex fusion

use serde::{Deserialize, Serialize};

use crate::error::{DocentError, DocentResult};

/// Retrieval mode determines which signals are combined and how.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RetrievalMode {
    /// Vector search only.
    #[default]
    Dense,
    /// BM25 term search only.
    Lexical,
    /// Vector + BM25 fusion.
    Hybrid,
}

impl RetrievalMode {
    /// Check if this mode queries the vector index.
    pub fn uses_dense(&self) -> bool {
        matches!(self, Self::Dense | Self::Hybrid)
    }

    /// Check if this mode needs a term index.
    pub fn uses_lexical(&self) -> bool {
        matches!(self, Self::Lexical | Self::Hybrid)
    }
}

/// Configuration for retrieval operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Requested retrieval mode. The engine may fall back to dense.
    pub mode: RetrievalMode,
    /// Maximum number of results to return.
    pub top_k: usize,
    /// Dense candidates fetched before fusion. Defaults to `top_k`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dense_k: Option<usize>,
    /// Lexical candidates fetched before fusion. Defaults to `top_k`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_k: Option<usize>,
    /// Weight of the dense family in hybrid fusion.
    #[serde(alias = "hybrid_dense_weight")]
    pub dense_weight: f64,
    /// Relevance floor for dense and hybrid scores.
    #[serde(alias = "min_relevance_score")]
    pub min_relevance: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::Dense,
            top_k: 5,
            dense_k: None,
            lexical_k: None,
            dense_weight: 0.5,
            min_relevance: 0.2,
        }
    }
}

impl RetrievalConfig {
    /// Create config for dense mode.
    pub fn dense(top_k: usize) -> Self {
        Self {
            mode: RetrievalMode::Dense,
            top_k,
            ..Default::default()
        }
    }

    /// Create config for lexical mode.
    pub fn lexical(top_k: usize) -> Self {
        Self {
            mode: RetrievalMode::Lexical,
            top_k,
            ..Default::default()
        }
    }

    /// Create config for hybrid mode.
    pub fn hybrid(top_k: usize) -> Self {
        Self {
            mode: RetrievalMode::Hybrid,
            top_k,
            ..Default::default()
        }
    }

    /// Effective dense fan-out.
    pub fn dense_k(&self) -> usize {
        self.dense_k.unwrap_or(self.top_k)
    }

    /// Effective lexical fan-out.
    pub fn lexical_k(&self) -> usize {
        self.lexical_k.unwrap_or(self.top_k)
    }

    /// Set the candidate fan-out for both families.
    pub fn with_fan_out(mut self, dense_k: usize, lexical_k: usize) -> Self {
        self.dense_k = Some(dense_k);
        self.lexical_k = Some(lexical_k);
        self
    }

    /// Set the dense weight.
    pub fn with_dense_weight(mut self, weight: f64) -> Self {
        self.dense_weight = weight;
        self
    }

    /// Set the relevance floor.
    pub fn with_min_relevance(mut self, min_relevance: f64) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    /// Validate invariants between fields.
    pub fn validate(&self) -> DocentResult<()> {
        if self.top_k == 0 {
            return Err(DocentError::invalid_config(
                "top_k must be at least 1",
                "Set retrieval.top_k to a positive number",
            ));
        }
        if self.dense_k() < self.top_k {
            return Err(DocentError::invalid_config(
                format!("dense_k ({}) is smaller than top_k ({})", self.dense_k(), self.top_k),
                "Raise retrieval.dense_k or leave it unset",
            ));
        }
        if self.lexical_k() < self.top_k {
            return Err(DocentError::invalid_config(
                format!(
                    "lexical_k ({}) is smaller than top_k ({})",
                    self.lexical_k(),
                    self.top_k
                ),
                "Raise retrieval.lexical_k or leave it unset",
            ));
        }
        if !(0.0..=1.0).contains(&self.dense_weight) {
            return Err(DocentError::invalid_config(
                format!("dense_weight {} is outside [0, 1]", self.dense_weight),
                "Use a weight between 0.0 and 1.0",
            ));
        }
        if !self.min_relevance.is_finite() {
            return Err(DocentError::invalid_config(
                "min_relevance must be a finite number",
                "Use a value such as 0.2",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_mode_helpers() {
        assert!(RetrievalMode::Dense.uses_dense());
        assert!(!RetrievalMode::Dense.uses_lexical());

        assert!(!RetrievalMode::Lexical.uses_dense());
        assert!(RetrievalMode::Lexical.uses_lexical());

        assert!(RetrievalMode::Hybrid.uses_dense());
        assert!(RetrievalMode::Hybrid.uses_lexical());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("HYBRID".parse::<RetrievalMode>().unwrap(), RetrievalMode::Hybrid);
        assert_eq!(RetrievalMode::Lexical.to_string(), "lexical");
        assert!("bm42".parse::<RetrievalMode>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.mode, RetrievalMode::Dense);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.dense_k(), 5);
        assert_eq!(config.lexical_k(), 5);
        assert_eq!(config.dense_weight, 0.5);
        assert_eq!(config.min_relevance, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fan_out_follows_top_k() {
        let config = RetrievalConfig::hybrid(8);
        assert_eq!(config.dense_k(), 8);
        let config = config.with_fan_out(20, 12);
        assert_eq!(config.dense_k(), 20);
        assert_eq!(config.lexical_k(), 12);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RetrievalConfig::dense(0).validate().is_err());
        assert!(RetrievalConfig::hybrid(5).with_fan_out(4, 10).validate().is_err());
        assert!(RetrievalConfig::hybrid(5).with_fan_out(10, 4).validate().is_err());
        assert!(RetrievalConfig::hybrid(5).with_dense_weight(1.5).validate().is_err());
        assert!(RetrievalConfig::hybrid(5).with_dense_weight(-0.1).validate().is_err());
        assert!(RetrievalConfig::hybrid(5).with_dense_weight(0.0).validate().is_ok());
        assert!(RetrievalConfig::hybrid(5).with_dense_weight(1.0).validate().is_ok());
    }

    #[test]
    fn test_legacy_key_aliases() {
        let config: RetrievalConfig = serde_json::from_value(serde_json::json!({
            "mode": "hybrid",
            "top_k": 3,
            "min_relevance_score": 0.1,
            "hybrid_dense_weight": 0.7
        }))
        .unwrap();
        assert_eq!(config.mode, RetrievalMode::Hybrid);
        assert_eq!(config.min_relevance, 0.1);
        assert_eq!(config.dense_weight, 0.7);
        assert_eq!(config.dense_k(), 3);
    }
}
