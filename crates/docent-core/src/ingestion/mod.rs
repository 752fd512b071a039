//! Ingestion: loader records to normalized, access-stamped, embedded chunks.
//!
//! - [`normalize`]: canonical metadata for each record
//! - [`rbac_inference`]: visibility and owner inference from dataset and path
//! - [`chunker`]: character windows with a markdown section mode
//! - [`pipeline`]: chunk, embed in one batch, upsert

pub mod chunker;
pub mod normalize;
pub mod pipeline;
pub mod rbac_inference;

pub use chunker::Chunker;
pub use normalize::{
    has_consistent_access, ingestion_timestamp, normalize_metadata, normalize_record, RawRecord,
};
pub use pipeline::{IngestReport, IngestStatus, IngestionPipeline};
pub use rbac_inference::{AccessRule, AccessRules, InferredAccess};
