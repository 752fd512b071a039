//! Collaborator traits consumed by the retrieval core.

mod cross_encoder;
mod embedder;
mod vector_index;

pub use cross_encoder::*;
pub use embedder::*;
pub use vector_index::*;
