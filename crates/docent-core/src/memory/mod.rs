//! Per-user conversational memory and answer feedback.

mod conversation;
mod feedback;

pub use conversation::{ConversationStore, ConversationTurn, MemorySnapshot};
pub use feedback::{FeedbackRecord, FeedbackStore, RATING_RANGE};
