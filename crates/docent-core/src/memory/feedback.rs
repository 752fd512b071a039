//! Answer feedback, appended as JSON lines for offline evaluation.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::MemoryConfig;
use crate::error::{DocentError, DocentResult};
use crate::rbac::Role;

/// Accepted rating range: thumbs (-1, 0, 1) or stars (1 to 5).
pub const RATING_RANGE: std::ops::RangeInclusive<i32> = -1..=5;

/// A user's judgement of one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// When the feedback was recorded (RFC 3339, UTC).
    pub timestamp: String,
    pub user_id: String,
    pub role: Role,
    pub question: String,
    pub answer: String,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    /// Sources the answer was grounded on.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl FeedbackRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        user_id: impl Into<String>,
        role: Role,
        question: impl Into<String>,
        answer: impl Into<String>,
        rating: i32,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            user_id: user_id.into(),
            role,
            question: question.into(),
            answer: answer.into(),
            rating,
            comment: None,
            sources: Vec::new(),
        }
    }

    /// Attach a free-text comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Attach the sources the answer cited.
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Reject ratings outside [`RATING_RANGE`] and empty user ids.
    pub fn validate(&self) -> DocentResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(DocentError::validation("Feedback user_id cannot be empty"));
        }
        if !RATING_RANGE.contains(&self.rating) {
            return Err(DocentError::validation(format!(
                "Feedback rating {} is outside {}..={}",
                self.rating,
                RATING_RANGE.start(),
                RATING_RANGE.end()
            )));
        }
        Ok(())
    }
}

enum Sink {
    File(PathBuf),
    Memory(Vec<String>),
}

/// Append-only feedback log.
#[derive(Clone)]
pub struct FeedbackStore {
    sink: Arc<Mutex<Sink>>,
}

impl FeedbackStore {
    /// Log to `path`, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> DocentResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            sink: Arc::new(Mutex::new(Sink::File(path.to_path_buf()))),
        })
    }

    /// Keep feedback in memory only.
    pub fn in_memory() -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink::Memory(Vec::new()))),
        }
    }

    /// Open the log configured in `config`.
    pub fn from_config(config: &MemoryConfig) -> DocentResult<Self> {
        Self::new(&config.feedback_path)
    }

    fn lock(&self) -> DocentResult<MutexGuard<'_, Sink>> {
        self.sink
            .lock()
            .map_err(|_| DocentError::database("feedback store lock poisoned"))
    }

    /// Validate and append one record as a single JSON line.
    pub fn submit(&self, record: &FeedbackRecord) -> DocentResult<()> {
        record.validate()?;
        let line = serde_json::to_string(record)?;

        let mut sink = self.lock()?;
        match &mut *sink {
            Sink::File(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                writeln!(file, "{line}")?;
            }
            Sink::Memory(lines) => lines.push(line),
        }
        info!(
            user_id = %record.user_id,
            rating = record.rating,
            "Feedback recorded"
        );
        Ok(())
    }

    /// Every record logged so far, oldest first. Unparsable lines are skipped.
    pub fn records(&self) -> DocentResult<Vec<FeedbackRecord>> {
        let sink = self.lock()?;
        let lines: Vec<String> = match &*sink {
            Sink::File(path) if !path.exists() => Vec::new(),
            Sink::File(path) => BufReader::new(std::fs::File::open(path)?)
                .lines()
                .collect::<Result<_, _>>()?,
            Sink::Memory(lines) => lines.clone(),
        };

        Ok(lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed feedback line");
                    None
                }
            })
            .collect())
    }
}
