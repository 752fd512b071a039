//! Per-user conversation turns and profile facts in SQLite.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MemoryConfig;
use crate::error::{DocentError, DocentResult};

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Turn id.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// What the user asked.
    pub question: String,
    /// What was answered.
    pub answer: String,
    /// When the turn was recorded (RFC 3339, UTC).
    pub timestamp: String,
}

/// Everything remembered about a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Recent turns, oldest first.
    pub conversation_history: Vec<ConversationTurn>,
    /// Profile facts.
    pub user_profile: Map<String, Value>,
}

/// SQLite-backed conversation store.
#[derive(Clone)]
pub struct ConversationStore {
    conn: Arc<Mutex<Connection>>,
}

impl ConversationStore {
    /// Open (or create) a store at `db_path`. `":memory:"` opens an
    /// in-memory database.
    pub fn new(db_path: impl AsRef<Path>) -> DocentResult<Self> {
        let path = db_path.as_ref();
        let conn = if path.to_str() == Some(":memory:") {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(path)?
        };

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        Ok(store)
    }

    /// Open an in-memory store.
    pub fn in_memory() -> DocentResult<Self> {
        Self::new(":memory:")
    }

    /// Open the store configured in `config`.
    pub fn from_config(config: &MemoryConfig) -> DocentResult<Self> {
        Self::new(&config.db_path)
    }

    fn lock(&self) -> DocentResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DocentError::database("conversation store lock poisoned"))
    }

    fn create_tables(&self) -> DocentResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT NOT NULL UNIQUE,
                user_id     TEXT NOT NULL,
                question    TEXT NOT NULL,
                answer      TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_turns_user ON turns(user_id, seq);

            CREATE TABLE IF NOT EXISTS profiles (
                user_id     TEXT PRIMARY KEY,
                profile     TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Record a turn and return it.
    pub fn append_turn(
        &self,
        user_id: &str,
        question: &str,
        answer: &str,
    ) -> DocentResult<ConversationTurn> {
        let turn = ConversationTurn {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO turns (id, user_id, question, answer, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![turn.id, turn.user_id, turn.question, turn.answer, turn.timestamp],
        )?;
        debug!(user_id, turn_id = %turn.id, "Appended conversation turn");
        Ok(turn)
    }

    /// The most recent `limit` turns for `user_id`, oldest first.
    /// A `limit` of 0 returns the whole history.
    pub fn load_conversation(&self, user_id: &str, limit: usize) -> DocentResult<Vec<ConversationTurn>> {
        let sql_limit: i64 = if limit == 0 {
            -1
        } else {
            i64::try_from(limit).unwrap_or(i64::MAX)
        };

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, question, answer, created_at
            FROM turns
            WHERE user_id = ?1
            ORDER BY seq DESC
            LIMIT ?2
            "#,
        )?;
        let mut turns = stmt
            .query_map(params![user_id, sql_limit], |row| {
                Ok(ConversationTurn {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    question: row.get(2)?,
                    answer: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        turns.reverse();
        Ok(turns)
    }

    /// Profile facts for `user_id`; empty when none are stored.
    pub fn load_profile(&self, user_id: &str) -> DocentResult<Map<String, Value>> {
        let conn = self.lock()?;
        read_profile(&conn, user_id)
    }

    /// Shallow-merge `updates` into the profile of `user_id` and return the
    /// merged profile.
    ///
    /// Read and write happen in one transaction under the store lock.
    pub fn update_profile(
        &self,
        user_id: &str,
        updates: &Map<String, Value>,
    ) -> DocentResult<Map<String, Value>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut profile = read_profile(&tx, user_id)?;
        for (key, value) in updates {
            profile.insert(key.clone(), value.clone());
        }

        let serialized = serde_json::to_string(&profile)?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        tx.execute(
            r#"
            INSERT INTO profiles (user_id, profile, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET profile = excluded.profile, updated_at = excluded.updated_at
            "#,
            params![user_id, serialized, now],
        )?;
        tx.commit()?;
        debug!(user_id, keys = updates.len(), "Updated user profile");
        Ok(profile)
    }

    /// Recent turns and profile together.
    pub fn load(&self, user_id: &str, limit: usize) -> DocentResult<MemorySnapshot> {
        Ok(MemorySnapshot {
            conversation_history: self.load_conversation(user_id, limit)?,
            user_profile: self.load_profile(user_id)?,
        })
    }
}

fn read_profile(conn: &Connection, user_id: &str) -> DocentResult<Map<String, Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT profile FROM profiles WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(raw) = raw else {
        return Ok(Map::new());
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) | Err(_) => {
            warn!(user_id, "Stored profile is not a JSON object, ignoring");
            Ok(Map::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recent_turns_in_order() {
        let store = ConversationStore::in_memory().unwrap();
        for i in 0..5 {
            store
                .append_turn("alice", &format!("q{i}"), &format!("a{i}"))
                .unwrap();
        }
        store.append_turn("bob", "other", "user").unwrap();

        let recent = store.load_conversation("alice", 3).unwrap();
        let questions: Vec<_> = recent.iter().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, vec!["q2", "q3", "q4"]);
        assert!(recent.iter().all(|t| t.user_id == "alice"));

        assert_eq!(store.load_conversation("alice", 0).unwrap().len(), 5);
        assert!(store.load_conversation("carol", 10).unwrap().is_empty());
    }

    #[test]
    fn test_profile_shallow_merge() {
        let store = ConversationStore::in_memory().unwrap();
        assert!(store.load_profile("alice").unwrap().is_empty());

        let first = json!({ "team": "it", "prefs": { "lang": "en" } });
        store.update_profile("alice", first.as_object().unwrap()).unwrap();

        let second = json!({ "prefs": { "tone": "short" }, "office": "lyon" });
        let merged = store.update_profile("alice", second.as_object().unwrap()).unwrap();

        assert_eq!(merged.get("team"), Some(&json!("it")));
        assert_eq!(merged.get("office"), Some(&json!("lyon")));
        assert_eq!(merged.get("prefs"), Some(&json!({ "tone": "short" })));
        assert_eq!(store.load_profile("alice").unwrap(), merged);
    }

    #[test]
    fn test_concurrent_profile_updates_keep_every_key() {
        let store = ConversationStore::in_memory().unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let mut update = Map::new();
                        update.insert(format!("t{t}-k{i}"), json!(i));
                        store.update_profile("shared", &update).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let profile = store.load_profile("shared").unwrap();
        assert_eq!(profile.len(), 800);
        assert_eq!(profile.get("t3-k199"), Some(&json!(199)));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.db");
        {
            let store = ConversationStore::new(&path).unwrap();
            store.append_turn("u1", "vpn?", "use the client").unwrap();
            store
                .update_profile("u1", json!({ "role": "employee" }).as_object().unwrap())
                .unwrap();
        }

        let store = ConversationStore::new(&path).unwrap();
        let snapshot = store.load("u1", 10).unwrap();
        assert_eq!(snapshot.conversation_history.len(), 1);
        assert_eq!(snapshot.conversation_history[0].answer, "use the client");
        assert_eq!(snapshot.user_profile.get("role"), Some(&json!("employee")));
    }
}
