//! Role-based visibility filtering.
//!
//! | role     | public | hr  | admin | private    |
//! |----------|--------|-----|-------|------------|
//! | admin    | yes    | yes | yes   | yes        |
//! | hr       | yes    | yes | no    | yes        |
//! | employee | yes    | no  | no    | owner only |
//! | other    | yes    | no  | no    | no         |
//!
//! The filter runs on already-ranked, already-truncated results. Removed
//! entries are not backfilled, so a caller may receive fewer than `top_k`
//! results.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use crate::types::{ChunkMetadata, DocumentChunk, ScoredCandidate, Visibility};

/// Requesting role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Hr,
    Employee,
    /// Any role label the policy does not recognise. Public access only.
    Other(String),
}

impl Role {
    /// Parse a role label, case-insensitively.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "hr" => Self::Hr,
            "employee" => Self::Employee,
            other => Self::Other(other.to_string()),
        }
    }

    /// Label as lowercase text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Hr => "hr",
            Self::Employee => "employee",
            Self::Other(label) => label,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse(&label))
    }
}

/// Identity of the caller for one retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    /// Requesting user.
    pub user_id: String,
    /// Requesting role.
    pub role: Role,
}

impl AccessContext {
    /// Create an access context.
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Context with admin rights.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// Context with employee rights.
    pub fn employee(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Employee)
    }
}

/// Decide whether `ctx` may see a chunk with the given visibility and owner.
pub fn is_allowed(visibility: Visibility, owner_user_id: Option<&str>, ctx: &AccessContext) -> bool {
    match ctx.role {
        Role::Admin => true,
        Role::Hr => matches!(
            visibility,
            Visibility::Public | Visibility::Hr | Visibility::Private
        ),
        Role::Employee => match visibility {
            Visibility::Public => true,
            Visibility::Private => owner_user_id == Some(ctx.user_id.as_str()),
            Visibility::Hr | Visibility::Admin => false,
        },
        Role::Other(_) => visibility == Visibility::Public,
    }
}

/// Anything that carries chunk metadata.
pub trait AccessControlled {
    /// Metadata used for the access decision.
    fn access_metadata(&self) -> &ChunkMetadata;

    /// Whether `ctx` may see this item.
    fn visible_to(&self, ctx: &AccessContext) -> bool {
        let meta = self.access_metadata();
        is_allowed(
            meta.effective_visibility(),
            meta.owner_user_id.as_deref(),
            ctx,
        )
    }
}

impl AccessControlled for DocumentChunk {
    fn access_metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }
}

impl AccessControlled for ScoredCandidate {
    fn access_metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }
}

/// Stateless visibility filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbacFilter;

impl RbacFilter {
    /// Keep only the items `ctx` may see, preserving order.
    pub fn filter<T: AccessControlled>(&self, items: Vec<T>, ctx: &AccessContext) -> Vec<T> {
        let total = items.len();
        let allowed: Vec<T> = items.into_iter().filter(|item| item.visible_to(ctx)).collect();
        if allowed.len() < total {
            info!(
                removed = total - allowed.len(),
                total,
                user_id = %ctx.user_id,
                role = %ctx.role,
                "RBAC filtered documents"
            );
        }
        allowed
    }
}
