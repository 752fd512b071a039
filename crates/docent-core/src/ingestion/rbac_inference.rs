//! Visibility inference for freshly loaded records.
//!
//! Records that already carry a `visibility` keep it. Otherwise the first
//! rule whose dataset matches and whose path fragment (if any) occurs in the
//! normalized source path decides. Records no rule matches are public.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Visibility;

/// Outcome of access inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredAccess {
    /// Visibility to stamp on every chunk of the record.
    pub visibility: Visibility,
    /// Owner for private records, when one could be found.
    pub owner_user_id: Option<String>,
}

/// One row of the inference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRule {
    /// Dataset the rule applies to (case-insensitive).
    pub dataset: String,
    /// Path fragments; the rule matches if any occurs in the source path.
    /// Empty matches every path in the dataset.
    #[serde(default)]
    pub path_contains: Vec<String>,
    /// Visibility assigned on match.
    pub visibility: Visibility,
    /// Metadata keys probed in order for the owning user.
    #[serde(default)]
    pub owner_keys: Vec<String>,
}

impl AccessRule {
    /// Rule matching every path of `dataset`.
    pub fn dataset(dataset: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            dataset: dataset.into(),
            path_contains: Vec::new(),
            visibility,
            owner_keys: Vec::new(),
        }
    }

    /// Rule matching paths of `dataset` that contain any of `fragments`.
    pub fn path<I, S>(dataset: impl Into<String>, fragments: I, visibility: Visibility) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dataset: dataset.into(),
            path_contains: fragments.into_iter().map(Into::into).collect(),
            visibility,
            owner_keys: Vec::new(),
        }
    }

    /// Set the owner lookup keys.
    pub fn with_owner_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owner_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    fn matches(&self, dataset: &str, path: &str) -> bool {
        self.dataset.eq_ignore_ascii_case(dataset)
            && (self.path_contains.is_empty()
                || self
                    .path_contains
                    .iter()
                    .any(|fragment| path.contains(&fragment.to_lowercase())))
    }
}

/// Ordered inference table. First match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRules {
    rules: Vec<AccessRule>,
}

impl Default for AccessRules {
    fn default() -> Self {
        Self::new(vec![
            AccessRule::path(
                "hr_data",
                ["employee_data.csv", "synthetic_health_benefits_500.csv"],
                Visibility::Private,
            )
            .with_owner_keys(["employee_id", "EmployeeID", "email", "Email"]),
            AccessRule::path(
                "hr_data",
                [
                    "employee_engagement_survey_data.csv",
                    "recruitment_data.csv",
                    "training_and_development_data.csv",
                ],
                Visibility::Hr,
            ),
            AccessRule::dataset("hr_data", Visibility::Public),
            AccessRule::dataset("hr_local", Visibility::Public),
            AccessRule::dataset("hr_policies", Visibility::Public),
            AccessRule::path("it_assets", ["/it_assets/network/"], Visibility::Admin),
            AccessRule::path("it_assets", ["/it_assets/users/"], Visibility::Private)
                .with_owner_keys(["user_id", "employee_id", "email"]),
            AccessRule::path("it_assets", ["/it_assets/hardware/"], Visibility::Hr),
            AccessRule::dataset("it_assets", Visibility::Public),
        ])
    }
}

impl AccessRules {
    /// Create a table from rules in priority order.
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// Table with no rules: everything without explicit visibility is public.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Insert a rule ahead of the existing ones.
    pub fn with_rule(mut self, rule: AccessRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// Infer visibility and owner for a record.
    pub fn infer(&self, source_path: &str, dataset: &str, metadata: &Map<String, Value>) -> InferredAccess {
        let explicit_owner = metadata.get("owner_user_id").and_then(value_to_string);

        if let Some(label) = metadata
            .get("visibility")
            .and_then(value_to_string)
            .filter(|v| !v.is_empty())
        {
            return InferredAccess {
                visibility: Visibility::from_label(&label),
                owner_user_id: explicit_owner,
            };
        }

        let path = source_path.replace('\\', "/").to_lowercase();
        let Some(rule) = self.rules.iter().find(|r| r.matches(dataset, &path)) else {
            return InferredAccess {
                visibility: Visibility::Public,
                owner_user_id: explicit_owner,
            };
        };

        let owner = rule
            .owner_keys
            .iter()
            .find_map(|key| {
                metadata
                    .get(key)
                    .and_then(value_to_string)
                    .filter(|v| !v.is_empty())
            })
            .or(explicit_owner);

        InferredAccess {
            visibility: rule.visibility,
            owner_user_id: owner,
        }
    }
}

/// Render scalar JSON values as strings; CSV loaders often produce numeric ids.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
