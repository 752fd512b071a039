//! Metadata filters pushed down to vector stores and document sources.

use serde::{Deserialize, Serialize};

use super::chunk::ChunkMetadata;

/// Filter operator for metadata queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to.
    Eq(serde_json::Value),
    /// Not equal to.
    Ne(serde_json::Value),
    /// In list.
    In(Vec<serde_json::Value>),
    /// Not in list.
    Nin(Vec<serde_json::Value>),
}

/// A single filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Metadata key to filter on.
    pub field: String,
    /// Operator to apply.
    pub operator: FilterOperator,
}

impl FilterCondition {
    /// Create an equality condition.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Eq(value.into()),
        }
    }

    /// Create an inequality condition.
    pub fn ne(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Ne(value.into()),
        }
    }

    /// Create an in-list condition.
    pub fn in_list(field: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::In(values),
        }
    }

    /// Create a not-in-list condition.
    pub fn not_in_list(field: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Nin(values),
        }
    }

    fn matches(&self, metadata: &ChunkMetadata) -> bool {
        let value = field_value(metadata, &self.field);
        match (&self.operator, value) {
            (FilterOperator::Eq(expected), Some(v)) => &v == expected,
            (FilterOperator::Eq(_), None) => false,
            (FilterOperator::Ne(expected), Some(v)) => &v != expected,
            (FilterOperator::Ne(_), None) => true,
            (FilterOperator::In(values), Some(v)) => values.contains(&v),
            (FilterOperator::In(_), None) => false,
            (FilterOperator::Nin(values), Some(v)) => !values.contains(&v),
            (FilterOperator::Nin(_), None) => true,
        }
    }
}

/// Conjunction of metadata conditions.
///
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Conditions, all of which must hold.
    pub conditions: Vec<FilterCondition>,
}

impl MetadataFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition.
    pub fn and(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Shorthand for a single equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::new().and(FilterCondition::eq(field, value))
    }

    /// Whether the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter against chunk metadata.
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        self.conditions.iter().all(|c| c.matches(metadata))
    }
}

/// Resolve a metadata key to a JSON value, covering typed fields and `extra`.
fn field_value(metadata: &ChunkMetadata, field: &str) -> Option<serde_json::Value> {
    match field {
        "visibility" => metadata
            .visibility
            .map(|v| serde_json::Value::String(v.to_string())),
        "source" | "ingested_at" | "dataset" | "owner_user_id" => metadata
            .get_str(field)
            .map(|s| serde_json::Value::String(s.to_string())),
        _ => metadata.extra.get(field).cloned(),
    }
}
