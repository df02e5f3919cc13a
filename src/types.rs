//! Convenience types exchanged with the engine.

use serde::{Deserialize, Serialize};

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<serde_json::Value>,
    /// The value after the change (None if deleting).
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation (`null` when destroying).
    pub planned_state: serde_json::Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: serde_json::Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Returns true if applying the plan would change anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// The provider's type name, prefix of every resource type name.
    pub type_name: String,
    /// List of resource type names.
    pub resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("Urgent"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("Urgent")));

        let removed = AttributeChange::removed("note", json!("old"));
        assert_eq!(removed.before, Some(json!("old")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("active", json!(true), json!(false));
        assert_eq!(modified.before, Some(json!(true)));
        assert_eq!(modified.after, Some(json!(false)));
    }

    #[test]
    fn test_plan_result() {
        let no_change = PlanResult::no_change(json!({"id": "7"}));
        assert!(!no_change.has_changes());
        assert!(!no_change.requires_replace);

        let with_changes = PlanResult::with_changes(
            json!({"id": "7", "name": "High"}),
            vec![AttributeChange::modified("name", json!("Low"), json!("High"))],
            false,
        );
        assert!(with_changes.has_changes());
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("zammad_ticket_priority", json!({"id": "42"}));
        assert_eq!(imported.resource_type, "zammad_ticket_priority");
        assert_eq!(imported.state["id"], "42");
    }
}
