//! Schema-driven planning.
//!
//! Planning turns the user's configuration and the prior state into the
//! state the engine expects after apply, marking provider-computed values as
//! unknown and running each attribute's plan modifiers.

use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::schema::Schema;
use crate::types::{AttributeChange, PlanResult};
use crate::value::{is_unknown_json, unknown_json};

/// Plan a resource.
///
/// `prior_state` is `None` when the resource does not exist yet. A `null`
/// configuration plans its destruction.
pub fn plan_resource(
    schema: &Schema,
    prior_state: Option<&Value>,
    config: &Value,
) -> Result<PlanResult, ProviderError> {
    let prior = match prior_state {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            return Err(ProviderError::InvalidRequest(
                "prior state must be an object".to_string(),
            ))
        },
    };

    let config = match config {
        Value::Null => return Ok(plan_destroy(prior)),
        Value::Object(map) => map,
        _ => {
            return Err(ProviderError::InvalidRequest(
                "configuration must be an object".to_string(),
            ))
        },
    };

    let mut planned = Map::new();
    for (name, attr) in &schema.attributes {
        let configured = config.get(name).filter(|v| !v.is_null());
        let prior_value = prior.and_then(|p| p.get(name));
        let prior_known = prior_value.filter(|v| !v.is_null() && !is_unknown_json(v));
        let initial = if attr.flags.is_computed_only() {
            unknown_json()
        } else {
            match (configured, prior_known) {
                (Some(v), _) => v.clone(),
                // Unset optional+computed values keep what the server last reported
                (None, Some(v)) if attr.flags.computed => v.clone(),
                (None, None) if attr.flags.computed => unknown_json(),
                (None, _) => Value::Null,
            }
        };

        let value = attr
            .plan_modifiers
            .iter()
            .fold(initial, |value, modifier| modifier.apply(value, prior_value));
        planned.insert(name.clone(), value);
    }

    let mut changes = Vec::new();
    let mut requires_replace = false;
    match prior {
        None => {
            for (name, value) in &planned {
                if !value.is_null() && !is_unknown_json(value) {
                    changes.push(AttributeChange::added(name.clone(), value.clone()));
                }
            }
        },
        Some(prior) => {
            for (name, attr) in &schema.attributes {
                let after = &planned[name.as_str()];
                if is_unknown_json(after) {
                    continue;
                }
                let before = prior.get(name).cloned().unwrap_or(Value::Null);
                if &before != after {
                    requires_replace |= attr.force_new;
                    changes.push(AttributeChange::modified(
                        name.clone(),
                        before,
                        after.clone(),
                    ));
                }
            }
        },
    }

    Ok(PlanResult::with_changes(
        Value::Object(planned),
        changes,
        requires_replace,
    ))
}

fn plan_destroy(prior: Option<&Map<String, Value>>) -> PlanResult {
    let Some(prior) = prior else {
        return PlanResult::no_change(Value::Null);
    };
    let changes = prior
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(name, v)| AttributeChange::removed(name.clone(), v.clone()))
        .collect();
    PlanResult::with_changes(Value::Null, changes, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, PlanModifier};
    use crate::ticket_priority;
    use serde_json::json;

    #[test]
    fn test_create_marks_computed_unknown() {
        let plan = plan_resource(
            &ticket_priority::schema(),
            None,
            &json!({"name": "Urgent"}),
        )
        .unwrap();

        let state = &plan.planned_state;
        assert_eq!(state["name"], "Urgent");
        assert_eq!(state["note"], Value::Null);
        assert_eq!(state["ui_icon"], Value::Null);
        assert!(is_unknown_json(&state["id"]));
        assert!(is_unknown_json(&state["created_at"]));
        assert!(is_unknown_json(&state["default_create"]));
        // Default-true modifier
        assert_eq!(state["active"], true);
        assert!(!plan.requires_replace);

        let paths: Vec<_> = plan.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["active", "name"]);
    }

    #[test]
    fn test_configured_active_wins() {
        let plan = plan_resource(
            &ticket_priority::schema(),
            None,
            &json!({"name": "Low", "active": false}),
        )
        .unwrap();
        assert_eq!(plan.planned_state["active"], false);
    }

    #[test]
    fn test_update_reuses_computed_state() {
        let prior = json!({
            "id": "7",
            "name": "Normal",
            "note": null,
            "ui_icon": null,
            "ui_color": null,
            "default_create": true,
            "active": false,
            "created_by_id": 1,
            "updated_by_id": 1,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });

        let plan = plan_resource(
            &ticket_priority::schema(),
            Some(&prior),
            &json!({"name": "High"}),
        )
        .unwrap();

        let state = &plan.planned_state;
        assert_eq!(state["id"], "7");
        assert_eq!(state["created_at"], "2024-01-01T00:00:00Z");
        assert_eq!(state["default_create"], true);
        // Unconfigured active keeps the known prior value
        assert_eq!(state["active"], false);

        let paths: Vec<_> = plan.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["name"]);
        assert!(!plan.requires_replace);
    }

    #[test]
    fn test_unconfigured_inactive_priority_has_no_changes() {
        let prior = json!({
            "id": "7",
            "name": "Normal",
            "note": null,
            "ui_icon": null,
            "ui_color": null,
            "default_create": false,
            "active": false,
            "created_by_id": 1,
            "updated_by_id": 1,
            "created_at": "a",
            "updated_at": "b"
        });
        let plan = plan_resource(
            &ticket_priority::schema(),
            Some(&prior),
            &json!({"name": "Normal"}),
        )
        .unwrap();

        assert_eq!(plan.planned_state["active"], false);
        assert!(!plan.has_changes());
        assert_eq!(plan.planned_state, prior);
    }

    #[test]
    fn test_active_defaults_when_prior_value_missing() {
        // Imported state before its first read
        let prior = json!({"id": "42", "name": null, "active": null});
        let plan = plan_resource(
            &ticket_priority::schema(),
            Some(&prior),
            &json!({"name": "Normal"}),
        )
        .unwrap();

        assert_eq!(plan.planned_state["active"], true);
        assert!(is_unknown_json(&plan.planned_state["default_create"]));
        assert_eq!(plan.planned_state["id"], "42");
    }

    #[test]
    fn test_no_change_when_config_matches_state() {
        let prior = json!({
            "id": "7",
            "name": "Normal",
            "active": true,
            "default_create": false,
            "created_by_id": 1,
            "updated_by_id": 1,
            "created_at": "a",
            "updated_at": "b"
        });
        let plan = plan_resource(
            &ticket_priority::schema(),
            Some(&prior),
            &json!({"name": "Normal"}),
        )
        .unwrap();
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_destroy() {
        let prior = json!({"id": "7", "name": "Normal", "note": null});
        let plan = plan_resource(&ticket_priority::schema(), Some(&prior), &Value::Null).unwrap();
        assert_eq!(plan.planned_state, Value::Null);
        let paths: Vec<_> = plan.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["id", "name"]);

        let plan = plan_resource(&ticket_priority::schema(), None, &Value::Null).unwrap();
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_force_new_requires_replace() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute(
                "id",
                Attribute::computed_string().with_plan_modifier(PlanModifier::UseStateForUnknown),
            );
        let plan = plan_resource(
            &schema,
            Some(&json!({"id": "1", "name": "a"})),
            &json!({"name": "b"}),
        )
        .unwrap();
        assert!(plan.requires_replace);
    }

    #[test]
    fn test_rejects_non_object_input() {
        let schema = ticket_priority::schema();
        assert!(matches!(
            plan_resource(&schema, None, &json!("nope")),
            Err(ProviderError::InvalidRequest(_))
        ));
        assert!(matches!(
            plan_resource(&schema, Some(&json!([1])), &json!({"name": "x"})),
            Err(ProviderError::InvalidRequest(_))
        ));
    }
}
