//! Schema validation helpers.
//!
//! Validates a configuration `serde_json::Value` against a [`Schema`] before
//! it is planned, producing one [`Diagnostic`] per problem.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_zammad::schema::{Schema, Attribute};
//! use hemmer_provider_zammad::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("id", Attribute::computed_string());
//!
//! assert!(validate(&schema, &json!({"name": "Urgent"})).is_empty());
//!
//! // Computed attributes cannot be configured
//! let diagnostics = validate(&schema, &json!({"name": "Urgent", "id": "7"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("id".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use crate::value::is_unknown_json;
use serde_json::Value;

/// Validate a configuration value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - The configuration must be an object
/// - Required attributes must be present and non-null
/// - Computed-only attributes must not be set
/// - Attribute types must match the schema; unknown values match any type
/// - Attributes not in the schema are rejected
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        },
    };

    for (name, attr) in &schema.attributes {
        validate_attribute(name, attr, obj.get(name), &mut diagnostics);
    }

    for name in obj.keys() {
        if schema.attribute(name).is_none() {
            diagnostics.push(
                Diagnostic::error(format!("Unsupported attribute '{}'", name))
                    .with_detail("An attribute with this name is not expected here")
                    .with_attribute(name.as_str()),
            );
        }
    }

    diagnostics
}

/// Validate a configuration value, returning Ok if valid or Err with diagnostics.
///
/// This is a convenience wrapper around [`validate`] that returns a Result.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a configuration value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_attribute(
    name: &str,
    attr: &Attribute,
    value: Option<&Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", name))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(name),
                );
            }
        },
        Some(_) if attr.flags.is_computed_only() => {
            diagnostics.push(
                Diagnostic::error(format!("Invalid configuration for attribute '{}'", name))
                    .with_detail("This attribute is computed by the provider and cannot be set")
                    .with_attribute(name),
            );
        },
        Some(v) if is_unknown_json(v) => {},
        Some(v) => {
            if !type_matches(attr.attr_type, v) {
                diagnostics.push(type_error(name, attr.attr_type, v));
            }
        },
    }
}

fn type_matches(attr_type: AttributeType, value: &Value) -> bool {
    match attr_type {
        AttributeType::String => value.is_string(),
        AttributeType::Int64 => value.is_i64(),
        AttributeType::Bool => value.is_boolean(),
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: AttributeType, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!(
            "Expected {}, got {}",
            expected.name(),
            value_type_name(got)
        ))
        .with_attribute(path)
}
