//! Mapping validation against a resolved schema version.
//!
//! Pure and deterministic: the same mapping and schema always produce the
//! same ordered violation list. Required fields are checked in schema
//! declaration order, then mapping keys in submission order, so callers can
//! fix a whole mapping in one round trip.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::model::{FieldDef, FieldType, Mapping, SchemaVersion};

/// What went wrong with one mapping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field absent or unpopulated.
    Missing,
    /// Mapping key not declared in the schema.
    Unknown,
    /// Literal value incompatible with the declared field type.
    TypeMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Validate a submitted mapping against a schema's field definitions.
pub fn validate(mapping: &Mapping, schema: &SchemaVersion) -> ValidationResult {
    let mut violations = Vec::new();

    // Required fields, in schema declaration order.
    for def in &schema.field_definitions {
        if def.required && !mapping.get(&def.name).map(is_populated).unwrap_or(false) {
            violations.push(Violation {
                field: def.name.clone(),
                kind: ViolationKind::Missing,
            });
        }
    }

    // Unknown keys and type mismatches, in submission order.
    for (key, value) in mapping {
        match schema.field(key) {
            None => violations.push(Violation {
                field: key.clone(),
                kind: ViolationKind::Unknown,
            }),
            Some(def) => {
                if is_populated(value) && !value_matches(value, def) {
                    violations.push(Violation {
                        field: key.clone(),
                        kind: ViolationKind::TypeMismatch,
                    });
                }
            }
        }
    }

    if violations.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(violations)
    }
}

/// An entry counts as populated unless it is null or an empty string.
fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Check a populated value against the declared field type.
///
/// Strings are source column references and pass for text/number/boolean
/// fields (the actual column content is checked by the worker at import
/// time). Enum fields take a pinned constant, so the string must be one of
/// the allowed values. Non-string literals must match the declared category.
fn value_matches(value: &Value, def: &FieldDef) -> bool {
    match (&def.field_type, value) {
        (FieldType::Enum { allowed }, Value::String(s)) => allowed.iter().any(|a| a == s),
        (_, Value::String(_)) => true,
        (FieldType::Number, Value::Number(_)) => true,
        (FieldType::Boolean, Value::Bool(_)) => true,
        _ => false,
    }
}
