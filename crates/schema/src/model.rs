//! Versioned schema and mapping data model.
//!
//! Schemas are published by an out-of-scope admin process into the
//! `schema_versions` table; this crate only ever reads them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared type category of a schema field.
///
/// Serialized as a tagged object inside the `field_definitions` jsonb column,
/// e.g. `{"name":"region","type":"enum","allowed":["emea","apac"],"required":false}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Enum { allowed: Vec<String> },
}

/// One field declaration within a schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

/// A versioned schema row for one (client, import type) pair.
///
/// At most one row per pair is active at any time (enforced by a partial
/// unique index); versions are strictly increasing per pair.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SchemaVersion {
    pub client_id: String,
    pub import_type: String,
    pub version: i32,
    #[sqlx(json)]
    pub field_definitions: Vec<FieldDef>,
    pub is_active: bool,
}

impl SchemaVersion {
    /// Look up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.field_definitions.iter().find(|f| f.name == name)
    }
}

/// Ordered correspondence from declared schema field names to source values.
///
/// Values are JSON scalars: a string is a source column reference, a
/// number/boolean is a pinned constant. Entry order is preserved end to end
/// (submission, storage, violation reporting).
pub type Mapping = IndexMap<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_tagged_serde() {
        let json = r#"{"name":"budget","type":"number","required":true}"#;
        let def: FieldDef = serde_json::from_str(json).unwrap();
        assert_eq!(def.name, "budget");
        assert_eq!(def.field_type, FieldType::Number);
        assert!(def.required);

        let back = serde_json::to_value(&def).unwrap();
        assert_eq!(back["type"], "number");
    }

    #[test]
    fn test_enum_field_carries_allowed_values() {
        let json = r#"{"name":"region","type":"enum","allowed":["emea","apac"]}"#;
        let def: FieldDef = serde_json::from_str(json).unwrap();
        assert_eq!(
            def.field_type,
            FieldType::Enum { allowed: vec!["emea".into(), "apac".into()] }
        );
        // `required` defaults to false when omitted.
        assert!(!def.required);
    }

    #[test]
    fn test_mapping_preserves_submission_order() {
        let json = r#"{"name":"col_a","budget":"col_b","region":"col_c"}"#;
        let mapping: Mapping = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = mapping.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "budget", "region"]);
    }

    #[test]
    fn test_schema_field_lookup() {
        let schema = SchemaVersion {
            client_id: "acme".into(),
            import_type: "campaigns".into(),
            version: 3,
            field_definitions: vec![FieldDef {
                name: "name".into(),
                field_type: FieldType::Text,
                required: true,
            }],
            is_active: true,
        };
        assert!(schema.field("name").is_some());
        assert!(schema.field("budget").is_none());
    }
}
