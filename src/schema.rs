//! Declarative field schemas for agent boundaries
//!
//! Every agent declares an input and an output schema: an ordered list of
//! typed field descriptors. Validation is shallow-structural and names the
//! first violation it finds; unknown extra fields are always permitted for
//! forward compatibility. Defaults are merged into the data before the
//! agent's task handler runs.

use serde_json::Value;

/// Associative data passed between agents.
///
/// Keys beginning with `_` are reserved for the engine (`_pipeline_id`,
/// `_retry_attempt`).
pub type DataMap = serde_json::Map<String, Value>;

/// Field types supported by agent schemas
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Map,
    Array(Box<FieldType>),
    Any,
}

impl FieldType {
    /// Human-readable type name used in validation messages
    pub fn name(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Integer => "integer".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Map => "map".to_string(),
            FieldType::Array(inner) => format!("array<{}>", inner.name()),
            FieldType::Any => "any".to_string(),
        }
    }

    /// Check a single value against this type.
    ///
    /// `Map` accepts any object without recursing; `Array` checks each
    /// element; `Any` accepts everything.
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Map => value.is_object(),
            FieldType::Array(_) => value.is_array(),
            FieldType::Any => true,
        }
    }
}

/// One field descriptor in a schema
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    field_type: FieldType,
    required: bool,
    default: Option<Value>,
    description: Option<String>,
}

impl Field {
    /// Declare a required field
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            default: None,
            description: None,
        }
    }

    /// Declare an optional field
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            description: None,
        }
    }

    /// Attach a default value, merged in when the field is absent
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Attach a human-readable description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Schema construction errors, reported at agent-load time
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate field name '{0}'")]
    DuplicateField(String),
    #[error("Required field '{0}' must not declare a default")]
    RequiredWithDefault(String),
    #[error("Default for field '{field}' does not match declared type {expected}")]
    DefaultTypeMismatch { field: String, expected: String },
}

/// Ordered set of field descriptors with a validation entry point
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Build a schema, enforcing the construction invariants: field names
    /// are unique, required fields carry no default, and declared defaults
    /// match their field type.
    pub fn new(fields: Vec<Field>) -> Result<Self, SchemaError> {
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            if field.required && field.default.is_some() {
                return Err(SchemaError::RequiredWithDefault(field.name.clone()));
            }
            if let Some(default) = &field.default {
                if !type_check(&field.field_type, default) {
                    return Err(SchemaError::DefaultTypeMismatch {
                        field: field.name.clone(),
                        expected: field.field_type.name(),
                    });
                }
            }
        }
        Ok(Self { fields })
    }

    /// Schema with no declared fields; validation accepts anything
    pub fn empty() -> Self {
        Self::default()
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Validate a data map against this schema.
    ///
    /// Returns the first violation: a missing required field, a wrong
    /// top-level type, or an array element type mismatch. Extra fields not
    /// declared in the schema pass through untouched.
    pub fn validate(&self, data: &DataMap) -> Result<(), String> {
        for field in &self.fields {
            match data.get(&field.name) {
                None => {
                    if field.required {
                        return Err(format!("missing required field '{}'", field.name));
                    }
                }
                Some(value) => validate_value(&field.name, &field.field_type, value)?,
            }
        }
        Ok(())
    }

    /// Insert declared defaults for absent optional fields.
    ///
    /// Applied before the task handler runs, so handlers always observe
    /// defaulted fields.
    pub fn merge_defaults(&self, data: &mut DataMap) {
        for field in &self.fields {
            if let Some(default) = &field.default {
                if !data.contains_key(&field.name) {
                    data.insert(field.name.clone(), default.clone());
                }
            }
        }
    }
}

fn validate_value(name: &str, field_type: &FieldType, value: &Value) -> Result<(), String> {
    if !field_type.matches(value) {
        return Err(format!(
            "field '{}' expected {}, got {}",
            name,
            field_type.name(),
            json_type_name(value)
        ));
    }

    if let (FieldType::Array(element_type), Value::Array(elements)) = (field_type, value) {
        for (index, element) in elements.iter().enumerate() {
            if !type_check(element_type, element) {
                return Err(format!(
                    "element {} of array field '{}' expected {}, got {}",
                    index,
                    name,
                    element_type.name(),
                    json_type_name(element)
                ));
            }
        }
    }

    Ok(())
}

/// Full recursive type check, used for defaults and array elements
fn type_check(field_type: &FieldType, value: &Value) -> bool {
    match (field_type, value) {
        (FieldType::Array(element_type), Value::Array(elements)) => {
            elements.iter().all(|e| type_check(element_type, e))
        }
        _ => field_type.matches(value),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> DataMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected JSON object"),
        }
    }

    fn greeter_schema() -> Schema {
        Schema::new(vec![
            Field::required("name", FieldType::String),
            Field::optional("language", FieldType::String)
                .with_default(json!("en"))
                .with_description("ISO 639-1 language code"),
        ])
        .unwrap()
    }

    // ========== Construction invariants ==========

    #[test]
    fn test_duplicate_field_rejected() {
        let result = Schema::new(vec![
            Field::required("name", FieldType::String),
            Field::optional("name", FieldType::Integer),
        ]);
        assert!(matches!(result, Err(SchemaError::DuplicateField(_))));
    }

    #[test]
    fn test_required_with_default_rejected() {
        let result = Schema::new(vec![
            Field::required("name", FieldType::String).with_default(json!("x"))
        ]);
        assert!(matches!(result, Err(SchemaError::RequiredWithDefault(_))));
    }

    #[test]
    fn test_default_type_mismatch_rejected() {
        let result =
            Schema::new(vec![
                Field::optional("count", FieldType::Integer).with_default(json!("three"))
            ]);
        assert!(matches!(
            result,
            Err(SchemaError::DefaultTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_array_default_elements_checked() {
        let result = Schema::new(vec![Field::optional(
            "tags",
            FieldType::Array(Box::new(FieldType::String)),
        )
        .with_default(json!(["a", 1]))]);
        assert!(matches!(
            result,
            Err(SchemaError::DefaultTypeMismatch { .. })
        ));
    }

    // ========== Validation ==========

    #[test]
    fn test_valid_data_passes() {
        let schema = greeter_schema();
        let data = object(json!({"name": "Maria", "language": "es"}));
        assert!(schema.validate(&data).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let schema = greeter_schema();
        let data = object(json!({"language": "es"}));
        let err = schema.validate(&data).unwrap_err();
        assert_eq!(err, "missing required field 'name'");
    }

    #[test]
    fn test_wrong_type_reports_both_types() {
        let schema = greeter_schema();
        let data = object(json!({"name": 42}));
        let err = schema.validate(&data).unwrap_err();
        assert_eq!(err, "field 'name' expected string, got integer");
    }

    #[test]
    fn test_integer_rejects_float() {
        let schema = Schema::new(vec![Field::required("count", FieldType::Integer)]).unwrap();
        let err = schema.validate(&object(json!({"count": 1.5}))).unwrap_err();
        assert!(err.contains("expected integer"));
    }

    #[test]
    fn test_float_accepts_integer_values() {
        let schema = Schema::new(vec![Field::required("score", FieldType::Float)]).unwrap();
        assert!(schema.validate(&object(json!({"score": 3}))).is_ok());
        assert!(schema.validate(&object(json!({"score": 3.25}))).is_ok());
    }

    #[test]
    fn test_array_element_mismatch_names_index() {
        let schema = Schema::new(vec![Field::required(
            "tags",
            FieldType::Array(Box::new(FieldType::String)),
        )])
        .unwrap();

        let err = schema
            .validate(&object(json!({"tags": ["ok", "fine", 3]})))
            .unwrap_err();
        assert_eq!(
            err,
            "element 2 of array field 'tags' expected string, got integer"
        );
    }

    #[test]
    fn test_map_is_shallow() {
        let schema = Schema::new(vec![Field::required("metadata", FieldType::Map)]).unwrap();
        let data = object(json!({"metadata": {"nested": {"deeply": [1, "mixed", null]}}}));
        assert!(schema.validate(&data).is_ok());
    }

    #[test]
    fn test_any_accepts_everything() {
        let schema = Schema::new(vec![Field::required("payload", FieldType::Any)]).unwrap();
        for value in [json!(null), json!(1), json!("s"), json!([1]), json!({})] {
            let data = object(json!({ "payload": value }));
            assert!(schema.validate(&data).is_ok());
        }
    }

    #[test]
    fn test_extra_fields_permitted() {
        let schema = greeter_schema();
        let data = object(json!({"name": "Hans", "unexpected": true, "_pipeline_id": 7}));
        assert!(schema.validate(&data).is_ok());
    }

    #[test]
    fn test_empty_schema_accepts_anything() {
        let data = object(json!({"whatever": [1, 2, 3]}));
        assert!(Schema::empty().validate(&data).is_ok());
    }

    // ========== Default merging ==========

    #[test]
    fn test_merge_defaults_fills_absent_field() {
        let schema = greeter_schema();
        let mut data = object(json!({"name": "Maria"}));
        schema.merge_defaults(&mut data);
        assert_eq!(data.get("language"), Some(&json!("en")));
    }

    #[test]
    fn test_merge_defaults_keeps_present_value() {
        let schema = greeter_schema();
        let mut data = object(json!({"name": "Maria", "language": "es"}));
        schema.merge_defaults(&mut data);
        assert_eq!(data.get("language"), Some(&json!("es")));
    }

    #[test]
    fn test_field_accessors() {
        let field = Field::optional("language", FieldType::String)
            .with_default(json!("en"))
            .with_description("ISO 639-1 language code");

        assert_eq!(field.name(), "language");
        assert_eq!(field.field_type(), &FieldType::String);
        assert!(!field.is_required());
        assert_eq!(field.default(), Some(&json!("en")));
        assert_eq!(field.description(), Some("ISO 639-1 language code"));
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::String.name(), "string");
        assert_eq!(
            FieldType::Array(Box::new(FieldType::Integer)).name(),
            "array<integer>"
        );
    }
}
