use crate::error::{RuntimeError, RuntimeResult};
use serde_json::Value;

/// Validates `arguments` against a tool's `input_schema` (spec §4.6 step 1).
/// The schemas this daemon loads are plain `{type, properties, required}`
/// objects, not full JSON Schema documents, so this only checks that every
/// required property is present and, where declared, of the right JSON type.
pub fn validate_arguments(schema: &Value, arguments: &Value) -> RuntimeResult<()> {
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return Ok(());
    };
    let properties = schema.get("properties");
    for field in required {
        let Some(name) = field.as_str() else { continue };
        let Some(value) = arguments.get(name) else {
            return Err(RuntimeError::InvalidInput(format!("missing required field `{name}`")));
        };
        let expected_type = properties.and_then(|p| p.get(name)).and_then(|p| p.get("type")).and_then(Value::as_str);
        if let Some(expected_type) = expected_type {
            if !json_type_matches(value, expected_type) {
                return Err(RuntimeError::InvalidInput(format!(
                    "field `{name}` must be of type `{expected_type}`"
                )));
            }
        }
    }
    Ok(())
}

fn json_type_matches(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}
