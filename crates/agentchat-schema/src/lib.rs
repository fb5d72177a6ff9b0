use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A single string parameter a tool accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, description)
        }
    }
}

/// Builds the object schema advertised to the model for a list of string
/// parameters. `properties` is keyed by name and carries no order; the
/// `required` list keeps the order of `params`.
pub fn string_parameters(params: &[ParameterSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        properties.insert(
            param.name.clone(),
            json!({
                "type": "string",
                "description": param.description
            }),
        );
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_and_optional_params() {
        let schema = string_parameters(&[
            ParameterSpec::required("city", "City to look up"),
            ParameterSpec::optional("format", "Clock format"),
        ]);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["city"]["type"], "string");
        assert_eq!(schema["properties"]["city"]["description"], "City to look up");
        assert_eq!(schema["required"], json!(["city"]));
    }

    #[test]
    fn every_param_is_declared_and_required_keeps_input_order() {
        let schema = string_parameters(&[
            ParameterSpec::required("zone", "Time zone"),
            ParameterSpec::optional("locale", "Output locale"),
            ParameterSpec::required("city", "City to look up"),
        ]);

        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 3);
        for name in ["zone", "locale", "city"] {
            assert_eq!(properties[name]["type"], "string");
        }
        assert_eq!(schema["required"], json!(["zone", "city"]));
    }

    #[test]
    fn no_required_key_without_required_params() {
        let schema = string_parameters(&[]);
        assert_eq!(schema, json!({"type": "object", "properties": {}}));
    }
}
