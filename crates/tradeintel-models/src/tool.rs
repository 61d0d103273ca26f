use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Accepted JSON type of one argument field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    StringArray,
}

/// One argument field of a tool's input shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Closed set of accepted values (checked per element for arrays).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
}

impl FieldSpec {
    fn new(name: &str, description: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            field_type,
            required: false,
            allowed: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn string(name: &str, description: &str) -> Self {
        Self::new(name, description, FieldType::String)
    }

    pub fn number(name: &str, description: &str) -> Self {
        Self::new(name, description, FieldType::Number)
    }

    pub fn integer(name: &str, description: &str) -> Self {
        Self::new(name, description, FieldType::Integer)
    }

    pub fn boolean(name: &str, description: &str) -> Self {
        Self::new(name, description, FieldType::Boolean)
    }

    pub fn string_array(name: &str, description: &str) -> Self {
        Self::new(name, description, FieldType::StringArray)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn range(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        let enum_values = self.allowed.as_ref().map(|values| json!(values));
        let type_name = match self.field_type {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::StringArray => "array",
        };
        schema.insert("type".into(), json!(type_name));
        if self.field_type == FieldType::StringArray {
            let mut items = Map::new();
            items.insert("type".into(), json!("string"));
            if let Some(values) = enum_values {
                items.insert("enum".into(), values);
            }
            schema.insert("items".into(), Value::Object(items));
        } else if let Some(values) = enum_values {
            schema.insert("enum".into(), values);
        }
        schema.insert("description".into(), json!(self.description));
        if let Some(min) = self.minimum {
            schema.insert("minimum".into(), json!(min));
        }
        if let Some(max) = self.maximum {
            schema.insert("maximum".into(), json!(max));
        }
        Value::Object(schema)
    }
}

/// Schema-like description of the arguments a tool accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InputShape {
    pub fields: Vec<FieldSpec>,
}

impl InputShape {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render as a JSON Schema object (`type: object`, `properties`, `required`).
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Name and input shape of one registered tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_shape: InputShape,
}

impl ToolDescriptor {
    pub fn listing(&self) -> ToolListing {
        ToolListing {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_shape.to_json_schema(),
        }
    }
}

/// Wire form of a descriptor returned by `list_tools`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolListing {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result of a single dispatch. Always well-formed, even for failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallResult {
    pub content: Value,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn success(content: Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn failure(content: Value) -> Self {
        Self {
            content,
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shape() -> InputShape {
        InputShape::new(vec![
            FieldSpec::number("min_margin", "Minimum gross margin, percent")
                .required()
                .range(0, 100),
            FieldSpec::string_array("products", "Products to include").one_of(["coffee", "tea"]),
        ])
    }

    #[test]
    fn schema_lists_required_fields() {
        let schema = sample_shape().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["min_margin"]));
        assert_eq!(schema["properties"]["min_margin"]["type"], "number");
        assert_eq!(schema["properties"]["min_margin"]["maximum"], 100);
    }

    #[test]
    fn array_enum_applies_to_items() {
        let schema = sample_shape().to_json_schema();
        let products = &schema["properties"]["products"];
        assert_eq!(products["type"], "array");
        assert_eq!(products["items"]["enum"], json!(["coffee", "tea"]));
    }

    #[test]
    fn empty_shape_has_no_required() {
        let schema = InputShape::empty().to_json_schema();
        assert_eq!(schema["required"], json!([]));
        assert_eq!(schema["properties"], json!({}));
    }

    #[test]
    fn call_result_wire_names() {
        let result = ToolCallResult::failure(json!({"error": "Unknown tool: nope"}));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["content"]["error"], "Unknown tool: nope");
    }
}
