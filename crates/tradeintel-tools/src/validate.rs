use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tradeintel_models::{FieldSpec, FieldType, InputShape};

use crate::error::ToolError;

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Number(Decimal),
    Integer(i64),
    Bool(bool),
    StrList(Vec<String>),
}

/// Arguments that passed the input-shape check, keyed by field name.
/// Absent optional fields are simply missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    values: HashMap<String, ArgValue>,
}

impl ValidatedArgs {
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<Decimal> {
        match self.values.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            Some(ArgValue::Integer(i)) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn strings(&self, name: &str) -> Option<&[String]> {
        match self.values.get(name) {
            Some(ArgValue::StrList(list)) => Some(list),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn insert(&mut self, name: &str, value: ArgValue) {
        self.values.insert(name.to_string(), value);
    }
}

/// Check `args` against `shape`, coercing scalars where unambiguous.
pub fn validate(shape: &InputShape, args: &Value) -> Result<ValidatedArgs, ToolError> {
    let empty = Map::new();
    let object = match args {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => return Err(ToolError::invalid("arguments", "expected a JSON object")),
    };

    let mut validated = ValidatedArgs::default();
    for spec in &shape.fields {
        match object.get(&spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    return Err(ToolError::invalid(&spec.name, "is required"));
                }
            }
            Some(raw) => {
                let value = coerce(spec, raw)?;
                validated.insert(&spec.name, value);
            }
        }
    }
    Ok(validated)
}

fn coerce(spec: &FieldSpec, raw: &Value) -> Result<ArgValue, ToolError> {
    let field = spec.name.as_str();
    match spec.field_type {
        FieldType::String => {
            let s = scalar_string(raw).ok_or_else(|| ToolError::invalid(field, "expected a string"))?;
            if s.trim().is_empty() {
                return Err(ToolError::invalid(field, "must not be empty"));
            }
            Ok(ArgValue::Str(check_allowed(spec, field, &s)?))
        }
        FieldType::Number => {
            let n = number(raw).ok_or_else(|| ToolError::invalid(field, "expected a number"))?;
            check_range(spec, n)?;
            Ok(ArgValue::Number(n))
        }
        FieldType::Integer => {
            let n = number(raw)
                .filter(|n| n.fract().is_zero())
                .and_then(|n| n.to_i64())
                .ok_or_else(|| ToolError::invalid(field, "expected an integer"))?;
            check_range(spec, Decimal::from(n))?;
            Ok(ArgValue::Integer(n))
        }
        FieldType::Boolean => match raw {
            Value::Bool(b) => Ok(ArgValue::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(ArgValue::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(ArgValue::Bool(false)),
            _ => Err(ToolError::invalid(field, "expected a boolean")),
        },
        FieldType::StringArray => {
            let items: Vec<&Value> = match raw {
                Value::Array(items) => items.iter().collect(),
                scalar => vec![scalar],
            };
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let element = format!("{field}[{i}]");
                let s = scalar_string(item)
                    .ok_or_else(|| ToolError::invalid(&element, "expected a string"))?;
                out.push(check_allowed(spec, &element, &s)?);
            }
            Ok(ArgValue::StrList(out))
        }
    }
}

fn scalar_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(raw: &Value) -> Option<Decimal> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Match against the allowed set case-insensitively, returning the canonical spelling.
fn check_allowed(spec: &FieldSpec, field: &str, value: &str) -> Result<String, ToolError> {
    let Some(allowed) = &spec.allowed else {
        return Ok(value.to_string());
    };
    allowed
        .iter()
        .find(|a| a.eq_ignore_ascii_case(value.trim()))
        .cloned()
        .ok_or_else(|| {
            ToolError::invalid(field, format!("must be one of: {}", allowed.join(", ")))
        })
}

fn check_range(spec: &FieldSpec, n: Decimal) -> Result<(), ToolError> {
    if let Some(min) = spec.minimum {
        if n < Decimal::from(min) {
            return Err(ToolError::invalid(&spec.name, format!("must be >= {min}")));
        }
    }
    if let Some(max) = spec.maximum {
        if n > Decimal::from(max) {
            return Err(ToolError::invalid(&spec.name, format!("must be <= {max}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn shape() -> InputShape {
        InputShape::new(vec![
            FieldSpec::number("min_margin", "percent").required().range(0, 100),
            FieldSpec::integer("top_n", "count").range(1, 50),
            FieldSpec::string("country", "name"),
            FieldSpec::string_array("products", "commodities").one_of(["coffee", "tea"]),
            FieldSpec::boolean("detailed", "flag"),
        ])
    }

    fn field_of(err: ToolError) -> String {
        match err {
            ToolError::InvalidArguments { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accepts_valid_arguments() {
        let args = validate(
            &shape(),
            &json!({"min_margin": 25.5, "top_n": 3, "country": "Ghana", "products": ["coffee"], "detailed": true}),
        )
        .unwrap();
        assert_eq!(args.number("min_margin"), Some(dec!(25.5)));
        assert_eq!(args.integer("top_n"), Some(3));
        assert_eq!(args.str("country"), Some("Ghana"));
        assert_eq!(args.strings("products"), Some(&["coffee".to_string()][..]));
        assert_eq!(args.boolean("detailed"), Some(true));
    }

    #[test]
    fn coerces_strings_and_scalars() {
        let args = validate(
            &shape(),
            &json!({"min_margin": "30", "top_n": "5", "country": 7490, "products": "TEA", "detailed": "false"}),
        )
        .unwrap();
        assert_eq!(args.number("min_margin"), Some(dec!(30)));
        assert_eq!(args.integer("top_n"), Some(5));
        assert_eq!(args.str("country"), Some("7490"));
        assert_eq!(args.strings("products"), Some(&["tea".to_string()][..]));
        assert_eq!(args.boolean("detailed"), Some(false));
    }

    #[test]
    fn missing_required_field() {
        let err = validate(&shape(), &json!({"top_n": 2})).unwrap_err();
        assert_eq!(field_of(err), "min_margin");
    }

    #[test]
    fn null_counts_as_absent() {
        let err = validate(&shape(), &json!({"min_margin": null})).unwrap_err();
        assert_eq!(field_of(err), "min_margin");

        let args = validate(&shape(), &json!({"min_margin": 1, "country": null})).unwrap();
        assert_eq!(args.str("country"), None);
    }

    #[test]
    fn rejects_wrong_types() {
        assert_eq!(
            field_of(validate(&shape(), &json!({"min_margin": "lots"})).unwrap_err()),
            "min_margin"
        );
        assert_eq!(
            field_of(validate(&shape(), &json!({"min_margin": 1, "top_n": 2.5})).unwrap_err()),
            "top_n"
        );
        assert_eq!(
            field_of(validate(&shape(), &json!({"min_margin": 1, "country": {"a": 1}})).unwrap_err()),
            "country"
        );
    }

    #[test]
    fn enforces_range_and_enum() {
        assert_eq!(
            field_of(validate(&shape(), &json!({"min_margin": 150})).unwrap_err()),
            "min_margin"
        );
        assert_eq!(
            field_of(
                validate(&shape(), &json!({"min_margin": 1, "products": ["tea", "gold"]})).unwrap_err()
            ),
            "products[1]"
        );
    }

    #[test]
    fn non_object_arguments() {
        assert_eq!(field_of(validate(&shape(), &json!([1, 2])).unwrap_err()), "arguments");
        assert!(validate(&InputShape::empty(), &Value::Null).unwrap().is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let args = validate(&shape(), &json!({"min_margin": 10, "colour": "blue"})).unwrap();
        assert_eq!(args.str("colour"), None);
    }
}
