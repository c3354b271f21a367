//! Re-encoding a schema to JSON.
//!
//! Encoding starts from the retained [`SubSchema::source`] object and
//! overwrites the typed keywords with their current values, so unknown
//! keywords survive untouched and programmatic changes to typed fields
//! take effect. Overwriting an existing key keeps its position, which
//! is what makes a decode/encode round trip preserve key order.

use serde_json::{Map, Number, Value};

use crate::schema::{Boundary, Dependency, Items, Schema, SubSchema, Type};

impl Schema {
    /// Encodes this schema back to a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Schema::Boolean(b) => Value::Bool(*b),
            Schema::Object(sub) => Value::Object(encode_subschema(sub)),
        }
    }
}

fn encode_subschema(sub: &SubSchema) -> Map<String, Value> {
    let mut out = sub.source.clone();

    if let Some(id) = &sub.id {
        // Write back to whichever spelling the source used.
        let key = if !out.contains_key("$id") && out.contains_key("id") {
            "id"
        } else {
            "$id"
        };
        out.insert(key.to_owned(), Value::String(id.clone()));
    }
    if let Some(reference) = &sub.ref_ {
        out.insert("$ref".to_owned(), Value::String(reference.clone()));
    }

    if let Some(title) = &sub.title {
        out.insert("title".to_owned(), Value::String(title.clone()));
    }
    if let Some(description) = &sub.description {
        out.insert("description".to_owned(), Value::String(description.clone()));
    }
    if let Some(default) = &sub.default {
        out.insert("default".to_owned(), default.clone());
    }
    if let Some(examples) = &sub.examples {
        out.insert("examples".to_owned(), Value::Array(examples.clone()));
    }
    if let Some(definitions) = &sub.definitions {
        out.insert("definitions".to_owned(), encode_schema_map(definitions));
    }

    if let Some(type_) = encode_type(&sub.type_) {
        out.insert("type".to_owned(), type_);
    }
    if let Some(members) = &sub.enum_ {
        out.insert("enum".to_owned(), Value::Array(members.clone()));
    }
    if let Some(value) = &sub.const_ {
        out.insert("const".to_owned(), value.clone());
    }

    if let Some(factor) = sub.multiple_of {
        out.insert("multipleOf".to_owned(), number(factor));
    }
    if let Some(limit) = sub.maximum {
        out.insert("maximum".to_owned(), number(limit));
    }
    if let Some(limit) = sub.minimum {
        out.insert("minimum".to_owned(), number(limit));
    }
    if let Some(boundary) = sub.exclusive_maximum {
        out.insert("exclusiveMaximum".to_owned(), encode_boundary(boundary));
    }
    if let Some(boundary) = sub.exclusive_minimum {
        out.insert("exclusiveMinimum".to_owned(), encode_boundary(boundary));
    }

    if let Some(limit) = sub.max_length {
        out.insert("maxLength".to_owned(), Value::Number(limit.into()));
    }
    if let Some(limit) = sub.min_length {
        out.insert("minLength".to_owned(), Value::Number(limit.into()));
    }
    if let Some(pattern) = &sub.pattern {
        out.insert("pattern".to_owned(), Value::String(pattern.clone()));
    }
    if let Some(format) = &sub.format {
        out.insert("format".to_owned(), Value::String(format.clone()));
    }

    match &sub.items {
        Items::None => {}
        Items::Single(schema) => {
            out.insert("items".to_owned(), schema.to_value());
        }
        Items::Tuple(schemas) => {
            out.insert(
                "items".to_owned(),
                Value::Array(schemas.iter().map(Schema::to_value).collect()),
            );
        }
    }
    if let Some(schema) = &sub.additional_items {
        out.insert("additionalItems".to_owned(), schema.to_value());
    }
    if let Some(limit) = sub.max_items {
        out.insert("maxItems".to_owned(), Value::Number(limit.into()));
    }
    if let Some(limit) = sub.min_items {
        out.insert("minItems".to_owned(), Value::Number(limit.into()));
    }
    if let Some(unique) = sub.unique_items {
        out.insert("uniqueItems".to_owned(), Value::Bool(unique));
    }
    if let Some(schema) = &sub.contains {
        out.insert("contains".to_owned(), schema.to_value());
    }

    if let Some(limit) = sub.max_properties {
        out.insert("maxProperties".to_owned(), Value::Number(limit.into()));
    }
    if let Some(limit) = sub.min_properties {
        out.insert("minProperties".to_owned(), Value::Number(limit.into()));
    }
    if let Some(names) = &sub.required {
        out.insert(
            "required".to_owned(),
            Value::Array(names.iter().cloned().map(Value::String).collect()),
        );
    }
    if let Some(properties) = &sub.properties {
        out.insert("properties".to_owned(), encode_schema_map(properties));
    }
    if let Some(patterns) = &sub.pattern_properties {
        out.insert("patternProperties".to_owned(), encode_schema_map(patterns));
    }
    if let Some(schema) = &sub.additional_properties {
        out.insert("additionalProperties".to_owned(), schema.to_value());
    }
    if let Some(dependencies) = &sub.dependencies {
        let mut encoded = Map::new();
        for (name, dependency) in dependencies {
            let value = match dependency {
                Dependency::Schema(schema) => schema.to_value(),
                Dependency::Properties(names) => {
                    Value::Array(names.iter().cloned().map(Value::String).collect())
                }
            };
            encoded.insert(name.clone(), value);
        }
        out.insert("dependencies".to_owned(), Value::Object(encoded));
    }
    if let Some(schema) = &sub.property_names {
        out.insert("propertyNames".to_owned(), schema.to_value());
    }

    if let Some(schemas) = &sub.all_of {
        out.insert("allOf".to_owned(), encode_schema_list(schemas));
    }
    if let Some(schemas) = &sub.any_of {
        out.insert("anyOf".to_owned(), encode_schema_list(schemas));
    }
    if let Some(schemas) = &sub.one_of {
        out.insert("oneOf".to_owned(), encode_schema_list(schemas));
    }
    if let Some(schema) = &sub.not {
        out.insert("not".to_owned(), schema.to_value());
    }

    out
}

fn encode_type(type_: &Type) -> Option<Value> {
    let names = |primitives: &[crate::schema::Primitive]| {
        Value::Array(
            primitives
                .iter()
                .map(|p| Value::String(p.to_string()))
                .collect(),
        )
    };
    match type_ {
        Type::Any => None,
        Type::Single(primitive) => Some(Value::String(primitive.to_string())),
        Type::Nullable(primitive) => Some(names(&[*primitive, crate::schema::Primitive::Null])),
        Type::Union(primitives) => Some(names(primitives)),
    }
}

fn encode_boundary(boundary: Boundary) -> Value {
    match boundary {
        Boundary::Bool(b) => Value::Bool(b),
        Boundary::Number(n) => number(n),
    }
}

fn encode_schema_map(schemas: &indexmap::IndexMap<String, Schema>) -> Value {
    let mut out = Map::new();
    for (name, schema) in schemas {
        out.insert(name.clone(), schema.to_value());
    }
    Value::Object(out)
}

fn encode_schema_list(schemas: &[Schema]) -> Value {
    Value::Array(schemas.iter().map(Schema::to_value).collect())
}

/// Integral floats encode as JSON integers so `{"maximum": 5}` round
/// trips without growing a `.0`.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(value as i64));
    }
    match Number::from_f64(value) {
        Some(number) => Value::Number(number),
        None => Value::Null,
    }
}
