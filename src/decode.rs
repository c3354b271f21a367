//! Decoding JSON into the checked schema model.
//!
//! Decoding enforces the structural preconditions of every keyword
//! (known type names, non-negative counts, non-empty enums, compilable
//! patterns) and reports the first violation with a pointer-like path
//! into the schema document.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::JsvError;
use crate::schema::{structural_eq, Boundary, Dependency, Items, Primitive, Schema, SubSchema, Type};

impl Schema {
    /// Decodes a JSON value into a schema.
    ///
    /// Booleans decode to the two boolean schemas, objects to a keyword
    /// record; anything else is structurally invalid. Unknown keywords
    /// are retained in [`SubSchema::source`] but get no typed field.
    pub fn from_value(value: &Value) -> Result<Schema, JsvError> {
        decode_schema(value, "")
    }
}

fn decode_schema(value: &Value, path: &str) -> Result<Schema, JsvError> {
    match value {
        Value::Bool(b) => Ok(Schema::Boolean(*b)),
        Value::Object(map) => Ok(Schema::Object(Box::new(decode_subschema(map, path)?))),
        _ => Err(invalid(path, "a schema must be an object or a boolean")),
    }
}

fn decode_subschema(map: &Map<String, Value>, path: &str) -> Result<SubSchema, JsvError> {
    let mut sub = SubSchema {
        source: map.clone(),
        ..SubSchema::default()
    };

    // `$id` takes precedence over the legacy `id` spelling.
    for key in ["$id", "id"] {
        if sub.id.is_none() {
            if let Some(value) = map.get(key) {
                sub.id = Some(expect_string(value, &child(path, key))?);
            }
        }
    }
    if let Some(value) = map.get("$ref") {
        sub.ref_ = Some(expect_string(value, &child(path, "$ref"))?);
    }

    if let Some(value) = map.get("title") {
        sub.title = Some(expect_string(value, &child(path, "title"))?);
    }
    if let Some(value) = map.get("description") {
        sub.description = Some(expect_string(value, &child(path, "description"))?);
    }
    sub.default = map.get("default").cloned();
    if let Some(value) = map.get("examples") {
        match value {
            Value::Array(values) => sub.examples = Some(values.clone()),
            _ => return Err(invalid(&child(path, "examples"), "examples must be an array")),
        }
    }
    if let Some(value) = map.get("definitions") {
        sub.definitions = Some(decode_schema_map(value, &child(path, "definitions"))?);
    }

    if let Some(value) = map.get("type") {
        sub.type_ = decode_type(value, &child(path, "type"))?;
    }
    if let Some(value) = map.get("enum") {
        sub.enum_ = Some(decode_enum(value, &child(path, "enum"))?);
    }
    sub.const_ = map.get("const").cloned();

    if let Some(value) = map.get("multipleOf") {
        let factor = expect_number(value, &child(path, "multipleOf"))?;
        if factor <= 0.0 {
            return Err(invalid(
                &child(path, "multipleOf"),
                "multipleOf must be strictly positive",
            ));
        }
        sub.multiple_of = Some(factor);
    }
    if let Some(value) = map.get("maximum") {
        sub.maximum = Some(expect_number(value, &child(path, "maximum"))?);
    }
    if let Some(value) = map.get("minimum") {
        sub.minimum = Some(expect_number(value, &child(path, "minimum"))?);
    }
    if let Some(value) = map.get("exclusiveMaximum") {
        sub.exclusive_maximum = Some(decode_boundary(value, &child(path, "exclusiveMaximum"))?);
    }
    if let Some(value) = map.get("exclusiveMinimum") {
        sub.exclusive_minimum = Some(decode_boundary(value, &child(path, "exclusiveMinimum"))?);
    }

    if let Some(value) = map.get("maxLength") {
        sub.max_length = Some(expect_count(value, &child(path, "maxLength"), "maxLength")?);
    }
    if let Some(value) = map.get("minLength") {
        sub.min_length = Some(expect_count(value, &child(path, "minLength"), "minLength")?);
    }
    if let Some(value) = map.get("pattern") {
        let pattern = expect_string(value, &child(path, "pattern"))?;
        check_pattern(&pattern, &child(path, "pattern"))?;
        sub.pattern = Some(pattern);
    }
    if let Some(value) = map.get("format") {
        sub.format = Some(expect_string(value, &child(path, "format"))?);
    }

    if let Some(value) = map.get("items") {
        sub.items = decode_items(value, &child(path, "items"))?;
    }
    if let Some(value) = map.get("additionalItems") {
        sub.additional_items = Some(decode_schema(value, &child(path, "additionalItems"))?);
    }
    if let Some(value) = map.get("maxItems") {
        sub.max_items = Some(expect_count(value, &child(path, "maxItems"), "maxItems")?);
    }
    if let Some(value) = map.get("minItems") {
        sub.min_items = Some(expect_count(value, &child(path, "minItems"), "minItems")?);
    }
    if let Some(value) = map.get("uniqueItems") {
        match value {
            Value::Bool(b) => sub.unique_items = Some(*b),
            _ => {
                return Err(invalid(
                    &child(path, "uniqueItems"),
                    "uniqueItems must be a boolean",
                ))
            }
        }
    }
    if let Some(value) = map.get("contains") {
        sub.contains = Some(decode_schema(value, &child(path, "contains"))?);
    }

    if let Some(value) = map.get("maxProperties") {
        sub.max_properties = Some(expect_count(value, &child(path, "maxProperties"), "maxProperties")?);
    }
    if let Some(value) = map.get("minProperties") {
        sub.min_properties = Some(expect_count(value, &child(path, "minProperties"), "minProperties")?);
    }
    if let Some(value) = map.get("required") {
        sub.required = Some(decode_names(value, &child(path, "required"))?);
    }
    if let Some(value) = map.get("properties") {
        sub.properties = Some(decode_schema_map(value, &child(path, "properties"))?);
    }
    if let Some(value) = map.get("patternProperties") {
        let patterns = decode_schema_map(value, &child(path, "patternProperties"))?;
        for pattern in patterns.keys() {
            check_pattern(pattern, &child(path, "patternProperties"))?;
        }
        sub.pattern_properties = Some(patterns);
    }
    if let Some(value) = map.get("additionalProperties") {
        sub.additional_properties =
            Some(decode_schema(value, &child(path, "additionalProperties"))?);
    }
    if let Some(value) = map.get("dependencies") {
        sub.dependencies = Some(decode_dependencies(value, &child(path, "dependencies"))?);
    }
    if let Some(value) = map.get("propertyNames") {
        sub.property_names = Some(decode_schema(value, &child(path, "propertyNames"))?);
    }

    if let Some(value) = map.get("allOf") {
        sub.all_of = Some(decode_schema_list(value, &child(path, "allOf"), "allOf")?);
    }
    if let Some(value) = map.get("anyOf") {
        sub.any_of = Some(decode_schema_list(value, &child(path, "anyOf"), "anyOf")?);
    }
    if let Some(value) = map.get("oneOf") {
        sub.one_of = Some(decode_schema_list(value, &child(path, "oneOf"), "oneOf")?);
    }
    if let Some(value) = map.get("not") {
        sub.not = Some(decode_schema(value, &child(path, "not"))?);
    }

    Ok(sub)
}

fn decode_type(value: &Value, path: &str) -> Result<Type, JsvError> {
    match value {
        Value::String(name) => match Primitive::from_name(name) {
            Some(primitive) => Ok(Type::Single(primitive)),
            None => Err(JsvError::UnknownType {
                path: path.to_owned(),
                name: name.clone(),
            }),
        },
        Value::Array(names) => {
            let mut primitives = Vec::with_capacity(names.len());
            for name in names {
                let name = expect_string(name, path)?;
                match Primitive::from_name(&name) {
                    Some(primitive) => primitives.push(primitive),
                    None => {
                        return Err(JsvError::UnknownType {
                            path: path.to_owned(),
                            name,
                        })
                    }
                }
            }
            primitives.sort();
            primitives.dedup();
            match primitives.as_slice() {
                [] => Err(invalid(path, "type array must not be empty")),
                [single] => Ok(Type::Single(*single)),
                [Primitive::Null, other] => Ok(Type::Nullable(*other)),
                _ => Ok(Type::Union(primitives)),
            }
        }
        _ => Err(invalid(path, "type must be a string or an array of strings")),
    }
}

fn decode_enum(value: &Value, path: &str) -> Result<Vec<Value>, JsvError> {
    let members = match value {
        Value::Array(members) => members,
        _ => return Err(invalid(path, "enum must be an array")),
    };
    if members.is_empty() {
        return Err(JsvError::InvalidEnum {
            path: path.to_owned(),
        });
    }
    for (i, member) in members.iter().enumerate() {
        if members[..i].iter().any(|seen| structural_eq(seen, member)) {
            return Err(JsvError::InvalidEnum {
                path: path.to_owned(),
            });
        }
    }
    Ok(members.clone())
}

fn decode_items(value: &Value, path: &str) -> Result<Items, JsvError> {
    match value {
        Value::Array(schemas) => {
            let mut decoded = Vec::with_capacity(schemas.len());
            for (index, schema) in schemas.iter().enumerate() {
                decoded.push(decode_schema(schema, &child(path, &index.to_string()))?);
            }
            Ok(Items::Tuple(decoded))
        }
        _ => Ok(Items::Single(decode_schema(value, path)?)),
    }
}

fn decode_boundary(value: &Value, path: &str) -> Result<Boundary, JsvError> {
    match value {
        Value::Bool(b) => Ok(Boundary::Bool(*b)),
        Value::Number(_) => Ok(Boundary::Number(expect_number(value, path)?)),
        _ => Err(invalid(path, "exclusive bounds must be a boolean or a number")),
    }
}

fn decode_dependencies(value: &Value, path: &str) -> Result<IndexMap<String, Dependency>, JsvError> {
    let map = match value {
        Value::Object(map) => map,
        _ => return Err(invalid(path, "dependencies must be an object")),
    };
    let mut dependencies = IndexMap::with_capacity(map.len());
    for (name, dependency) in map {
        let dependency = match dependency {
            Value::Array(_) => Dependency::Properties(decode_names(dependency, &child(path, name))?),
            _ => Dependency::Schema(decode_schema(dependency, &child(path, name))?),
        };
        dependencies.insert(name.clone(), dependency);
    }
    Ok(dependencies)
}

fn decode_names(value: &Value, path: &str) -> Result<Vec<String>, JsvError> {
    let names = match value {
        Value::Array(names) => names,
        _ => return Err(invalid(path, "expected an array of property names")),
    };
    names
        .iter()
        .map(|name| expect_string(name, path))
        .collect()
}

fn decode_schema_map(value: &Value, path: &str) -> Result<IndexMap<String, Schema>, JsvError> {
    let map = match value {
        Value::Object(map) => map,
        _ => return Err(invalid(path, "expected an object of schemas")),
    };
    let mut schemas = IndexMap::with_capacity(map.len());
    for (name, schema) in map {
        schemas.insert(name.clone(), decode_schema(schema, &child(path, name))?);
    }
    Ok(schemas)
}

fn decode_schema_list(
    value: &Value,
    path: &str,
    keyword: &'static str,
) -> Result<Vec<Schema>, JsvError> {
    let schemas = match value {
        Value::Array(schemas) => schemas,
        _ => return Err(invalid(path, "expected an array of schemas")),
    };
    if schemas.is_empty() {
        return Err(JsvError::EmptyArray {
            path: path.to_owned(),
            keyword,
        });
    }
    schemas
        .iter()
        .enumerate()
        .map(|(index, schema)| decode_schema(schema, &child(path, &index.to_string())))
        .collect()
}

fn check_pattern(pattern: &str, path: &str) -> Result<(), JsvError> {
    match Regex::new(pattern) {
        Ok(_) => Ok(()),
        Err(_) => Err(JsvError::BadPattern {
            path: path.to_owned(),
            pattern: pattern.to_owned(),
        }),
    }
}

fn expect_string(value: &Value, path: &str) -> Result<String, JsvError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(invalid(path, "expected a string")),
    }
}

fn expect_number(value: &Value, path: &str) -> Result<f64, JsvError> {
    value
        .as_f64()
        .ok_or_else(|| invalid(path, "expected a number"))
}

fn expect_count(value: &Value, path: &str, keyword: &'static str) -> Result<u64, JsvError> {
    let number = match value {
        Value::Number(number) => number,
        _ => return Err(invalid(path, "expected a non-negative integer")),
    };
    if let Some(count) = number.as_u64() {
        return Ok(count);
    }
    if number.as_f64().map_or(false, |f| f >= 0.0 && f.fract() == 0.0) {
        return Ok(number.as_f64().map_or(0, |f| f as u64));
    }
    if number.as_f64().map_or(false, |f| f < 0.0) {
        return Err(JsvError::NegativeCount {
            path: path.to_owned(),
            keyword,
        });
    }
    Err(invalid(path, "expected a non-negative integer"))
}

fn child(path: &str, key: &str) -> String {
    format!("{}/{}", path, key)
}

fn invalid(path: &str, detail: &str) -> JsvError {
    JsvError::StructurallyInvalid {
        path: path.to_owned(),
        detail: detail.to_owned(),
    }
}
