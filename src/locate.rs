//! Schema-guided value location and placement.
//!
//! These helpers answer "which subschema governs this spot in the
//! data?" and use the answer to write values into an instance. A
//! pointer is walked token by token through `properties`,
//! `patternProperties`, `additionalProperties` and `items`, resolving
//! `$ref` along the way; when a step lands on an `anyOf`/`oneOf`, the
//! first branch whose `type` admits the provided value is taken.
//!
//! [`set_value`] additionally creates the intermediate containers a
//! pointer implies: objects for named tokens, arrays where the schema
//! routes a numeric token through `items`.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::errors::JsvError;
use crate::pointer::{self, Reference};
use crate::registry::Registry;
use crate::schema::{Items, Schema};

/// Returns the subschema governing `pointer`, after `$ref` resolution
/// and combinator branch selection against `value`'s kind.
pub fn subschema_at(
    registry: &Registry,
    root: &Schema,
    pointer: &str,
    value: &Value,
) -> Result<Schema, JsvError> {
    let locator = Locator::new(registry, root);
    let mut ns = locator.root_ns.clone();
    let mut schema = root.clone();
    for token in pointer::tokens(pointer) {
        let step = locator.child(&ns, &schema, &token, value, pointer)?;
        ns = step.ns;
        schema = step.schema;
    }
    let (_, resolved) = locator.resolve(&ns, &schema, value)?;
    Ok(resolved)
}

/// Writes `value` at `pointer` inside `target`, creating intermediate
/// objects and arrays as the schema dictates.
pub fn set_value(
    registry: &Registry,
    root: &Schema,
    target: &mut Value,
    pointer: &str,
    value: Value,
) -> Result<(), JsvError> {
    let locator = Locator::new(registry, root);
    let mut ns = locator.root_ns.clone();
    let mut schema = root.clone();
    let mut node = target;

    for token in pointer::tokens(pointer) {
        let step = locator.child(&ns, &schema, &token, &value, pointer)?;

        if !matches!(node, Value::Object(_) | Value::Array(_)) {
            *node = if step.in_array {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        }
        node = match node {
            Value::Object(map) => map.entry(token.clone()).or_insert(Value::Null),
            Value::Array(items) => {
                let index = token.parse::<usize>().map_err(|_| JsvError::NoSubschema {
                    pointer: pointer.to_owned(),
                })?;
                while items.len() <= index {
                    items.push(Value::Null);
                }
                &mut items[index]
            }
            _ => {
                return Err(JsvError::NoSubschema {
                    pointer: pointer.to_owned(),
                })
            }
        };

        ns = step.ns;
        schema = step.schema;
    }

    *node = value;
    Ok(())
}

struct Step {
    ns: String,
    schema: Schema,
    /// Whether the token was routed through `items`, meaning the
    /// container to create at this step is an array.
    in_array: bool,
}

struct Locator<'a> {
    registry: &'a Registry,
    root: &'a Schema,
    root_ns: String,
}

impl<'a> Locator<'a> {
    fn new(registry: &'a Registry, root: &'a Schema) -> Locator<'a> {
        Locator {
            registry,
            root,
            root_ns: root
                .id()
                .map(|id| pointer::compose("", id))
                .unwrap_or_default(),
        }
    }

    /// Chases `$ref` chains and picks the first `anyOf`/`oneOf` branch
    /// whose type admits the value.
    fn resolve(&self, ns: &str, schema: &Schema, value: &Value) -> Result<(String, Schema), JsvError> {
        let mut ns = ns.to_owned();
        let mut current = schema.clone();
        let mut visited: HashSet<String> = HashSet::new();

        while let Some(target) = current.as_object().and_then(|sub| sub.ref_.clone()) {
            if !visited.insert(Reference::parse(&ns, &target).key()) {
                return Err(JsvError::UnresolvableReference { reference: target });
            }
            let (next_ns, next) =
                self.registry
                    .resolve_in(&ns, &target, Some((&self.root_ns, self.root)))?;
            ns = next_ns;
            current = next.into_owned();
        }

        if let Some(sub) = current.as_object() {
            if let Some(branches) = sub.any_of.as_ref().or(sub.one_of.as_ref()) {
                for branch in branches {
                    let (branch_ns, branch) = self.resolve(&ns, branch, value)?;
                    let admits = branch
                        .as_object()
                        .map_or(true, |sub| sub.type_.admits(value));
                    if admits {
                        return Ok((branch_ns, branch));
                    }
                }
            }
        }

        Ok((ns, current))
    }

    fn child(
        &self,
        ns: &str,
        schema: &Schema,
        token: &str,
        value: &Value,
        pointer: &str,
    ) -> Result<Step, JsvError> {
        let (ns, resolved) = self.resolve(ns, schema, value)?;
        let numeric = token.parse::<usize>().ok();

        let sub = match resolved.as_object() {
            Some(sub) => sub,
            // boolean schemas constrain nothing; the token decides
            None => {
                return Ok(Step {
                    ns,
                    schema: Schema::Boolean(true),
                    in_array: numeric.is_some(),
                })
            }
        };

        if let Some(properties) = &sub.properties {
            if let Some(child) = properties.get(token) {
                return Ok(Step {
                    ns,
                    schema: child.clone(),
                    in_array: false,
                });
            }
        }
        if let Some(patterns) = &sub.pattern_properties {
            for (pattern, child) in patterns {
                if Regex::new(pattern).map_or(false, |regex| regex.is_match(token)) {
                    return Ok(Step {
                        ns,
                        schema: child.clone(),
                        in_array: false,
                    });
                }
            }
        }
        if let Some(index) = numeric {
            match &sub.items {
                Items::Single(child) => {
                    return Ok(Step {
                        ns,
                        schema: child.clone(),
                        in_array: true,
                    })
                }
                Items::Tuple(schemas) => {
                    if let Some(child) = schemas.get(index) {
                        return Ok(Step {
                            ns,
                            schema: child.clone(),
                            in_array: true,
                        });
                    }
                    match &sub.additional_items {
                        Some(Schema::Boolean(false)) | None => {}
                        Some(child) => {
                            return Ok(Step {
                                ns,
                                schema: child.clone(),
                                in_array: true,
                            })
                        }
                    }
                }
                Items::None => {}
            }
        }
        match &sub.additional_properties {
            Some(Schema::Boolean(false)) => Err(JsvError::NoSubschema {
                pointer: pointer.to_owned(),
            }),
            Some(child) => Ok(Step {
                ns,
                schema: child.clone(),
                in_array: false,
            }),
            // nothing names this token; treat it as unconstrained
            None => Ok(Step {
                ns,
                schema: Schema::Boolean(true),
                in_array: numeric.is_some() && matches!(sub.items, Items::Single(_) | Items::Tuple(_)),
            }),
        }
    }
}
