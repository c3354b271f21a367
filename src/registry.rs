//! Logic related to holding a collection of schemas together.
//!
//! A [`Registry`] is the pool of schemas that `$ref` resolution draws
//! from. Registering a root schema walks its raw source JSON, composes
//! every nested `$id` against the current base namespace, and inserts
//! each id-bearing subtree under its fully qualified key. External
//! documents are registered the same way by the caller; this crate
//! never fetches anything over the network.

use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

use crate::errors::JsvError;
use crate::pointer::{self, Reference};
use crate::schema::Schema;

/// Holds a collection of schemas keyed by fully qualified id.
#[derive(Debug, Default)]
pub struct Registry {
    schemas: HashMap<String, Schema>,
}

impl Registry {
    /// Construct a new, empty registry.
    pub fn new() -> Registry {
        Registry {
            schemas: HashMap::new(),
        }
    }

    /// Add a root schema to the registry and return its namespace.
    ///
    /// The schema itself is inserted under its `$id` (or the empty
    /// namespace when anonymous), and every `$id`-bearing subtree of
    /// its source JSON is decoded and inserted under the composed id.
    /// Registering a second document with the same id replaces the
    /// first.
    ///
    /// ```
    /// use jsv::{Registry, Schema};
    /// use serde_json::json;
    ///
    /// fn main() -> Result<(), jsv::JsvError> {
    ///     let schema = Schema::from_value(&json!({
    ///         "$id": "http://example.com/list",
    ///         "definitions": {
    ///             "entry": {
    ///                 "$id": "entry.json",
    ///                 "type": "string"
    ///             }
    ///         }
    ///     }))?;
    ///
    ///     let mut registry = Registry::new();
    ///     let ns = registry.register(schema)?;
    ///     assert_eq!(ns, "http://example.com/list");
    ///     assert!(registry.get("http://example.com/entry.json").is_some());
    ///     Ok(())
    /// }
    /// ```
    pub fn register(&mut self, schema: Schema) -> Result<String, JsvError> {
        let namespace = schema
            .id()
            .map(|id| pointer::compose("", id))
            .unwrap_or_default();
        if let Some(source) = schema.source() {
            let source = Value::Object(source.clone());
            self.collect(&namespace, &source, true)?;
        }
        log::debug!("registered schema under namespace {namespace:?}");
        self.schemas.insert(namespace.clone(), schema);
        Ok(namespace)
    }

    /// Gets the schema with the given fully qualified key, if any.
    pub fn get(&self, key: &str) -> Option<&Schema> {
        self.schemas.get(key)
    }

    /// Resolve a reference against a base namespace.
    ///
    /// Returns the referent's namespace together with the referent: a
    /// borrow when the pool has the canonical key, or a freshly decoded
    /// schema when the reference had to be navigated by pointer.
    pub fn resolve(&self, ns: &str, reference: &str) -> Result<(String, Cow<Schema>), JsvError> {
        self.resolve_in(ns, reference, None)
    }

    /// Resolution with a fallback root for documents that were never
    /// registered: validation may be handed a schema directly.
    pub(crate) fn resolve_in<'s>(
        &'s self,
        ns: &str,
        reference: &str,
        fallback: Option<(&str, &'s Schema)>,
    ) -> Result<(String, Cow<'s, Schema>), JsvError> {
        let parsed = Reference::parse(ns, reference);
        if let Some(hit) = self.schemas.get(&parsed.key()) {
            return Ok((parsed.namespace, Cow::Borrowed(hit)));
        }

        let base = match self.schemas.get(&parsed.namespace) {
            Some(base) => base,
            None => match fallback {
                Some((root_ns, root)) if root_ns == parsed.namespace => root,
                _ => {
                    log::debug!(
                        "no document for namespace {:?} while resolving {reference:?}",
                        parsed.namespace
                    );
                    return Err(JsvError::NoSuchSchema {
                        namespace: parsed.namespace,
                    });
                }
            },
        };

        if parsed.path.is_empty() {
            return Ok((parsed.namespace, Cow::Borrowed(base)));
        }

        let mut current: Option<&Value> = None;
        for token in &parsed.path {
            let next = match current {
                None => base.source().and_then(|map| map.get(token)),
                Some(Value::Object(map)) => map.get(token),
                Some(Value::Array(items)) => {
                    token.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                Some(_) => None,
            };
            current = Some(next.ok_or_else(|| JsvError::UnresolvableReference {
                reference: reference.to_owned(),
            })?);
        }
        match current {
            Some(value) => {
                let schema = Schema::from_value(value)?;
                Ok((parsed.namespace, Cow::Owned(schema)))
            }
            None => Ok((parsed.namespace, Cow::Borrowed(base))),
        }
    }

    /// The id collector: walk raw schema JSON, tracking the base
    /// namespace, and pool every subtree that declares an id. The walk
    /// visits each node once; the input is a tree, so it terminates.
    fn collect(&mut self, ns: &str, value: &Value, is_root: bool) -> Result<(), JsvError> {
        match value {
            Value::Object(map) => {
                let mut ns = Cow::Borrowed(ns);
                let id = match map.get("$id").or_else(|| map.get("id")) {
                    Some(Value::String(id)) => Some(id),
                    _ => None,
                };
                if let Some(id) = id {
                    ns = Cow::Owned(pointer::compose(&ns, id));
                    if !is_root {
                        let schema = Schema::from_value(value)?;
                        log::debug!("collected subschema id {:?}", ns.as_ref());
                        self.schemas.insert(ns.clone().into_owned(), schema);
                    }
                }
                for child in map.values() {
                    self.collect(&ns, child, false)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.collect(ns, item, false)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_pools_nested_ids() {
        let mut registry = Registry::new();
        let ns = registry
            .register(
                Schema::from_value(&json!({
                    "$id": "http://example.com/foo",
                    "definitions": {
                        "a": { "$id": "/bar", "type": "string" },
                        "b": { "$id": "http://other.example.com/baz" },
                        "c": { "type": "integer" }
                    }
                }))
                .unwrap(),
            )
            .unwrap();

        assert_eq!(ns, "http://example.com/foo");
        assert!(registry.get("http://example.com/foo").is_some());
        assert!(registry.get("http://example.com/bar").is_some());
        assert!(registry.get("http://other.example.com/baz").is_some());
        assert!(registry.get("http://example.com/c").is_none());
    }

    #[test]
    fn nested_ids_compose_against_the_enclosing_id() {
        let mut registry = Registry::new();
        registry
            .register(
                Schema::from_value(&json!({
                    "$id": "http://example.com/a/root.json",
                    "definitions": {
                        "inner": {
                            "$id": "folder/",
                            "definitions": {
                                "leaf": { "$id": "leaf.json" }
                            }
                        }
                    }
                }))
                .unwrap(),
            )
            .unwrap();

        assert!(registry.get("http://example.com/a/folder/").is_some());
        assert!(registry.get("http://example.com/a/folder/leaf.json").is_some());
    }

    #[test]
    fn resolve_finds_pool_entries_and_pointers() {
        let mut registry = Registry::new();
        registry
            .register(
                Schema::from_value(&json!({
                    "$id": "http://example.com/root",
                    "definitions": {
                        "named": { "$id": "named.json", "type": "boolean" },
                        "local": { "type": "string" }
                    }
                }))
                .unwrap(),
            )
            .unwrap();

        // pool hit through a relative uri
        let (ns, schema) = registry
            .resolve("http://example.com/root", "named.json")
            .unwrap();
        assert_eq!(ns, "http://example.com/named.json");
        assert!(schema.as_object().is_some());

        // pointer navigation through the document source
        let (_, schema) = registry
            .resolve("http://example.com/root", "#/definitions/local")
            .unwrap();
        assert_eq!(
            schema.as_object().unwrap().type_,
            crate::schema::Type::Single(crate::schema::Primitive::String)
        );

        assert_eq!(
            registry.resolve("http://example.com/root", "#/definitions/missing"),
            Err(JsvError::UnresolvableReference {
                reference: "#/definitions/missing".to_owned(),
            })
        );
        assert!(matches!(
            registry.resolve("http://example.com/root", "http://nowhere.example.com"),
            Err(JsvError::NoSuchSchema { .. })
        ));
    }

    #[test]
    fn anonymous_roots_live_under_the_empty_namespace() {
        let mut registry = Registry::new();
        let ns = registry
            .register(Schema::from_value(&json!({ "type": "object" })).unwrap())
            .unwrap();
        assert_eq!(ns, "");
        assert!(registry.get("").is_some());

        let (_, schema) = registry.resolve("", "#").unwrap();
        assert!(schema.as_object().is_some());
    }
}
