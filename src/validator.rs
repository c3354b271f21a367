//! Validate input data against schemas.
//!
//! This module contains the public face of *validation*, the process of
//! taking a piece of input data (called an "instance") and checking if
//! it's valid according to a schema.
//!
//! See the docs for [`Validator`](struct.Validator.html) for more.

use json_pointer::JsonPointer;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use crate::format;
use crate::registry::Registry;
use crate::schema::{Primitive, Schema, Type};
use crate::vm;

/// Validates instances against schemas drawn from a registry.
pub struct Validator<'a> {
    registry: &'a Registry,
    config: Config,
}

impl<'a> Validator<'a> {
    /// Constructs a new validator using the default configuration.
    pub fn new(registry: &'a Registry) -> Self {
        Self::new_with_config(registry, Config::default())
    }

    /// Constructs a new validator using a configuration.
    pub fn new_with_config(registry: &'a Registry, config: Config) -> Self {
        Self { registry, config }
    }

    /// Validate an instance against a schema.
    ///
    /// On success the instance comes back unchanged: borrowed, unless
    /// [`apply_defaults`](struct.Config.html#method.apply_defaults)
    /// filled missing properties, in which case the filled copy is
    /// returned. On failure the full, ordered list of validation
    /// errors is returned; validation never stops at the first
    /// problem.
    ///
    /// Despite their name, the errors are not Rust errors: an
    /// unresolvable reference or an exceeded recursion limit is
    /// reported in the same list as any other failed keyword.
    pub fn validate<'v>(
        &self,
        schema: &'v Schema,
        instance: &'v Value,
    ) -> Result<Cow<'v, Value>, Vec<ValidationError>> {
        vm::validate(&self.config, self.registry, schema, schema, instance)
    }

    /// Validate an instance against one subschema of a root document.
    ///
    /// References inside the subschema resolve the way they would
    /// during a full validation of `root`: same-document fragments
    /// navigate the root's source, and the root's `$id` is the base
    /// namespace.
    pub fn validate_sub<'v>(
        &self,
        root: &'v Schema,
        schema: &Schema,
        instance: &'v Value,
    ) -> Result<Cow<'v, Value>, Vec<ValidationError>> {
        vm::validate(&self.config, self.registry, root, schema, instance)
    }
}

/// Configuration for how validation should proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) apply_defaults: bool,
    pub(crate) ignore_ref_siblings: bool,
    pub(crate) enabled_formats: HashSet<String>,
    pub(crate) max_depth: usize,
}

impl Config {
    /// Create a new, default `Config`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether missing object properties whose schema supplies a
    /// `default` are filled into the validated copy. The default is
    /// not to fill; filled values are not themselves re-validated.
    pub fn apply_defaults(&mut self, apply_defaults: bool) -> &mut Self {
        self.apply_defaults = apply_defaults;
        self
    }

    /// Sets whether keywords sibling to a `$ref` are ignored. Draft-6
    /// says they are, and that is the default; turning this off makes
    /// siblings combine with the referent.
    pub fn ignore_ref_siblings(&mut self, ignore_ref_siblings: bool) -> &mut Self {
        self.ignore_ref_siblings = ignore_ref_siblings;
        self
    }

    /// Sets which `format` names are enforced. The default is the
    /// twelve draft-6 names in
    /// [`format::DEFAULT_FORMATS`](../format/constant.DEFAULT_FORMATS.html);
    /// pass an empty set to turn format checking off entirely.
    pub fn enabled_formats<I, S>(&mut self, formats: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the maximum schema nesting depth before evaluation reports
    /// a recursion-limit error at the current location. The default is
    /// 128.
    pub fn max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apply_defaults: false,
            ignore_ref_siblings: true,
            enabled_formats: format::DEFAULT_FORMATS
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
            max_depth: 128,
        }
    }
}

/// Contains a single problem with an instance when evaluated against a
/// schema.
///
/// Note that, despite its name, `ValidationError` is not an error in
/// the usual Rust sense. It is an ordinary struct carrying the
/// location of the offending value, the keyword that rejected it, and
/// the structured reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    instance_path: JsonPointer<String, Vec<String>>,
    keyword: &'static str,
    kind: ErrorKind,
}

impl ValidationError {
    pub(crate) fn new(
        instance_path: JsonPointer<String, Vec<String>>,
        keyword: &'static str,
        kind: ErrorKind,
    ) -> ValidationError {
        ValidationError {
            instance_path,
            keyword,
            kind,
        }
    }

    /// A pointer into the part of the instance which was rejected.
    pub fn instance_path(&self) -> &JsonPointer<String, Vec<String>> {
        &self.instance_path
    }

    /// The schema keyword that rejected the instance.
    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// The structured reason for the rejection.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.instance_path.to_string(), self.kind)
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("ValidationError", 3)?;
        out.serialize_field("instancePath", &self.instance_path.to_string())?;
        out.serialize_field("keyword", self.keyword)?;
        out.serialize_field("error", &self.kind.to_string())?;
        out.end()
    }
}

/// The closed set of reasons an instance can fail validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The schema was `false`.
    AlwaysFail,
    /// The value's type is not in the schema's type set.
    InvalidType { expected: Type, actual: Primitive },
    /// A required (or dependency-required) property is missing.
    Required { property: String },
    /// The value equals no `enum` member.
    NotInEnum,
    /// The value does not equal the `const`.
    NotConst,
    /// The number is not a multiple of `multipleOf`.
    MultipleOf,
    /// The number exceeds `maximum`.
    Maximum,
    /// The number reaches or exceeds the exclusive maximum.
    ExclusiveMaximum,
    /// The number is below `minimum`.
    Minimum,
    /// The number reaches or falls below the exclusive minimum.
    ExclusiveMinimum,
    /// The string has more code points than `maxLength`.
    MaxLength,
    /// The string has fewer code points than `minLength`.
    MinLength,
    /// The string does not match `pattern`.
    Pattern,
    /// The string fails an enabled named format.
    Format { name: String },
    /// The array has more elements than `maxItems`.
    MaxItems,
    /// The array has fewer elements than `minItems`.
    MinItems,
    /// Two array elements are structurally equal under `uniqueItems`.
    NotUnique { first: usize, second: usize },
    /// No array element matches `contains`.
    Contains,
    /// The object has more members than `maxProperties`.
    MaxProperties,
    /// The object has fewer members than `minProperties`.
    MinProperties,
    /// A property fell through to `additionalProperties: false`.
    AdditionalProperties { property: String },
    /// An element fell through to `additionalItems: false`.
    AdditionalItems { index: usize },
    /// A property name failed the `propertyNames` schema.
    PropertyNames { errors: Vec<ValidationError> },
    /// A present property's schema dependency can never hold.
    InvalidDependency { property: String },
    /// One `allOf` branch failed.
    AllOfFailed { index: usize, errors: Vec<ValidationError> },
    /// Every `anyOf` branch failed; each branch's errors are kept.
    AnyOfFailed { branches: Vec<Vec<ValidationError>> },
    /// No `oneOf` branch matched.
    OneOfNoneMatch,
    /// More than one `oneOf` branch matched.
    OneOfManyMatch { indices: Vec<usize> },
    /// The `not` schema matched.
    NotDisallowed,
    /// A `$ref` could not be resolved.
    UnresolvableReference { reference: String },
    /// Schema nesting exceeded the configured maximum depth.
    RecursionLimit,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::AlwaysFail => f.write_str("schema always fails"),
            ErrorKind::InvalidType { expected, actual } => {
                write!(f, "expected {}, got {}", expected, actual)
            }
            ErrorKind::Required { property } => write!(f, "missing property {:?}", property),
            ErrorKind::NotInEnum => f.write_str("not a member of the enum"),
            ErrorKind::NotConst => f.write_str("not equal to the const"),
            ErrorKind::MultipleOf => f.write_str("not a multiple of the expected factor"),
            ErrorKind::Maximum => f.write_str("above the maximum"),
            ErrorKind::ExclusiveMaximum => f.write_str("not below the exclusive maximum"),
            ErrorKind::Minimum => f.write_str("below the minimum"),
            ErrorKind::ExclusiveMinimum => f.write_str("not above the exclusive minimum"),
            ErrorKind::MaxLength => f.write_str("longer than maxLength"),
            ErrorKind::MinLength => f.write_str("shorter than minLength"),
            ErrorKind::Pattern => f.write_str("does not match the pattern"),
            ErrorKind::Format { name } => write!(f, "not a valid {}", name),
            ErrorKind::MaxItems => f.write_str("more items than maxItems"),
            ErrorKind::MinItems => f.write_str("fewer items than minItems"),
            ErrorKind::NotUnique { first, second } => {
                write!(f, "items {} and {} are equal", first, second)
            }
            ErrorKind::Contains => f.write_str("no item matches the contains schema"),
            ErrorKind::MaxProperties => f.write_str("more properties than maxProperties"),
            ErrorKind::MinProperties => f.write_str("fewer properties than minProperties"),
            ErrorKind::AdditionalProperties { property } => {
                write!(f, "additional property {:?} is not allowed", property)
            }
            ErrorKind::AdditionalItems { index } => {
                write!(f, "additional item {} is not allowed", index)
            }
            ErrorKind::PropertyNames { errors } => {
                write!(f, "property name fails {} check(s)", errors.len())
            }
            ErrorKind::InvalidDependency { property } => {
                write!(f, "dependency of {:?} can never hold", property)
            }
            ErrorKind::AllOfFailed { index, errors } => {
                write!(f, "allOf branch {} failed with {} error(s)", index, errors.len())
            }
            ErrorKind::AnyOfFailed { branches } => {
                write!(f, "no anyOf branch matched ({} tried)", branches.len())
            }
            ErrorKind::OneOfNoneMatch => f.write_str("no oneOf branch matched"),
            ErrorKind::OneOfManyMatch { indices } => {
                write!(f, "{} oneOf branches matched", indices.len())
            }
            ErrorKind::NotDisallowed => f.write_str("matches the not schema"),
            ErrorKind::UnresolvableReference { reference } => {
                write!(f, "unresolvable reference {:?}", reference)
            }
            ErrorKind::RecursionLimit => f.write_str("recursion limit exceeded"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn recursion_limit_is_reported_as_an_error() {
        let mut registry = Registry::new();
        let schema = Schema::from_value(&json!({
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": { "next": { "$ref": "#/definitions/node" } }
                }
            },
            "$ref": "#/definitions/node"
        }))
        .unwrap();
        registry.register(schema.clone()).unwrap();

        // a list far deeper than the configured depth
        let mut instance = json!({});
        for _ in 0..32 {
            instance = json!({ "next": instance });
        }

        let mut config = Config::new();
        config.max_depth(8);
        let validator = Validator::new_with_config(&registry, config);

        let errors = validator.validate(&schema, &instance).unwrap_err();
        assert!(errors
            .iter()
            .any(|error| *error.kind() == ErrorKind::RecursionLimit));

        // the same instance is fine under the default depth
        let validator = Validator::new(&registry);
        assert!(validator.validate(&schema, &instance).is_ok());
    }

    #[test]
    fn pure_ref_cycles_terminate_as_success() {
        let mut registry = Registry::new();
        let schema = Schema::from_value(&json!({
            "definitions": {
                "a": { "$ref": "#/definitions/b" },
                "b": { "$ref": "#/definitions/a" }
            },
            "$ref": "#/definitions/a"
        }))
        .unwrap();
        registry.register(schema.clone()).unwrap();

        let validator = Validator::new(&registry);
        assert!(validator.validate(&schema, &json!({})).is_ok());
    }

    #[test]
    fn errors_serialize_canonically() {
        let registry = Registry::new();
        let validator = Validator::new(&registry);
        let schema = Schema::from_value(&json!({
            "properties": { "a": { "type": "integer" } }
        }))
        .unwrap();

        let errors = validator
            .validate(&schema, &json!({ "a": "nope" }))
            .unwrap_err();
        let serialized = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            serialized,
            json!([{
                "instancePath": "/a",
                "keyword": "type",
                "error": "expected integer, got string"
            }])
        );
    }

    #[test]
    fn ref_siblings_are_ignored_by_default() {
        let mut registry = Registry::new();
        let schema = Schema::from_value(&json!({
            "definitions": { "any": true },
            "$ref": "#/definitions/any",
            "type": "string"
        }))
        .unwrap();
        registry.register(schema.clone()).unwrap();

        // draft-6: the sibling `type` is ignored, so a number passes
        let validator = Validator::new(&registry);
        assert!(validator.validate(&schema, &json!(7)).is_ok());

        // with siblings honored, `type: string` now applies
        let mut config = Config::new();
        config.ignore_ref_siblings(false);
        let validator = Validator::new_with_config(&registry, config);
        assert!(validator.validate(&schema, &json!(7)).is_err());
    }

    #[test]
    fn defaults_fill_a_copy_when_enabled() {
        let registry = Registry::new();
        let schema = Schema::from_value(&json!({
            "properties": {
                "role": { "type": "string", "default": "user" },
                "name": { "type": "string" }
            }
        }))
        .unwrap();

        let instance = json!({ "name": "ada" });

        let validator = Validator::new(&registry);
        let untouched = validator.validate(&schema, &instance).unwrap();
        assert_eq!(*untouched, instance);

        let mut config = Config::new();
        config.apply_defaults(true);
        let validator = Validator::new_with_config(&registry, config);
        let filled = validator.validate(&schema, &instance).unwrap();
        assert_eq!(*filled, json!({ "name": "ada", "role": "user" }));
        // the original instance is never mutated
        assert_eq!(instance, json!({ "name": "ada" }));
    }

    #[test]
    fn formats_are_enforced_by_default() {
        let registry = Registry::new();
        let validator = Validator::new(&registry);

        let ipv4 = Schema::from_value(&json!({ "format": "ipv4" })).unwrap();
        let errors = validator.validate(&ipv4, &json!("999.0.0.1")).unwrap_err();
        assert_eq!(
            *errors[0].kind(),
            ErrorKind::Format { name: "ipv4".to_owned() }
        );
        assert!(validator.validate(&ipv4, &json!("127.0.0.1")).is_ok());

        let email = Schema::from_value(&json!({ "format": "email" })).unwrap();
        assert!(validator.validate(&email, &json!("not-an-email")).is_err());
        assert!(validator
            .validate(&email, &json!("joe.bloggs@example.com"))
            .is_ok());

        // unknown names are still ignored
        let unknown = Schema::from_value(&json!({ "format": "color" })).unwrap();
        assert!(validator.validate(&unknown, &json!("#zzz")).is_ok());
    }

    #[test]
    fn format_checking_can_be_narrowed_or_disabled() {
        let registry = Registry::new();
        let ipv4 = Schema::from_value(&json!({ "format": "ipv4" })).unwrap();
        let date = Schema::from_value(&json!({ "format": "date" })).unwrap();

        // narrowed: only the named formats are enforced
        let mut config = Config::new();
        config.enabled_formats(vec!["date"]);
        let validator = Validator::new_with_config(&registry, config);
        assert!(validator.validate(&ipv4, &json!("999.0.0.1")).is_ok());
        assert!(validator.validate(&date, &json!("06/19/1963")).is_err());

        // emptied: strings pass any format
        let mut config = Config::new();
        config.enabled_formats(Vec::<String>::new());
        let validator = Validator::new_with_config(&registry, config);
        assert!(validator.validate(&ipv4, &json!("999.0.0.1")).is_ok());
        assert!(validator.validate(&date, &json!("06/19/1963")).is_ok());
    }
}
