//! The checked, in-memory representation of a draft-6 schema.
//!
//! A [`Schema`] is either one of the two boolean schemas or an object
//! schema carrying the closed draft-6 keyword record ([`SubSchema`]).
//! Every polymorphic keyword is held as a tagged enum ([`Type`],
//! [`Items`], [`Dependency`], [`Boundary`]) so validation can match
//! exhaustively instead of re-inspecting JSON.
//!
//! A `SubSchema` also retains the JSON object it was decoded from in
//! [`SubSchema::source`]. The source drives id collection, reference
//! navigation and re-encoding, and is what lets unknown keywords
//! survive a decode/encode round trip.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

/// A JSON Schema: a boolean, or an object of keywords.
///
/// `true` matches any instance and `false` matches none; everything
/// else is an [`ObjectSchema`](Schema::Object) whose behavior is the
/// conjunction of its keywords.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Boolean(bool),
    Object(Box<SubSchema>),
}

impl Schema {
    /// The keyword record, if this is an object schema.
    pub fn as_object(&self) -> Option<&SubSchema> {
        match self {
            Schema::Object(sub) => Some(sub),
            Schema::Boolean(_) => None,
        }
    }

    /// The schema's `$id` (or legacy `id`), if any.
    pub fn id(&self) -> Option<&str> {
        self.as_object().and_then(|sub| sub.id.as_deref())
    }

    /// The raw JSON object this schema was decoded from.
    pub fn source(&self) -> Option<&Map<String, Value>> {
        self.as_object().map(|sub| &sub.source)
    }
}

/// The closed record of draft-6 keywords an object schema may carry.
///
/// Absent keywords are `None` (or the dedicated absent variant for
/// [`Type`] and [`Items`]); they impose no constraint. Keyword maps use
/// [`IndexMap`] so declaration order survives into error ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubSchema {
    // identity
    pub id: Option<String>,
    pub ref_: Option<String>,

    // metadata
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub examples: Option<Vec<Value>>,
    pub definitions: Option<IndexMap<String, Schema>>,

    // type and generic
    pub type_: Type,
    pub enum_: Option<Vec<Value>>,
    pub const_: Option<Value>,

    // numeric
    pub multiple_of: Option<f64>,
    pub maximum: Option<f64>,
    pub minimum: Option<f64>,
    pub exclusive_maximum: Option<Boundary>,
    pub exclusive_minimum: Option<Boundary>,

    // string
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,

    // array
    pub items: Items,
    pub additional_items: Option<Schema>,
    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: Option<bool>,
    pub contains: Option<Schema>,

    // object
    pub max_properties: Option<u64>,
    pub min_properties: Option<u64>,
    pub required: Option<Vec<String>>,
    pub properties: Option<IndexMap<String, Schema>>,
    pub pattern_properties: Option<IndexMap<String, Schema>>,
    pub additional_properties: Option<Schema>,
    pub dependencies: Option<IndexMap<String, Dependency>>,
    pub property_names: Option<Schema>,

    // combinators
    pub all_of: Option<Vec<Schema>>,
    pub any_of: Option<Vec<Schema>>,
    pub one_of: Option<Vec<Schema>>,
    pub not: Option<Schema>,

    /// The JSON object this record was decoded from, verbatim. Unknown
    /// and custom keywords live only here.
    pub source: Map<String, Value>,
}

/// The seven draft-6 type names.
///
/// `Ord` is derived so type unions have one canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Primitive {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl Primitive {
    /// Parses one of the seven draft-6 type names.
    pub fn from_name(name: &str) -> Option<Primitive> {
        match name {
            "null" => Some(Primitive::Null),
            "boolean" => Some(Primitive::Boolean),
            "integer" => Some(Primitive::Integer),
            "number" => Some(Primitive::Number),
            "string" => Some(Primitive::String),
            "array" => Some(Primitive::Array),
            "object" => Some(Primitive::Object),
            _ => None,
        }
    }

    /// The type name of an instance value. Never `Integer`: JSON has no
    /// integer kind of its own, integers are a refinement checked by
    /// [`admits`](Primitive::admits).
    pub fn of(value: &Value) -> Primitive {
        match value {
            Value::Null => Primitive::Null,
            Value::Bool(_) => Primitive::Boolean,
            Value::Number(_) => Primitive::Number,
            Value::String(_) => Primitive::String,
            Value::Array(_) => Primitive::Array,
            Value::Object(_) => Primitive::Object,
        }
    }

    /// Whether an instance value inhabits this type. `Integer` accepts
    /// any JSON number with a zero fractional part, so `1.0` counts.
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            Primitive::Null => value.is_null(),
            Primitive::Boolean => value.is_boolean(),
            Primitive::Number => value.is_number(),
            Primitive::String => value.is_string(),
            Primitive::Array => value.is_array(),
            Primitive::Object => value.is_object(),
            Primitive::Integer => match value {
                Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().map_or(false, |f| f.fract() == 0.0)
                }
                _ => false,
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Boolean => "boolean",
            Primitive::Integer => "integer",
            Primitive::Number => "number",
            Primitive::String => "string",
            Primitive::Array => "array",
            Primitive::Object => "object",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The decoded form of the `type` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// No `type` keyword: every value passes.
    Any,
    /// A single type name.
    Single(Primitive),
    /// The two-element form `[t, "null"]`, in either order.
    Nullable(Primitive),
    /// Any other type array, deduplicated and sorted.
    Union(Vec<Primitive>),
}

impl Type {
    /// Whether an instance value satisfies this type set.
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            Type::Any => true,
            Type::Single(primitive) => primitive.admits(value),
            Type::Nullable(primitive) => value.is_null() || primitive.admits(value),
            Type::Union(primitives) => primitives.iter().any(|p| p.admits(value)),
        }
    }
}

impl Default for Type {
    fn default() -> Type {
        Type::Any
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Any => f.write_str("any"),
            Type::Single(primitive) => write!(f, "{}", primitive),
            Type::Nullable(primitive) => write!(f, "[{}, null]", primitive),
            Type::Union(primitives) => {
                f.write_str("[")?;
                for (i, primitive) in primitives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", primitive)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// The decoded form of the `items` keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    /// No `items` keyword: elements are unconstrained by it.
    None,
    /// A single schema applied to every element.
    Single(Schema),
    /// Positional schemas; elements past the end fall to
    /// `additionalItems`.
    Tuple(Vec<Schema>),
}

impl Default for Items {
    fn default() -> Items {
        Items::None
    }
}

/// One entry of the `dependencies` keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    /// The whole instance must validate against this schema.
    Schema(Schema),
    /// These property names must also be present.
    Properties(Vec<String>),
}

/// An `exclusiveMaximum`/`exclusiveMinimum` value.
///
/// Draft-6 made these numbers; the boolean form is the draft-4
/// modifier of the corresponding inclusive bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    Bool(bool),
    Number(f64),
}

/// Structural JSON equality: numbers by numeric value, arrays
/// pairwise, objects as key-value maps regardless of order.
pub fn structural_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| structural_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, v)| y.get(key).map_or(false, |w| structural_eq(v, w)))
        }
        _ => false,
    }
}
