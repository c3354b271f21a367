//! An error type for schema decoding and reference resolution.

use failure::Fail;

/// An enum of possible errors that can emerge from this crate.
///
/// Validation failures are not represented here; they are ordinary data
/// returned by [`Validator::validate`](../validator/struct.Validator.html#method.validate).
/// `JsvError` covers the two fallible boundaries: turning JSON into a
/// [`Schema`](../schema/enum.Schema.html), and resolving references
/// between schemas.
#[derive(Debug, Fail, PartialEq)]
pub enum JsvError {
    /// A `type` keyword named something other than the seven draft-6 types.
    ///
    /// Only `"null"`, `"boolean"`, `"integer"`, `"number"`, `"string"`,
    /// `"array"` and `"object"` are valid type names, whether they appear
    /// alone or inside a type array.
    #[fail(display = "{}: unknown type name {:?}", path, name)]
    UnknownType { path: String, name: String },

    /// An `enum` keyword was empty or contained duplicate members.
    ///
    /// Draft-6 requires `enum` to be a non-empty array whose members are
    /// pairwise distinct under structural JSON equality.
    #[fail(display = "{}: enum must be a non-empty array of unique values", path)]
    InvalidEnum { path: String },

    /// A keyword that requires a non-empty array was given an empty one.
    ///
    /// Applies to `allOf`, `anyOf` and `oneOf`.
    #[fail(display = "{}: {} must not be an empty array", path, keyword)]
    EmptyArray { path: String, keyword: &'static str },

    /// A counting keyword was given a negative value.
    ///
    /// `maxLength`, `minLength`, `maxItems`, `minItems`, `maxProperties`
    /// and `minProperties` must all be non-negative integers.
    #[fail(display = "{}: {} must be a non-negative integer", path, keyword)]
    NegativeCount { path: String, keyword: &'static str },

    /// A `pattern` or `patternProperties` key is not a valid regex.
    #[fail(display = "{}: invalid pattern {:?}", path, pattern)]
    BadPattern { path: String, pattern: String },

    /// A schema-like value did not have the required structure.
    ///
    /// This is the catch-all for structural preconditions: a schema that
    /// is neither an object nor a boolean, a `required` entry that is not
    /// a string, a `multipleOf` that is not a positive number, and so on.
    #[fail(display = "{}: {}", path, detail)]
    StructurallyInvalid { path: String, detail: String },

    /// A reference names a document that is not in the registry.
    #[fail(display = "no schema registered under namespace {:?}", namespace)]
    NoSuchSchema { namespace: String },

    /// A reference could not be resolved to a subschema.
    ///
    /// The pool had no entry for the reference's canonical key, and
    /// navigating the owning document by the reference's pointer path did
    /// not reach a schema.
    #[fail(display = "unresolvable reference {:?}", reference)]
    UnresolvableReference { reference: String },

    /// A value-locator pointer does not correspond to any subschema.
    ///
    /// Returned by the functions in [`locate`](../locate/index.html) when
    /// no `properties`, `patternProperties`, `additionalProperties` or
    /// `items` entry covers a pointer token.
    #[fail(display = "no subschema at pointer {:?}", pointer)]
    NoSubschema { pointer: String },
}
