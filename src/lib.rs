//! `jsv` is a Rust implementation of the JSON Schema draft-6
//! vocabulary: decoding schema documents into a checked model,
//! resolving `$id`/`$ref` across documents, and validating JSON
//! instances with structured, ordered errors.
//!
//! # Validating data
//!
//! The most common use-case for this crate is checking that some JSON
//! input is really valid against a schema. Here's how you'd achieve
//! that use-case:
//!
//! ```
//! use jsv::{Registry, Schema, Validator};
//! use serde_json::json;
//!
//! fn main() -> Result<(), jsv::JsvError> {
//!     let demo_schema = Schema::from_value(&json!({
//!         "type": "object",
//!         "required": ["name"],
//!         "properties": {
//!             "name": { "type": "string" },
//!             "age": { "type": "integer", "minimum": 0 },
//!             "phones": {
//!                 "type": "array",
//!                 "items": { "type": "string" }
//!             }
//!         }
//!     }))?;
//!
//!     // The Registry pools schemas so `$ref` can reach across
//!     // documents. A single self-contained schema still registers,
//!     // so its internal references resolve.
//!     let mut registry = Registry::new();
//!     registry.register(demo_schema.clone())?;
//!
//!     let validator = Validator::new(&registry);
//!
//!     let input_ok = json!({
//!         "name": "John Doe",
//!         "age": 43,
//!         "phones": ["+44 1234567", "+44 2345678"]
//!     });
//!     assert!(validator.validate(&demo_schema, &input_ok).is_ok());
//!
//!     let input_bad = json!({
//!         "age": -1,
//!         "phones": ["+44 1234567", 442345678]
//!     });
//!
//!     // Validation accumulates every failure, in schema order, each
//!     // with a JSON Pointer into the instance.
//!     let errors = validator.validate(&demo_schema, &input_bad).unwrap_err();
//!     assert_eq!(errors.len(), 3);
//!
//!     // "name" is required
//!     assert_eq!(errors[0].instance_path().to_string(), "");
//!     assert_eq!(errors[0].keyword(), "required");
//!
//!     // "age" is below the minimum
//!     assert_eq!(errors[1].instance_path().to_string(), "/age");
//!     assert_eq!(errors[1].keyword(), "minimum");
//!
//!     // "phones[1]" has the wrong type
//!     assert_eq!(errors[2].instance_path().to_string(), "/phones/1");
//!     assert_eq!(errors[2].keyword(), "type");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Building tooling on top of schemas
//!
//! A decoded [`Schema`](schema/enum.Schema.html) is plain data: every
//! keyword is a typed field, and the original JSON object is retained
//! so unknown keywords survive a round trip through
//! [`Schema::to_value`](schema/enum.Schema.html#method.to_value).
//! The [`locate`](locate/index.html) module builds on the model to
//! find the subschema governing a JSON Pointer and to write values
//! into an instance under schema guidance.
//!
//! There is no I/O anywhere in this crate: schemas arrive as parsed
//! [`serde_json::Value`]s, external documents are pre-registered by
//! the caller, and validation is a pure function of its inputs.

mod decode;
mod encode;
mod vm;

pub mod errors;
pub mod format;
pub mod locate;
pub mod pointer;
pub mod registry;
pub mod schema;
pub mod validator;

pub use crate::errors::JsvError;
pub use crate::pointer::Reference;
pub use crate::registry::Registry;
pub use crate::schema::{Boundary, Dependency, Items, Primitive, Schema, SubSchema, Type};
pub use crate::validator::{Config, ErrorKind, ValidationError, Validator};
