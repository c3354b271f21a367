use jsv::{Registry, Schema, Validator};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
struct TestSuite {
    name: String,
    schema: Value,
    instances: Vec<TestCase>,
}

#[derive(Deserialize)]
struct TestCase {
    instance: Value,
    errors: Vec<TestCaseError>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct TestCaseError {
    #[serde(rename = "instancePath")]
    instance_path: String,
    keyword: String,
}

#[test]
fn keyword_suites() {
    let suites: Vec<TestSuite> =
        serde_json::from_value(suite_data()).expect("malformed suite data");

    for (i, suite) in suites.into_iter().enumerate() {
        println!("{}: {}", i, suite.name);

        let schema = Schema::from_value(&suite.schema).expect("error decoding schema");
        let mut registry = Registry::new();
        registry.register(schema.clone()).expect("error registering schema");
        let validator = Validator::new(&registry);

        for (j, test_case) in suite.instances.into_iter().enumerate() {
            println!("{}/{}", i, j);

            let mut actual: Vec<TestCaseError> =
                match validator.validate(&schema, &test_case.instance) {
                    Ok(_) => Vec::new(),
                    Err(errors) => errors
                        .iter()
                        .map(|error| TestCaseError {
                            instance_path: error.instance_path().to_string(),
                            keyword: error.keyword().to_owned(),
                        })
                        .collect(),
                };

            let mut expected = test_case.errors;
            actual.sort_by_key(|error| format!("{},{}", error.instance_path, error.keyword));
            expected.sort_by_key(|error| format!("{},{}", error.instance_path, error.keyword));

            assert_eq!(actual, expected);
        }
    }
}

fn suite_data() -> Value {
    json!([
        {
            "name": "integer type",
            "schema": { "type": "integer" },
            "instances": [
                { "instance": 3, "errors": [] },
                { "instance": 3.0, "errors": [] },
                { "instance": 3.5, "errors": [{ "instancePath": "", "keyword": "type" }] },
                { "instance": "3", "errors": [{ "instancePath": "", "keyword": "type" }] }
            ]
        },
        {
            "name": "nullable type pair",
            "schema": { "type": ["string", "null"] },
            "instances": [
                { "instance": null, "errors": [] },
                { "instance": "x", "errors": [] },
                { "instance": 5, "errors": [{ "instancePath": "", "keyword": "type" }] }
            ]
        },
        {
            "name": "required and string length",
            "schema": {
                "type": "object",
                "required": ["a"],
                "properties": { "a": { "type": "string", "maxLength": 3 } }
            },
            "instances": [
                { "instance": { "a": "hey" }, "errors": [] },
                { "instance": { "a": "hello" }, "errors": [{ "instancePath": "/a", "keyword": "maxLength" }] },
                { "instance": {}, "errors": [{ "instancePath": "", "keyword": "required" }] }
            ]
        },
        {
            "name": "length counts code points",
            "schema": { "minLength": 2, "maxLength": 5 },
            "instances": [
                { "instance": "héllo", "errors": [] },
                { "instance": "héllo!", "errors": [{ "instancePath": "", "keyword": "maxLength" }] },
                { "instance": "é", "errors": [{ "instancePath": "", "keyword": "minLength" }] }
            ]
        },
        {
            "name": "tuple items with closed tail",
            "schema": {
                "items": [{ "type": "integer" }, { "type": "string" }],
                "additionalItems": false
            },
            "instances": [
                { "instance": [1, "x"], "errors": [] },
                { "instance": [1], "errors": [] },
                { "instance": [1, "x", true], "errors": [{ "instancePath": "/2", "keyword": "additionalItems" }] },
                { "instance": ["x", 1], "errors": [
                    { "instancePath": "/0", "keyword": "type" },
                    { "instancePath": "/1", "keyword": "type" }
                ] }
            ]
        },
        {
            "name": "one of overlapping number types",
            "schema": { "oneOf": [{ "type": "integer" }, { "type": "number" }] },
            "instances": [
                { "instance": 3, "errors": [{ "instancePath": "", "keyword": "oneOf" }] },
                { "instance": 3.5, "errors": [] },
                { "instance": "x", "errors": [{ "instancePath": "", "keyword": "oneOf" }] }
            ]
        },
        {
            "name": "recursive reference",
            "schema": {
                "$id": "root",
                "definitions": {
                    "node": {
                        "type": "object",
                        "properties": { "next": { "$ref": "#/definitions/node" } }
                    }
                },
                "$ref": "#/definitions/node"
            },
            "instances": [
                { "instance": { "next": { "next": {} } }, "errors": [] },
                { "instance": { "next": 42 }, "errors": [{ "instancePath": "/next", "keyword": "type" }] }
            ]
        },
        {
            "name": "dependencies",
            "schema": { "dependencies": { "a": ["b"], "c": { "required": ["d"] } } },
            "instances": [
                { "instance": { "a": 1, "b": 2, "c": 3, "d": 4 }, "errors": [] },
                { "instance": { "a": 1 }, "errors": [{ "instancePath": "", "keyword": "dependencies" }] },
                { "instance": { "c": 1 }, "errors": [{ "instancePath": "", "keyword": "required" }] },
                { "instance": 17, "errors": [] }
            ]
        },
        {
            "name": "enum and const compare numbers by value",
            "schema": { "enum": [1, "a", { "k": [1, 2] }] },
            "instances": [
                { "instance": 1.0, "errors": [] },
                { "instance": { "k": [1, 2] }, "errors": [] },
                { "instance": { "k": [2, 1] }, "errors": [{ "instancePath": "", "keyword": "enum" }] },
                { "instance": "b", "errors": [{ "instancePath": "", "keyword": "enum" }] }
            ]
        },
        {
            "name": "const",
            "schema": { "const": { "a": 1, "b": 2 } },
            "instances": [
                { "instance": { "b": 2, "a": 1 }, "errors": [] },
                { "instance": { "a": 1 }, "errors": [{ "instancePath": "", "keyword": "const" }] }
            ]
        },
        {
            "name": "numeric bounds",
            "schema": { "minimum": 0, "maximum": 10, "multipleOf": 2 },
            "instances": [
                { "instance": 4, "errors": [] },
                { "instance": 7, "errors": [{ "instancePath": "", "keyword": "multipleOf" }] },
                { "instance": -2, "errors": [{ "instancePath": "", "keyword": "minimum" }] },
                { "instance": 12, "errors": [{ "instancePath": "", "keyword": "maximum" }] },
                { "instance": "not a number", "errors": [] }
            ]
        },
        {
            "name": "draft-6 exclusive bounds are numbers",
            "schema": { "exclusiveMinimum": 0, "exclusiveMaximum": 10 },
            "instances": [
                { "instance": 5, "errors": [] },
                { "instance": 0, "errors": [{ "instancePath": "", "keyword": "exclusiveMinimum" }] },
                { "instance": 10, "errors": [{ "instancePath": "", "keyword": "exclusiveMaximum" }] }
            ]
        },
        {
            "name": "draft-4 boolean exclusives sharpen the inclusive bounds",
            "schema": { "maximum": 10, "exclusiveMaximum": true, "minimum": 0, "exclusiveMinimum": false },
            "instances": [
                { "instance": 0, "errors": [] },
                { "instance": 10, "errors": [{ "instancePath": "", "keyword": "exclusiveMaximum" }] }
            ]
        },
        {
            "name": "pattern",
            "schema": { "pattern": "^[0-9]{3}-[0-9]{4}$" },
            "instances": [
                { "instance": "555-1234", "errors": [] },
                { "instance": "5551234", "errors": [{ "instancePath": "", "keyword": "pattern" }] },
                { "instance": 5551234, "errors": [] }
            ]
        },
        {
            "name": "format",
            "schema": { "format": "ipv4" },
            "instances": [
                { "instance": "127.0.0.1", "errors": [] },
                { "instance": "999.0.0.1", "errors": [{ "instancePath": "", "keyword": "format" }] },
                { "instance": 3, "errors": [] }
            ]
        },
        {
            "name": "format inside properties",
            "schema": {
                "properties": { "when": { "format": "date-time" } }
            },
            "instances": [
                { "instance": { "when": "1985-04-12T23:20:50.52Z" }, "errors": [] },
                { "instance": { "when": "yesterday" }, "errors": [{ "instancePath": "/when", "keyword": "format" }] }
            ]
        },
        {
            "name": "unknown formats are ignored",
            "schema": { "format": "color" },
            "instances": [
                { "instance": "#ff0000", "errors": [] },
                { "instance": "anything goes", "errors": [] }
            ]
        },
        {
            "name": "array cardinality and uniqueness",
            "schema": { "minItems": 1, "maxItems": 3, "uniqueItems": true },
            "instances": [
                { "instance": [1, 2], "errors": [] },
                { "instance": [], "errors": [{ "instancePath": "", "keyword": "minItems" }] },
                { "instance": [1, 2, 3, 4], "errors": [{ "instancePath": "", "keyword": "maxItems" }] },
                { "instance": [1, 2, 1.0], "errors": [{ "instancePath": "", "keyword": "uniqueItems" }] }
            ]
        },
        {
            "name": "contains",
            "schema": { "contains": { "type": "integer" } },
            "instances": [
                { "instance": ["a", 3], "errors": [] },
                { "instance": ["a", "b"], "errors": [{ "instancePath": "", "keyword": "contains" }] },
                { "instance": [], "errors": [{ "instancePath": "", "keyword": "contains" }] }
            ]
        },
        {
            "name": "object cardinality",
            "schema": { "minProperties": 1, "maxProperties": 2 },
            "instances": [
                { "instance": { "a": 1 }, "errors": [] },
                { "instance": {}, "errors": [{ "instancePath": "", "keyword": "minProperties" }] },
                { "instance": { "a": 1, "b": 2, "c": 3 }, "errors": [{ "instancePath": "", "keyword": "maxProperties" }] }
            ]
        },
        {
            "name": "pattern and additional properties",
            "schema": {
                "properties": { "known": true },
                "patternProperties": { "^x-": { "type": "integer" } },
                "additionalProperties": false
            },
            "instances": [
                { "instance": { "known": 1, "x-rate": 2 }, "errors": [] },
                { "instance": { "x-rate": "fast" }, "errors": [{ "instancePath": "/x-rate", "keyword": "type" }] },
                { "instance": { "other": 1 }, "errors": [{ "instancePath": "/other", "keyword": "additionalProperties" }] }
            ]
        },
        {
            "name": "additional properties as a schema",
            "schema": {
                "properties": { "id": true },
                "additionalProperties": { "type": "string" }
            },
            "instances": [
                { "instance": { "id": 1, "note": "fine" }, "errors": [] },
                { "instance": { "note": 3 }, "errors": [{ "instancePath": "/note", "keyword": "type" }] }
            ]
        },
        {
            "name": "property names",
            "schema": { "propertyNames": { "maxLength": 3 } },
            "instances": [
                { "instance": { "abc": 1 }, "errors": [] },
                { "instance": { "toolong": 1 }, "errors": [{ "instancePath": "/toolong", "keyword": "propertyNames" }] }
            ]
        },
        {
            "name": "combinators",
            "schema": {
                "allOf": [{ "minimum": 0 }],
                "anyOf": [{ "type": "integer" }, { "type": "string" }],
                "not": { "const": 13 }
            },
            "instances": [
                { "instance": 12, "errors": [] },
                { "instance": -1, "errors": [{ "instancePath": "", "keyword": "allOf" }] },
                { "instance": 1.5, "errors": [{ "instancePath": "", "keyword": "anyOf" }] },
                { "instance": 13, "errors": [{ "instancePath": "", "keyword": "not" }] }
            ]
        },
        {
            "name": "boolean schemas nested in keywords",
            "schema": { "properties": { "allowed": true, "forbidden": false } },
            "instances": [
                { "instance": { "allowed": 1 }, "errors": [] },
                { "instance": { "forbidden": 1 }, "errors": [{ "instancePath": "/forbidden", "keyword": "schema" }] }
            ]
        },
        {
            "name": "unresolvable reference",
            "schema": { "properties": { "a": { "$ref": "#/definitions/missing" } } },
            "instances": [
                { "instance": {}, "errors": [] },
                { "instance": { "a": 1 }, "errors": [{ "instancePath": "/a", "keyword": "$ref" }] }
            ]
        }
    ])
}

#[test]
fn boolean_schema_laws() {
    let registry = Registry::new();
    let validator = Validator::new(&registry);
    let accept_all = Schema::from_value(&json!(true)).unwrap();
    let reject_all = Schema::from_value(&json!(false)).unwrap();

    let samples = vec![
        json!(null),
        json!(true),
        json!(3),
        json!(3.5),
        json!("x"),
        json!([1, [2]]),
        json!({ "k": { "n": 1 } }),
    ];
    for sample in &samples {
        assert!(validator.validate(&accept_all, sample).is_ok());
        assert!(validator.validate(&reject_all, sample).is_err());
    }
}

#[test]
fn double_negation_agrees_with_the_base_schema() {
    let registry = Registry::new();
    let validator = Validator::new(&registry);

    let base = Schema::from_value(&json!({ "type": "integer" })).unwrap();
    let doubled = Schema::from_value(&json!({
        "not": { "not": { "type": "integer" } }
    }))
    .unwrap();

    for sample in [json!(3), json!(3.5), json!("x"), json!(null)] {
        assert_eq!(
            validator.validate(&base, &sample).is_ok(),
            validator.validate(&doubled, &sample).is_ok(),
            "disagreement on {}",
            sample
        );
    }
}

#[test]
fn all_of_is_conjunction() {
    let registry = Registry::new();
    let validator = Validator::new(&registry);

    let left = Schema::from_value(&json!({ "minimum": 0 })).unwrap();
    let right = Schema::from_value(&json!({ "maximum": 10 })).unwrap();
    let both = Schema::from_value(&json!({
        "allOf": [{ "minimum": 0 }, { "maximum": 10 }]
    }))
    .unwrap();

    for sample in [json!(-5), json!(0), json!(5), json!(10), json!(15)] {
        let expected = validator.validate(&left, &sample).is_ok()
            && validator.validate(&right, &sample).is_ok();
        assert_eq!(validator.validate(&both, &sample).is_ok(), expected);
    }
}

#[test]
fn repeated_validation_is_stable() {
    let mut registry = Registry::new();
    let schema = Schema::from_value(&json!({
        "type": "object",
        "required": ["a", "b"],
        "properties": {
            "a": { "type": "string", "minLength": 4, "pattern": "^z" },
            "b": { "anyOf": [{ "type": "integer" }, { "type": "boolean" }] }
        },
        "additionalProperties": false
    }))
    .unwrap();
    registry.register(schema.clone()).unwrap();
    let validator = Validator::new(&registry);

    let instance = json!({ "a": "no", "b": 1.5, "c": true });
    let first = validator.validate(&schema, &instance).unwrap_err();
    let second = validator.validate(&schema, &instance).unwrap_err();
    assert_eq!(first, second);

    // type first, then kind-specific keywords, then combinators
    let keywords: Vec<&str> = first.iter().map(|error| error.keyword()).collect();
    assert_eq!(
        keywords,
        ["minLength", "pattern", "anyOf", "additionalProperties"]
    );
}

#[test]
fn cross_document_references() {
    let mut registry = Registry::new();

    let user = Schema::from_value(&json!({
        "$id": "http://schemas.example.com/user.json",
        "type": "object",
        "required": ["name"],
        "properties": { "name": { "type": "string" } }
    }))
    .unwrap();
    registry.register(user).unwrap();

    let feed = Schema::from_value(&json!({
        "$id": "http://schemas.example.com/feed.json",
        "type": "object",
        "properties": {
            "users": {
                "type": "array",
                "items": { "$ref": "user.json" }
            }
        }
    }))
    .unwrap();
    registry.register(feed.clone()).unwrap();

    let validator = Validator::new(&registry);
    assert!(validator
        .validate(&feed, &json!({ "users": [{ "name": "ada" }] }))
        .is_ok());

    let errors = validator
        .validate(&feed, &json!({ "users": [{}] }))
        .unwrap_err();
    assert_eq!(errors[0].instance_path().to_string(), "/users/0");
    assert_eq!(errors[0].keyword(), "required");
}

#[test]
fn subschemas_validate_with_root_resolution() {
    let mut registry = Registry::new();
    let root = Schema::from_value(&json!({
        "definitions": {
            "name": { "type": "string", "minLength": 1 },
            "person": {
                "type": "object",
                "properties": { "name": { "$ref": "#/definitions/name" } }
            }
        }
    }))
    .unwrap();
    registry.register(root.clone()).unwrap();
    let validator = Validator::new(&registry);

    let (_, person) = registry.resolve("", "#/definitions/person").unwrap();
    assert!(validator
        .validate_sub(&root, &person, &json!({ "name": "ada" }))
        .is_ok());

    let errors = validator
        .validate_sub(&root, &person, &json!({ "name": "" }))
        .unwrap_err();
    assert_eq!(errors[0].instance_path().to_string(), "/name");
    assert_eq!(errors[0].keyword(), "minLength");
}

#[test]
fn decode_encode_roundtrip_preserves_the_model() {
    let documents = vec![
        json!(true),
        json!({ "type": ["integer", "null"] }),
        json!({
            "$id": "http://example.com/schema",
            "title": "demo",
            "definitions": { "s": { "type": "string" } },
            "properties": { "a": { "$ref": "#/definitions/s" } },
            "dependencies": { "a": ["b"] },
            "x-custom": [1, 2, 3]
        }),
        json!({
            "enum": [null, 0, "zero"],
            "const": 0,
            "examples": [0, "zero"]
        }),
    ];
    for document in documents {
        let schema = Schema::from_value(&document).unwrap();
        let encoded = schema.to_value();
        assert_eq!(Schema::from_value(&encoded).unwrap(), schema);
    }
}
