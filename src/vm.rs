use json_pointer::JsonPointer;
use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use crate::format;
use crate::pointer::{self, Reference};
use crate::registry::Registry;
use crate::schema::{
    structural_eq, Boundary, Dependency, Items, Primitive, Schema, SubSchema,
};
use crate::validator::{Config, ErrorKind, ValidationError};

pub(crate) fn validate<'v>(
    config: &Config,
    registry: &Registry,
    root: &'v Schema,
    current: &Schema,
    instance: &'v Value,
) -> Result<Cow<'v, Value>, Vec<ValidationError>> {
    let root_ns = root
        .id()
        .map(|id| pointer::compose("", id))
        .unwrap_or_default();

    let mut vm = Vm {
        config,
        registry,
        root,
        root_ns: root_ns.clone(),
        instance_tokens: Vec::new(),
        in_flight: HashSet::new(),
        depth: 0,
        fills: Vec::new(),
        regexes: HashMap::new(),
    };

    let errors = vm.eval(&root_ns, current, instance);
    if !errors.is_empty() {
        return Err(errors);
    }
    if vm.fills.is_empty() {
        return Ok(Cow::Borrowed(instance));
    }

    let mut filled = instance.clone();
    for fill in &vm.fills {
        apply_fill(&mut filled, fill);
    }
    Ok(Cow::Owned(filled))
}

/// A default recorded for a property that was absent during
/// validation; applied to a copy of the instance on overall success.
struct Fill {
    location: Vec<String>,
    property: String,
    value: Value,
}

fn apply_fill(target: &mut Value, fill: &Fill) {
    let mut node = target;
    for token in &fill.location {
        node = match node {
            Value::Object(map) => match map.get_mut(token) {
                Some(next) => next,
                None => return,
            },
            Value::Array(items) => {
                match token.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                    Some(next) => next,
                    None => return,
                }
            }
            _ => return,
        };
    }
    if let Value::Object(map) = node {
        map.entry(fill.property.clone())
            .or_insert_with(|| fill.value.clone());
    }
}

struct Vm<'a, 'v> {
    config: &'a Config,
    registry: &'a Registry,
    root: &'v Schema,
    root_ns: String,
    instance_tokens: Vec<String>,
    /// References currently being expanded, keyed by canonical ref key
    /// and instance location. A repeat means the same work is already
    /// pending, which is a success for recursive schemas.
    in_flight: HashSet<(String, String)>,
    depth: usize,
    fills: Vec<Fill>,
    /// Compiled patterns, memoized for the duration of one validation.
    /// `None` marks a pattern that failed to compile.
    regexes: HashMap<String, Option<Regex>>,
}

impl<'a, 'v> Vm<'a, 'v> {
    fn eval(&mut self, ns: &str, schema: &Schema, instance: &Value) -> Vec<ValidationError> {
        match schema {
            Schema::Boolean(true) => Vec::new(),
            Schema::Boolean(false) => vec![self.error("schema", ErrorKind::AlwaysFail)],
            Schema::Object(sub) => self.eval_sub(ns, sub, instance),
        }
    }

    fn eval_sub(&mut self, ns: &str, sub: &SubSchema, instance: &Value) -> Vec<ValidationError> {
        if self.depth >= self.config.max_depth {
            return vec![self.error("schema", ErrorKind::RecursionLimit)];
        }
        self.depth += 1;
        let errors = self.eval_keywords(ns, sub, instance);
        self.depth -= 1;
        errors
    }

    fn eval_keywords(
        &mut self,
        ns: &str,
        sub: &SubSchema,
        instance: &Value,
    ) -> Vec<ValidationError> {
        // an `$id` on a subschema rebases everything beneath it
        let ns: Cow<str> = match &sub.id {
            Some(id) => Cow::Owned(pointer::compose(ns, id)),
            None => Cow::Borrowed(ns),
        };
        let ns = ns.as_ref();

        let mut errors = Vec::new();

        if let Some(target) = &sub.ref_ {
            self.eval_ref(ns, target, instance, &mut errors);
            if self.config.ignore_ref_siblings {
                return errors;
            }
        }

        self.check_type(sub, instance, &mut errors);
        self.check_generic(sub, instance, &mut errors);
        match instance {
            Value::Number(_) => self.check_number(sub, instance, &mut errors),
            Value::String(value) => self.check_string(sub, value, &mut errors),
            Value::Array(items) => self.check_array(ns, sub, items, &mut errors),
            Value::Object(members) => self.check_object(ns, sub, instance, members, &mut errors),
            _ => {}
        }
        self.check_combinators(ns, sub, instance, &mut errors);

        errors
    }

    fn eval_ref(
        &mut self,
        ns: &str,
        target: &str,
        instance: &Value,
        errors: &mut Vec<ValidationError>,
    ) {
        let guard = (Reference::parse(ns, target).key(), self.instance_pointer());
        if !self.in_flight.insert(guard.clone()) {
            return;
        }

        let registry = self.registry;
        let root = self.root;
        let root_ns = self.root_ns.clone();
        match registry.resolve_in(ns, target, Some((&root_ns, root))) {
            Ok((referent_ns, referent)) => {
                errors.extend(self.eval(&referent_ns, &referent, instance));
            }
            Err(_) => {
                errors.push(self.error(
                    "$ref",
                    ErrorKind::UnresolvableReference {
                        reference: target.to_owned(),
                    },
                ));
            }
        }

        self.in_flight.remove(&guard);
    }

    fn check_type(&self, sub: &SubSchema, instance: &Value, errors: &mut Vec<ValidationError>) {
        if !sub.type_.admits(instance) {
            errors.push(self.error(
                "type",
                ErrorKind::InvalidType {
                    expected: sub.type_.clone(),
                    actual: Primitive::of(instance),
                },
            ));
        }
    }

    fn check_generic(&self, sub: &SubSchema, instance: &Value, errors: &mut Vec<ValidationError>) {
        if let Some(members) = &sub.enum_ {
            if !members.iter().any(|member| structural_eq(member, instance)) {
                errors.push(self.error("enum", ErrorKind::NotInEnum));
            }
        }
        if let Some(expected) = &sub.const_ {
            if !structural_eq(expected, instance) {
                errors.push(self.error("const", ErrorKind::NotConst));
            }
        }
    }

    fn check_number(&self, sub: &SubSchema, instance: &Value, errors: &mut Vec<ValidationError>) {
        let value = match instance.as_f64() {
            Some(value) => value,
            None => return,
        };

        if let Some(factor) = sub.multiple_of {
            if !is_multiple_of(value, factor) {
                errors.push(self.error("multipleOf", ErrorKind::MultipleOf));
            }
        }
        if let Some(limit) = sub.maximum {
            if matches!(sub.exclusive_maximum, Some(Boundary::Bool(true))) {
                if value >= limit {
                    errors.push(self.error("exclusiveMaximum", ErrorKind::ExclusiveMaximum));
                }
            } else if value > limit {
                errors.push(self.error("maximum", ErrorKind::Maximum));
            }
        }
        if let Some(Boundary::Number(limit)) = sub.exclusive_maximum {
            if value >= limit {
                errors.push(self.error("exclusiveMaximum", ErrorKind::ExclusiveMaximum));
            }
        }
        if let Some(limit) = sub.minimum {
            if matches!(sub.exclusive_minimum, Some(Boundary::Bool(true))) {
                if value <= limit {
                    errors.push(self.error("exclusiveMinimum", ErrorKind::ExclusiveMinimum));
                }
            } else if value < limit {
                errors.push(self.error("minimum", ErrorKind::Minimum));
            }
        }
        if let Some(Boundary::Number(limit)) = sub.exclusive_minimum {
            if value <= limit {
                errors.push(self.error("exclusiveMinimum", ErrorKind::ExclusiveMinimum));
            }
        }
    }

    fn check_string(&mut self, sub: &SubSchema, value: &str, errors: &mut Vec<ValidationError>) {
        // lengths count Unicode code points, not bytes
        if sub.max_length.is_some() || sub.min_length.is_some() {
            let length = value.chars().count() as u64;
            if sub.max_length.map_or(false, |limit| length > limit) {
                errors.push(self.error("maxLength", ErrorKind::MaxLength));
            }
            if sub.min_length.map_or(false, |limit| length < limit) {
                errors.push(self.error("minLength", ErrorKind::MinLength));
            }
        }
        if let Some(pattern) = &sub.pattern {
            if self.is_match(pattern, value) == Some(false) {
                errors.push(self.error("pattern", ErrorKind::Pattern));
            }
        }
        if let Some(name) = &sub.format {
            if self.config.enabled_formats.contains(name)
                && format::check(name, value) == Some(false)
            {
                errors.push(self.error("format", ErrorKind::Format { name: name.clone() }));
            }
        }
    }

    fn check_array(
        &mut self,
        ns: &str,
        sub: &SubSchema,
        items: &[Value],
        errors: &mut Vec<ValidationError>,
    ) {
        match &sub.items {
            Items::None => {}
            Items::Single(schema) => {
                for (index, element) in items.iter().enumerate() {
                    self.instance_tokens.push(index.to_string());
                    let element_errors = self.eval(ns, schema, element);
                    self.instance_tokens.pop();
                    errors.extend(element_errors);
                }
            }
            Items::Tuple(schemas) => {
                for (index, element) in items.iter().enumerate() {
                    if let Some(schema) = schemas.get(index) {
                        self.instance_tokens.push(index.to_string());
                        let element_errors = self.eval(ns, schema, element);
                        self.instance_tokens.pop();
                        errors.extend(element_errors);
                        continue;
                    }
                    match &sub.additional_items {
                        None | Some(Schema::Boolean(true)) => {}
                        Some(Schema::Boolean(false)) => {
                            self.instance_tokens.push(index.to_string());
                            errors.push(
                                self.error("additionalItems", ErrorKind::AdditionalItems { index }),
                            );
                            self.instance_tokens.pop();
                        }
                        Some(schema) => {
                            self.instance_tokens.push(index.to_string());
                            let element_errors = self.eval(ns, schema, element);
                            self.instance_tokens.pop();
                            errors.extend(element_errors);
                        }
                    }
                }
            }
        }

        if let Some(limit) = sub.max_items {
            if items.len() as u64 > limit {
                errors.push(self.error("maxItems", ErrorKind::MaxItems));
            }
        }
        if let Some(limit) = sub.min_items {
            if (items.len() as u64) < limit {
                errors.push(self.error("minItems", ErrorKind::MinItems));
            }
        }
        if sub.unique_items == Some(true) {
            for second in 1..items.len() {
                if let Some(first) =
                    (0..second).find(|&first| structural_eq(&items[first], &items[second]))
                {
                    errors.push(self.error("uniqueItems", ErrorKind::NotUnique { first, second }));
                }
            }
        }
        if let Some(schema) = &sub.contains {
            let mut matched = false;
            for (index, element) in items.iter().enumerate() {
                self.instance_tokens.push(index.to_string());
                let (element_errors, fills) = self.trial(ns, schema, element);
                self.instance_tokens.pop();
                if element_errors.is_empty() {
                    self.fills.extend(fills);
                    matched = true;
                    break;
                }
            }
            if !matched {
                errors.push(self.error("contains", ErrorKind::Contains));
            }
        }
    }

    fn check_object(
        &mut self,
        ns: &str,
        sub: &SubSchema,
        instance: &Value,
        members: &Map<String, Value>,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(required) = &sub.required {
            // entries may repeat syntactically; report each name once
            let mut seen = HashSet::new();
            for name in required {
                if seen.insert(name.as_str()) && !members.contains_key(name) {
                    errors.push(self.error(
                        "required",
                        ErrorKind::Required {
                            property: name.clone(),
                        },
                    ));
                }
            }
        }

        if let Some(properties) = &sub.properties {
            for (name, schema) in properties {
                if let Some(value) = members.get(name) {
                    self.instance_tokens.push(name.clone());
                    let value_errors = self.eval(ns, schema, value);
                    self.instance_tokens.pop();
                    errors.extend(value_errors);
                } else if self.config.apply_defaults {
                    if let Some(default) = schema.as_object().and_then(|s| s.default.as_ref()) {
                        self.fills.push(Fill {
                            location: self.instance_tokens.clone(),
                            property: name.clone(),
                            value: default.clone(),
                        });
                    }
                }
            }
        }

        if let Some(patterns) = &sub.pattern_properties {
            for (pattern, schema) in patterns {
                for (name, value) in members {
                    if self.is_match(pattern, name) == Some(true) {
                        self.instance_tokens.push(name.clone());
                        let value_errors = self.eval(ns, schema, value);
                        self.instance_tokens.pop();
                        errors.extend(value_errors);
                    }
                }
            }
        }

        if let Some(additional) = &sub.additional_properties {
            for (name, value) in members {
                if sub
                    .properties
                    .as_ref()
                    .map_or(false, |properties| properties.contains_key(name))
                {
                    continue;
                }
                let pattern_matched = sub.pattern_properties.as_ref().map_or(false, |patterns| {
                    patterns
                        .keys()
                        .any(|pattern| self.is_match(pattern, name) == Some(true))
                });
                if pattern_matched {
                    continue;
                }
                match additional {
                    Schema::Boolean(true) => {}
                    Schema::Boolean(false) => {
                        self.instance_tokens.push(name.clone());
                        errors.push(self.error(
                            "additionalProperties",
                            ErrorKind::AdditionalProperties {
                                property: name.clone(),
                            },
                        ));
                        self.instance_tokens.pop();
                    }
                    schema => {
                        self.instance_tokens.push(name.clone());
                        let value_errors = self.eval(ns, schema, value);
                        self.instance_tokens.pop();
                        errors.extend(value_errors);
                    }
                }
            }
        }

        if let Some(limit) = sub.max_properties {
            if members.len() as u64 > limit {
                errors.push(self.error("maxProperties", ErrorKind::MaxProperties));
            }
        }
        if let Some(limit) = sub.min_properties {
            if (members.len() as u64) < limit {
                errors.push(self.error("minProperties", ErrorKind::MinProperties));
            }
        }

        if let Some(dependencies) = &sub.dependencies {
            for (name, dependency) in dependencies {
                if !members.contains_key(name) {
                    continue;
                }
                match dependency {
                    Dependency::Properties(names) => {
                        for required in names {
                            if !members.contains_key(required) {
                                errors.push(self.error(
                                    "dependencies",
                                    ErrorKind::Required {
                                        property: required.clone(),
                                    },
                                ));
                            }
                        }
                    }
                    Dependency::Schema(Schema::Boolean(false)) => {
                        errors.push(self.error(
                            "dependencies",
                            ErrorKind::InvalidDependency {
                                property: name.clone(),
                            },
                        ));
                    }
                    Dependency::Schema(schema) => {
                        errors.extend(self.eval(ns, schema, instance));
                    }
                }
            }
        }

        if let Some(schema) = &sub.property_names {
            for name in members.keys() {
                let as_string = Value::String(name.clone());
                self.instance_tokens.push(name.clone());
                let (name_errors, _) = self.trial(ns, schema, &as_string);
                if !name_errors.is_empty() {
                    errors.push(self.error(
                        "propertyNames",
                        ErrorKind::PropertyNames {
                            errors: name_errors,
                        },
                    ));
                }
                self.instance_tokens.pop();
            }
        }
    }

    fn check_combinators(
        &mut self,
        ns: &str,
        sub: &SubSchema,
        instance: &Value,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(branches) = &sub.all_of {
            for (index, branch) in branches.iter().enumerate() {
                let branch_errors = self.eval(ns, branch, instance);
                if !branch_errors.is_empty() {
                    errors.push(self.error(
                        "allOf",
                        ErrorKind::AllOfFailed {
                            index,
                            errors: branch_errors,
                        },
                    ));
                }
            }
        }

        if let Some(branches) = &sub.any_of {
            let mut failures = Vec::with_capacity(branches.len());
            let mut matched = false;
            for branch in branches {
                let (branch_errors, fills) = self.trial(ns, branch, instance);
                if branch_errors.is_empty() {
                    if !matched {
                        self.fills.extend(fills);
                    }
                    matched = true;
                }
                failures.push(branch_errors);
            }
            if !matched {
                errors.push(self.error("anyOf", ErrorKind::AnyOfFailed { branches: failures }));
            }
        }

        if let Some(branches) = &sub.one_of {
            let mut indices = Vec::new();
            let mut winner_fills = Vec::new();
            for (index, branch) in branches.iter().enumerate() {
                let (branch_errors, fills) = self.trial(ns, branch, instance);
                if branch_errors.is_empty() {
                    indices.push(index);
                    winner_fills = fills;
                }
            }
            match indices.len() {
                1 => self.fills.extend(winner_fills),
                0 => errors.push(self.error("oneOf", ErrorKind::OneOfNoneMatch)),
                _ => errors.push(self.error("oneOf", ErrorKind::OneOfManyMatch { indices })),
            }
        }

        if let Some(schema) = &sub.not {
            let (inner, _) = self.trial(ns, schema, instance);
            if inner.is_empty() {
                errors.push(self.error("not", ErrorKind::NotDisallowed));
            }
        }
    }

    /// Evaluates a schema whose outcome may be discarded, keeping any
    /// fills it records separate so rejected branches cannot leak
    /// defaults into the result.
    fn trial(
        &mut self,
        ns: &str,
        schema: &Schema,
        instance: &Value,
    ) -> (Vec<ValidationError>, Vec<Fill>) {
        let saved = std::mem::take(&mut self.fills);
        let errors = self.eval(ns, schema, instance);
        let fills = std::mem::replace(&mut self.fills, saved);
        (errors, fills)
    }

    fn is_match(&mut self, pattern: &str, value: &str) -> Option<bool> {
        if !self.regexes.contains_key(pattern) {
            let compiled = Regex::new(pattern).ok();
            if compiled.is_none() {
                log::warn!("skipping uncompilable pattern {pattern:?}");
            }
            self.regexes.insert(pattern.to_owned(), compiled);
        }
        self.regexes
            .get(pattern)
            .and_then(|slot| slot.as_ref())
            .map(|regex| regex.is_match(value))
    }

    fn instance_pointer(&self) -> String {
        JsonPointer::new(self.instance_tokens.clone()).to_string()
    }

    fn error(&self, keyword: &'static str, kind: ErrorKind) -> ValidationError {
        ValidationError::new(
            JsonPointer::new(self.instance_tokens.clone()),
            keyword,
            kind,
        )
    }
}

/// Division with a tolerance scaled to the operands, so `10` is a
/// multiple of `0.1` despite the binary representation.
fn is_multiple_of(value: f64, factor: f64) -> bool {
    let quotient = value / factor;
    if quotient.fract() == 0.0 {
        return true;
    }
    let nearest = quotient.round();
    (nearest * factor - value).abs() <= f64::EPSILON * value.abs().max(factor.abs()) * 4.0
}
