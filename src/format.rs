//! Named string-format checks.
//!
//! Validation runs the checks named in
//! [`Config::enabled_formats`](../validator/struct.Config.html); a
//! default configuration enables all of [`DEFAULT_FORMATS`]. A format
//! name this module does not know is ignored, as draft-6 requires.

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::Url;

/// The format names a default
/// [`Config`](../validator/struct.Config.html) enforces.
pub const DEFAULT_FORMATS: [&str; 12] = [
    "date-time",
    "date",
    "time",
    "email",
    "hostname",
    "ipv4",
    "ipv6",
    "uri",
    "uri-reference",
    "uri-template",
    "json-pointer",
    "regex",
];

/// Runs the named format check against a string.
///
/// Returns `None` when the format name is unknown, `Some(valid)`
/// otherwise.
pub fn check(name: &str, value: &str) -> Option<bool> {
    match name {
        "date-time" => Some(DateTime::parse_from_rfc3339(value).is_ok()),
        "date" => Some(NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()),
        "time" => Some(is_time(value)),
        "email" => Some(is_email(value)),
        "hostname" => Some(is_hostname(value)),
        "ipv4" => Some(value.parse::<Ipv4Addr>().is_ok()),
        "ipv6" => Some(value.parse::<Ipv6Addr>().is_ok()),
        "uri" => Some(Url::parse(value).is_ok()),
        "uri-reference" => Some(is_uri_reference(value)),
        "uri-template" => Some(is_uri_template(value)),
        "json-pointer" => Some(is_json_pointer(value)),
        "regex" => Some(Regex::new(value).is_ok()),
        _ => None,
    }
}

/// RFC 3339 full-time: a time of day plus a mandatory offset.
fn is_time(value: &str) -> bool {
    let (time, offset) = if let Some(rest) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        (rest, None)
    } else if let Some(position) = value.rfind(|c| c == '+' || c == '-') {
        (&value[..position], Some(&value[position + 1..]))
    } else {
        return false;
    };
    if let Some(offset) = offset {
        if NaiveTime::parse_from_str(offset, "%H:%M").is_err() {
            return false;
        }
    }
    NaiveTime::parse_from_str(time, "%H:%M:%S%.f").is_ok()
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// RFC 1034 host names: dot-separated labels of letters, digits and
/// hyphens, 63 octets per label, 253 total.
fn is_hostname(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_uri_reference(value: &str) -> bool {
    match Url::parse(value) {
        Ok(_) => true,
        // A relative reference is fine; it just has no scheme to parse.
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            !value.chars().any(|c| c == ' ' || c == '<' || c == '>' || c == '"')
                && value.matches('#').count() <= 1
        }
        Err(_) => false,
    }
}

/// RFC 6570 templates, to the depth draft-6 cares about: balanced,
/// non-nested braces and no raw whitespace.
fn is_uri_template(value: &str) -> bool {
    let mut open = false;
    for c in value.chars() {
        match c {
            '{' => {
                if open {
                    return false;
                }
                open = true;
            }
            '}' => {
                if !open {
                    return false;
                }
                open = false;
            }
            ' ' | '<' | '>' => return false,
            _ => {}
        }
    }
    !open
}

fn is_json_pointer(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.peek(), Some('0') | Some('1')) {
            return false;
        }
    }
    true
}
