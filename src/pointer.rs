//! Reference parsing, JSON Pointer tokens, and base-URI composition.
//!
//! Draft-6 references come in three shapes: a same-document fragment
//! (`#/definitions/node`), a bare URI (`http://example.com/item.json` or
//! `other.json`), or a URI carrying a fragment
//! (`other.json#/definitions/node`). [`Reference::parse`] classifies a
//! reference against the current base namespace; [`Reference::key`]
//! produces the canonical key used by the
//! [`Registry`](../registry/struct.Registry.html) pool.

use url::Url;

/// A `$ref` string parsed against a base namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The namespace the reference points into. For same-document
    /// fragments this is the base namespace unchanged; otherwise it is
    /// the reference's URI part resolved against the base.
    pub namespace: String,

    /// Whether the reference carried a `#` fragment.
    pub is_pointer: bool,

    /// Unescaped pointer tokens from the fragment, empty for bare URIs.
    pub path: Vec<String>,
}

impl Reference {
    /// Parses a reference string relative to a base namespace.
    pub fn parse(base: &str, reference: &str) -> Reference {
        if let Some(fragment) = reference.strip_prefix('#') {
            Reference {
                namespace: base.to_owned(),
                is_pointer: true,
                path: tokens(fragment),
            }
        } else if let Some(hash) = reference.find('#') {
            Reference {
                namespace: compose(base, &reference[..hash]),
                is_pointer: true,
                path: tokens(&reference[hash + 1..]),
            }
        } else {
            Reference {
                namespace: compose(base, reference),
                is_pointer: false,
                path: Vec::new(),
            }
        }
    }

    /// The canonical key this reference occupies in a schema pool.
    ///
    /// Pointer references render as `namespace#token/token`; bare URI
    /// references are their namespace alone, which is also the key the
    /// id collector uses when inserting an `$id`-bearing subschema.
    pub fn key(&self) -> String {
        if self.is_pointer || !self.path.is_empty() {
            format!("{}#{}", self.namespace, self.path.join("/"))
        } else {
            self.namespace.clone()
        }
    }
}

/// Splits a pointer string into unescaped tokens.
///
/// Accepts both fragment tails (`/definitions/node`) and plain-name
/// fragments (`node`); empty tokens produced by leading or doubled
/// slashes are dropped.
pub fn tokens(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .filter(|token| !token.is_empty())
        .map(unescape)
        .collect()
}

/// Reverses JSON Pointer escaping: `~1` becomes `/`, `~0` becomes `~`.
pub fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Combines a base namespace with an `$id` value.
///
/// When the base parses as an absolute URL the id is joined against it
/// per RFC 3986, which covers relative paths, network-path references
/// and fragments alike. Opaque bases (draft-6 permits ids like
/// `"root"`) fall back to replacement, since there is nothing to
/// resolve against.
pub fn compose(base: &str, id: &str) -> String {
    if id.is_empty() {
        return base.to_owned();
    }
    if !base.is_empty() {
        if let Ok(url) = Url::parse(base) {
            if let Ok(joined) = url.join(id) {
                return joined.to_string();
            }
        }
    }
    // Absolute ids are normalized so pool keys match however they are
    // reached; anything else is kept verbatim.
    match Url::parse(id) {
        Ok(url) => url.to_string(),
        Err(_) => id.to_owned(),
    }
}
