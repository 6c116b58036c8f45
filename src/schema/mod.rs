//! Typed account schema: access levels, identity keys, and field rules.
//!
//! The schema is loaded once at startup and never mutated. Every dotted path
//! is parsed and cross-checked at load time so unknown keys, unknown access
//! levels, and misplaced verify flags abort startup instead of failing deep
//! inside request handling.

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("unknown access level {level:?} referenced by {path:?}")]
    UnknownLevel { level: String, path: String },
    #[error("identity key {key:?} has no field rule")]
    UnknownIdentityKey { key: String },
    #[error("verify flag {verify:?} must live in the partition of identity key {key:?}")]
    VerifyOutsideKeyPartition { verify: String, key: String },
    #[error("duplicate access level {level:?}")]
    DuplicateLevel { level: String },
    #[error("no access levels configured")]
    NoAccessLevels,
    #[error("no identity keys configured")]
    NoIdentityKeys,
    #[error("skeleton must be an object keyed by access level")]
    InvalidSkeleton,
    #[error("failed to parse schema file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What a schema field is for. Anything that is not a password is plain data
/// as far as credential checks are concerned.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Password,
    #[serde(other)]
    Data,
}

/// A parsed dotted path. The first segment selects the access-level
/// partition; the rest address a field inside the stored document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    fn parse(raw: &str) -> Result<Self, SchemaError> {
        let invalid = |reason| SchemaError::InvalidPath {
            path: raw.to_string(),
            reason,
        };
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.len() < 2 {
            return Err(invalid("need an access level and at least one field segment"));
        }
        let well_formed =
            Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").is_ok_and(|re| {
                segments.iter().all(|segment| re.is_match(segment))
            });
        if !well_formed {
            return Err(invalid("segments must match [A-Za-z][A-Za-z0-9_]*"));
        }
        Ok(Self { segments })
    }

    /// Access-level partition this path points into.
    #[must_use]
    pub fn level(&self) -> &str {
        &self.segments[0]
    }

    /// Path segments inside the partition document.
    #[must_use]
    pub fn field(&self) -> &[String] {
        &self.segments[1..]
    }

    /// All segments, level first. This is the shape submitted candidates use.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// In-document path as a dotted string, for store filters.
    #[must_use]
    pub fn dotted_field(&self) -> String {
        self.field().join(".")
    }

    /// Compare against a raw dotted key without allocating.
    #[must_use]
    pub fn matches(&self, dotted: &str) -> bool {
        self.segments.iter().map(String::as_str).eq(dotted.split('.'))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Resolved rule for one schema field.
#[derive(Clone, Debug)]
pub struct FieldRule {
    path: FieldPath,
    kind: FieldKind,
    hash: bool,
    verify: Option<FieldPath>,
}

impl FieldRule {
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub fn hash(&self) -> bool {
        self.hash
    }

    #[must_use]
    pub fn verify(&self) -> Option<&FieldPath> {
        self.verify.as_ref()
    }

    #[must_use]
    pub fn is_password(&self) -> bool {
        self.kind == FieldKind::Password
    }
}

/// One configured identity lookup: a field path plus the verify flag that
/// must be true in the stored record for a match to count.
#[derive(Clone, Debug)]
pub struct IdentityKey {
    path: FieldPath,
    verify: Option<FieldPath>,
}

impl IdentityKey {
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    #[must_use]
    pub fn verify(&self) -> Option<&FieldPath> {
        self.verify.as_ref()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawRule {
    #[serde(default)]
    verify: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<FieldKind>,
    #[serde(default)]
    hash: bool,
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    access_levels: Vec<String>,
    identity_keys: Vec<String>,
    #[serde(default)]
    fields: BTreeMap<String, RawRule>,
    #[serde(default)]
    skeleton: Option<Value>,
}

/// Immutable account schema, shared process-wide after startup.
#[derive(Debug)]
pub struct AuthSchema {
    access_levels: Vec<String>,
    identity_keys: Vec<IdentityKey>,
    fields: BTreeMap<String, FieldRule>,
    skeleton: Value,
}

impl AuthSchema {
    /// Parse and validate a schema file.
    ///
    /// # Errors
    /// Returns a [`SchemaError`] for malformed JSON, malformed dotted paths,
    /// references to unknown access levels, identity keys without a field
    /// rule, or verify flags outside their identity key's partition.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = serde_json::from_str(raw)?;

        if file.access_levels.is_empty() {
            return Err(SchemaError::NoAccessLevels);
        }
        for (index, level) in file.access_levels.iter().enumerate() {
            if file.access_levels[..index].contains(level) {
                return Err(SchemaError::DuplicateLevel {
                    level: level.clone(),
                });
            }
        }
        if file.identity_keys.is_empty() {
            return Err(SchemaError::NoIdentityKeys);
        }

        let known_level = |path: &FieldPath| file.access_levels.iter().any(|level| level == path.level());

        let mut fields = BTreeMap::new();
        for (key, raw_rule) in &file.fields {
            let path = FieldPath::parse(key)?;
            if !known_level(&path) {
                return Err(SchemaError::UnknownLevel {
                    level: path.level().to_string(),
                    path: key.clone(),
                });
            }
            let verify = match &raw_rule.verify {
                Some(verify_key) => {
                    let verify_path = FieldPath::parse(verify_key)?;
                    if !known_level(&verify_path) {
                        return Err(SchemaError::UnknownLevel {
                            level: verify_path.level().to_string(),
                            path: verify_key.clone(),
                        });
                    }
                    Some(verify_path)
                }
                None => None,
            };
            fields.insert(
                key.clone(),
                FieldRule {
                    path,
                    kind: raw_rule.kind.unwrap_or(FieldKind::Data),
                    hash: raw_rule.hash,
                    verify,
                },
            );
        }

        let mut identity_keys = Vec::with_capacity(file.identity_keys.len());
        for key in &file.identity_keys {
            let rule = fields
                .get(key)
                .ok_or_else(|| SchemaError::UnknownIdentityKey { key: key.clone() })?;
            if let Some(verify) = rule.verify() {
                // The verify predicate is folded into the same partition
                // query as the key, so it cannot point elsewhere.
                if verify.level() != rule.path().level() {
                    return Err(SchemaError::VerifyOutsideKeyPartition {
                        verify: verify.to_string(),
                        key: key.clone(),
                    });
                }
            }
            identity_keys.push(IdentityKey {
                path: rule.path().clone(),
                verify: rule.verify().cloned(),
            });
        }

        let skeleton = match file.skeleton {
            Some(skeleton) => {
                let Some(by_level) = skeleton.as_object() else {
                    return Err(SchemaError::InvalidSkeleton);
                };
                for level in by_level.keys() {
                    if !file.access_levels.contains(level) {
                        return Err(SchemaError::UnknownLevel {
                            level: level.clone(),
                            path: "skeleton".to_string(),
                        });
                    }
                }
                skeleton
            }
            None => Value::Object(Map::new()),
        };

        Ok(Self {
            access_levels: file.access_levels,
            identity_keys,
            fields,
            skeleton,
        })
    }

    /// Configured access levels, in partition-write order.
    #[must_use]
    pub fn access_levels(&self) -> &[String] {
        &self.access_levels
    }

    /// Identity keys in configured evaluation order.
    #[must_use]
    pub fn identity_keys(&self) -> &[IdentityKey] {
        &self.identity_keys
    }

    /// Rule for a dotted field key, if one is configured.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&FieldRule> {
        self.fields.get(key)
    }

    /// Identity key matching a raw dotted key, if configured.
    #[must_use]
    pub fn identity_key(&self, dotted: &str) -> Option<&IdentityKey> {
        self.identity_keys.iter().find(|key| key.path().matches(dotted))
    }

    /// All password-typed field rules.
    pub fn password_fields(&self) -> impl Iterator<Item = &FieldRule> {
        self.fields.values().filter(|rule| rule.is_password())
    }

    /// Per-access-level defaults merged under sign-up candidates.
    #[must_use]
    pub fn skeleton(&self) -> &Value {
        &self.skeleton
    }
}

/// Walk `segments` through nested objects.
#[must_use]
pub fn value_at<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = current.get(segment.as_ref())?;
    }
    Some(current)
}

/// Set a nested value, creating intermediate objects. A non-object in the
/// way is replaced, matching update-wins merge semantics.
pub fn set_value<S: AsRef<str>>(root: &mut Value, segments: &[S], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };
    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Some(map) = current.as_object_mut() else {
            return;
        };
        current = map
            .entry(segment.as_ref().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(last.as_ref().to_string(), value);
    }
}
