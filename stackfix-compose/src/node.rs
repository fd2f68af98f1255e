//! Closed node model for compose documents.
//!
//! `docker compose config` output is parsed into [`Node`]s instead of being walked as loose
//! `serde_yaml::Value`s. Mappings are `BTreeMap`s, so iteration and serialization are sorted.

use crate::error::{FixupError, FixupResult};
use serde::ser::{Serialize, Serializer};
use serde_yaml::{Number, Value};
use std::collections::BTreeMap;

pub type Mapping = BTreeMap<String, Node>;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Node {
    #[default]
    Null,
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

impl Node {
    pub fn string(s: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }

    /// Human-readable shape name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Scalar(Scalar::Bool(_)) => "a boolean",
            Node::Scalar(Scalar::Number(_)) => "a number",
            Node::Scalar(Scalar::String(_)) => "a string",
            Node::Sequence(_) => "a sequence",
            Node::Mapping(_) => "a mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?.get(key)
    }

    /// Walk mapping keys and sequence indices, e.g. `["services", "web", "ports", "0"]`.
    pub fn lookup(&self, path: &[&str]) -> Option<&Node> {
        path.iter().try_fold(self, |node, segment| match node {
            Node::Mapping(map) => map.get(*segment),
            Node::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    pub(crate) fn from_yaml(value: Value, path: &str) -> FixupResult<Node> {
        Ok(match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Sequence(items) => Node::Sequence(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| Node::from_yaml(item, &format!("{path}[{i}]")))
                    .collect::<FixupResult<_>>()?,
            ),
            Value::Mapping(map) => {
                let mut out = Mapping::new();
                for (key, item) in map {
                    let key = mapping_key(key, path)?;
                    let item_path = join(path, &key);
                    let node = Node::from_yaml(item, &item_path)?;
                    if out.insert(key, node).is_some() {
                        return Err(FixupError::Shape {
                            path: item_path,
                            expected: "a unique key",
                            found: "a key that collides with another once stringified",
                        });
                    }
                }
                Node::Mapping(out)
            }
            Value::Tagged(_) => {
                return Err(FixupError::Shape {
                    path: display_path(path),
                    expected: "an untagged node",
                    found: "a tagged node",
                });
            }
        })
    }
}

fn mapping_key(key: Value, path: &str) -> FixupResult<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        _ => Err(FixupError::Shape {
            path: display_path(path),
            expected: "a mapping with scalar keys",
            found: "a non-scalar key",
        }),
    }
}

pub(crate) fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Number(n) => n.serialize(serializer),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Scalar(scalar) => scalar.serialize(serializer),
            Node::Sequence(items) => items.serialize(serializer),
            Node::Mapping(map) => map.serialize(serializer),
        }
    }
}

/// How compose's list shorthand maps onto the long mapping form.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ListForm {
    /// `[a, b]` → `{a: null, b: null}` (service networks).
    Names,
    /// `["K=V", "K"]` → `{K: V, K: null}` (environment, labels).
    KeyValue,
}

impl ListForm {
    fn to_mapping(self, items: &[Node], path: &str) -> FixupResult<Mapping> {
        let mut out = Mapping::new();
        for (i, item) in items.iter().enumerate() {
            let Some(entry) = item.as_str() else {
                return Err(FixupError::shape(&format!("{path}[{i}]"), "a string", item));
            };
            match (self, entry.split_once('=')) {
                (ListForm::KeyValue, Some((key, value))) => {
                    out.insert(key.to_string(), Node::string(value));
                }
                _ => {
                    out.insert(entry.to_string(), Node::Null);
                }
            }
        }
        Ok(out)
    }
}

/// The mapping stored under `key`, created when absent or null and converted from list form.
pub(crate) fn ensure_mapping<'a>(
    parent: &'a mut Mapping,
    key: &str,
    path: &str,
    form: ListForm,
) -> FixupResult<&'a mut Mapping> {
    let slot = parent.entry(key.to_string()).or_insert(Node::Null);

    let replacement = match &*slot {
        Node::Null => Some(Mapping::new()),
        Node::Sequence(items) => Some(form.to_mapping(items, path)?),
        _ => None,
    };
    if let Some(map) = replacement {
        *slot = Node::Mapping(map);
    }

    match slot {
        Node::Mapping(map) => Ok(map),
        other => Err(FixupError::shape(path, "a mapping", other)),
    }
}

/// A top-level section such as `services`; absent and null both mean "no entries".
pub(crate) fn section<'a>(root: &'a Mapping, key: &str) -> FixupResult<Option<&'a Mapping>> {
    match root.get(key) {
        None | Some(Node::Null) => Ok(None),
        Some(Node::Mapping(map)) => Ok(Some(map)),
        Some(other) => Err(FixupError::shape(key, "a mapping", other)),
    }
}

pub(crate) fn section_mut<'a>(
    root: &'a mut Mapping,
    key: &str,
) -> FixupResult<Option<&'a mut Mapping>> {
    match root.get_mut(key) {
        None | Some(Node::Null) => Ok(None),
        Some(Node::Mapping(map)) => Ok(Some(map)),
        Some(other) => Err(FixupError::shape(key, "a mapping", other)),
    }
}
