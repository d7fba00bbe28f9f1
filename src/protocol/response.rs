//! Response definitions
//!
//! Structured results produced by the response grammar parsers.

use std::collections::btree_map::{self, BTreeMap};

use crate::error::{MpdError, Result};

/// Value of one field in a parsed object
///
/// A key seen once holds a single string. Each repeat of the key inside
/// the same object upgrades it to (or extends) an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Merge another occurrence of the same key
    pub fn push(&mut self, value: String) {
        match self {
            FieldValue::Single(first) => {
                let first = std::mem::take(first);
                *self = FieldValue::Multiple(vec![first, value]);
            }
            FieldValue::Multiple(values) => values.push(value),
        }
    }

    /// The first value recorded for the key
    pub fn first(&self) -> &str {
        match self {
            FieldValue::Single(value) => value,
            FieldValue::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::Multiple(_) => None,
        }
    }

    /// All values in arrival order
    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(value) => vec![value.as_str()],
            FieldValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, FieldValue::Multiple(_))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl<S: Into<String>> From<Vec<S>> for FieldValue {
    fn from(values: Vec<S>) -> Self {
        FieldValue::Multiple(values.into_iter().map(Into::into).collect())
    }
}

/// One decoded record: lower-cased key → value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Object {
    fields: BTreeMap<String, FieldValue>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one key/value pair, applying the repeated-key merge rule
    pub fn insert(&mut self, key: &str, value: String) {
        match self.fields.entry(key.to_lowercase()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(FieldValue::Single(value));
            }
            btree_map::Entry::Occupied(mut slot) => slot.get_mut().push(value),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// First value of `key`, the common case for single-valued fields
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(FieldValue::first)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Lazy sequence of objects split on boundary keys
///
/// Single pass: each object is assembled only when it is pulled.
#[derive(Debug)]
pub struct Objects {
    pairs: std::vec::IntoIter<(String, String)>,
    boundaries: Vec<String>,
    current: Object,
}

impl Objects {
    pub(crate) fn new(pairs: Vec<(String, String)>, boundaries: &[&str]) -> Self {
        Self {
            pairs: pairs.into_iter(),
            boundaries: boundaries.iter().map(|b| b.to_lowercase()).collect(),
            current: Object::new(),
        }
    }
}

impl Iterator for Objects {
    type Item = Object;

    fn next(&mut self) -> Option<Object> {
        for (key, value) in self.pairs.by_ref() {
            let key = key.to_lowercase();
            // A boundary key only closes an object that already has fields
            let finished = if self.boundaries.iter().any(|b| *b == key) && !self.current.is_empty() {
                Some(std::mem::take(&mut self.current))
            } else {
                None
            };

            self.current.insert(&key, value);

            if finished.is_some() {
                return finished;
            }
        }

        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }
}

/// Structured result of one command
#[derive(Debug)]
pub enum Response {
    /// Command has no payload
    Nothing,

    /// Single value, or None when the reply did not hold exactly one line
    Item(Option<String>),

    /// Homogeneous list of one repeated field
    List(Vec<String>),

    /// Single object
    Object(Object),

    /// Sequence of objects
    Objects(Objects),
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Nothing => "nothing",
            Response::Item(_) => "item",
            Response::List(_) => "list",
            Response::Object(_) => "object",
            Response::Objects(_) => "objects",
        }
    }

    pub fn into_nothing(self) -> Result<()> {
        match self {
            Response::Nothing => Ok(()),
            other => Err(other.mismatch("nothing")),
        }
    }

    pub fn into_item(self) -> Result<Option<String>> {
        match self {
            Response::Item(item) => Ok(item),
            other => Err(other.mismatch("item")),
        }
    }

    pub fn into_list(self) -> Result<Vec<String>> {
        match self {
            Response::List(values) => Ok(values),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn into_object(self) -> Result<Object> {
        match self {
            Response::Object(object) => Ok(object),
            other => Err(other.mismatch("object")),
        }
    }

    pub fn into_objects(self) -> Result<Objects> {
        match self {
            Response::Objects(objects) => Ok(objects),
            other => Err(other.mismatch("objects")),
        }
    }

    fn mismatch(&self, expected: &str) -> MpdError {
        MpdError::Protocol(format!(
            "Expected {} response, got {}",
            expected,
            self.kind()
        ))
    }
}
