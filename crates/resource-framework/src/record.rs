//! # Records
//!
//! Every decoded payload is represented as a [`Record`]: an insertion-ordered
//! map from string keys to [`Value`]s. Server keys are free-form and frequently
//! contain separators (`email.to`, `eai:acl`, `check-new`), so the key space is
//! flat and keys are stored verbatim. Nested access over dotted keys is an
//! explicit request made through [`Record::group`], never an implicit split.
//!
//! ## Access modes
//!
//! | Method | Missing key |
//! |--------|-------------|
//! | [`Record::get`] | `None` (mapping-style probe) |
//! | [`Record::item`] | [`ResourceError::NoSuchKey`] (index-style) |
//! | [`Record::group`] | [`ResourceError::NoSuchKey`] when no `key.` entries exist |
//! | [`Record::resolve`] | exact key first, then the dotted group |

use crate::error::{ResourceError, Result};
use linked_hash_map::LinkedHashMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

const SEPARATOR: char = '.';

/// A decoded value: text, a sequence, a nested record, or nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    /// Text content. Elements that carried attributes as well as text decode
    /// to a record with a `$text` key, which is also honoured here.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Record(record) => record.get("$text").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Normalizes "one or many" into a sequence: a list is returned as is,
    /// `Null` becomes empty and any other value becomes a one-element list.
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    /// The text items of a (possibly single-valued) list.
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Value::List(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            other => other.as_str().map(|s| vec![s.to_string()]).unwrap_or_default(),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// An ordered, flat key/value container.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: LinkedHashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Inserts or replaces a value, keeping the original position of an
    /// existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.fields.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.insert(key, value);
                None
            }
        }
    }

    /// Inserts a value, promoting an existing value under the same key to a
    /// list so repeated elements keep document order.
    pub fn append(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.fields.get_mut(&key) {
            Some(Value::List(items)) => items.push(value),
            Some(slot) => {
                let first = std::mem::take(slot);
                *slot = Value::List(vec![first, value]);
            }
            None => {
                self.fields.insert(key, value);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Text value of a key, if present and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Index-style access: the key must exist.
    pub fn item(&self, key: &str) -> Result<&Value> {
        self.fields
            .get(key)
            .ok_or_else(|| ResourceError::NoSuchKey(key.to_string()))
    }

    /// Collects every `prefix.`-keyed entry into a nested record, one level of
    /// nesting per separator: `email.body.salutation` is reachable as
    /// `group("email")` → `body` → `salutation`.
    pub fn group(&self, prefix: &str) -> Result<Record> {
        let head = format!("{prefix}{SEPARATOR}");
        let mut result = Record::new();
        for (key, value) in self.fields.iter() {
            let Some(suffix) = key.strip_prefix(&head) else {
                continue;
            };
            let path: Vec<&str> = suffix.split(SEPARATOR).collect();
            result.insert_path(&path, value.clone());
        }
        if result.is_empty() {
            return Err(ResourceError::NoSuchKey(prefix.to_string()));
        }
        Ok(result)
    }

    /// Exact key first, then the dotted group for that key.
    pub fn resolve(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.get(key) {
            return Some(value.clone());
        }
        self.group(key).ok().map(Value::Record)
    }

    /// A sub-record holding only the named keys, each of which must exist.
    pub fn select<S: AsRef<str>>(&self, keys: &[S]) -> Result<Record> {
        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                self.item(key).map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    fn insert_path(&mut self, path: &[&str], value: Value) {
        match path {
            [] => {}
            [last] => {
                self.insert(*last, value);
            }
            [head, rest @ ..] => {
                let slot = self
                    .fields
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Record(Record::new()));
                if let Value::Record(child) = slot {
                    child.insert_path(rest, value);
                } else {
                    let mut child = Record::new();
                    child.insert_path(rest, value);
                    *slot = Value::Record(child);
                }
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = linked_hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Text(text) => serializer.serialize_str(text),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Record(record) => record.serialize(serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.fields.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_record() -> Record {
        [
            ("email.to", "boris@utopia.net"),
            ("email.action", "1"),
            ("email.body.salutation", "Dear"),
            ("disabled", "0"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_item_missing_key_is_an_error() {
        let record = email_record();
        assert_eq!(record.item("disabled").unwrap().as_str(), Some("0"));
        assert!(matches!(record.item("email"), Err(ResourceError::NoSuchKey(k)) if k == "email"));
    }

    #[test]
    fn test_dotted_keys_are_stored_verbatim() {
        let record = email_record();
        assert_eq!(record.text("email.to"), Some("boris@utopia.net"));
        assert!(!record.contains_key("email"));
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, ["email.to", "email.action", "email.body.salutation", "disabled"]);
    }

    #[test]
    fn test_group_nests_on_separator() {
        let record = email_record();
        let email = record.group("email").unwrap();
        assert_eq!(email.text("to"), Some("boris@utopia.net"));
        let body = email.get("body").and_then(Value::as_record).unwrap();
        assert_eq!(body.text("salutation"), Some("Dear"));
        assert!(record.group("nothing").is_err());
    }

    #[test]
    fn test_resolve_prefers_exact_key() {
        let mut record = email_record();
        assert!(matches!(record.resolve("email"), Some(Value::Record(_))));
        record.insert("email", "exact");
        assert_eq!(record.resolve("email"), Some(Value::from("exact")));
        assert_eq!(record.resolve("missing"), None);
    }

    #[test]
    fn test_append_promotes_to_list() {
        let mut record = Record::new();
        record.append("link", Value::from("a"));
        record.append("link", Value::from("b"));
        record.append("link", Value::from("c"));
        assert_eq!(
            record.get("link").unwrap().to_strings(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_select_and_insert_keep_order() {
        let mut record = email_record();
        record.insert("email.to", "someone@else.org");
        assert_eq!(record.keys().next().map(String::as_str), Some("email.to"));
        let picked = record.select(&["disabled", "email.action"]).unwrap();
        assert_eq!(picked.len(), 2);
        assert!(record.select(&["absent"]).is_err());
    }

    #[test]
    fn test_serializes_to_json_shapes() {
        let mut record = Record::new();
        record.insert("name", "main");
        record.insert("tags", Value::List(vec!["a".into(), "b".into()]));
        record.insert("empty", Value::Null);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"main","tags":["a","b"],"empty":null}"#);
    }
}
