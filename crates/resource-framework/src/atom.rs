//! # Atom Decoder
//!
//! Turns raw Atom/XML response bodies into [`Record`]s and [`ParsedEntry`]s.
//!
//! ## Decoding rules
//!
//! Elements are compared by local name, so `s:dict` and `dict` are the same
//! thing. The conversion from elements to values is structural:
//!
//! - `<s:dict>` becomes a [`Record`] keyed by each `<s:key name="...">`.
//! - `<s:list>` becomes a [`Value::List`] of its `<s:item>` values.
//! - A leaf element becomes its trimmed text, or [`Value::Null`] when empty.
//! - An element whose only child is a dict or list becomes that dict or list.
//! - Any other element becomes a record of its children; a repeated child name
//!   becomes a list in document order.
//! - Attributes are merged into the element's value (`$text` holds the text
//!   when an element has both).
//!
//! ## Match paths
//!
//! [`decode`] accepts an optional match path such as `"entry"` or
//! `"entry/content/*"`, evaluated against the children of the document root.
//! Subtrees that cannot lie on the path are skipped by the reader instead of
//! being materialized.
//!
//! ```rust
//! use resource_framework::atom;
//!
//! let body = br#"<feed xmlns="http://www.w3.org/2005/Atom"
//!                      xmlns:s="http://dev.splunk.com/ns/rest">
//!   <entry>
//!     <title>main</title>
//!     <link href="/services/data/indexes/main" rel="alternate"/>
//!     <content type="text/xml"><s:dict><s:key name="disabled">0</s:key></s:dict></content>
//!   </entry>
//! </feed>"#;
//!
//! let entries = atom::load_entries(body).unwrap().unwrap();
//! let entry = atom::parse_entry(&entries[0]);
//! assert_eq!(entry.title, "main");
//! assert_eq!(entry.alternate(), Some("/services/data/indexes/main"));
//! assert_eq!(entry.content.text("disabled"), Some("0"));
//! assert!(!entry.content.contains_key("type"));
//! ```

use crate::error::{ResourceError, Result};
use crate::record::{Record, Value};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;

/// Entries that are direct children of the document root.
pub const MATCH_ENTRY: &str = "entry";
/// The content values of every entry.
pub const MATCH_ENTRY_CONTENT: &str = "entry/content/*";

const KEY_ACCESS: &str = "eai:acl";
const KEY_ATTRIBUTES: &str = "eai:attributes";
const KEY_TYPE: &str = "type";
const RESERVED_CONTENT_KEYS: [&str; 3] = [KEY_ACCESS, KEY_ATTRIBUTES, KEY_TYPE];

/// Required, optional and wildcard field names a resource accepts.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FieldSchema {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub wildcard: Vec<String>,
}

impl From<FieldSchema> for Value {
    fn from(schema: FieldSchema) -> Self {
        let list = |names: Vec<String>| Value::List(names.into_iter().map(Value::from).collect());
        let mut record = Record::new();
        record.insert("required", list(schema.required));
        record.insert("optional", list(schema.optional));
        record.insert("wildcard", list(schema.wildcard));
        Value::Record(record)
    }
}

/// Access-control and field-schema metadata hoisted out of entry content.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EntryMetadata {
    pub access: Option<Record>,
    pub fields: Option<FieldSchema>,
}

/// One decoded resource: title, links by relation, metadata and the
/// user-visible content (reserved keys removed).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParsedEntry {
    pub title: String,
    pub links: Record,
    pub access: Option<Record>,
    pub fields: Option<FieldSchema>,
    pub content: Record,
}

impl ParsedEntry {
    pub fn link(&self, rel: &str) -> Option<&str> {
        self.links.text(rel)
    }

    /// The resource's own address.
    pub fn alternate(&self) -> Option<&str> {
        self.link("alternate")
    }
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn is_dict(&self) -> bool {
        self.name == "dict"
    }

    fn is_list(&self) -> bool {
        self.name == "list"
    }
}

/// Parses a document into a [`Value`] tree, optionally keeping only the
/// subtrees selected by `filter`. Empty bodies decode to `None`, as do match
/// paths that select nothing; several matches decode to a list.
pub fn decode(body: &[u8], filter: Option<&str>) -> Result<Option<Value>> {
    let text = std::str::from_utf8(body)?.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let segments: Option<Vec<&str>> = filter.map(|f| f.split('/').collect());
    let Some(root) = parse(text, segments.as_deref())? else {
        return Ok(None);
    };

    let items = match &segments {
        Some(segments) => select(&root, segments),
        None => vec![&root],
    };
    Ok(match items.as_slice() {
        [] => None,
        [item] => Some(load_root(item)),
        items => Some(Value::List(items.iter().map(|item| load_root(item)).collect())),
    })
}

/// The entries of a feed, normalized to a sequence. `None` when the feed has
/// no entries.
pub fn load_entries(body: &[u8]) -> Result<Option<Vec<Record>>> {
    let root = decode_record(body)?;
    let feed = root
        .get("feed")
        .ok_or_else(|| ResourceError::Decode("expected an Atom feed".to_string()))?;
    let Some(entries) = feed.as_record().and_then(|feed| feed.get("entry")) else {
        return Ok(None);
    };
    let entries = entries
        .clone()
        .into_list()
        .into_iter()
        .map(|entry| match entry {
            Value::Record(record) => record,
            _ => Record::new(),
        })
        .collect();
    Ok(Some(entries))
}

/// The first entry of a feed-rooted document.
pub fn load_feed_entry(body: &[u8]) -> Result<Record> {
    let matched = decode(body, Some(MATCH_ENTRY))?
        .ok_or_else(|| ResourceError::Decode("response has no entry".to_string()))?;
    let first = matched.into_list().into_iter().next();
    first
        .as_ref()
        .and_then(Value::as_record)
        .and_then(|wrapper| wrapper.get("entry"))
        .and_then(Value::as_record)
        .cloned()
        .ok_or_else(|| ResourceError::Decode("response has no entry".to_string()))
}

/// The entry of either document shape: the first entry of a feed, or the
/// root element when the document is an entry itself.
pub fn load_entry(body: &[u8]) -> Result<Record> {
    let root = decode_record(body)?;
    if let Some(entry) = root.get("entry").and_then(Value::as_record) {
        return Ok(entry.clone());
    }
    root.get("feed")
        .and_then(Value::as_record)
        .and_then(|feed| feed.get("entry"))
        .and_then(|entry| match entry {
            Value::List(entries) => entries.first(),
            other => Some(other),
        })
        .and_then(Value::as_record)
        .cloned()
        .ok_or_else(|| ResourceError::Decode("response has no entry".to_string()))
}

/// The content record of the first entry, without the entry envelope.
pub fn load_content(body: &[u8]) -> Result<Record> {
    let content = decode(body, Some(MATCH_ENTRY_CONTENT))?;
    Ok(content
        .map(Value::into_list)
        .and_then(|items| items.into_iter().next())
        .and_then(|value| match value {
            Value::Record(record) => Some(record),
            _ => None,
        })
        .unwrap_or_default())
}

/// The job identifier from a `<response><sid>` document.
pub fn load_sid(body: &[u8]) -> Result<String> {
    load_response_field(body, "sid")
}

/// A text field of a `<response>` document.
pub fn load_response_field(body: &[u8], key: &str) -> Result<String> {
    decode_record(body)?
        .get("response")
        .and_then(Value::as_record)
        .and_then(|response| response.text(key))
        .map(str::to_string)
        .ok_or_else(|| ResourceError::Decode(format!("response has no {key}")))
}

/// Splits a decoded entry into title, links, metadata and visible content.
pub fn parse_entry(entry: &Record) -> ParsedEntry {
    let title = entry.text("title").unwrap_or_default().to_string();

    let links = entry
        .get("link")
        .cloned()
        .unwrap_or_default()
        .into_list()
        .iter()
        .filter_map(|link| {
            let link = link.as_record()?;
            Some((link.text("rel")?.to_string(), link.text("href")?.to_string()))
        })
        .collect();

    let content = entry
        .get("content")
        .and_then(Value::as_record)
        .cloned()
        .unwrap_or_default();
    let metadata = parse_metadata(&content);
    let content = strip_reserved(&content);

    ParsedEntry {
        title,
        links,
        access: metadata.access,
        fields: metadata.fields,
        content,
    }
}

/// Content without the access descriptor, field schema and type keys.
pub fn strip_reserved(content: &Record) -> Record {
    content
        .iter()
        .filter(|(key, _)| !RESERVED_CONTENT_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Hoists the access descriptor and field schema out of a content record.
pub fn parse_metadata(content: &Record) -> EntryMetadata {
    let access = content
        .get(KEY_ACCESS)
        .and_then(Value::as_record)
        .cloned();
    let fields = content
        .get(KEY_ATTRIBUTES)
        .map(|attributes| {
            let list = |key: &str| {
                attributes
                    .as_record()
                    .and_then(|a| a.get(key))
                    .map(Value::to_strings)
                    .unwrap_or_default()
            };
            FieldSchema {
                required: list("requiredFields"),
                optional: list("optionalFields"),
                wildcard: list("wildcardFields"),
            }
        });
    EntryMetadata { access, fields }
}

fn decode_record(body: &[u8]) -> Result<Record> {
    match decode(body, None)? {
        Some(Value::Record(record)) => Ok(record),
        Some(_) => Err(ResourceError::Decode("unexpected document root".to_string())),
        None => Err(ResourceError::Decode("empty response".to_string())),
    }
}

fn on_path(filter: Option<&[&str]>, depth: usize, name: &str) -> bool {
    let Some(segments) = filter else {
        return true;
    };
    if depth == 0 {
        return true;
    }
    match segments.get(depth - 1) {
        Some(segment) => *segment == "*" || *segment == name,
        None => true,
    }
}

fn open(start: &BytesStart) -> Result<Node> {
    let name = std::str::from_utf8(start.local_name().as_ref())?.to_string();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = std::str::from_utf8(attr.key.local_name().as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(Node {
        name,
        attrs,
        ..Node::default()
    })
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn parse(text: &str, filter: Option<&[&str]>) -> Result<Option<Node>> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = std::str::from_utf8(start.local_name().as_ref())?.to_string();
                if !on_path(filter, stack.len(), &name) {
                    reader.read_to_end(start.name())?;
                    continue;
                }
                stack.push(open(&start)?);
            }
            Event::Empty(start) => {
                let name = std::str::from_utf8(start.local_name().as_ref())?.to_string();
                if !on_path(filter, stack.len(), &name) {
                    continue;
                }
                let node = open(&start)?;
                attach(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(std::str::from_utf8(&data)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(root)
}

fn select<'n>(node: &'n Node, segments: &[&str]) -> Vec<&'n Node> {
    match segments.split_first() {
        None => vec![node],
        Some((head, rest)) => node
            .children
            .iter()
            .filter(|child| *head == "*" || child.name == *head)
            .flat_map(|child| select(child, rest))
            .collect(),
    }
}

fn load_root(node: &Node) -> Value {
    if node.is_dict() {
        return Value::Record(load_dict(node));
    }
    if node.is_list() {
        return Value::List(load_list(node));
    }
    let (name, value) = load_elem(node);
    Value::Record([(name, value)].into_iter().collect())
}

fn load_attrs(node: &Node) -> Option<Record> {
    if node.attrs.is_empty() {
        return None;
    }
    Some(
        node.attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

fn load_elem(node: &Node) -> (String, Value) {
    let name = node.name.clone();
    let value = load_value(node);
    let Some(mut attrs) = load_attrs(node) else {
        return (name, value);
    };
    let merged = match value {
        Value::Null => Value::Record(attrs),
        Value::Text(text) => {
            attrs.insert("$text", text);
            Value::Record(attrs)
        }
        Value::Record(mut record) => {
            for (key, attr) in attrs.iter() {
                record.append(key.clone(), attr.clone());
            }
            Value::Record(record)
        }
        // Attributes on a list-valued element have nowhere to go.
        list @ Value::List(_) => list,
    };
    (name, merged)
}

fn load_value(node: &Node) -> Value {
    match node.children.as_slice() {
        [] => {
            let text = node.text.trim();
            if text.is_empty() {
                Value::Null
            } else {
                Value::Text(text.to_string())
            }
        }
        [child] if child.is_dict() => Value::Record(load_dict(child)),
        [child] if child.is_list() => Value::List(load_list(child)),
        children => {
            let mut record = Record::new();
            for child in children {
                let (name, value) = load_elem(child);
                record.append(name, value);
            }
            Value::Record(record)
        }
    }
}

fn load_dict(node: &Node) -> Record {
    node.children
        .iter()
        .filter_map(|key| Some((key.attr("name")?.to_string(), load_value(key))))
        .collect()
}

fn load_list(node: &Node) -> Vec<Value> {
    node.children.iter().map(load_value).collect()
}
