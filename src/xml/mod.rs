//! Rendering of JSON values as XML element trees.
//!
//! | JSON            | XML                                                 |
//! |-----------------|-----------------------------------------------------|
//! | Object          | one child per key, tag from [`names::sanitize_tag`] |
//! | Array           | one [`ITEM_TAG`] child per element, in order        |
//! | String/Number/Bool | text content                                     |
//! | Null            | empty element                                       |
//!
//! Nested arrays reuse [`ITEM_TAG`] at every depth, so `[[1, 2]]` is reached
//! with `result/item[1]/item[2]`.

use std::borrow::Cow;
use std::collections::HashSet;
use std::io;
use std::string::FromUtf8Error;

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use thiserror::Error;

use crate::json::scalar::canonical_number;

pub mod names;

use names::{sanitize_tag, sanitize_text};

/// Root element of every rendered document
pub const ROOT_TAG: &str = "result";
/// Placeholder tag for array elements
pub const ITEM_TAG: &str = "item";

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("failed to write XML")]
    Write(#[from] io::Error),
    #[error("XML output was not valid UTF-8")]
    Encoding(#[from] FromUtf8Error),
}

/// An element with optional text and ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub children: Vec<XmlNode>,
    pub text: Option<String>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> XmlNode {
        XmlNode {
            name: name.into(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Serializes the tree as a standalone, tab-indented XML document
    pub fn to_document(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.write(&mut writer)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write<W: io::Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        let name = self.name.as_str();
        if self.children.is_empty() && self.text.is_none() {
            return writer.write_event(Event::Empty(BytesStart::new(name)));
        }
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))
    }
}

/// Escapes markup, and CR as a character reference: a raw CR would reach
/// the reader as LF after end-of-line normalization
fn escape_text(text: &str) -> Cow<'_, str> {
    let escaped = escape(text);
    if escaped.contains('\r') {
        Cow::Owned(escaped.replace('\r', "&#13;"))
    } else {
        escaped
    }
}

/// Renders `value` under an element named `root_tag`.
///
/// Total over every JSON shape and free of side effects. A scalar at the top
/// level becomes the root's own text.
pub fn render(value: &Value, root_tag: &str) -> XmlNode {
    element(sanitize_tag(root_tag).into_owned(), value)
}

/// Renders and serializes in one step; nothing is returned on failure
pub fn to_xml_string(value: &Value) -> Result<String, XmlError> {
    render(value, ROOT_TAG).to_document()
}

fn element(name: String, value: &Value) -> XmlNode {
    let mut node = XmlNode::new(name);
    match value {
        Value::Object(map) => {
            let mut seen = HashSet::with_capacity(map.len());
            for (key, child) in map {
                let tag = sanitize_tag(key).into_owned();
                if !seen.insert(tag.clone()) {
                    log::debug!("key '{key}' repeats sibling tag '{tag}' under '{}'", node.name);
                }
                node.children.push(element(tag, child));
            }
        }
        Value::Array(items) => {
            node.children = items
                .iter()
                .map(|item| element(ITEM_TAG.to_owned(), item))
                .collect();
        }
        Value::String(s) => node.text = Some(sanitize_text(s).into_owned()),
        Value::Number(n) => node.text = Some(canonical_number(n)),
        Value::Bool(b) => node.text = Some(b.to_string()),
        Value::Null => {}
    }
    node
}
