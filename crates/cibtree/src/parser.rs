//! XML reading into a [`Document`].
//!
//! Whitespace-only text is dropped; comments, processing instructions and
//! the XML declaration are ignored. Everything else that is not an element
//! becomes the text content of the enclosing element.

use crate::document::{Document, NodeId};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Parse a document from a file.
pub fn parse_file(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)?;
    parse_string(&content)
}

/// Parse a document from a string.
pub fn parse_string(content: &str) -> Result<Document> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut doc: Option<Document> = None;
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event().map_err(Error::parse)? {
            Event::Start(start) => {
                let node = open_element(&mut doc, &stack, &start)?;
                stack.push(node);
            }
            Event::Empty(start) => {
                open_element(&mut doc, &stack, &start)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(Error::parse)?;
                append_text(doc.as_mut(), &stack, &value);
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data).into_owned();
                append_text(doc.as_mut(), &stack, &value);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes
            _ => {}
        }
    }

    let doc = doc.ok_or(Error::NoRoot)?;
    if let Some(&open) = stack.last() {
        return Err(Error::Unclosed(doc.tag(open).to_string()));
    }
    Ok(doc)
}

/// Create the element described by `start` below the current stack top.
fn open_element(
    doc: &mut Option<Document>,
    stack: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let node = if let Some(existing) = doc.as_mut() {
        let Some(&parent) = stack.last() else {
            return Err(Error::MultipleRoots(tag));
        };
        existing.append_element(parent, &tag)
    } else {
        let created = Document::new(&tag);
        let root = created.root();
        *doc = Some(created);
        root
    };

    let Some(doc) = doc.as_mut() else {
        return Err(Error::NoRoot);
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(Error::parse)?;
        let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(Error::parse)?;
        doc.set_attr(node, &name, &value);
    }
    Ok(node)
}

fn append_text(doc: Option<&mut Document>, stack: &[NodeId], value: &str) {
    let (Some(doc), Some(&node)) = (doc, stack.last()) else {
        return;
    };
    if value.trim().is_empty() {
        return;
    }
    let text = match doc.text(node) {
        Some(existing) => format!("{existing}{value}"),
        None => value.to_string(),
    };
    doc.set_text(node, Some(&text));
}
