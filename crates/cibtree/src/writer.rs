//! XML serialization of a [`Document`].
//!
//! Only nodes reachable from the root are written. Attribute order is kept
//! as stored.

use crate::document::{Document, NodeId};
use crate::error::{Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::path::Path;

/// Options for writing a document.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Indentation width in spaces, `None` writes everything on one line
    pub indent: Option<usize>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { indent: Some(2) }
    }
}

/// Write a document to a file.
pub fn write_file(doc: &Document, path: &Path, options: &WriteOptions) -> Result<()> {
    let content = write_string(doc, options)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Write a document to a string.
pub fn write_string(doc: &Document, options: &WriteOptions) -> Result<String> {
    let mut writer = match options.indent {
        Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
        None => Writer::new(Vec::new()),
    };
    write_node(&mut writer, doc, doc.root())?;
    String::from_utf8(writer.into_inner()).map_err(Error::write)
}

/// Write one element and its subtree.
fn write_node(writer: &mut Writer<Vec<u8>>, doc: &Document, node: NodeId) -> Result<()> {
    let tag = doc.tag(node);
    let mut start = BytesStart::new(tag);
    for (name, value) in doc.attrs(node) {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    let children = doc.children(node);
    let text = doc.text(node);
    if children.is_empty() && text.is_none() {
        writer.write_event(Event::Empty(start)).map_err(Error::write)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(Error::write)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(Error::write)?;
    }
    for &child in children {
        write_node(writer, doc, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(Error::write)?;
    Ok(())
}
