//! # cibtree
//!
//! Arena-backed ordered XML tree used to hold a cluster information base.
//!
//! This crate provides:
//! - A mutable element tree with ordered attributes and stable node handles
//! - Cheap "detach" that hides a subtree from every traversal from the root
//! - Deep copies that keep node handles valid, for speculative editing
//! - XML reading and writing
//!
//! ## Example
//!
//! ```
//! use cibtree::Document;
//!
//! let mut doc = Document::parse(r#"<cib><configuration><resources/></configuration></cib>"#)?;
//! let resources = doc.descendants(doc.root())[1];
//! let primitive = doc.append_element_with_attrs(resources, "primitive", &[("id", "R1")]);
//! assert_eq!(doc.attr(primitive, "id"), Some("R1"));
//!
//! let mut copy = doc.clone();
//! copy.detach(primitive);
//! assert!(doc.is_attached(primitive));
//! assert!(!copy.is_attached(primitive));
//! # Ok::<(), cibtree::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod document;
pub mod error;
pub mod parser;
pub mod writer;

pub use document::{Document, NodeId};
pub use error::{Error, Result};
pub use writer::WriteOptions;

use std::path::Path;

impl Document {
    /// Parse a document from an XML string.
    pub fn parse(content: &str) -> Result<Self> {
        parser::parse_string(content)
    }

    /// Parse a document from an XML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        parser::parse_file(path)
    }

    /// Serialize the document with the default options.
    pub fn to_xml_string(&self) -> Result<String> {
        writer::write_string(self, &WriteOptions::default())
    }

    /// Serialize the document into a file.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        writer::write_file(self, path, &WriteOptions::default())
    }
}
