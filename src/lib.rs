//! # cibkit
//!
//! Editing a pacemaker cluster information base (CIB) without leaving it
//! inconsistent.
//!
//! This crate provides:
//! - Removal of elements together with everything depending on them
//!   ([`removal`])
//! - Detection of constraints duplicating existing ones ([`duplicates`])
//! - Builders for colocation, order, ticket and location constraints,
//!   with or without resource sets ([`constraints`])
//! - A text rule language for location constraints ([`rule`])
//! - Command-level operations running all of the above on a working copy
//!   ([`operations`])
//!
//! Validation problems are collected as [`ReportItem`]s. Errors among them
//! abort an operation; some can be downgraded to warnings with
//! [`ForceFlags`].
//!
//! ## Example
//!
//! ```
//! use cibkit::{Config, Document, locator, operations};
//!
//! let mut doc = Document::parse(
//!     r#"<cib><configuration>
//!          <resources><group id="G"><primitive id="R1"/></group></resources>
//!          <constraints><rsc_location id="L" rsc="R1" node="n1" score="100"/></constraints>
//!        </configuration></cib>"#,
//! )?;
//!
//! let reports = operations::remove_elements(&mut doc, ["R1"], &Config::default())?;
//! for item in &reports {
//!     println!("{item}");
//! }
//! assert!(!locator::exists(&doc, "G"));
//! assert!(!locator::exists(&doc, "L"));
//! # Ok::<(), cibkit::Error>(())
//! ```

pub mod config;
pub mod constraints;
pub mod duplicates;
pub mod error;
pub mod ids;
pub mod kind;
pub mod locator;
pub mod operations;
pub mod removal;
pub mod reports;
pub mod rule;

pub use cibtree::{Document, NodeId};
pub use config::Config;
pub use error::{Error, Result};
pub use ids::IdProvider;
pub use kind::ElementKind;
pub use removal::{ElementsToRemove, remove_specified_elements};
pub use reports::{ForceFlag, ForceFlags, ReportItem, ReportList, ReportMessage, Severity};
