//! Constraint and resource-set builders.
//!
//! Builders validate their input, collect reports into a [`BuildContext`]
//! and append the new element to the `constraints` section. A builder
//! returns `Ok(None)` without touching the document when validation
//! produced an error report; `Err` is reserved for broken documents.
//!
//! Builders do not look for duplicates. [`crate::operations`] runs them
//! together with [`crate::duplicates::check`] on a working copy.

pub mod colocation;
pub mod common;
pub mod location;
pub mod order;
pub mod resource_set;
pub mod ticket;

pub use common::Options;
pub use location::LocationTarget;
pub use resource_set::ResourceSetSpec;

use crate::config::{Config, IdsConfig};
use crate::ids::IdProvider;
use crate::reports::{ForceFlags, ReportList};
use cibtree::Document;

/// State shared by the builders of one operation.
#[derive(Debug, Default)]
pub struct BuildContext {
    /// Ids booked or allocated so far
    pub ids: IdProvider,
    /// Overrides for forceable errors
    pub force_flags: ForceFlags,
    /// Id generation settings
    pub ids_config: IdsConfig,
    /// Everything reported so far
    pub reports: ReportList,
}

impl BuildContext {
    /// A fresh context for one operation.
    pub fn new(config: &Config) -> Self {
        Self {
            ids: IdProvider::new(),
            force_flags: config.force_flags(),
            ids_config: config.ids.clone(),
            reports: ReportList::new(),
        }
    }

    /// Record `reports`. Returns true when they contain an error.
    pub(crate) fn absorb(&mut self, reports: ReportList) -> bool {
        let failed = reports.has_errors();
        self.reports.append(reports);
        failed
    }

    /// Book the id given in `options`, if any.
    pub(crate) fn book_requested_id(&mut self, doc: &Document, options: &Options) -> ReportList {
        match options.get("id") {
            Some(id) => self.ids.book(doc, id),
            None => ReportList::new(),
        }
    }

    /// The id given in `options` or a fresh one based on `proposed`.
    pub(crate) fn id_or_allocate(&mut self, doc: &Document, options: &Options, proposed: &str) -> String {
        match options.get("id") {
            Some(id) => id.clone(),
            None => self.ids.allocate(doc, proposed),
        }
    }
}
