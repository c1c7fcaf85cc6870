//! Id reservation and generation for one logical operation.
//!
//! An [`IdProvider`] remembers ids handed out or booked during an operation
//! that are not in the document yet, so two elements created by the same
//! operation never end up with the same id. Create one per operation and
//! drop it afterwards.

use crate::locator;
use crate::reports::{ReportItem, ReportList, ReportMessage};
use cibtree::Document;
use std::collections::BTreeSet;

/// Why `id` is not a valid XML id, if it is not.
pub fn id_problem(id: &str) -> Option<String> {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return Some("empty string is not a valid id".to_string());
    };
    if !is_valid_first_char(first) {
        return Some(format!(
            "'{first}' is not a valid first character for an id"
        ));
    }
    chars
        .find(|&c| !is_valid_char(c))
        .map(|c| format!("'{c}' is not a valid character for an id"))
}

fn is_valid_first_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_valid_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Check an id, producing an error report when it is invalid.
pub fn validate_id(id: &str, description: &str) -> Option<ReportItem> {
    id_problem(id).map(|reason| {
        ReportItem::error(ReportMessage::InvalidId {
            id: id.to_string(),
            description: description.to_string(),
            reason,
        })
    })
}

/// Turn arbitrary text into a valid id: leading characters that cannot
/// start an id are dropped, other invalid characters become `_`.
pub fn sanitize_id(proposed: &str) -> String {
    let trimmed = proposed.trim_start_matches(|c: char| !is_valid_first_char(c));
    let sanitized: String = trimmed
        .chars()
        .map(|c| if is_valid_char(c) { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        "id".to_string()
    } else {
        sanitized
    }
}

/// Reserves and manufactures unique ids.
#[derive(Debug, Default)]
pub struct IdProvider {
    booked: BTreeSet<String>,
}

impl IdProvider {
    /// A provider with nothing booked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an id was booked through this provider.
    pub fn is_booked(&self, id: &str) -> bool {
        self.booked.contains(id)
    }

    fn is_taken(&self, doc: &Document, id: &str) -> bool {
        self.is_booked(id) || locator::exists(doc, id)
    }

    /// Reserve a user supplied id.
    ///
    /// Returns error reports when the id is invalid, exists in the document
    /// or was already booked; the id is reserved only when nothing is
    /// reported.
    pub fn book(&mut self, doc: &Document, id: &str) -> ReportList {
        let mut reports = ReportList::new();
        if let Some(item) = validate_id(id, "id") {
            reports.push(item);
        } else if self.is_taken(doc, id) {
            reports.push(ReportItem::error(ReportMessage::IdAlreadyExists {
                id: id.to_string(),
            }));
        } else {
            log::debug!("Booked id '{id}'");
            self.booked.insert(id.to_string());
        }
        reports
    }

    /// Reserve several ids. An id given more than once is reported once.
    pub fn book_ids<I, S>(&mut self, doc: &Document, ids: I) -> ReportList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut reports = ReportList::new();
        let mut reported = BTreeSet::new();
        for id in ids {
            let id = id.as_ref();
            let result = self.book(doc, id);
            if !result.is_empty() && reported.insert(id.to_string()) {
                reports.append(result);
            }
        }
        reports
    }

    /// Reserve and return a free id based on `proposed`.
    ///
    /// The proposal is sanitized first. When it is taken, `-1`, `-2`, ...
    /// are appended until a free candidate turns up.
    pub fn allocate(&mut self, doc: &Document, proposed: &str) -> String {
        let base = sanitize_id(proposed);
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.is_taken(doc, &candidate) {
            candidate = format!("{base}-{counter}");
            counter += 1;
        }
        log::debug!("Allocated id '{candidate}' for '{proposed}'");
        self.booked.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::Severity;

    fn doc() -> Document {
        Document::parse(
            r#"<cib><configuration><resources>
                 <primitive id="A"/><primitive id="A-1"/>
               </resources></configuration></cib>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_allocate_sequence() {
        let doc = Document::parse("<cib/>").unwrap();
        let mut provider = IdProvider::new();
        assert_eq!(provider.allocate(&doc, "X"), "X");
        assert_eq!(provider.allocate(&doc, "X"), "X-1");
        assert_eq!(provider.allocate(&doc, "X"), "X-2");
    }

    #[test]
    fn test_allocate_skips_document_ids() {
        let doc = doc();
        let mut provider = IdProvider::new();
        assert_eq!(provider.allocate(&doc, "A"), "A-2");
        assert!(provider.is_booked("A-2"));
    }

    #[test]
    fn test_allocate_sanitizes() {
        let doc = Document::parse("<cib/>").unwrap();
        let mut provider = IdProvider::new();
        assert_eq!(provider.allocate(&doc, "1st rule"), "st_rule");
        assert_eq!(provider.allocate(&doc, "--"), "id");
    }

    #[test]
    fn test_book() {
        let doc = doc();
        let mut provider = IdProvider::new();
        assert!(provider.book(&doc, "B").is_empty());

        let again = provider.book(&doc, "B");
        assert_eq!(again.len(), 1);
        assert_eq!(
            again.iter().next().unwrap().message,
            ReportMessage::IdAlreadyExists { id: "B".into() }
        );

        let existing = provider.book(&doc, "A");
        assert!(existing.has_errors());
        assert!(!provider.is_booked("A"));
    }

    #[test]
    fn test_book_invalid() {
        let doc = doc();
        let mut provider = IdProvider::new();
        let reports = provider.book(&doc, "9lives");
        let item = reports.iter().next().unwrap();
        assert_eq!(item.severity, Severity::Error);
        assert!(matches!(item.message, ReportMessage::InvalidId { .. }));
    }

    #[test]
    fn test_book_ids_reports_once() {
        let doc = doc();
        let mut provider = IdProvider::new();
        let reports = provider.book_ids(&doc, ["C", "C", "C", "A"]);
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn test_id_problem() {
        assert_eq!(id_problem("good_id-1.x"), None);
        assert!(id_problem("").is_some());
        assert!(id_problem("-x").is_some());
        assert!(id_problem("a b").is_some());
    }
}
