//! Report items collected by validators and engines.
//!
//! Nothing in this crate stops at the first problem it finds. Validators
//! push [`ReportItem`]s into a [`ReportList`] and the caller decides whether
//! the list aborts the operation, so a user sees every problem at once.
//!
//! Some errors are *forceable*: the detection is the same, but when the
//! caller passes the matching [`ForceFlag`] the item is emitted as a warning
//! instead of an error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Override tokens a caller may pass to downgrade forceable errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForceFlag {
    /// Downgrade every forceable error
    Force,
    /// Allow creating a constraint equal to an existing one
    AllowDuplicates,
    /// Allow constraining a resource that lives inside a clone or bundle
    AllowMultiInstance,
}

impl ForceFlag {
    /// Token name as used in configuration and serialized reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Force => "force",
            Self::AllowDuplicates => "allow-duplicates",
            Self::AllowMultiInstance => "allow-multi-instance",
        }
    }
}

impl fmt::Display for ForceFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of override tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForceFlags(BTreeSet<ForceFlag>);

impl ForceFlags {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag, builder style.
    pub fn with(mut self, flag: ForceFlag) -> Self {
        self.0.insert(flag);
        self
    }

    /// Add a flag.
    pub fn insert(&mut self, flag: ForceFlag) {
        self.0.insert(flag);
    }

    /// Check for an exact flag.
    pub fn contains(&self, flag: ForceFlag) -> bool {
        self.0.contains(&flag)
    }

    /// Whether a problem guarded by `flag` is overridden, either by that
    /// flag or by the generic [`ForceFlag::Force`].
    pub fn allows(&self, flag: ForceFlag) -> bool {
        self.contains(ForceFlag::Force) || self.contains(flag)
    }

    /// Check whether no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ForceFlag> for ForceFlags {
    fn from_iter<T: IntoIterator<Item = ForceFlag>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Severity of a report item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The operation must not proceed
    Error,
    /// The operation may proceed, the user should know
    Warning,
    /// Informational
    Info,
    /// Diagnostic detail
    Debug,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
            Self::Debug => "Debug",
        };
        f.write_str(label)
    }
}

/// What a report item is about, with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportMessage {
    /// An id is already used in the document or already booked
    IdAlreadyExists { id: String },
    /// An id is not a valid XML id
    InvalidId {
        id: String,
        description: String,
        reason: String,
    },
    /// An id does not exist in the document
    IdNotFound {
        id: String,
        expected_types: Vec<String>,
    },
    /// An id exists but names an element of the wrong kind
    IdBelongsToUnexpectedType {
        id: String,
        expected_types: Vec<String>,
        current_type: String,
    },
    /// Unknown option names were given
    InvalidOptions {
        option_names: Vec<String>,
        allowed: Vec<String>,
        option_type: String,
    },
    /// An option has a value outside the allowed set
    InvalidOptionValue {
        option_name: String,
        option_value: String,
        allowed_values: Vec<String>,
    },
    /// Mandatory options are missing
    RequiredOptionsMissing {
        option_names: Vec<String>,
        option_type: String,
    },
    /// Options that cannot be used together were given together
    MutuallyExclusiveOptions {
        option_names: Vec<String>,
        option_type: String,
    },
    /// A score is neither an integer nor INFINITY
    InvalidScore { score: String },
    /// The new constraint duplicates existing ones
    DuplicateConstraintsExist { constraint_ids: Vec<String> },
    /// A constrained resource lives inside a clone, master or bundle
    ResourceForConstraintIsMultiinstance {
        resource_id: String,
        parent_type: String,
        parent_id: String,
    },
    /// A set constraint was requested without sets
    EmptyResourceSetList,
    /// A resource set has no resources
    EmptyResourceSet,
    /// Elements removed because of a requested removal
    CibRemoveDependantElements { id_tag_map: BTreeMap<String, String> },
    /// References edited out of elements that stay in the document
    CibRemoveReferences {
        id_tag_map: BTreeMap<String, String>,
        removing_references_from: BTreeMap<String, BTreeSet<String>>,
    },
    /// Resources that go away with the removal
    CibRemoveResources { id_list: Vec<String> },
    /// Rule text could not be parsed
    RuleExpressionParseError { rule_string: String, reason: String },
}

fn quoted(items: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    items
        .into_iter()
        .map(|item| format!("'{}'", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn tagged(id_tag_map: &BTreeMap<String, String>, id: &str) -> String {
    match id_tag_map.get(id) {
        Some(tag) => format!("{tag} '{id}'"),
        None => format!("'{id}'"),
    }
}

impl fmt::Display for ReportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdAlreadyExists { id } => write!(f, "'{id}' already exists"),
            Self::InvalidId {
                id,
                description,
                reason,
            } => write!(f, "invalid {description} '{id}': {reason}"),
            Self::IdNotFound { id, expected_types } => {
                if expected_types.is_empty() {
                    write!(f, "'{id}' does not exist")
                } else {
                    write!(f, "{} '{id}' does not exist", expected_types.join(" / "))
                }
            }
            Self::IdBelongsToUnexpectedType {
                id,
                expected_types,
                current_type,
            } => write!(
                f,
                "'{id}' is not {}, it is '{current_type}'",
                expected_types.join(" / ")
            ),
            Self::InvalidOptions {
                option_names,
                allowed,
                option_type,
            } => write!(
                f,
                "invalid {option_type} option(s) {}, allowed options are: {}",
                quoted(option_names),
                quoted(allowed)
            ),
            Self::InvalidOptionValue {
                option_name,
                option_value,
                allowed_values,
            } => write!(
                f,
                "'{option_value}' is not a valid {option_name} value, use {}",
                quoted(allowed_values)
            ),
            Self::RequiredOptionsMissing {
                option_names,
                option_type,
            } => write!(
                f,
                "required {option_type} option(s) {} are missing",
                quoted(option_names)
            ),
            Self::MutuallyExclusiveOptions {
                option_names,
                option_type,
            } => write!(
                f,
                "only one of {option_type} options {} can be used",
                quoted(option_names)
            ),
            Self::InvalidScore { score } => write!(
                f,
                "invalid score '{score}', use integer or INFINITY or -INFINITY"
            ),
            Self::DuplicateConstraintsExist { constraint_ids } => write!(
                f,
                "duplicate constraints: {}",
                quoted(constraint_ids)
            ),
            Self::ResourceForConstraintIsMultiinstance {
                resource_id,
                parent_type,
                parent_id,
            } => write!(
                f,
                "'{resource_id}' is a {parent_type} resource, use the {parent_type} id '{parent_id}' instead"
            ),
            Self::EmptyResourceSetList => write!(f, "at least one resource set is required"),
            Self::EmptyResourceSet => write!(f, "a resource set must contain at least one resource"),
            Self::CibRemoveDependantElements { id_tag_map } => {
                let items: Vec<String> = id_tag_map
                    .iter()
                    .map(|(id, tag)| format!("{tag} '{id}'"))
                    .collect();
                write!(f, "removing dependant elements: {}", items.join(", "))
            }
            Self::CibRemoveReferences {
                id_tag_map,
                removing_references_from,
            } => {
                let items: Vec<String> = removing_references_from
                    .iter()
                    .map(|(removed, from)| {
                        let from: Vec<String> =
                            from.iter().map(|id| tagged(id_tag_map, id)).collect();
                        format!("{} from {}", tagged(id_tag_map, removed), from.join(", "))
                    })
                    .collect();
                write!(f, "removing references: {}", items.join("; "))
            }
            Self::CibRemoveResources { id_list } => {
                write!(f, "removing resources: {}", quoted(id_list))
            }
            Self::RuleExpressionParseError {
                rule_string,
                reason,
            } => write!(f, "'{rule_string}' is not a valid rule expression: {reason}"),
        }
    }
}

/// A single collected report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    pub severity: Severity,
    /// Flag that would have downgraded this item, set only on errors
    pub forceable: Option<ForceFlag>,
    pub message: ReportMessage,
}

impl ReportItem {
    /// An error that cannot be overridden.
    pub fn error(message: ReportMessage) -> Self {
        Self {
            severity: Severity::Error,
            forceable: None,
            message,
        }
    }

    /// A warning.
    pub fn warning(message: ReportMessage) -> Self {
        Self {
            severity: Severity::Warning,
            forceable: None,
            message,
        }
    }

    /// An informational item.
    pub fn info(message: ReportMessage) -> Self {
        Self {
            severity: Severity::Info,
            forceable: None,
            message,
        }
    }

    /// An error unless `force_flags` override `flag`, a warning otherwise.
    pub fn forceable_error(flag: ForceFlag, force_flags: &ForceFlags, message: ReportMessage) -> Self {
        if force_flags.allows(flag) {
            log::warn!("{message} (overridden by '{flag}')");
            Self::warning(message)
        } else {
            Self {
                severity: Severity::Error,
                forceable: Some(flag),
                message,
            }
        }
    }

    /// Check if this item blocks the operation.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ReportItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(flag) = self.forceable {
            write!(f, " (can be overridden with '{flag}')")?;
        }
        Ok(())
    }
}

/// Ordered collection of report items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportList(Vec<ReportItem>);

impl ReportList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item.
    pub fn push(&mut self, item: ReportItem) {
        self.0.push(item);
    }

    /// Append every item of another list.
    pub fn append(&mut self, other: ReportList) {
        self.0.extend(other.0);
    }

    /// Iterate over the items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ReportItem> {
        self.0.iter()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether any item blocks the operation.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(ReportItem::is_error)
    }

    /// Items with error severity.
    pub fn errors(&self) -> impl Iterator<Item = &ReportItem> {
        self.0.iter().filter(|item| item.is_error())
    }

    /// Items that are not errors.
    pub fn without_errors(self) -> Self {
        self.0.into_iter().filter(|item| !item.is_error()).collect()
    }

    /// Consume the list.
    pub fn into_vec(self) -> Vec<ReportItem> {
        self.0
    }

    /// Serialize the list for machine consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Vec<ReportItem>> for ReportList {
    fn from(items: Vec<ReportItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<ReportItem> for ReportList {
    fn from_iter<T: IntoIterator<Item = ReportItem>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ReportItem> for ReportList {
    fn extend<T: IntoIterator<Item = ReportItem>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ReportList {
    type Item = ReportItem;
    type IntoIter = std::vec::IntoIter<ReportItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReportList {
    type Item = &'a ReportItem;
    type IntoIter = std::slice::Iter<'a, ReportItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ReportList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duplicate() -> ReportMessage {
        ReportMessage::DuplicateConstraintsExist {
            constraint_ids: vec!["c1".into()],
        }
    }

    #[test]
    fn test_force_flags_allows() {
        let none = ForceFlags::new();
        assert!(!none.allows(ForceFlag::AllowDuplicates));

        let specific = ForceFlags::new().with(ForceFlag::AllowDuplicates);
        assert!(specific.allows(ForceFlag::AllowDuplicates));
        assert!(!specific.allows(ForceFlag::AllowMultiInstance));

        let generic = ForceFlags::new().with(ForceFlag::Force);
        assert!(generic.allows(ForceFlag::AllowMultiInstance));
    }

    #[test]
    fn test_forceable_error_severity() {
        let item = ReportItem::forceable_error(ForceFlag::AllowDuplicates, &ForceFlags::new(), duplicate());
        assert_eq!(item.severity, Severity::Error);
        assert_eq!(item.forceable, Some(ForceFlag::AllowDuplicates));

        let forced = ForceFlags::new().with(ForceFlag::Force);
        let item = ReportItem::forceable_error(ForceFlag::AllowDuplicates, &forced, duplicate());
        assert_eq!(item.severity, Severity::Warning);
        assert_eq!(item.forceable, None);
        assert_eq!(item.message, duplicate());
    }

    #[test]
    fn test_report_list_errors() {
        let mut list = ReportList::new();
        assert!(!list.has_errors());
        list.push(ReportItem::warning(duplicate()));
        assert!(!list.has_errors());
        list.push(ReportItem::error(ReportMessage::EmptyResourceSet));
        assert!(list.has_errors());
        assert_eq!(list.errors().count(), 1);
        assert_eq!(list.clone().without_errors().len(), 1);
    }

    #[test]
    fn test_display() {
        let item = ReportItem::forceable_error(ForceFlag::AllowDuplicates, &ForceFlags::new(), duplicate());
        assert_eq!(
            item.to_string(),
            "Error: duplicate constraints: 'c1' (can be overridden with 'allow-duplicates')"
        );
    }

    #[test]
    fn test_json_export() {
        let list: ReportList = vec![ReportItem::error(ReportMessage::IdAlreadyExists { id: "a".into() })].into();
        let json = list.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["severity"], "error");
        assert_eq!(value[0]["message"]["code"], "ID_ALREADY_EXISTS");
        assert_eq!(value[0]["message"]["id"], "a");
    }
}
