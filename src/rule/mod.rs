//! The rule language of location constraints.
//!
//! Rules are written as text, for example
//! `#uname eq node1 or (date-spec weekdays=1-5 and pingd gt integer 0)`,
//! parsed into a [`RuleExpr`] tree and exported into `rule`,
//! `expression`, `date_expression` and `date_spec` elements.
//! [`rule_to_str`] goes the other way and renders a `rule` element in a
//! canonical text form, which is what duplicate detection compares.

mod export;
mod parser;
mod to_str;

pub use export::export_rule;
pub use parser::parse_rule;
pub use to_str::rule_to_str;

use std::fmt;

/// Keys a `date-spec` expression accepts.
pub const DATE_SPEC_KEYS: [&str; 9] = [
    "hours",
    "monthdays",
    "weekdays",
    "yeardays",
    "months",
    "weeks",
    "years",
    "weekyears",
    "moon",
];

/// Boolean operator joining the operands of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

impl BoolOperator {
    /// Value of the `boolean-op` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for BoolOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison of a node attribute with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl CompareOperator {
    /// Parse an operator keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "lt" => Some(Self::Lt),
            "gt" => Some(Self::Gt),
            "lte" => Some(Self::Lte),
            "gte" => Some(Self::Gte),
            _ => None,
        }
    }

    /// Value of the `operation` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Lte => "lte",
            Self::Gte => "gte",
        }
    }
}

/// How a compared value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Number,
    Version,
}

impl ValueType {
    /// Parse a type keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "version" => Some(Self::Version),
            _ => None,
        }
    }

    /// Value of the `type` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Version => "version",
        }
    }
}

/// A parsed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpr {
    /// Operands joined by one boolean operator
    Bool {
        operator: BoolOperator,
        operands: Vec<RuleExpr>,
    },
    /// `defined ATTR` or `not_defined ATTR`
    Defined { attribute: String, defined: bool },
    /// `ATTR OP [TYPE] VALUE`
    Compare {
        attribute: String,
        operator: CompareOperator,
        value_type: Option<ValueType>,
        value: String,
    },
    /// `date gt DATE`
    DateAfter(String),
    /// `date lt DATE`
    DateBefore(String),
    /// `date in_range START to END`
    DateInRange { start: String, end: String },
    /// `date-spec KEY=VALUE...`
    DateSpec(Vec<(String, String)>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use cibtree::Document;
    use crate::ids::IdProvider;

    #[test]
    fn test_text_survives_export() {
        let mut doc = Document::parse(
            r#"<cib><configuration><constraints>
                 <rsc_location id="L" rsc="A"/>
               </constraints></configuration></cib>"#,
        )
        .unwrap();
        let location = crate::locator::find_by_id(&doc, "L")[0];
        let expr = parse_rule(
            "#uname eq node1 or (date-spec weekdays=1-5 hours=9-16 and pingd gt integer 0)",
        )
        .unwrap();

        let mut ids = IdProvider::new();
        let rule = export_rule(&mut doc, location, "L-rule", &expr, &mut ids);

        assert_eq!(
            rule_to_str(&doc, rule),
            "#uname eq node1 or (date-spec hours=9-16 weekdays=1-5 and pingd gt integer 0)"
        );
    }
}
