//! Tokenizer and recursive-descent parser for rule text.
//!
//! ```text
//! or_expr   := and_expr ("or" and_expr)*
//! and_expr  := primary ("and" primary)*
//! primary   := "(" or_expr ")"
//!            | ("defined" | "not_defined") ATTR
//!            | "date" ("gt" | "lt") DATE
//!            | "date" "in_range" DATE "to" DATE
//!            | "date-spec" (KEY "=" VALUE)+
//!            | ATTR OP [TYPE] VALUE
//! ```

use super::{BoolOperator, CompareOperator, DATE_SPEC_KEYS, RuleExpr, ValueType};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    /// A bare word or a quoted string
    Word { text: String, quoted: bool },
}

impl Token {
    fn keyword(&self) -> Option<&str> {
        match self {
            Self::Word { text, quoted: false } => Some(text.as_str()),
            _ => None,
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if !word.is_empty() {
            tokens.push(Token::Word {
                text: std::mem::take(word),
                quoted: false,
            });
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '(' | ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(if c == '(' { Token::Open } else { Token::Close });
            }
            '"' | '\'' if word.is_empty() => {
                let mut quoted = String::new();
                let mut closed = false;
                for q in chars.by_ref() {
                    if q == c {
                        closed = true;
                        break;
                    }
                    quoted.push(q);
                }
                if !closed {
                    return Err(Error::RuleParse {
                        position: tokens.len(),
                        message: format!("missing closing {c}"),
                    });
                }
                tokens.push(Token::Word {
                    text: quoted,
                    quoted: true,
                });
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(Error::RuleParse {
            position: self.position,
            message: message.into(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_keyword(&self) -> Option<&str> {
        self.peek().and_then(Token::keyword)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect_word(&mut self, what: &str) -> Result<String> {
        match self.next() {
            Some(Token::Word { text, .. }) => Ok(text),
            Some(_) => {
                self.position -= 1;
                self.error(format!("expected {what}"))
            }
            None => self.error(format!("expected {what}, found end of rule")),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.peek_keyword() == Some(keyword) {
            self.position += 1;
            Ok(())
        } else {
            self.error(format!("expected '{keyword}'"))
        }
    }

    fn parse_bool(&mut self, operator: BoolOperator) -> Result<RuleExpr> {
        let mut operands = vec![match operator {
            BoolOperator::Or => self.parse_bool(BoolOperator::And)?,
            BoolOperator::And => self.parse_primary()?,
        }];
        while self.peek_keyword() == Some(operator.as_str()) {
            self.position += 1;
            operands.push(match operator {
                BoolOperator::Or => self.parse_bool(BoolOperator::And)?,
                BoolOperator::And => self.parse_primary()?,
            });
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            RuleExpr::Bool { operator, operands }
        })
    }

    fn parse_primary(&mut self) -> Result<RuleExpr> {
        match self.peek() {
            None => return self.error("expected an expression, found end of rule"),
            Some(Token::Close) => return self.error("unexpected ')'"),
            Some(Token::Open) => {
                self.position += 1;
                let inner = self.parse_bool(BoolOperator::Or)?;
                return match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => self.error("missing ')'"),
                };
            }
            Some(Token::Word { .. }) => {}
        }

        match self.peek_keyword() {
            Some(keyword @ ("defined" | "not_defined")) => {
                let defined = keyword == "defined";
                self.position += 1;
                let attribute = self.expect_word("an attribute name")?;
                Ok(RuleExpr::Defined { attribute, defined })
            }
            Some("date") => {
                self.position += 1;
                self.parse_date()
            }
            Some("date-spec") => {
                self.position += 1;
                self.parse_date_spec()
            }
            _ => self.parse_compare(),
        }
    }

    fn parse_date(&mut self) -> Result<RuleExpr> {
        match self.peek_keyword() {
            Some("gt") => {
                self.position += 1;
                Ok(RuleExpr::DateAfter(self.expect_word("a date")?))
            }
            Some("lt") => {
                self.position += 1;
                Ok(RuleExpr::DateBefore(self.expect_word("a date")?))
            }
            Some("in_range") => {
                self.position += 1;
                let start = self.expect_word("a start date")?;
                self.expect_keyword("to")?;
                let end = self.expect_word("an end date")?;
                Ok(RuleExpr::DateInRange { start, end })
            }
            _ => self.error("expected 'gt', 'lt' or 'in_range' after 'date'"),
        }
    }

    fn parse_date_spec(&mut self) -> Result<RuleExpr> {
        let mut parts = Vec::new();
        while let Some(Token::Word { text, quoted: false }) = self.peek() {
            let Some((key, value)) = text.split_once('=') else {
                break;
            };
            if !DATE_SPEC_KEYS.contains(&key) {
                return self.error(format!("unknown date-spec key '{key}'"));
            }
            if value.is_empty() || parts.iter().any(|(k, _): &(String, String)| k == key) {
                return self.error(format!("invalid date-spec part '{text}'"));
            }
            parts.push((key.to_string(), value.to_string()));
            self.position += 1;
        }
        if parts.is_empty() {
            return self.error("expected KEY=VALUE after 'date-spec'");
        }
        Ok(RuleExpr::DateSpec(parts))
    }

    fn parse_compare(&mut self) -> Result<RuleExpr> {
        let attribute = self.expect_word("an attribute name")?;
        let Some(operator) = self.peek_keyword().and_then(CompareOperator::from_keyword) else {
            return self.error(format!("expected a comparison operator after '{attribute}'"));
        };
        self.position += 1;

        let value_type = self.peek_keyword().and_then(ValueType::from_keyword);
        // A type keyword followed by nothing is the value itself.
        let value_type = match value_type {
            Some(_) if self.tokens.len() > self.position + 1 => {
                let next = &self.tokens[self.position + 1];
                let next_is_value = !matches!(next.keyword(), Some("and" | "or"))
                    && matches!(next, Token::Word { .. });
                if next_is_value {
                    self.position += 1;
                    value_type
                } else {
                    None
                }
            }
            _ => None,
        };

        let value = self.expect_word("a value")?;
        Ok(RuleExpr::Compare {
            attribute,
            operator,
            value_type,
            value,
        })
    }
}

/// Parse rule text.
pub fn parse_rule(text: &str) -> Result<RuleExpr> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        position: 0,
    };
    let expr = parser.parse_bool(BoolOperator::Or)?;
    if parser.position < parser.tokens.len() {
        return parser.error("unexpected text after the end of the rule");
    }
    log::trace!("Parsed rule '{text}'");
    Ok(expr)
}
