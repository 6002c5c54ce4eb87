//! Condition parsing.
//!
//! A state's condition is a single predicate over one variable:
//!
//! - `<var> <op> <operand>` - comparison, `op` one of `==`, `!=`, `>`, `<`,
//!   `>=`, `<=`, `contains`
//! - `<var> onChange` - true for one pass after `<var>` was mutated
//!
//! Tokens are separated by single spaces and the text is not trimmed, so
//! `name == ` compares against the empty string. Everything after the
//! operator is joined back together as the operand, so operands may contain
//! spaces. Tokens after `onChange` do not affect evaluation but are kept so
//! the condition prints back exactly as written.
//!
//! Operands are resolved at evaluation time: an unquoted operand that names
//! an existing variable is a reference to that variable's current value,
//! anything else is a literal. Wrapping an operand in matching `'` or `"`
//! quotes forces a literal and strips the quotes, unlike the bare-token rule
//! where the rejoined text is used as is.
//!
//! Examples:
//! - `show_details == true`
//! - `count > budget` - compares against variable `budget` when it exists
//! - `region_filter != 'All'`
//! - `title contains sales report`

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    OnChange,
    /// Unrecognized operator token. Always evaluates to false.
    Other(String),
}

impl Operator {
    pub fn parse(token: &str) -> Self {
        match token {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            "contains" => Operator::Contains,
            "onChange" => Operator::OnChange,
            other => Operator::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Contains => "contains",
            Operator::OnChange => "onChange",
            Operator::Other(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Operator::Other(_))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Bare token: a variable reference if a variable with this id exists at
    /// evaluation time, otherwise a literal.
    Token(String),
    /// Quoted literal, stored without its quotes.
    Quoted { text: String, quote: char },
}

impl Operand {
    fn parse(raw: &str) -> Self {
        for quote in ['\'', '"'] {
            if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
                return Operand::Quoted {
                    text: raw[1..raw.len() - 1].to_string(),
                    quote,
                };
            }
        }
        Operand::Token(raw.to_string())
    }

    /// Operand text without quotes.
    pub fn text(&self) -> &str {
        match self {
            Operand::Token(t) => t,
            Operand::Quoted { text, .. } => text,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Token(t) => f.write_str(t),
            Operand::Quoted { text, quote } => write!(f, "{quote}{text}{quote}"),
        }
    }
}

/// A parsed condition.
///
/// Serializes as its text form, which is how conditions appear in exported
/// configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Condition {
    pub variable: String,
    pub operator: Operator,
    /// `None` only for `onChange`.
    pub operand: Option<Operand>,
    /// Ignored text after `onChange`.
    pub trailing: Option<String>,
}

impl Condition {
    /// Parses a condition from its text form.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidCondition {
            condition: text.to_string(),
            reason: reason.to_string(),
        };

        if text.trim().is_empty() {
            return Err(invalid("empty condition"));
        }

        let tokens: Vec<&str> = text.split(' ').collect();
        if tokens.len() < 2 {
            return Err(invalid("expected '<variable> <operator> <value>' or '<variable> onChange'"));
        }

        let variable = tokens[0].to_string();
        let operator = Operator::parse(tokens[1]);

        if operator == Operator::OnChange {
            let trailing = (tokens.len() > 2).then(|| tokens[2..].join(" "));
            return Ok(Self {
                variable,
                operator,
                operand: None,
                trailing,
            });
        }

        if tokens.len() < 3 {
            return Err(invalid("missing comparison value"));
        }

        let operand = Operand::parse(&tokens[2..].join(" "));
        Ok(Self {
            variable,
            operator,
            operand: Some(operand),
            trailing: None,
        })
    }

    /// Builds a comparison condition.
    pub fn compare(variable: impl Into<String>, operator: Operator, operand: &str) -> Self {
        Self {
            variable: variable.into(),
            operator,
            operand: Some(Operand::parse(operand)),
            trailing: None,
        }
    }

    /// Builds an `onChange` condition.
    pub fn on_change(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            operator: Operator::OnChange,
            operand: None,
            trailing: None,
        }
    }

    pub fn is_on_change(&self) -> bool {
        self.operator == Operator::OnChange
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.variable, self.operator)?;
        if let Some(operand) = &self.operand {
            write!(f, " {}", operand)?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " {}", trailing)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Condition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Condition {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Condition> for String {
    fn from(c: Condition) -> Self {
        c.to_string()
    }
}
