//! Evaluator for the predicate-string subset used by the screen objects:
//! `attribute OP 'literal'` clauses joined by `AND`.

use crate::driver::ElementHandle;
use crate::result::{SuiteError, SuiteResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Name,
    Label,
    Value,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    BeginsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    attribute: Attribute,
    op: Op,
    literal: String,
}

impl Clause {
    fn matches(&self, element: &ElementHandle) -> bool {
        let actual = match self.attribute {
            Attribute::Name => element.name.as_deref(),
            Attribute::Label => element.label.as_deref(),
            Attribute::Value => element.value.as_deref(),
            Attribute::Type => Some(element.role.xcui_type()),
        };
        match (self.op, actual) {
            (Op::Ne, None) => true,
            (_, None) => false,
            (Op::Eq, Some(a)) => a == self.literal,
            (Op::Ne, Some(a)) => a != self.literal,
            (Op::BeginsWith, Some(a)) => a.starts_with(&self.literal),
            (Op::EndsWith, Some(a)) => a.ends_with(&self.literal),
            (Op::Contains, Some(a)) => a.contains(&self.literal),
        }
    }
}

/// A parsed conjunction of attribute clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Parse a predicate string.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Protocol`] for anything outside the supported
    /// subset, the way a real server rejects an invalid predicate.
    pub fn parse(text: &str) -> SuiteResult<Self> {
        let clause_re = regex::Regex::new(
            r"^\s*(name|label|value|type)\s*(==|!=|BEGINSWITH|ENDSWITH|CONTAINS)\s*'((?:[^'\\]|\\.)*)'\s*",
        )
        .map_err(|e| SuiteError::protocol(e.to_string()))?;
        let and_re =
            regex::Regex::new(r"^AND\s+").map_err(|e| SuiteError::protocol(e.to_string()))?;

        let mut clauses = Vec::new();
        let mut rest = text;
        loop {
            let caps = clause_re.captures(rest).ok_or_else(|| {
                SuiteError::protocol(format!("unsupported predicate near {rest:?}"))
            })?;
            let attribute = match &caps[1] {
                "name" => Attribute::Name,
                "label" => Attribute::Label,
                "value" => Attribute::Value,
                _ => Attribute::Type,
            };
            let op = match &caps[2] {
                "==" => Op::Eq,
                "!=" => Op::Ne,
                "BEGINSWITH" => Op::BeginsWith,
                "ENDSWITH" => Op::EndsWith,
                _ => Op::Contains,
            };
            clauses.push(Clause {
                attribute,
                op,
                literal: unescape(&caps[3]),
            });
            rest = &rest[caps[0].len()..];
            if rest.is_empty() {
                break;
            }
            let connector = and_re.find(rest).ok_or_else(|| {
                SuiteError::protocol(format!("expected AND in predicate near {rest:?}"))
            })?;
            rest = &rest[connector.end()..];
        }
        Ok(Self { clauses })
    }

    /// Whether every clause holds for the element
    #[must_use]
    pub fn matches(&self, element: &ElementHandle) -> bool {
        self.clauses.iter().all(|c| c.matches(element))
    }
}

fn unescape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
