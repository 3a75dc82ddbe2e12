//! Locator specs and the resolver that turns them into element handles.
//!
//! # Design Philosophy
//!
//! - **Structural first**: accessibility identifiers and role + exact label
//!   beat positional lookups. `nth` exists only as a fallback.
//! - **Absence is data**: resolving zero elements is a valid answer; only a
//!   malformed spec is an error.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::driver::{ElementHandle, Role, Session};
use crate::result::{SuiteError, SuiteResult};

/// W3C strategy name for accessibility identifiers
pub const STRATEGY_ACCESSIBILITY_ID: &str = "accessibility id";

/// Appium XCUITest strategy name for NSPredicate expressions
pub const STRATEGY_PREDICATE: &str = "-ios predicate string";

/// How a locator matches elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorKind {
    /// Exact accessibility identifier
    AccessibilityId,
    /// NSPredicate-style expression over element attributes
    Predicate,
    /// Exact label/value text, optionally constrained to a role
    Text {
        /// Required role, if any
        role: Option<Role>,
    },
}

/// Immutable description of how to find an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorSpec {
    kind: LocatorKind,
    value: String,
    visible_only: bool,
    nth: Option<usize>,
}

impl LocatorSpec {
    /// Match by accessibility identifier
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::with_kind(LocatorKind::AccessibilityId, value)
    }

    /// Match by predicate expression
    #[must_use]
    pub fn predicate(value: impl Into<String>) -> Self {
        Self::with_kind(LocatorKind::Predicate, value)
    }

    /// Match by exact label or value text
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::with_kind(LocatorKind::Text { role: None }, value)
    }

    /// Match by role and exact label or value text
    #[must_use]
    pub fn role_text(role: Role, value: impl Into<String>) -> Self {
        Self::with_kind(LocatorKind::Text { role: Some(role) }, value)
    }

    fn with_kind(kind: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            visible_only: false,
            nth: None,
        }
    }

    /// Only return elements that are currently on screen
    #[must_use]
    pub const fn visible_only(mut self) -> Self {
        self.visible_only = true;
        self
    }

    /// Pick a single match by position (fallback; layout is volatile)
    #[must_use]
    pub const fn nth(mut self, index: usize) -> Self {
        self.nth = Some(index);
        self
    }

    /// Matching strategy
    #[must_use]
    pub const fn kind(&self) -> &LocatorKind {
        &self.kind
    }

    /// Match value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether invisible elements are filtered out
    #[must_use]
    pub const fn is_visible_only(&self) -> bool {
        self.visible_only
    }

    /// Positional index, if any
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        self.nth
    }

    /// Check the spec is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::InvalidLocator`] for an empty match value or an
    /// unbalanced predicate expression.
    pub fn validate(&self) -> SuiteResult<()> {
        if self.value.trim().is_empty() {
            return Err(SuiteError::invalid_locator(format!(
                "{} locator has an empty match value",
                self.kind_name()
            )));
        }
        if self.kind == LocatorKind::Predicate && count_unescaped_quotes(&self.value) % 2 != 0 {
            return Err(SuiteError::invalid_locator(format!(
                "unbalanced quotes in predicate {:?}",
                self.value
            )));
        }
        Ok(())
    }

    /// Render the protocol strategy and value for a W3C `elements` query
    #[must_use]
    pub fn to_query(&self) -> (&'static str, String) {
        match &self.kind {
            LocatorKind::AccessibilityId => (STRATEGY_ACCESSIBILITY_ID, self.value.clone()),
            LocatorKind::Predicate => (STRATEGY_PREDICATE, self.value.clone()),
            LocatorKind::Text { role } => {
                let text = escape_predicate_literal(&self.value);
                let text_match = format!("(label == '{text}' OR value == '{text}')");
                let query = match role {
                    Some(role) => format!("type == '{}' AND {text_match}", role.xcui_type()),
                    None => text_match,
                };
                (STRATEGY_PREDICATE, query)
            }
        }
    }

    /// Match an element snapshot directly (identifier and text kinds only).
    ///
    /// Returns `None` for predicate locators, which need an evaluator.
    #[must_use]
    pub fn matches(&self, element: &ElementHandle) -> Option<bool> {
        match &self.kind {
            LocatorKind::AccessibilityId => Some(element.name.as_deref() == Some(&self.value)),
            LocatorKind::Text { role } => {
                let role_ok = role.map_or(true, |r| r == element.role);
                let text_ok = element.label.as_deref() == Some(&self.value)
                    || element.value.as_deref() == Some(&self.value);
                Some(role_ok && text_ok)
            }
            LocatorKind::Predicate => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            LocatorKind::AccessibilityId => "accessibility-id",
            LocatorKind::Predicate => "predicate",
            LocatorKind::Text { .. } => "text",
        }
    }
}

impl std::fmt::Display for LocatorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            LocatorKind::Text { role: Some(role) } => {
                write!(f, "text[{role:?}]={:?}", self.value)?;
            }
            _ => write!(f, "{}={:?}", self.kind_name(), self.value)?,
        }
        if let Some(n) = self.nth {
            write!(f, "[{n}]")?;
        }
        Ok(())
    }
}

fn count_unescaped_quotes(s: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for c in s.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '\'' if !escaped => count += 1,
            _ => escaped = false,
        }
    }
    count
}

/// Escape a literal for use inside a single-quoted predicate string
#[must_use]
pub fn escape_predicate_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Resolves locator specs against a live session.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocatorResolver;

impl LocatorResolver {
    /// Create a resolver
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Return every element currently matching `spec`, in tree order.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::InvalidLocator`] for a malformed spec, or any
    /// transport error from the session. Zero matches is `Ok(vec![])`.
    pub fn resolve(
        &self,
        session: &dyn Session,
        spec: &LocatorSpec,
    ) -> SuiteResult<Vec<ElementHandle>> {
        spec.validate()?;
        let mut found = session.find_elements(spec)?;
        if spec.visible_only {
            found.retain(|e| e.visible);
        }
        if let Some(n) = spec.nth {
            found = found.into_iter().nth(n).into_iter().collect();
        }
        trace!(locator = %spec, matches = found.len(), "resolved locator");
        Ok(found)
    }

    /// Return the first match, if any.
    ///
    /// # Errors
    ///
    /// Same as [`LocatorResolver::resolve`].
    pub fn resolve_first(
        &self,
        session: &dyn Session,
        spec: &LocatorSpec,
    ) -> SuiteResult<Option<ElementHandle>> {
        Ok(self.resolve(session, spec)?.into_iter().next())
    }
}
