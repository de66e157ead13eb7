//! Typed filter predicates
//!
//! A [`Predicate`] is an AND of field-level [`Condition`]s. It renders to a
//! MongoDB filter document for the real store and can also be evaluated in
//! process against BSON documents, with the same semantics MongoDB applies
//! to the string-typed catalog fields.

use bson::{doc, Bson, Document};
use regex::{Regex, RegexBuilder};
use std::fmt;

use crate::types::{AppshelfError, Result};

/// Right-hand side of an equality condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl From<&FieldValue> for Bson {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => Bson::String(s.clone()),
            FieldValue::Flag(b) => Bson::Boolean(*b),
        }
    }
}

/// One field-level condition (a predicate fragment)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Exact match
    Equals {
        field: &'static str,
        value: FieldValue,
    },
    /// Exclusive range over a string-valued field
    Range {
        field: &'static str,
        gt: Option<String>,
        lt: Option<String>,
    },
    /// Regular-expression match; `pattern` is already escaped
    Pattern {
        field: &'static str,
        pattern: String,
        case_insensitive: bool,
    },
    /// Membership in a fixed set of strings
    OneOf {
        field: &'static str,
        values: Vec<String>,
    },
}

impl Condition {
    pub fn text(field: &'static str, value: impl Into<String>) -> Self {
        Self::Equals {
            field,
            value: FieldValue::Text(value.into()),
        }
    }

    pub fn flag(field: &'static str, value: bool) -> Self {
        Self::Equals {
            field,
            value: FieldValue::Flag(value),
        }
    }

    pub fn greater_than(field: &'static str, bound: impl Into<String>) -> Self {
        Self::Range {
            field,
            gt: Some(bound.into()),
            lt: None,
        }
    }

    pub fn between(field: &'static str, low: impl Into<String>, high: impl Into<String>) -> Self {
        Self::Range {
            field,
            gt: Some(low.into()),
            lt: Some(high.into()),
        }
    }

    /// Substring match; regex metacharacters in `needle` are escaped
    pub fn contains(field: &'static str, needle: &str, case_insensitive: bool) -> Self {
        Self::Pattern {
            field,
            pattern: regex::escape(needle),
            case_insensitive,
        }
    }

    pub fn one_of<I, S>(field: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Stored field this condition targets
    pub fn field(&self) -> &'static str {
        match self {
            Self::Equals { field, .. }
            | Self::Range { field, .. }
            | Self::Pattern { field, .. }
            | Self::OneOf { field, .. } => *field,
        }
    }

    /// Render as a single-field MongoDB filter document
    pub fn to_document(&self) -> Document {
        let mut rendered = Document::new();
        match self {
            Self::Equals { field, value } => {
                rendered.insert(*field, Bson::from(value));
            }
            Self::Range { field, gt, lt } => {
                let mut bounds = Document::new();
                if let Some(gt) = gt {
                    bounds.insert("$gt", gt.as_str());
                }
                if let Some(lt) = lt {
                    bounds.insert("$lt", lt.as_str());
                }
                rendered.insert(*field, bounds);
            }
            Self::Pattern {
                field,
                pattern,
                case_insensitive,
            } => {
                let mut spec = doc! { "$regex": pattern.as_str() };
                if *case_insensitive {
                    spec.insert("$options", "i");
                }
                rendered.insert(*field, spec);
            }
            Self::OneOf { field, values } => {
                rendered.insert(*field, doc! { "$in": values.clone() });
            }
        }
        rendered
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => match value {
                FieldValue::Text(s) => write!(f, "{field} == {s:?}"),
                FieldValue::Flag(b) => write!(f, "{field} == {b}"),
            },
            Self::Range { field, gt, lt } => match (gt, lt) {
                (Some(gt), Some(lt)) => write!(f, "{gt} < {field} < {lt}"),
                (Some(gt), None) => write!(f, "{field} > {gt}"),
                (None, Some(lt)) => write!(f, "{field} < {lt}"),
                (None, None) => write!(f, "{field} exists"),
            },
            Self::Pattern {
                field,
                pattern,
                case_insensitive,
            } => {
                let flags = if *case_insensitive { "i" } else { "" };
                write!(f, "{field} =~ /{pattern}/{flags}")
            }
            Self::OneOf { field, values } => write!(f, "{field} in {values:?}"),
        }
    }
}

/// Conjunction of conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND a condition into the predicate
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Stored fields referenced, in condition order
    pub fn fields(&self) -> Vec<&'static str> {
        self.conditions.iter().map(Condition::field).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Render as a MongoDB filter document
    ///
    /// A single condition renders bare; several are wrapped in `$and` so two
    /// conditions on the same field never overwrite each other.
    pub fn to_document(&self) -> Document {
        match self.conditions.as_slice() {
            [] => Document::new(),
            [only] => only.to_document(),
            many => {
                let clauses: Vec<Document> = many.iter().map(Condition::to_document).collect();
                doc! { "$and": clauses }
            }
        }
    }

    /// Compile pattern conditions for in-process evaluation
    pub fn matcher(&self) -> Result<Matcher<'_>> {
        let mut compiled = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let regex = match condition {
                Condition::Pattern {
                    field,
                    pattern,
                    case_insensitive,
                } => Some(
                    RegexBuilder::new(pattern)
                        .case_insensitive(*case_insensitive)
                        .build()
                        .map_err(|_| AppshelfError::invalid_filter(*field, pattern.as_str()))?,
                ),
                _ => None,
            };
            compiled.push((condition, regex));
        }
        Ok(Matcher { compiled })
    }

    /// One-off test of a single document; prefer [`Predicate::matcher`] in loops
    pub fn matches(&self, doc: &Document) -> Result<bool> {
        Ok(self.matcher()?.matches(doc))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "TRUE");
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{condition}")?;
        }
        Ok(())
    }
}

/// A predicate with its patterns compiled, ready to test documents
pub struct Matcher<'a> {
    compiled: Vec<(&'a Condition, Option<Regex>)>,
}

impl Matcher<'_> {
    /// Whether `doc` satisfies every condition
    ///
    /// A missing field never matches: absence means unknown, not zero.
    pub fn matches(&self, doc: &Document) -> bool {
        self.compiled
            .iter()
            .all(|(condition, regex)| condition_matches(condition, regex.as_ref(), doc))
    }
}

fn condition_matches(condition: &Condition, regex: Option<&Regex>, doc: &Document) -> bool {
    let Some(stored) = doc.get(condition.field()) else {
        return false;
    };

    match condition {
        Condition::Equals { value, .. } => match (value, stored) {
            (FieldValue::Text(want), Bson::String(have)) => want == have,
            (FieldValue::Flag(want), Bson::Boolean(have)) => want == have,
            _ => false,
        },
        // String bounds only ever compare against strings, lexicographically
        Condition::Range { gt, lt, .. } => match stored {
            Bson::String(have) => {
                gt.as_deref().map_or(true, |gt| have.as_str() > gt)
                    && lt.as_deref().map_or(true, |lt| have.as_str() < lt)
            }
            _ => false,
        },
        Condition::Pattern { .. } => match (stored, regex) {
            (Bson::String(have), Some(regex)) => regex.is_match(have),
            _ => false,
        },
        Condition::OneOf { values, .. } => match stored {
            Bson::String(have) => values.iter().any(|v| v == have),
            _ => false,
        },
    }
}
