//! Predicate builder
//!
//! Walks the field allow-list, parses every field the client supplied with
//! its designated parser, and ANDs the fragments into one [`Predicate`].
//! Pure: no I/O, same input gives the same predicate.

use tracing::debug;

use crate::query::fields::{is_reserved, FilterField};
use crate::query::parsers::{default_rating, parse_field};
use crate::query::predicate::Predicate;
use crate::query::request::FilterRequest;
use crate::types::{AppshelfError, Result};

/// Treatment of parameters that are neither filters nor reserved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// Fail with `InvalidFilterValue` naming the parameter
    #[default]
    Reject,
    /// Drop the parameter and carry on
    Ignore,
}

/// Builds predicates from raw filter requests
#[derive(Debug, Clone, Copy)]
pub struct PredicateBuilder {
    policy: UnknownFieldPolicy,
    default_rating: bool,
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self::new(UnknownFieldPolicy::default())
    }
}

impl PredicateBuilder {
    pub fn new(policy: UnknownFieldPolicy) -> Self {
        Self {
            policy,
            default_rating: true,
        }
    }

    /// Reject unknown parameters regardless of configuration
    pub fn strict() -> Self {
        Self::new(UnknownFieldPolicy::Reject)
    }

    /// Do not inject `Rating > 4.0` when the client sends no rating
    pub fn without_default_rating(mut self) -> Self {
        self.default_rating = false;
        self
    }

    pub fn policy(&self) -> UnknownFieldPolicy {
        self.policy
    }

    /// Translate `request` into a predicate
    ///
    /// Empty values count as absent. A field sent under two of its accepted
    /// names is ambiguous and rejected.
    pub fn build(&self, request: &FilterRequest) -> Result<Predicate> {
        self.check_unknown(request)?;

        let mut predicate = Predicate::new();
        for field in FilterField::ALL {
            match supplied_value(field, request)? {
                Some(raw) => predicate.push(parse_field(field, raw)?),
                None if field == FilterField::Rating && self.default_rating => {
                    predicate.push(default_rating())
                }
                None => {}
            }
        }

        debug!(predicate = %predicate, "Built filter predicate");
        Ok(predicate)
    }

    /// Apply the unknown-field policy for an endpoint that reads only `allowed`
    ///
    /// Used by the fixed-shape listings (scroll, search, featured), whose
    /// parameters are not filters.
    pub fn check_allowed(&self, request: &FilterRequest, allowed: &[&str]) -> Result<()> {
        self.apply_policy(request, |name| allowed.contains(&name))
    }

    fn check_unknown(&self, request: &FilterRequest) -> Result<()> {
        self.apply_policy(request, |name| {
            is_reserved(name) || FilterField::from_param(name).is_some()
        })
    }

    fn apply_policy(&self, request: &FilterRequest, known: impl Fn(&str) -> bool) -> Result<()> {
        // FilterRequest iterates in key order, so the first unknown is the smallest
        let mut unknown = request.iter().filter(|(name, _)| !known(name));

        match self.policy {
            UnknownFieldPolicy::Reject => match unknown.next() {
                Some((name, raw)) => Err(AppshelfError::invalid_filter(name, raw)),
                None => Ok(()),
            },
            UnknownFieldPolicy::Ignore => {
                for (name, _) in unknown {
                    debug!(param = name, "Ignoring unknown filter parameter");
                }
                Ok(())
            }
        }
    }
}

/// The single non-empty value supplied for `field`, under any accepted name
fn supplied_value(field: FilterField, request: &FilterRequest) -> Result<Option<&str>> {
    let mut supplied = field
        .param_names()
        .iter()
        .filter_map(|name| request.get(name))
        .filter(|raw| !raw.is_empty());

    let first = supplied.next();
    if let Some(second) = supplied.next() {
        return Err(AppshelfError::invalid_filter(field.store_name(), second));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::Condition;

    fn request(pairs: &[(&str, &str)]) -> FilterRequest {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_request_is_default_rating_only() {
        let predicate = PredicateBuilder::default().build(&FilterRequest::new()).unwrap();
        assert_eq!(predicate, Predicate::new().and(Condition::greater_than("Rating", "4.0")));
    }

    #[test]
    fn test_rating_and_installs() {
        let predicate = PredicateBuilder::default()
            .build(&request(&[("Rating", "4.2 - 4.8"), ("Installs", "1,000,000 ")]))
            .unwrap();

        assert_eq!(
            predicate,
            Predicate::new()
                .and(Condition::between("Rating", "4.2", "4.8"))
                .and(Condition::text("Installs", "1,000,000+"))
        );
    }

    #[test]
    fn test_supplied_rating_replaces_default() {
        let predicate = PredicateBuilder::default()
            .build(&request(&[("rating", "1.0 - 2.0")]))
            .unwrap();
        assert_eq!(predicate.len(), 1);
        assert_eq!(predicate.conditions()[0], Condition::between("Rating", "1.0", "2.0"));
    }

    #[test]
    fn test_conditions_follow_allow_list_order() {
        let predicate = PredicateBuilder::default()
            .build(&request(&[
                ("Free", "true"),
                ("Category", "Tools"),
                ("minimumAndroid", "5.0"),
            ]))
            .unwrap();
        assert_eq!(
            predicate.fields(),
            vec!["Rating", "minimumAndroid", "Category", "Free"]
        );
    }

    #[test]
    fn test_count_param_is_not_a_filter() {
        let predicate = PredicateBuilder::strict()
            .build(&request(&[("currentCount", "25")]))
            .unwrap();
        assert_eq!(predicate.fields(), vec!["Rating"]);
    }

    #[test]
    fn test_unknown_field_rejected_by_default() {
        let err = PredicateBuilder::default()
            .build(&request(&[("password", "x"), ("$where", "1"), ("Category", "Tools")]))
            .unwrap_err();
        // "$where" sorts before "password"
        assert_eq!(err.field(), Some("$where"));
    }

    #[test]
    fn test_unknown_field_ignored_when_configured() {
        let predicate = PredicateBuilder::new(UnknownFieldPolicy::Ignore)
            .build(&request(&[("utm_source", "mail"), ("Category", "Tools")]))
            .unwrap();
        assert_eq!(predicate.fields(), vec!["Rating", "Category"]);
    }

    #[test]
    fn test_empty_value_counts_as_absent() {
        let predicate = PredicateBuilder::default()
            .build(&request(&[("Rating", ""), ("Category", "")]))
            .unwrap();
        assert_eq!(predicate, Predicate::new().and(Condition::greater_than("Rating", "4.0")));
    }

    #[test]
    fn test_alias_conflict_rejected() {
        let err = PredicateBuilder::default()
            .build(&request(&[("Category", "Tools"), ("category", "Games")]))
            .unwrap_err();
        assert_eq!(err.field(), Some("Category"));
    }

    #[test]
    fn test_malformed_value_aborts_build() {
        let err = PredicateBuilder::default()
            .build(&request(&[("Rating", "abc"), ("Category", "Tools")]))
            .unwrap_err();
        assert!(matches!(err, AppshelfError::InvalidFilterValue { .. }));
        assert_eq!(err.field(), Some("Rating"));
    }

    #[test]
    fn test_without_default_rating() {
        let predicate = PredicateBuilder::strict()
            .without_default_rating()
            .build(&FilterRequest::new())
            .unwrap();
        assert!(predicate.is_empty());
    }

    #[test]
    fn test_check_allowed_follows_policy() {
        let req = request(&[("appName", "clock"), ("Category", "Tools")]);
        let allowed = ["appName", "currentCount"];

        let err = PredicateBuilder::default()
            .check_allowed(&req, &allowed)
            .unwrap_err();
        assert_eq!(err.field(), Some("Category"));

        assert!(PredicateBuilder::new(UnknownFieldPolicy::Ignore)
            .check_allowed(&req, &allowed)
            .is_ok());
        assert!(PredicateBuilder::default()
            .check_allowed(&request(&[("currentCount", "5")]), &allowed)
            .is_ok());
    }
}
