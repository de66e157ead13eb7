//! Filter requests
//!
//! The raw parameter bag a client sends, decoded from a query string.

use std::collections::BTreeMap;

use crate::types::{AppshelfError, Result};

/// Parameter carrying the client's requested result count
pub const COUNT_PARAM: &str = "currentCount";

/// Raw filter parameters, name to undecoded-by-type value
///
/// Keys are kept sorted so every walk over the bag is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRequest {
    params: BTreeMap<String, String>,
}

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string
    ///
    /// `+` decodes to a space. A parameter repeated with different values is
    /// ambiguous and rejected.
    pub fn from_query(query: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| AppshelfError::BadRequest(format!("Malformed query string: {e}")))?;

        let mut params = BTreeMap::new();
        for (key, value) in pairs {
            if let Some(previous) = params.get(&key) {
                if previous != &value {
                    return Err(AppshelfError::invalid_filter(key, value));
                }
            }
            params.insert(key, value);
        }

        Ok(Self { params })
    }

    /// Add or replace one parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The raw `currentCount` value, if any
    pub fn count(&self) -> Option<&str> {
        self.get(COUNT_PARAM)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K, V> FromIterator<(K, V)> for FilterRequest
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_decodes_to_space() {
        let request = FilterRequest::from_query("Installs=1,000,000+&currentCount=25").unwrap();
        assert_eq!(request.get("Installs"), Some("1,000,000 "));
        assert_eq!(request.count(), Some("25"));
    }

    #[test]
    fn test_percent_decoding() {
        let request = FilterRequest::from_query("Rating=4.2%20-%204.8&appName=Caf%C3%A9").unwrap();
        assert_eq!(request.get("Rating"), Some("4.2 - 4.8"));
        assert_eq!(request.get("appName"), Some("Café"));
    }

    #[test]
    fn test_empty_query() {
        let request = FilterRequest::from_query("").unwrap();
        assert!(request.is_empty());
        assert_eq!(request.count(), None);
    }

    #[test]
    fn test_conflicting_repeat_rejected() {
        let err = FilterRequest::from_query("Category=Tools&Category=Games").unwrap_err();
        assert_eq!(err.field(), Some("Category"));

        let same = FilterRequest::from_query("Category=Tools&Category=Tools").unwrap();
        assert_eq!(same.len(), 1);
    }

    #[test]
    fn test_from_iterator() {
        let request: FilterRequest = [("Category", "Tools"), ("Free", "true")].into_iter().collect();
        assert_eq!(request.get("Free"), Some("true"));
        assert_eq!(request.iter().count(), 2);
    }
}
