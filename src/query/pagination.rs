//! Pagination resolver
//!
//! Turns the client's optional `currentCount` into a bounded result limit.

use std::fmt;

/// Result count used when the client sends none
pub const DEFAULT_LIMIT: u32 = 10;

/// Hard ceiling on any client-requested result count
pub const MAX_LIMIT: u32 = 1000;

/// A result-count bound, always within `1..=ceiling`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResultLimit(u32);

impl ResultLimit {
    /// Fixed limit for internally defined queries; zero is lifted to one
    pub const fn fixed(n: u32) -> Self {
        if n == 0 {
            Self(1)
        } else {
            Self(n)
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// As the signed type the MongoDB driver expects
    pub fn as_i64(self) -> i64 {
        i64::from(self.0)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ResultLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves raw count parameters against a default and a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationResolver {
    default: u32,
    ceiling: u32,
}

impl Default for PaginationResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, MAX_LIMIT)
    }
}

impl PaginationResolver {
    /// Zero values are lifted to one and the default never exceeds the ceiling
    pub fn new(default: u32, ceiling: u32) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            default: default.clamp(1, ceiling),
            ceiling,
        }
    }

    pub fn default_limit(&self) -> ResultLimit {
        ResultLimit(self.default)
    }

    pub fn ceiling(&self) -> ResultLimit {
        ResultLimit(self.ceiling)
    }

    /// Resolve a raw count
    ///
    /// Absent, non-numeric, zero or negative values give the default; values
    /// above the ceiling are clamped to it.
    pub fn resolve(&self, raw: Option<&str>) -> ResultLimit {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return self.default_limit();
        };

        match raw.parse::<i64>() {
            Ok(n) if n <= 0 => self.default_limit(),
            Ok(n) => ResultLimit(n.min(i64::from(self.ceiling)) as u32),
            // All digits but too long for i64: clearly above the ceiling
            Err(_) if raw.bytes().all(|b| b.is_ascii_digit()) => self.ceiling(),
            Err(_) => self.default_limit(),
        }
    }
}
