//! Value parsers
//!
//! Each parser turns one raw query-string value into a single [`Condition`]
//! on one field, or rejects it with `InvalidFilterValue`.

use regex::Regex;
use std::sync::OnceLock;

use crate::query::fields::{FieldKind, FilterField};
use crate::query::predicate::Condition;
use crate::types::{AppshelfError, Result};

/// Lower rating bound applied when the client sends no rating filter
pub const DEFAULT_MIN_RATING: &str = "4.0";

/// Install tier labels used by the catalog, smallest first
pub const INSTALL_TIERS: [&str; 22] = [
    "0+",
    "1+",
    "5+",
    "10+",
    "50+",
    "100+",
    "500+",
    "1,000+",
    "5,000+",
    "10,000+",
    "50,000+",
    "100,000+",
    "500,000+",
    "1,000,000+",
    "5,000,000+",
    "10,000,000+",
    "50,000,000+",
    "100,000,000+",
    "500,000,000+",
    "1,000,000,000+",
    "5,000,000,000+",
    "10,000,000,000+",
];

/// Tiers considered "popular" by the featured and search listings
pub const POPULAR_TIERS: [&str; 6] = [
    "10,000,000+",
    "50,000,000+",
    "100,000,000+",
    "500,000,000+",
    "1,000,000,000+",
    "5,000,000,000+",
];

fn rating_range_regex() -> &'static Regex {
    static RANGE: OnceLock<Regex> = OnceLock::new();
    RANGE.get_or_init(|| {
        Regex::new(r"^(?P<low>\d\.\d)\s*-\s*(?P<high>\d\.\d)$")
            .expect("rating range pattern is valid")
    })
}

/// Default rating fragment: `Rating > 4.0`
pub fn default_rating() -> Condition {
    Condition::greater_than(FilterField::Rating.store_name(), DEFAULT_MIN_RATING)
}

/// Parse `"<low> - <high>"` into `low < Rating < high`
///
/// Both bounds are single-decimal values in `[0.0, 5.0]` and `low` must be
/// strictly below `high`; anything else is rejected rather than guessed at.
pub fn parse_rating_range(raw: &str) -> Result<Condition> {
    let field = FilterField::Rating.store_name();
    let invalid = || AppshelfError::invalid_filter(field, raw);

    let caps = rating_range_regex().captures(raw).ok_or_else(invalid)?;
    let low = &caps["low"];
    let high = &caps["high"];

    let in_scale = |v: &str| v.parse::<f64>().map(|n| (0.0..=5.0).contains(&n)).unwrap_or(false);
    if !in_scale(low) || !in_scale(high) || low >= high {
        return Err(invalid());
    }

    Ok(Condition::between(field, low, high))
}

/// Restore the canonical tier label and match it exactly
///
/// A `+` sent unescaped in a query string decodes to a space, so
/// `"10,000,000 "` becomes `"10,000,000+"`. Labels that are already
/// canonical pass through unchanged.
pub fn parse_install_tier(raw: &str) -> Result<Condition> {
    let field = FilterField::Installs.store_name();
    let tier = normalize_install_tier(raw);

    if !INSTALL_TIERS.contains(&tier.as_str()) {
        return Err(AppshelfError::invalid_filter(field, raw));
    }

    Ok(Condition::text(field, tier))
}

/// Replace one trailing space with `+`
pub fn normalize_install_tier(raw: &str) -> String {
    match raw.strip_suffix(' ') {
        Some(stem) => format!("{stem}+"),
        None => raw.to_string(),
    }
}

/// Substring needles are printable text; MongoDB refuses NUL in a `$regex`
fn printable<'a>(field: FilterField, raw: &'a str) -> Result<&'a str> {
    if raw.chars().any(char::is_control) {
        return Err(AppshelfError::invalid_filter(field.store_name(), raw));
    }
    Ok(raw)
}

/// Case-sensitive substring match on `minimumAndroid`
pub fn parse_minimum_android(raw: &str) -> Result<Condition> {
    let field = FilterField::MinimumAndroid;
    Ok(Condition::contains(
        field.store_name(),
        printable(field, raw)?,
        false,
    ))
}

/// Case-insensitive substring match on `appName`
pub fn parse_app_name(raw: &str) -> Result<Condition> {
    let field = FilterField::AppName;
    Ok(Condition::contains(field.store_name(), printable(field, raw)?, true))
}

/// Exact equality for plain text and boolean fields
pub fn parse_equality(field: FilterField, raw: &str) -> Result<Condition> {
    let name = field.store_name();
    match field.kind() {
        FieldKind::Flag => match raw {
            "true" => Ok(Condition::flag(name, true)),
            "false" => Ok(Condition::flag(name, false)),
            _ => Err(AppshelfError::invalid_filter(name, raw)),
        },
        FieldKind::Text => Ok(Condition::text(name, raw)),
        _ => Err(AppshelfError::Internal(format!(
            "{name} is not an equality field"
        ))),
    }
}

/// Dispatch to the parser designated for `field`
pub fn parse_field(field: FilterField, raw: &str) -> Result<Condition> {
    match field.kind() {
        FieldKind::RatingRange => parse_rating_range(raw),
        FieldKind::InstallTier => parse_install_tier(raw),
        FieldKind::Contains => parse_minimum_android(raw),
        FieldKind::ContainsIgnoreCase => parse_app_name(raw),
        FieldKind::Text | FieldKind::Flag => parse_equality(field, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::FieldValue;

    fn assert_invalid(result: Result<Condition>, field: &str) {
        match result {
            Err(AppshelfError::InvalidFilterValue { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected InvalidFilterValue on {field}, got {other:?}"),
        }
    }

    #[test]
    fn test_contains_rejects_control_characters() {
        assert_invalid(parse_app_name("a\0b"), "appName");
        assert_invalid(parse_app_name("x\ny"), "appName");
        assert_invalid(parse_minimum_android("4.0\0"), "minimumAndroid");
        assert_invalid(parse_minimum_android("4\t.0"), "minimumAndroid");

        assert!(parse_app_name("Clock (Pro) ü").is_ok());
        assert!(parse_minimum_android("4.0 and up").is_ok());
    }

    #[test]
    fn test_rating_range() {
        let condition = parse_rating_range("4.2 - 4.8").unwrap();
        assert_eq!(condition, Condition::between("Rating", "4.2", "4.8"));
    }

    #[test]
    fn test_rating_range_tolerates_spacing() {
        assert_eq!(
            parse_rating_range("3.0-4.5").unwrap(),
            Condition::between("Rating", "3.0", "4.5")
        );
        assert_eq!(
            parse_rating_range("0.0   -  5.0").unwrap(),
            Condition::between("Rating", "0.0", "5.0")
        );
    }

    #[test]
    fn test_rating_range_rejects_garbage() {
        for raw in [
            "abc",
            "",
            "4.2",
            "4.2 - ",
            "4.2 : 4.8",
            "42 - 48",
            "4.25 - 4.8",
            " 4.2 - 4.8",
            "4.2 - 4.8 ",
            "4.2 - 4.8; drop",
        ] {
            assert_invalid(parse_rating_range(raw), "Rating");
        }
    }

    #[test]
    fn test_rating_range_rejects_out_of_scale_and_inverted() {
        assert_invalid(parse_rating_range("4.0 - 9.9"), "Rating");
        assert_invalid(parse_rating_range("4.8 - 4.2"), "Rating");
        assert_invalid(parse_rating_range("4.5 - 4.5"), "Rating");
    }

    #[test]
    fn test_install_tier_restores_plus() {
        assert_eq!(
            parse_install_tier("10,000,000 ").unwrap(),
            Condition::text("Installs", "10,000,000+")
        );
    }

    #[test]
    fn test_install_tier_is_idempotent() {
        for tier in INSTALL_TIERS {
            let once = normalize_install_tier(tier);
            assert_eq!(once, tier);
            assert_eq!(normalize_install_tier(&once), once);
            assert_eq!(parse_install_tier(tier).unwrap(), Condition::text("Installs", tier));
        }
    }

    #[test]
    fn test_install_tier_rejects_unknown_labels() {
        assert_invalid(parse_install_tier("lots"), "Installs");
        assert_invalid(parse_install_tier("10,000,000"), "Installs");
        assert_invalid(parse_install_tier("10,000,000  "), "Installs");
    }

    #[test]
    fn test_minimum_android_is_escaped_contains() {
        let condition = parse_minimum_android("4.0.3").unwrap();
        assert_eq!(
            condition,
            Condition::Pattern {
                field: "minimumAndroid",
                pattern: r"4\.0\.3".to_string(),
                case_insensitive: false,
            }
        );
    }

    #[test]
    fn test_app_name_is_case_insensitive() {
        match parse_app_name("clock").unwrap() {
            Condition::Pattern {
                field,
                case_insensitive,
                ..
            } => {
                assert_eq!(field, "appName");
                assert!(case_insensitive);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_flags_accept_only_booleans() {
        assert_eq!(
            parse_equality(FilterField::Free, "true").unwrap(),
            Condition::Equals {
                field: "Free",
                value: FieldValue::Flag(true)
            }
        );
        assert_invalid(parse_equality(FilterField::AdSupported, "yes"), "adSupported");
        assert_invalid(parse_equality(FilterField::Free, "TRUE"), "Free");
    }

    #[test]
    fn test_text_equality_passes_through() {
        assert_eq!(
            parse_field(FilterField::Category, "Tools").unwrap(),
            Condition::text("Category", "Tools")
        );
    }

    #[test]
    fn test_popular_tiers_are_known_tiers() {
        for tier in POPULAR_TIERS {
            assert!(INSTALL_TIERS.contains(&tier));
        }
    }
}
