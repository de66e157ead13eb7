//! Filterable catalog fields
//!
//! The allow-list of filter parameters a client may send, the stored
//! document field each one targets, and the parser that handles it.

/// Parameters consumed by pagination, never treated as filters
pub const RESERVED_PARAMS: &[&str] = &["currentCount"];

/// How a field's raw value is turned into a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `"<low> - <high>"` exclusive range
    RatingRange,
    /// Install tier label, trailing space restored to `+`
    InstallTier,
    /// Case-sensitive substring match
    Contains,
    /// Case-insensitive substring match
    ContainsIgnoreCase,
    /// Exact string equality
    Text,
    /// Exact boolean equality (`true` / `false`)
    Flag,
}

/// A recognised filter field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    Rating,
    Installs,
    MinimumAndroid,
    AppName,
    Category,
    DeveloperId,
    ContentRating,
    Currency,
    AppId,
    Free,
    AdSupported,
    InAppPurchases,
    EditorsChoice,
}

impl FilterField {
    /// Every field, in the order conditions are emitted
    pub const ALL: [FilterField; 13] = [
        FilterField::Rating,
        FilterField::Installs,
        FilterField::MinimumAndroid,
        FilterField::AppName,
        FilterField::Category,
        FilterField::DeveloperId,
        FilterField::ContentRating,
        FilterField::Currency,
        FilterField::AppId,
        FilterField::Free,
        FilterField::AdSupported,
        FilterField::InAppPurchases,
        FilterField::EditorsChoice,
    ];

    /// Name of the field in stored catalog documents
    pub fn store_name(self) -> &'static str {
        match self {
            Self::Rating => "Rating",
            Self::Installs => "Installs",
            Self::MinimumAndroid => "minimumAndroid",
            Self::AppName => "appName",
            Self::Category => "Category",
            Self::DeveloperId => "developerId",
            Self::ContentRating => "contentRating",
            Self::Currency => "Currency",
            Self::AppId => "appId",
            Self::Free => "Free",
            Self::AdSupported => "adSupported",
            Self::InAppPurchases => "inAppPurchases",
            Self::EditorsChoice => "editorsChoice",
        }
    }

    /// Query parameter names accepted for this field
    ///
    /// The stored name always works; a few capitalised fields also accept
    /// their lower-case spelling.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            Self::Rating => &["Rating", "rating"],
            Self::Installs => &["Installs", "installs"],
            Self::MinimumAndroid => &["minimumAndroid"],
            Self::AppName => &["appName"],
            Self::Category => &["Category", "category"],
            Self::DeveloperId => &["developerId"],
            Self::ContentRating => &["contentRating"],
            Self::Currency => &["Currency", "currency"],
            Self::AppId => &["appId"],
            Self::Free => &["Free", "free"],
            Self::AdSupported => &["adSupported"],
            Self::InAppPurchases => &["inAppPurchases"],
            Self::EditorsChoice => &["editorsChoice"],
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::Rating => FieldKind::RatingRange,
            Self::Installs => FieldKind::InstallTier,
            Self::MinimumAndroid => FieldKind::Contains,
            Self::AppName => FieldKind::ContainsIgnoreCase,
            Self::Category
            | Self::DeveloperId
            | Self::ContentRating
            | Self::Currency
            | Self::AppId => FieldKind::Text,
            Self::Free | Self::AdSupported | Self::InAppPurchases | Self::EditorsChoice => {
                FieldKind::Flag
            }
        }
    }

    /// Resolve a query parameter name to its field
    pub fn from_param(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.param_names().contains(&name))
    }
}

/// Whether a parameter name is consumed outside the filter
pub fn is_reserved(name: &str) -> bool {
    RESERVED_PARAMS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_param_aliases() {
        assert_eq!(FilterField::from_param("Rating"), Some(FilterField::Rating));
        assert_eq!(FilterField::from_param("rating"), Some(FilterField::Rating));
        assert_eq!(FilterField::from_param("category"), Some(FilterField::Category));
        assert_eq!(FilterField::from_param("appName"), Some(FilterField::AppName));
        assert_eq!(FilterField::from_param("password"), None);
        assert_eq!(FilterField::from_param("_id"), None);
    }

    #[test]
    fn test_param_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for field in FilterField::ALL {
            for name in field.param_names() {
                assert!(seen.insert(*name), "duplicate param name {name}");
            }
        }
    }

    #[test]
    fn test_reserved_is_not_a_field() {
        for name in RESERVED_PARAMS {
            assert!(is_reserved(name));
            assert_eq!(FilterField::from_param(name), None);
        }
    }
}
