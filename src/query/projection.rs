//! Field projections
//!
//! Catalog rows are never returned whole; every lookup names one of these
//! field sets.

use bson::{Bson, Document};
use serde_json::{Map, Value as JsonValue};

/// Fields shown in listings and filtered results
pub const DISPLAY_FIELDS: [&str; 13] = [
    "appName",
    "developerId",
    "adSupported",
    "inAppPurchases",
    "Rating",
    "Size",
    "Installs",
    "privacyPolicy",
    "developerWebsite",
    "developerEmail",
    "minimumAndroid",
    "appId",
    "Category",
];

/// Fields shown in recommendation cards
pub const SUMMARY_FIELDS: [&str; 4] = ["appName", "developerId", "adSupported", "inAppPurchases"];

/// A named projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Display,
    Summary,
}

impl Projection {
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Display => &DISPLAY_FIELDS,
            Self::Summary => &SUMMARY_FIELDS,
        }
    }

    /// MongoDB projection document (`{ field: 1, ... }`)
    ///
    /// `_id` is included implicitly, as MongoDB does.
    pub fn to_document(self) -> Document {
        let mut projection = Document::new();
        for field in self.fields() {
            projection.insert(*field, 1);
        }
        projection
    }

    /// Apply this projection to a full stored document
    pub fn apply(self, source: &Document) -> Document {
        let mut projected = Document::new();
        if let Some(id) = source.get("_id") {
            projected.insert("_id", id.clone());
        }
        for field in self.fields() {
            if let Some(value) = source.get(*field) {
                projected.insert(*field, value.clone());
            }
        }
        projected
    }
}

/// Render a projected row as a JSON object
///
/// ObjectIds become their hex string; everything else uses relaxed extended
/// JSON.
pub fn row_to_json(row: Document) -> JsonValue {
    let mut object = Map::with_capacity(row.len());
    for (key, value) in row {
        let rendered = match value {
            Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
            other => other.into_relaxed_extjson(),
        };
        object.insert(key, rendered);
    }
    JsonValue::Object(object)
}
