//! End-to-end query path against the in-memory catalog

use appshelf::query::{
    CatalogQueryService, FilterRequest, MemoryCatalogStore, PaginationResolver, PredicateBuilder,
    UnknownFieldPolicy,
};
use appshelf::logging::QueryLogger;
use appshelf::AppshelfError;
use bson::{doc, Document};
use std::sync::Arc;

const POPULAR: &[&str] = &[
    "10,000,000+",
    "50,000,000+",
    "100,000,000+",
    "500,000,000+",
    "1,000,000,000+",
    "5,000,000,000+",
];

fn entry(name: &str, rating: &str, installs: &str, category: &str) -> Document {
    doc! {
        "appName": name,
        "appId": format!("com.example.{}", name.to_lowercase().replace(' ', "")),
        "Category": category,
        "Rating": rating,
        "Installs": installs,
        "minimumAndroid": "4.1 and up",
        "developerId": "Example Labs",
        "Free": true,
        "adSupported": false,
        "inAppPurchases": false,
        "Size": "12M",
        "Price": "0",
    }
}

fn catalog() -> Vec<Document> {
    let mut entries = vec![
        entry("Alarm Clock Pro", "4.6", "10,000,000+", "Tools"),
        entry("Clockwork Puzzle", "3.8", "100,000,000+", "Puzzle"),
        entry("Budget Planner", "4.5", "1,000,000+", "Finance"),
        entry("Photo Fixer", "4.3", "1,000,000+", "Photography"),
        entry("Chess Club", "4.9", "50,000,000+", "Board"),
        entry("Tiny Notes", "2.9", "500+", "Productivity"),
    ];
    for i in 0..40 {
        let rating = format!("4.{}", i % 10);
        entries.push(entry(&format!("Filler {i}"), &rating, "10,000+", "Tools"));
    }
    entries
}

fn service() -> CatalogQueryService {
    CatalogQueryService::with_defaults(Arc::new(MemoryCatalogStore::with_entries(catalog())))
}

fn rating(row: &Document) -> &str {
    row.get_str("Rating").unwrap()
}

#[tokio::test]
async fn analysis_range_and_tier() {
    let request = FilterRequest::from_query("Rating=4.2+-+4.8&Installs=1,000,000%2B").unwrap();

    let predicate = PredicateBuilder::default().build(&request).unwrap();
    assert_eq!(
        predicate.to_string(),
        r#"4.2 < Rating < 4.8 AND Installs == "1,000,000+""#
    );

    let rows = service().analysis(&request).await.unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.get_str("appName").unwrap()).collect();
    assert_eq!(names, vec!["Budget Planner", "Photo Fixer"]);
}

#[tokio::test]
async fn scroll_respects_count_and_rating_floor() {
    let rows = service().scroll(Some("25")).await.unwrap();
    assert!(rows.len() <= 25);
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| rating(r) > "4.0"));
}

#[tokio::test]
async fn scroll_with_garbage_count_uses_default() {
    let rows = service().scroll(Some("lots")).await.unwrap();
    assert_eq!(rows.len(), 10);
}

#[tokio::test]
async fn featured_is_popular_and_bounded() {
    let mut entries = Vec::new();
    for i in 0..15 {
        let installs = POPULAR[i % POPULAR.len()];
        entries.push(entry(&format!("Hit {i}"), "4.5", installs, "Games"));
        entries.push(entry(&format!("Niche {i}"), "4.8", "1,000,000+", "Games"));
        entries.push(entry(&format!("Panned {i}"), "3.2", installs, "Games"));
    }
    let service =
        CatalogQueryService::with_defaults(Arc::new(MemoryCatalogStore::with_entries(entries)));

    let rows = service.featured().await.unwrap();
    assert_eq!(rows.len(), 10);
    for row in &rows {
        assert!(POPULAR.contains(&row.get_str("Installs").unwrap()));
        assert!(rating(row) > "4.0");
        assert!(row.get_str("appName").unwrap().starts_with("Hit "));
    }
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let rows = service().search(Some("clock"), None).await.unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.get_str("appName").unwrap()).collect();
    // No rating floor on search
    assert_eq!(names, vec!["Alarm Clock Pro", "Clockwork Puzzle"]);
}

#[tokio::test]
async fn search_treats_pattern_characters_literally() {
    let rows = service().search(Some("Clock.*"), None).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn malformed_rating_is_an_error_not_empty_rows() {
    let request = FilterRequest::new().with("Rating", "abc");
    match service().analysis(&request).await {
        Err(AppshelfError::InvalidFilterValue { field, raw }) => {
            assert_eq!(field, "Rating");
            assert_eq!(raw, "abc");
        }
        other => panic!("expected InvalidFilterValue, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_fields_rejected_by_default_ignored_on_request() {
    let request = FilterRequest::new()
        .with("Category", "Tools")
        .with("$where", "sleep(1000)");

    let err = service().analysis(&request).await.unwrap_err();
    assert_eq!(err.field(), Some("$where"));

    let lenient = CatalogQueryService::new(
        Arc::new(MemoryCatalogStore::with_entries(catalog())),
        PredicateBuilder::new(UnknownFieldPolicy::Ignore),
        PaginationResolver::default(),
        QueryLogger::new("test"),
    );
    let rows = lenient.analysis(&request).await.unwrap();
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r.get_str("Category").unwrap() == "Tools"));
}

#[tokio::test]
async fn empty_request_applies_only_default_rating() {
    let predicate = PredicateBuilder::default()
        .build(&FilterRequest::new())
        .unwrap();
    assert_eq!(predicate.to_string(), "Rating > 4.0");

    let rows = service().analysis(&FilterRequest::new()).await.unwrap();
    assert_eq!(rows.len(), 10);
}

#[tokio::test]
async fn analysis_count_is_capped_at_ceiling() {
    let service = CatalogQueryService::new(
        Arc::new(MemoryCatalogStore::with_entries(catalog())),
        PredicateBuilder::default(),
        PaginationResolver::new(10, 5),
        QueryLogger::new("test"),
    );
    let request = FilterRequest::new().with("currentCount", "100000");
    assert_eq!(service.analysis(&request).await.unwrap().len(), 5);
}

#[tokio::test]
async fn recommend_returns_three_summaries() {
    let request = FilterRequest::new().with("Category", "Tools");
    let rows = service().recommend(&request).await.unwrap();

    assert_eq!(rows.len(), 3);
    for row in &rows {
        let mut keys: Vec<&str> = row.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["adSupported", "appName", "developerId", "inAppPurchases"]
        );
    }
}

#[tokio::test]
async fn boolean_flags_match_typed_values() {
    let request = FilterRequest::new().with("free", "true");
    let rows = service().analysis(&request).await.unwrap();
    assert!(!rows.is_empty());

    let request = FilterRequest::new().with("Free", "yes");
    assert!(service().analysis(&request).await.is_err());
}
