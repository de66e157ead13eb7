//! Catalog query service
//!
//! Orchestrates predicate building and pagination, issues exactly one read
//! against the [`CatalogStore`], and reports every lookup to the query log.
//! Filter errors are returned to the caller, never turned into empty results.

use bson::Document;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::logging::QueryLogger;
use crate::query::builder::PredicateBuilder;
use crate::query::fields::FilterField;
use crate::query::pagination::{PaginationResolver, ResultLimit};
use crate::query::parsers::{default_rating, parse_app_name, POPULAR_TIERS};
use crate::query::predicate::{Condition, Predicate};
use crate::query::projection::Projection;
use crate::query::request::{FilterRequest, COUNT_PARAM};
use crate::query::store::CatalogStore;
use crate::types::{AppshelfError, Result};

/// Entries returned by the featured listing
pub const FEATURED_LIMIT: u32 = 10;

/// Entries returned by a recommendation
pub const RECOMMEND_LIMIT: u32 = 3;

/// Parameters read by the fixed-shape listings
const SCROLL_PARAMS: &[&str] = &[COUNT_PARAM];
const SEARCH_PARAMS: &[&str] = &["appName", COUNT_PARAM];

/// `Rating > 4.0 AND Installs in <popular tiers>`
pub fn featured_predicate() -> Predicate {
    Predicate::new().and(default_rating()).and(popular_installs())
}

/// `Rating > 4.0`
pub fn scroll_predicate() -> Predicate {
    Predicate::new().and(default_rating())
}

/// `appName =~ /name/i AND Installs in <popular tiers>`
pub fn search_predicate(app_name: Option<&str>) -> Result<Predicate> {
    let name = app_name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppshelfError::invalid_filter(FilterField::AppName.store_name(), ""))?;

    Ok(Predicate::new()
        .and(parse_app_name(name)?)
        .and(popular_installs()))
}

fn popular_installs() -> Condition {
    Condition::one_of(FilterField::Installs.store_name(), POPULAR_TIERS)
}

/// Runs the named catalog queries against one store
#[derive(Clone)]
pub struct CatalogQueryService {
    store: Arc<dyn CatalogStore>,
    builder: PredicateBuilder,
    pagination: PaginationResolver,
    logger: QueryLogger,
}

impl CatalogQueryService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        builder: PredicateBuilder,
        pagination: PaginationResolver,
        logger: QueryLogger,
    ) -> Self {
        Self {
            store,
            builder,
            pagination,
            logger,
        }
    }

    /// Strict filters, default pagination, tracing-only query log
    pub fn with_defaults(store: Arc<dyn CatalogStore>) -> Self {
        Self::new(
            store,
            PredicateBuilder::default(),
            PaginationResolver::default(),
            QueryLogger::new("local"),
        )
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub fn pagination(&self) -> PaginationResolver {
        self.pagination
    }

    /// Filtered lookup over arbitrary client parameters (the analysis view)
    ///
    /// `currentCount` sets the limit; every other parameter must be a known
    /// filter (unless the builder is configured to ignore unknown ones).
    pub async fn query(&self, request: &FilterRequest) -> Result<Vec<Document>> {
        let limit = self.pagination.resolve(request.count());
        let predicate = self.builder.build(request);
        self.execute("analysis", predicate, Projection::Display, limit)
            .await
    }

    pub async fn analysis(&self, request: &FilterRequest) -> Result<Vec<Document>> {
        self.query(request).await
    }

    /// Top popular, well-rated entries
    pub async fn featured(&self) -> Result<Vec<Document>> {
        self.featured_request(&FilterRequest::new()).await
    }

    /// [`featured`](Self::featured) for a client request, which carries no parameters
    pub async fn featured_request(&self, request: &FilterRequest) -> Result<Vec<Document>> {
        let predicate = self
            .builder
            .check_allowed(request, &[])
            .map(|()| featured_predicate());
        self.execute(
            "featured",
            predicate,
            Projection::Display,
            ResultLimit::fixed(FEATURED_LIMIT),
        )
        .await
    }

    /// Well-rated entries for infinite scrolling
    pub async fn scroll(&self, raw_count: Option<&str>) -> Result<Vec<Document>> {
        let limit = self.pagination.resolve(raw_count);
        self.execute("scroll", Ok(scroll_predicate()), Projection::Display, limit)
            .await
    }

    /// [`scroll`](Self::scroll) for a client request; only `currentCount` is read
    pub async fn scroll_request(&self, request: &FilterRequest) -> Result<Vec<Document>> {
        let limit = self.pagination.resolve(request.count());
        let predicate = self
            .builder
            .check_allowed(request, SCROLL_PARAMS)
            .map(|()| scroll_predicate());
        self.execute("scroll", predicate, Projection::Display, limit)
            .await
    }

    /// Popular entries whose name contains `app_name`, ignoring case
    pub async fn search(
        &self,
        app_name: Option<&str>,
        raw_count: Option<&str>,
    ) -> Result<Vec<Document>> {
        let limit = self.pagination.resolve(raw_count);
        self.execute("search", search_predicate(app_name), Projection::Display, limit)
            .await
    }

    /// [`search`](Self::search) for a client request; reads `appName` and `currentCount`
    pub async fn search_request(&self, request: &FilterRequest) -> Result<Vec<Document>> {
        let limit = self.pagination.resolve(request.count());
        let predicate = self
            .builder
            .check_allowed(request, SEARCH_PARAMS)
            .and_then(|()| search_predicate(request.get("appName")));
        self.execute("search", predicate, Projection::Display, limit)
            .await
    }

    /// A few entries sharing the requested attributes (e.g. same category)
    ///
    /// Always strict about unknown parameters and adds no rating default.
    pub async fn recommend(&self, request: &FilterRequest) -> Result<Vec<Document>> {
        let predicate = PredicateBuilder::strict()
            .without_default_rating()
            .build(request);
        self.execute(
            "recommend",
            predicate,
            Projection::Summary,
            ResultLimit::fixed(RECOMMEND_LIMIT),
        )
        .await
    }

    async fn execute(
        &self,
        query: &str,
        predicate: Result<Predicate>,
        projection: Projection,
        limit: ResultLimit,
    ) -> Result<Vec<Document>> {
        let started = Instant::now();
        let event = self.logger.event(query).with_limit(limit.get());

        let predicate = match predicate {
            Ok(p) => p,
            Err(e) => {
                warn!(query, error = %e, "Rejected catalog filter");
                self.logger.log(event.with_error(&e)).await;
                return Err(e);
            }
        };
        let event = event.with_fields(&predicate.fields());

        let result = self
            .store
            .find(&predicate, projection, limit)
            .await
            .map_err(|e| match e {
                AppshelfError::InvalidFilterValue { .. } | AppshelfError::QueryFailed(_) => e,
                other => AppshelfError::QueryFailed(other.to_string()),
            });
        let elapsed = started.elapsed().as_millis() as u64;

        match result {
            Ok(rows) => {
                self.logger
                    .log(event.with_rows(rows.len()).with_duration(elapsed))
                    .await;
                Ok(rows)
            }
            Err(e) => {
                warn!(query, predicate = %predicate, error = %e, "Catalog lookup failed");
                self.logger
                    .log(event.with_error(&e).with_duration(elapsed))
                    .await;
                Err(e)
            }
        }
    }
}
