//! Query translation engine
//!
//! Turns an arbitrary bag of client filter parameters into a typed, bounded
//! catalog lookup.
//!
//! ```text
//! FilterRequest ──► PredicateBuilder ──(parsers)──► Predicate ─┐
//!       │                                                        ├─► CatalogStore::find ─► rows
//!       └─ currentCount ──► PaginationResolver ──► ResultLimit ─┘
//! ```

pub mod builder;
pub mod fields;
pub mod pagination;
pub mod parsers;
pub mod predicate;
pub mod projection;
pub mod request;
pub mod service;
pub mod store;

pub use builder::{PredicateBuilder, UnknownFieldPolicy};
pub use fields::{FieldKind, FilterField};
pub use pagination::{PaginationResolver, ResultLimit};
pub use predicate::{Condition, FieldValue, Predicate};
pub use projection::{row_to_json, Projection};
pub use request::FilterRequest;
pub use service::CatalogQueryService;
pub use store::{CatalogStore, MemoryCatalogStore};
