//! HTTP server for Appshelf

pub mod http;

pub use http::{dispatch, run, AppState};
