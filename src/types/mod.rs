//! Shared types for Appshelf

mod error;

pub use error::{AppshelfError, Result};
