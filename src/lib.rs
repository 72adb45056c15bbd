//! folio application library
//!
//! Catalog and identity services for the book storefront. Everything a screen
//! needs goes through [`Services`].

pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::books::{
    Book, CatalogError, CatalogRepository, CatalogSource, FileLink, NewBookInput, Sourced,
};
pub use modules::*;
