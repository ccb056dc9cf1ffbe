//! Book Price Finder - resilient search-result extraction for book listings
//!
//! Finds a book on an e-commerce search surface, extracts title, author,
//! price and link from every listing across a bounded number of result
//! pages, and ranks the listings by price with summary statistics.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod test_utils;
