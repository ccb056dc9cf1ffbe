//! Domain module - search requests, listing records and price statistics
//!
//! Pure value types with no I/O; every other layer builds on these.

pub mod book_record;
pub mod price;
pub mod search_request;
pub mod statistics;

pub use book_record::{CleanedRecord, RawItemRecord};
pub use price::{format_price, parse_price};
pub use search_request::{RequestValidationError, SearchRequest};
pub use statistics::{ResultSet, Statistics};
