//! Application layer
//!
//! Orchestration of one search request on top of the domain types and the
//! infrastructure sessions: pagination, normalization, reporting and export.

pub mod context;
pub mod export;
pub mod normalizer;
pub mod pagination;
pub mod report;
pub mod search_error;
pub mod search_orchestrator;

pub use context::SessionContext;
pub use export::{ExportError, export_csv, export_file_name, write_csv};
pub use normalizer::normalize;
pub use pagination::{CollectionLimits, CollectionOutcome, PaginationController, StopReason};
pub use report::{EmptyReason, ReportRow, SearchReport};
pub use search_error::{SearchError, SearchResult};
pub use search_orchestrator::{SearchOrchestrator, SearchSettings, try_optional_step};
