//! Faceted listing search for a real-estate marketplace: URL path segments,
//! query-string parameters and sidebar controls resolve into one canonical
//! filter set, which runs as a paginated, sorted query against a property
//! store while the URL and the displayed results stay in step.

pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod storage;
pub mod store;
