pub mod canonical;
pub mod query;
pub mod slug;
pub mod sync;
pub mod types;

pub use canonical::{canonicalize, QueryParams, RouteParams};
pub use query::QueryExecutor;
pub use sync::{FetchTicket, SearchSync, SyncStatus};
pub use types::{FilterParam, ListingsFilters, PagedResult, SortOrder};
