//! CRM API access: paginated listings, wire models and the owner directory.

pub mod models;
pub mod owners;
pub mod paging;
pub mod source;

pub use owners::{OwnerDirectory, OwnerMap, OwnerSummary, UNKNOWN_OWNER};
pub use paging::{CrmError, FetchOutcome, PagedFetcher, MAX_PAGE_LIMIT};
pub use source::{CrmSource, HubSpotClient};
