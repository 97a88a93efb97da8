//! # jd-comment-spider-rs
//!
//! Fetches every review page of a JD product with a fixed pool of
//! concurrent workers and collects the comments into one list.
//!
//! - [`fetcher`] loads a single page and unwraps its JSONP envelope
//! - [`partition`] splits `[0, maxPage]` into one contiguous range per worker
//! - [`coordinator`] runs the discovery request, the workers and the merge
//! - [`output`] writes the collected comments to a CSV sheet

pub mod config;
pub mod coordinator;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod partition;
pub mod retry;
pub mod types;

pub use config::{CoordinatorConfig, FetchConfig, PartitionStrategy, RetryConfig};
pub use coordinator::{Coordinator, FetchReport, PageFailure};
pub use error::FetchError;
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use output::write_to_csv;
pub use partition::{Partition, PartitionPlan};
pub use types::{CommentRecord, FetchRequest, PAGE_SIZE, PageResult, Score, SortType};
