//! Incremental paging over the remote character listing.
//!
//! - [`PageLoader`] turns one page request into one [`LoadResult`]
//! - `refresh_key` picks where to resume after the loaded set is invalidated
//! - [`Pager`] owns the loaded pages for a query and drives the loader

mod pager;
mod source;
mod state;

pub use pager::{LoadState, Pager};
pub use source::{LoadError, LoadResult, PageKey, PageLoader};
pub use state::PagingConfig;
