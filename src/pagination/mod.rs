//! Pagination module
//!
//! The [`PageSource`] contract and its implementations over the remote API.
//!
//! # Overview
//!
//! A page source turns one page request (caller filters plus a 1-based page
//! number and a page size) into a [`Page`] of typed records and an
//! end-of-data signal. It isolates the lister from per-resource differences:
//! which remote call is made, how pagination fields are named and what record
//! type comes back.

mod sources;
mod types;

pub use sources::ApiSource;
pub use types::{Page, PageParams, PageRequest, PageSource};
