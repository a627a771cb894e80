//! # symq-query
//!
//! Query engine over the symq symbol index.
//!
//! - [`filter`]: turns a [`FilterSet`] into one escaped SQL predicate.
//! - [`search`]: assembles statements for a [`Selection`] and runs them.
//! - [`proximity`]: two-phase multi-pattern search within N lines.
//! - [`presenter`]: column selection, width pass, table rendering.
//! - [`toc`]: per-file table of contents.
//! - [`diagnostics`]: explanations and retry for empty results.
//!
//! Everything runs sequentially on one connection; the only shared state is
//! the connection-scoped proximity scratch table.

pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod presenter;
pub mod proximity;
pub mod query_text;
pub mod search;
pub mod source;
pub mod toc;
pub mod within;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::QueryError;
pub use filter::FilterSet;
pub use proximity::{PROXIMITY_TABLE, ProximityRequest};
pub use search::{Searcher, Selection};
