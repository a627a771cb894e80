//! # symq-core
//!
//! Core types shared across all symq crates:
//! - The closed set of context categories a symbol occurrence can carry
//! - The column schema registry (core + extensible columns)
//! - Symbol record and source span types
//! - Search-key derivation used by both the loader and the query engine
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod schema;
