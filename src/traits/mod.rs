//! Trait definitions for datastore operations.

mod get;

pub use get::Get;
