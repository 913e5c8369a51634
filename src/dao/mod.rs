/// Catalog abstraction over game definitions.
pub mod catalog;
/// In-memory catalog implementation.
pub mod memory;
/// Catalog record definitions.
pub mod models;
