pub mod get;
pub mod list;

pub use get::{GetIngestionError, GetIngestionQuery};
pub use list::{ListIngestionsError, ListIngestionsQuery};
