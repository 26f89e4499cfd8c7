pub mod list_by_ingestion;

pub use list_by_ingestion::{ListErrorsError, ListErrorsQuery};
