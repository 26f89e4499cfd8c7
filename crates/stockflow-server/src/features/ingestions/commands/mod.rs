pub mod start;

pub use start::{IngestionSummary, StartIngestionCommand, StartIngestionError};
