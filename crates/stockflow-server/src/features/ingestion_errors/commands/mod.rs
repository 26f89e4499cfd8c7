pub mod correct;
pub mod delete;
pub mod promote;

pub use correct::{CorrectErrorCommand, CorrectErrorError};
pub use delete::{DeleteErrorCommand, DeleteErrorError};
pub use promote::{PromoteErrorCommand, PromoteErrorError, PromoteErrorResponse};
