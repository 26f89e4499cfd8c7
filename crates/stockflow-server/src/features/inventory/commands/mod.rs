pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateInventoryCommand, CreateInventoryError};
pub use delete::{DeleteInventoryCommand, DeleteInventoryError};
pub use update::{UpdateInventoryCommand, UpdateInventoryError};
