pub mod list;

pub use list::{ListInventoryError, ListInventoryQuery};
