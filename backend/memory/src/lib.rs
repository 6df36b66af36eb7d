pub mod sqlite_store;
pub mod store;
pub mod types;

pub use sqlite_store::SqliteDialogLog;
pub use store::{DialogLog, InMemoryDialogLog};
pub use types::{DialogRecord, DialogRole};
