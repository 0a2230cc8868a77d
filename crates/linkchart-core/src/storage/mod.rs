mod memory;
mod notify;
mod redb_store;
mod traits;

pub use memory::MemoryStateStore;
pub use redb_store::{RedbStateStore, CURRENT_SCHEMA_VERSION};
pub use traits::GraphStateStore;
