//! Object store implementations
//!
//! Contains LocalFsObjectStore and InMemoryObjectStore.

mod local_fs;
mod memory;

pub use self::local_fs::LocalFsObjectStore;
pub use self::memory::InMemoryObjectStore;
