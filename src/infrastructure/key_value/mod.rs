//! Key-value stores used to persist cache entries

mod in_memory;
mod json_file;

pub use in_memory::InMemoryKeyValueStore;
pub use json_file::JsonFileKeyValueStore;
