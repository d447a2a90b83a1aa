//! Response cache implementation

mod in_memory;

pub use in_memory::ResponseCache;
