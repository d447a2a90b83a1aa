pub mod clock;
pub mod error;
pub mod response_cache;
pub mod text;
pub mod tokenizer;
pub mod usage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, ErrorKind};
