//! Persistence collaborator for the response cache

#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

/// Durable key-value store the cache mirrors its entries into.
///
/// Values are JSON strings. The cache treats every call as best-effort:
/// failures are logged and never change the outcome of a lookup or store.
#[cfg_attr(test, automock)]
pub trait KeyValueStore: Send + Sync {
    /// Gets a raw value
    fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Deletes a value; deleting a missing key is not an error
    fn delete(&self, key: &str) -> Result<(), DomainError>;
}
