//! # Bloom Registry
//!
//! Named, fixed-capacity Bloom filters owned per caller identity.
//! Each filter keeps its bit array, hash count, insertion count and a
//! running false positive estimate. A [`FilterRegistry`] stands in for the
//! host storage layer that addresses filters by `(owner, name)`.

pub mod bloom;
pub mod config;
pub mod hash;
pub mod registry;
pub mod utils;

pub use bloom::{BloomFilter, BloomStats, NewFilter};
pub use config::{FilterLimits, MAX_FILTER_BITS, MAX_HASHES, MAX_NAME_LEN};
pub use hash::{ElementHash, Fnv1aHash, HashScheme, SipHash13};
pub use registry::{FilterKey, FilterRegistry, FilterStore, MemoryStore, OwnerId};

// Python bindings
#[cfg(feature = "python")]
pub mod python_module;

/// Diagnostic carried by [`BloomError::ElementNotFound`].
pub const ELEMENT_NOT_FOUND_MSG: &str = "Element definitely not in the set";

/// Common error types for the library
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BloomError {
    #[error("Filter name is too long: {len} > {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("Filter size is too large: {size} > {max}")]
    FilterTooLarge { size: u32, max: u32 },

    #[error("Filter already exists: {0}")]
    AlreadyExists(String),

    #[error("Filter not found: {0}")]
    NotFound(String),

    #[error("Element definitely not in the set")]
    ElementNotFound,

    #[error("Element count overflow")]
    CountOverflow,

    #[error("Invalid filter data: {0}")]
    InvalidData(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BloomError {
    /// True for the membership-negative outcome of a check, as opposed to
    /// validation or storage failures.
    pub fn is_definitely_absent(&self) -> bool {
        matches!(self, BloomError::ElementNotFound)
    }
}

pub type Result<T> = std::result::Result<T, BloomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_bloom_filter() {
        let mut bloom = BloomFilter::new("basic", 1000, 10).unwrap();

        bloom.add(b"42").unwrap();
        bloom.add(b"1337").unwrap();
        bloom.add(b"9999").unwrap();

        assert!(bloom.check(b"42").is_ok());
        assert!(bloom.check(b"1337").is_ok());
        assert!(bloom.check(b"9999").is_ok());
        assert_eq!(bloom.n(), 3);
    }

    #[test]
    fn test_element_not_found_message() {
        let err = BloomError::ElementNotFound;
        assert_eq!(err.to_string(), ELEMENT_NOT_FOUND_MSG);
        assert!(err.is_definitely_absent());
        assert!(!BloomError::NotFound("x".to_string()).is_definitely_absent());
    }

    #[test]
    fn test_basic_registry() {
        let registry = FilterRegistry::new(MemoryStore::new());
        let owner = OwnerId::from_seed(b"alice");

        registry
            .init(owner, NewFilter::new("bloom-filter", 2000, 8))
            .unwrap();
        registry.add(owner, "bloom-filter", b"hello").unwrap();

        assert!(registry.check(owner, "bloom-filter", b"hello").is_ok());
    }
}
