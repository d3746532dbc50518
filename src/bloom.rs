//! Named Bloom filter state
//!
//! A fixed-size bit array plus the metadata the storage layer persists with
//! it. Bits only ever go from 0 to 1 and the array never resizes.

use crate::{
    config::FilterLimits,
    hash::{bit_indices, HashScheme},
    utils::false_positive_rate,
    BloomError, Result,
};
use bit_vec::BitVec;
use serde::{Deserialize, Serialize};

/// Leading bytes of every encoded filter account.
pub const ACCOUNT_DISCRIMINATOR: [u8; 8] = *b"bloomflt";

/// Parameters for a new filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFilter {
    pub name: String,
    /// Bit-array size (m)
    pub size: u32,
    /// Number of hash functions (k)
    pub num_hashes: u8,
    #[serde(default)]
    pub scheme: HashScheme,
}

impl NewFilter {
    pub fn new(name: impl Into<String>, size: u32, num_hashes: u8) -> Self {
        NewFilter {
            name: name.into(),
            size,
            num_hashes,
            scheme: HashScheme::default(),
        }
    }

    pub fn with_scheme(mut self, scheme: HashScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn validate(&self, limits: &FilterLimits) -> Result<()> {
        if self.name.len() > limits.max_name_len {
            return Err(BloomError::NameTooLong {
                len: self.name.len(),
                max: limits.max_name_len,
            });
        }
        if self.size == 0 {
            return Err(BloomError::InvalidParameters(
                "Bit count must be > 0".to_string(),
            ));
        }
        if self.num_hashes == 0 {
            return Err(BloomError::InvalidParameters(
                "Number of hashes must be > 0".to_string(),
            ));
        }
        if self.size > limits.max_filter_bits {
            return Err(BloomError::FilterTooLarge {
                size: self.size,
                max: limits.max_filter_bits,
            });
        }
        if self.num_hashes > limits.max_hashes {
            return Err(BloomError::InvalidParameters(format!(
                "Number of hashes must be 1-{}",
                limits.max_hashes
            )));
        }
        Ok(())
    }
}

/// A named Bloom filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomFilter {
    /// Filter name, part of the storage identity
    name: String,
    /// Bit array storing the filter data
    #[serde(with = "bitvec_bytes")]
    bits: BitVec,
    /// Size of the bit array
    m: u32,
    /// Number of hash functions
    k: u8,
    /// Number of add operations performed
    n: u32,
    /// Estimated false positive rate after `n` adds
    false_positive_rate: f64,
    scheme: HashScheme,
}

/// Serde support for BitVec
mod bitvec_bytes {
    use bit_vec::BitVec;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (bits.to_bytes(), bits.len()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bytes, len): (Vec<u8>, usize) = Deserialize::deserialize(deserializer)?;
        let mut bits = BitVec::from_bytes(&bytes);
        if len > bits.len() {
            return Err(D::Error::custom(format!(
                "bit length {} exceeds {} stored bits",
                len,
                bits.len()
            )));
        }
        bits.truncate(len);
        Ok(bits)
    }
}

impl BloomFilter {
    /// Create a filter after validating `new_filter` against `limits`
    pub fn init(new_filter: NewFilter, limits: &FilterLimits) -> Result<Self> {
        new_filter.validate(limits)?;

        Ok(BloomFilter {
            name: new_filter.name,
            bits: BitVec::from_elem(new_filter.size as usize, false),
            m: new_filter.size,
            k: new_filter.num_hashes,
            n: 0,
            false_positive_rate: 0.0,
            scheme: new_filter.scheme,
        })
    }

    /// Create a filter with the default limits
    pub fn new(name: impl Into<String>, m: u32, k: u8) -> Result<Self> {
        Self::init(NewFilter::new(name, m, k), &FilterLimits::default())
    }

    /// Bit positions for an element
    pub fn indices(&self, element: &[u8]) -> Vec<usize> {
        bit_indices(self.scheme, element, self.k, self.m)
    }

    /// Add an element.
    ///
    /// Duplicates still set their bits and bump `n`; the filter cannot tell
    /// a repeat from a false positive.
    pub fn add(&mut self, element: &[u8]) -> Result<()> {
        let n = self.n.checked_add(1).ok_or(BloomError::CountOverflow)?;

        for index in self.indices(element) {
            self.bits.set(index, true);
        }

        self.n = n;
        self.update_false_positive_rate();
        Ok(())
    }

    /// Check if an element might be in the filter.
    ///
    /// `Ok(())` means possibly present. [`BloomError::ElementNotFound`] means
    /// definitely absent.
    pub fn check(&self, element: &[u8]) -> Result<()> {
        let indices = self.indices(element);
        self.check_indices(&indices)
    }

    /// Boolean form of [`BloomFilter::check`]
    pub fn contains(&self, element: &[u8]) -> bool {
        self.check(element).is_ok()
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        if !indices
            .iter()
            .all(|&index| self.bits.get(index).unwrap_or(false))
        {
            return Err(BloomError::ElementNotFound);
        }
        Ok(())
    }

    fn update_false_positive_rate(&mut self) {
        self.false_positive_rate = false_positive_rate(self.m, self.n, self.k);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the bit array
    pub fn m(&self) -> u32 {
        self.m
    }

    /// Number of hash functions
    pub fn k(&self) -> u8 {
        self.k
    }

    /// Number of add operations performed
    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    /// The bit array as booleans, index 0 first
    pub fn bit_array(&self) -> Vec<bool> {
        self.bits.iter().collect()
    }

    pub fn bits_set(&self) -> usize {
        self.bits.iter().filter(|&bit| bit).count()
    }

    /// Fraction of bits set
    pub fn load_factor(&self) -> f64 {
        self.bits_set() as f64 / self.bits.len() as f64
    }

    /// Get statistics about the filter
    pub fn stats(&self) -> BloomStats {
        BloomStats {
            name: self.name.clone(),
            m: self.m,
            k: self.k,
            n: self.n,
            bits_set: self.bits_set(),
            load_factor: self.load_factor(),
            false_positive_rate: self.false_positive_rate,
        }
    }

    /// Encode as account bytes: discriminator followed by the bincode body
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)
            .map_err(|e| BloomError::InvalidData(format!("encode failed: {}", e)))?;

        let mut bytes = Vec::with_capacity(ACCOUNT_DISCRIMINATOR.len() + body.len());
        bytes.extend_from_slice(&ACCOUNT_DISCRIMINATOR);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode account bytes written by [`BloomFilter::to_bytes`].
    ///
    /// The false positive rate is recomputed from `m`, `n` and `k`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let body = bytes
            .strip_prefix(&ACCOUNT_DISCRIMINATOR[..])
            .ok_or_else(|| BloomError::InvalidData("bad account discriminator".to_string()))?;

        let mut filter: BloomFilter = bincode::deserialize(body)
            .map_err(|e| BloomError::InvalidData(format!("decode failed: {}", e)))?;

        if filter.m == 0 || filter.k == 0 {
            return Err(BloomError::InvalidData(format!(
                "m={} k={} must both be > 0",
                filter.m, filter.k
            )));
        }
        if filter.bits.len() != filter.m as usize {
            return Err(BloomError::InvalidData(format!(
                "bit array holds {} bits, expected {}",
                filter.bits.len(),
                filter.m
            )));
        }

        filter.update_false_positive_rate();
        Ok(filter)
    }

    /// Bytes needed to hold the largest filter `limits` allow
    pub fn account_size(limits: &FilterLimits) -> Result<usize> {
        let largest = BloomFilter::init(
            NewFilter::new("x".repeat(limits.max_name_len), limits.max_filter_bits, 1),
            limits,
        )?;
        Ok(largest.to_bytes()?.len())
    }
}

/// Statistics about a Bloom filter
#[derive(Debug, Clone)]
pub struct BloomStats {
    pub name: String,
    pub m: u32,
    pub k: u8,
    pub n: u32,
    pub bits_set: usize,
    pub load_factor: f64,
    pub false_positive_rate: f64,
}

impl std::fmt::Display for BloomStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "BloomFilter '{}':\n\
             - Size: {} bits\n\
             - Hash functions: {}\n\
             - Elements added: {}\n\
             - Bits set: {}\n\
             - Load factor: {:.3}\n\
             - False positive rate: {:.6}",
            self.name,
            self.m,
            self.k,
            self.n,
            self.bits_set,
            self.load_factor,
            self.false_positive_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_sets_fields() {
        let bloom = BloomFilter::new("bloom-filter", 1000, 32).unwrap();

        assert_eq!(bloom.name(), "bloom-filter");
        assert_eq!(bloom.m(), 1000);
        assert_eq!(bloom.k(), 32);
        assert_eq!(bloom.n(), 0);
        assert_eq!(bloom.false_positive_rate(), 0.0);
        assert_eq!(bloom.bits_set(), 0);
        assert_eq!(bloom.bit_array().len(), 1000);
    }

    #[test]
    fn test_init_rejects_zero_parameters() {
        assert!(matches!(
            BloomFilter::new("f", 0, 8),
            Err(BloomError::InvalidParameters(_))
        ));
        assert!(matches!(
            BloomFilter::new("f", 1000, 0),
            Err(BloomError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_init_rejects_oversized() {
        assert_eq!(
            BloomFilter::new("f", 10_001, 8),
            Err(BloomError::FilterTooLarge {
                size: 10_001,
                max: 10_000
            })
        );
        assert!(BloomFilter::new("f", 10_000, 8).is_ok());

        let limits = FilterLimits::new(32, 5000, 16).unwrap();
        assert!(BloomFilter::init(NewFilter::new("f", 2000, 17), &limits).is_err());
        assert!(BloomFilter::init(NewFilter::new("f", 2000, 16), &limits).is_ok());
    }

    #[test]
    fn test_init_rejects_long_name() {
        let name = "n".repeat(33);
        assert_eq!(
            BloomFilter::new(name, 1000, 8),
            Err(BloomError::NameTooLong { len: 33, max: 32 })
        );
        assert!(BloomFilter::new("n".repeat(32), 1000, 8).is_ok());
    }

    #[test]
    fn test_add_then_check() {
        let mut bloom = BloomFilter::new("f", 1000, 8).unwrap();
        bloom.add(b"hello").unwrap();

        assert!(bloom.check(b"hello").is_ok());
        assert!(bloom.contains(b"hello"));
        assert_eq!(bloom.n(), 1);
        assert!(bloom.false_positive_rate() <= 0.01);
        assert!(bloom.false_positive_rate() > 0.0);
    }

    #[test]
    fn test_check_reports_absent() {
        let mut bloom = BloomFilter::new("f", 2000, 8).unwrap();
        bloom.add(b"X").unwrap();

        let err = bloom.check(b"Y").unwrap_err();
        assert!(err.is_definitely_absent());
        assert!(err.to_string().contains("Element definitely not in the set"));
    }

    #[test]
    fn test_empty_filter_rejects_everything() {
        let bloom = BloomFilter::new("f", 100, 3).unwrap();
        assert_eq!(bloom.check(b"anything"), Err(BloomError::ElementNotFound));
        assert_eq!(bloom.check(b""), Err(BloomError::ElementNotFound));
    }

    #[test]
    fn test_empty_element_accepted() {
        let mut bloom = BloomFilter::new("f", 100, 3).unwrap();
        bloom.add(b"").unwrap();
        assert!(bloom.check(b"").is_ok());
        assert_eq!(bloom.n(), 1);
    }

    #[test]
    fn test_duplicate_add_counts_twice() {
        let mut bloom = BloomFilter::new("f", 2000, 16).unwrap();

        bloom.add(b"dup").unwrap();
        let after_first = bloom.bit_array();
        let rate_first = bloom.false_positive_rate();

        bloom.add(b"dup").unwrap();
        assert_eq!(bloom.bit_array(), after_first);
        assert_eq!(bloom.n(), 2);
        assert!(bloom.false_positive_rate() > rate_first);
    }

    #[test]
    fn test_add_sets_at_most_k_bits() {
        let mut bloom = BloomFilter::new("f", 2000, 16).unwrap();
        bloom.add(b"element").unwrap();

        let set = bloom.bits_set();
        assert!(set >= 1 && set <= 16);

        let mut expected = bloom.indices(b"element");
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(set, expected.len());
    }

    #[test]
    fn test_count_overflow_leaves_state() {
        let mut bloom = BloomFilter::new("f", 100, 3).unwrap();
        bloom.n = u32::MAX;
        let before = bloom.clone();

        assert_eq!(bloom.add(b"x"), Err(BloomError::CountOverflow));
        assert_eq!(bloom, before);
    }

    #[test]
    fn test_sip_scheme_filter() {
        let new_filter = NewFilter::new("f", 1000, 8).with_scheme(HashScheme::Sip13);
        let mut bloom = BloomFilter::init(new_filter, &FilterLimits::default()).unwrap();
        bloom.add(b"sip").unwrap();
        assert_eq!(bloom.scheme(), HashScheme::Sip13);
        assert!(bloom.check(b"sip").is_ok());
    }

    #[test]
    fn test_bytes_roundtrip_keeps_membership() {
        let mut bloom = BloomFilter::new("bloom-filter", 2000, 8).unwrap();
        for i in 0..50 {
            bloom.add(format!("element-{}", i).as_bytes()).unwrap();
        }

        let bytes = bloom.to_bytes().unwrap();
        assert_eq!(&bytes[..8], &ACCOUNT_DISCRIMINATOR);

        let decoded = BloomFilter::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, bloom);
        for i in 0..50 {
            assert!(decoded.check(format!("element-{}", i).as_bytes()).is_ok());
        }
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(matches!(
            BloomFilter::from_bytes(b"nope"),
            Err(BloomError::InvalidData(_))
        ));

        let bloom = BloomFilter::new("f", 100, 3).unwrap();
        let mut bytes = bloom.to_bytes().unwrap();
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(
            BloomFilter::from_bytes(&bytes),
            Err(BloomError::InvalidData(_))
        ));
    }

    #[test]
    fn test_from_bytes_rejects_size_mismatch() {
        let mut bloom = BloomFilter::new("f", 100, 3).unwrap();
        bloom.m = 200;
        let bytes = bloom.to_bytes().unwrap();
        assert!(matches!(
            BloomFilter::from_bytes(&bytes),
            Err(BloomError::InvalidData(_))
        ));
    }

    #[test]
    fn test_from_bytes_recomputes_rate() {
        let mut bloom = BloomFilter::new("f", 1000, 8).unwrap();
        bloom.add(b"a").unwrap();
        let expected = bloom.false_positive_rate();

        bloom.false_positive_rate = 0.75;
        let decoded = BloomFilter::from_bytes(&bloom.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.false_positive_rate(), expected);
    }

    #[test]
    fn test_account_size_grows_with_limit() {
        let small = BloomFilter::account_size(&FilterLimits::new(32, 5000, 255).unwrap()).unwrap();
        let large = BloomFilter::account_size(&FilterLimits::default()).unwrap();

        assert!(small > 5000 / 8);
        assert_eq!(large - small, 625);
    }

    #[test]
    fn test_bloom_filter_stats() {
        let mut bloom = BloomFilter::new("stats", 1000, 5).unwrap();

        for i in 0..100u32 {
            bloom.add(&i.to_le_bytes()).unwrap();
        }

        let stats = bloom.stats();
        assert_eq!(stats.k, 5);
        assert_eq!(stats.n, 100);
        assert!(stats.load_factor > 0.0);
        assert!(stats.false_positive_rate > 0.0);
        assert!(stats.to_string().contains("Elements added: 100"));
    }
}
