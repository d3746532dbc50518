//! Hash index derivation for Bloom filters
//!
//! Every element is hashed once into two 64-bit base values `(h1, h2)`.
//! The `k` bit positions are then derived by double hashing:
//! `p_i = (h1 + i * h2) mod m`. Cost per operation stays flat in `k`.

use serde::{Deserialize, Serialize};
use siphasher::sip128::{Hasher128, SipHasher13};
use std::hash::Hasher;

/// Golden ratio increment, also used as the second FNV offset basis.
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Fixed SipHash keys so stored filters re-derive the same positions.
const SIP_KEY_0: u64 = 0x626c_6f6f_6d2d_6669;
const SIP_KEY_1: u64 = 0x6c74_6572_2d6b_6579;

/// Trait for hashers that produce the two base values for double hashing
pub trait ElementHash: Send + Sync {
    /// Hash an element into `(h1, h2)`
    fn base_hashes(&self, element: &[u8]) -> (u64, u64);

    /// Get a name/identifier for this hash function
    fn name(&self) -> String;
}

/// FNV-1a based base hashes.
///
/// FNV alone mixes its high bits poorly, so both outputs go through a
/// 64-bit finalizer before use.
#[derive(Debug, Clone, Default)]
pub struct Fnv1aHash;

impl ElementHash for Fnv1aHash {
    fn base_hashes(&self, element: &[u8]) -> (u64, u64) {
        let mut first = fnv::FnvHasher::default();
        first.write(element);

        let mut second = fnv::FnvHasher::with_key(GOLDEN_GAMMA);
        second.write(element);

        (mix64(first.finish()), mix64(second.finish()))
    }

    fn name(&self) -> String {
        "fnv1a".to_string()
    }
}

/// SipHash-1-3 with a 128-bit output split into the two base hashes
#[derive(Debug, Clone)]
pub struct SipHash13 {
    key0: u64,
    key1: u64,
}

impl SipHash13 {
    pub fn new(key0: u64, key1: u64) -> Self {
        SipHash13 { key0, key1 }
    }
}

impl Default for SipHash13 {
    fn default() -> Self {
        SipHash13::new(SIP_KEY_0, SIP_KEY_1)
    }
}

impl ElementHash for SipHash13 {
    fn base_hashes(&self, element: &[u8]) -> (u64, u64) {
        let mut hasher = SipHasher13::new_with_keys(self.key0, self.key1);
        hasher.write(element);
        let hash = hasher.finish128();
        (hash.h1, hash.h2)
    }

    fn name(&self) -> String {
        format!("sip13-{:x}-{:x}", self.key0, self.key1)
    }
}

/// Hash scheme recorded with each filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashScheme {
    #[default]
    Fnv1a,
    Sip13,
}

impl HashScheme {
    pub fn base_hashes(&self, element: &[u8]) -> (u64, u64) {
        match self {
            HashScheme::Fnv1a => Fnv1aHash.base_hashes(element),
            HashScheme::Sip13 => SipHash13::default().base_hashes(element),
        }
    }

    pub fn name(&self) -> String {
        match self {
            HashScheme::Fnv1a => Fnv1aHash.name(),
            HashScheme::Sip13 => SipHash13::default().name(),
        }
    }
}

/// Bit position for slot `i` in a filter of `m` bits.
///
/// `h2` is forced odd so consecutive slots never land on the same stride of
/// zero. Returns 0 for `m == 0`.
#[inline]
pub fn bit_index(h1: u64, h2: u64, i: u64, m: u64) -> usize {
    if m == 0 {
        return 0;
    }
    (h1.wrapping_add(i.wrapping_mul(h2 | 1)) % m) as usize
}

/// All `k` bit positions for an element
pub fn bit_indices(scheme: HashScheme, element: &[u8], k: u8, m: u32) -> Vec<usize> {
    let (h1, h2) = scheme.base_hashes(element);
    (0..u64::from(k))
        .map(|i| bit_index(h1, h2, i, u64::from(m)))
        .collect()
}

// splitmix64 finalizer
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
