//! Per-owner filter storage
//!
//! Filters live in a [`FilterStore`] as encoded account bytes, addressed by a
//! hash of `(seed, program id, owner, name)`. The registry trusts that the
//! caller has already been authenticated as `owner`: a caller can only name
//! filters under its own identity.

use crate::{
    bloom::{BloomFilter, NewFilter},
    config::FilterLimits,
    BloomError, Result,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Seed prefix for filter addresses
pub const BLOOM_FILTER_SEED: &[u8] = b"bloom-filter";

pub type Address = [u8; 32];

/// Identity of the caller that owns a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub [u8; 32]);

impl OwnerId {
    pub fn new(bytes: [u8; 32]) -> Self {
        OwnerId(bytes)
    }

    /// Deterministic identity from arbitrary seed bytes
    pub fn from_seed(seed: &[u8]) -> Self {
        OwnerId(Sha256::digest(seed).into())
    }

    pub fn random() -> Self {
        OwnerId(rand::random())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Identity of one filter: owner plus name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterKey {
    pub owner: OwnerId,
    pub name: String,
}

impl FilterKey {
    pub fn new(owner: OwnerId, name: impl Into<String>) -> Self {
        FilterKey {
            owner,
            name: name.into(),
        }
    }

    /// Storage address under `program_id`
    pub fn address(&self, program_id: &[u8; 32]) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(BLOOM_FILTER_SEED);
        hasher.update(program_id);
        hasher.update(self.owner.as_bytes());
        hasher.update(self.name.as_bytes());
        hasher.finalize().into()
    }
}

impl std::fmt::Display for FilterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", &hex::encode(self.owner.0)[..8], self.name)
    }
}

/// Byte storage for encoded filters
pub trait FilterStore: Send + Sync {
    fn load(&self, address: &Address) -> Result<Option<Vec<u8>>>;

    fn store(&self, address: &Address, data: Vec<u8>) -> Result<()>;

    fn exists(&self, address: &Address) -> Result<bool> {
        Ok(self.load(address)?.is_some())
    }
}

/// In-memory [`FilterStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<Address, Vec<u8>>>,
    max_account_size: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses accounts larger than `max_account_size` bytes
    pub fn with_max_account_size(max_account_size: usize) -> Self {
        MemoryStore {
            accounts: RwLock::new(HashMap::new()),
            max_account_size: Some(max_account_size),
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FilterStore for MemoryStore {
    fn load(&self, address: &Address) -> Result<Option<Vec<u8>>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| BloomError::Storage("account map lock poisoned".to_string()))?;
        Ok(accounts.get(address).cloned())
    }

    fn store(&self, address: &Address, data: Vec<u8>) -> Result<()> {
        if let Some(max) = self.max_account_size {
            if data.len() > max {
                return Err(BloomError::Storage(format!(
                    "account of {} bytes exceeds {} byte limit",
                    data.len(),
                    max
                )));
            }
        }
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| BloomError::Storage("account map lock poisoned".to_string()))?;
        accounts.insert(*address, data);
        Ok(())
    }
}

/// Entry points for named filters: init, add, check, fetch.
///
/// Mutations are serialized and each one stores the whole updated account,
/// so readers never see a half-applied add.
pub struct FilterRegistry<S: FilterStore> {
    store: S,
    limits: FilterLimits,
    program_id: [u8; 32],
    write_lock: Mutex<()>,
}

impl<S: FilterStore> FilterRegistry<S> {
    pub fn new(store: S) -> Self {
        Self::with_limits(store, FilterLimits::default())
    }

    pub fn with_limits(store: S, limits: FilterLimits) -> Self {
        FilterRegistry {
            store,
            limits,
            program_id: Sha256::digest(b"bloom-registry").into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_program_id(mut self, program_id: [u8; 32]) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn limits(&self) -> &FilterLimits {
        &self.limits
    }

    pub fn program_id(&self) -> &[u8; 32] {
        &self.program_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a filter. Fails with [`BloomError::AlreadyExists`] if the
    /// owner already has one under this name.
    pub fn init(&self, owner: OwnerId, new_filter: NewFilter) -> Result<BloomFilter> {
        self.create(owner, new_filter, false)
    }

    /// Create a filter, replacing any existing one under the same name
    pub fn reinit(&self, owner: OwnerId, new_filter: NewFilter) -> Result<BloomFilter> {
        self.create(owner, new_filter, true)
    }

    fn create(&self, owner: OwnerId, new_filter: NewFilter, overwrite: bool) -> Result<BloomFilter> {
        let key = FilterKey::new(owner, new_filter.name.clone());
        let address = key.address(&self.program_id);

        let _guard = self.lock()?;

        if !overwrite && self.store.exists(&address)? {
            warn!(filter = %key, "filter already exists");
            return Err(BloomError::AlreadyExists(key.to_string()));
        }

        let filter = BloomFilter::init(new_filter, &self.limits).map_err(|e| {
            warn!(filter = %key, error = %e, "rejected filter parameters");
            e
        })?;
        self.store.store(&address, filter.to_bytes()?)?;

        info!(
            filter = %key,
            m = filter.m(),
            k = filter.k(),
            overwrite,
            "init bloom filter"
        );
        Ok(filter)
    }

    /// Add an element to the owner's filter
    pub fn add(&self, owner: OwnerId, name: &str, element: &[u8]) -> Result<()> {
        let key = FilterKey::new(owner, name);
        let address = key.address(&self.program_id);

        let _guard = self.lock()?;

        let mut filter = self.load(&key, &address)?;
        filter.add(element)?;
        self.store.store(&address, filter.to_bytes()?)?;

        debug!(
            filter = %key,
            n = filter.n(),
            false_positive_rate = filter.false_positive_rate(),
            "added element"
        );
        Ok(())
    }

    /// Check an element against the owner's filter.
    ///
    /// Returns [`BloomError::ElementNotFound`] when it is definitely absent.
    pub fn check(&self, owner: OwnerId, name: &str, element: &[u8]) -> Result<()> {
        let key = FilterKey::new(owner, name);
        let filter = self.load(&key, &key.address(&self.program_id))?;

        let result = filter.check(element);
        debug!(filter = %key, possibly_present = result.is_ok(), "checked element");
        result
    }

    /// Current state of the owner's filter
    pub fn fetch(&self, owner: OwnerId, name: &str) -> Result<BloomFilter> {
        let key = FilterKey::new(owner, name);
        self.load(&key, &key.address(&self.program_id))
    }

    fn load(&self, key: &FilterKey, address: &Address) -> Result<BloomFilter> {
        let bytes = self
            .store
            .load(address)?
            .ok_or_else(|| BloomError::NotFound(key.to_string()))?;
        BloomFilter::from_bytes(&bytes)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| BloomError::Storage("registry lock poisoned".to_string()))
    }
}
