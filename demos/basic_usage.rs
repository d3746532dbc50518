//! Basic usage examples for bloom-registry

use bloom_registry::utils::optimal_bloom_parameters;
use bloom_registry::{
    BloomFilter, FilterLimits, FilterRegistry, HashScheme, MemoryStore, NewFilter, OwnerId,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Bloom Registry Examples ===\n");

    // Example 1: A standalone filter
    println!("1. Standalone filter:");
    let mut bloom = BloomFilter::new("fruits", 1000, 7)?;

    for item in ["apple", "banana", "cherry"] {
        bloom.add(item.as_bytes())?;
    }

    for item in ["apple", "banana", "cherry", "grape", "melon"] {
        match bloom.check(item.as_bytes()) {
            Ok(()) => println!("  {}: possibly present", item),
            Err(e) if e.is_definitely_absent() => println!("  {}: {}", item, e),
            Err(e) => return Err(e.into()),
        }
    }

    println!("  {}", bloom.stats());
    println!();

    // Example 2: Picking m and k for a target rate
    println!("2. Sizing a filter:");
    let limits = FilterLimits::default();
    let params = optimal_bloom_parameters(500, 0.01, &limits);
    println!(
        "  500 elements at 1%: m={} k={} (expected rate {:.4})",
        params.num_bits, params.num_hashes, params.expected_fpr
    );
    println!(
        "  largest account: {} bytes",
        BloomFilter::account_size(&limits)?
    );
    println!();

    // Example 3: Filters owned per identity
    println!("3. Registry:");
    let registry = FilterRegistry::new(MemoryStore::new());
    let alice = OwnerId::from_seed(b"alice");
    let bob = OwnerId::from_seed(b"bob");

    registry.init(alice, NewFilter::new("seen", params.num_bits, params.num_hashes))?;
    registry.init(
        bob,
        NewFilter::new("seen", 2000, 8).with_scheme(HashScheme::Sip13),
    )?;

    registry.add(alice, "seen", b"tx-1")?;
    registry.add(alice, "seen", b"tx-1")?;
    registry.add(bob, "seen", b"tx-2")?;

    println!(
        "  alice has tx-1: {}",
        registry.check(alice, "seen", b"tx-1").is_ok()
    );
    println!(
        "  bob has tx-1: {}",
        registry.check(bob, "seen", b"tx-1").is_ok()
    );

    let alice_filter = registry.fetch(alice, "seen")?;
    println!(
        "  alice n={} (duplicates count) rate={:.8}",
        alice_filter.n(),
        alice_filter.false_positive_rate()
    );

    if let Err(e) = registry.init(alice, NewFilter::new("seen", 1000, 8)) {
        println!("  second init: {}", e);
    }

    Ok(())
}
