use bloom_registry::utils::false_positive_rate;
use bloom_registry::{FilterRegistry, MemoryStore, NewFilter, OwnerId};
use rand::Rng;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const FILTER_NAME: &str = "bloom-filter";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Bloom Registry Benchmark");
    println!("{}", "=".repeat(55));

    // 210 sequential adds into a 2000-bit, 8-hash filter
    let registry = FilterRegistry::new(MemoryStore::new());
    let owner = OwnerId::random();
    registry.init(owner, NewFilter::new(FILTER_NAME, 2000, 8))?;

    let start = Instant::now();
    for i in 0..210 {
        registry.add(owner, FILTER_NAME, format!("element-{}", i).as_bytes())?;
    }
    let insert_time = start.elapsed();

    let filter = registry.fetch(owner, FILTER_NAME)?;
    println!("filter name {}", filter.name());
    println!("filter m {}", filter.m());
    println!("filter k {}", filter.k());
    println!("filter n {}", filter.n());
    println!("filter falsePositiveRate {:.6}", filter.false_positive_rate());
    println!("insert time {:?} for {} adds", insert_time, filter.n());
    println!();

    // Cost profile: grows with m (encode/decode of the account), flat in k
    println!("m,k,add_ns,check_ns,predicted_fpr,observed_fpr");
    let mut rng = rand::thread_rng();
    for &m in &[1000u32, 2000, 3000] {
        for &k in &[8u8, 16, 32] {
            let name = format!("profile-{}-{}", m, k);
            registry.init(owner, NewFilter::new(name.clone(), m, k))?;

            let num_elements = 100u32;
            let start = Instant::now();
            for i in 0..num_elements {
                registry.add(owner, &name, format!("element-{}", i).as_bytes())?;
            }
            let add_ns = start.elapsed().as_nanos() / u128::from(num_elements);

            let queries = 1000u32;
            let mut false_positives = 0u32;
            let start = Instant::now();
            for _ in 0..queries {
                let probe: [u8; 16] = rng.gen();
                if registry.check(owner, &name, &probe).is_ok() {
                    false_positives += 1;
                }
            }
            let check_ns = start.elapsed().as_nanos() / u128::from(queries);

            println!(
                "{},{},{},{},{:.6},{:.6}",
                m,
                k,
                add_ns,
                check_ns,
                false_positive_rate(m, num_elements, k),
                f64::from(false_positives) / f64::from(queries)
            );
        }
    }

    Ok(())
}
