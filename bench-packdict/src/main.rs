//! PackedDict benchmark with memory tracking.
//!
//! Measures build, point mutation, lookup, bulk merge, set operations, and
//! serialization at realistic small and large scales. Memory numbers come
//! from a tracking allocator so per-entry overhead is visible next to the
//! theoretical `block_size * n` floor.
//!
//! Run with: `cargo run --release -p bench-packdict`

use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use packdict::{intersection, merge, PackedDict};

// ============================================================================
// Tracking allocator
// ============================================================================

struct TrackingAllocator;

static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            let prev = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed);
            let current = prev + layout.size();
            let mut peak = PEAK.load(Ordering::Relaxed);
            while current > peak {
                match PEAK.compare_exchange_weak(
                    peak,
                    current,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(p) => peak = p,
                }
            }
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
        System.dealloc(ptr, layout);
    }
}

fn current_allocated() -> usize {
    ALLOCATED.load(Ordering::Relaxed)
}

// ============================================================================
// Data generation
// ============================================================================

const KEY_SIZE: usize = 8;
const VALUE_SIZE: usize = 8;

/// Sorted unique 8-byte keys with an 8-byte value each.
fn generate_sorted_pairs(count: usize, seed: u64) -> Vec<([u8; 8], [u8; 8])> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut keys: Vec<u64> = Vec::with_capacity(count);
    let mut next = 0u64;
    for _ in 0..count {
        // Sparse ascending keys leave gaps for miss lookups and merges.
        next += rng.gen_range(1..16);
        keys.push(next);
    }
    keys.into_iter()
        .map(|k| (k.to_be_bytes(), rng.gen::<u64>().to_be_bytes()))
        .collect()
}

fn as_refs(pairs: &[([u8; 8], [u8; 8])]) -> Vec<(&[u8], &[u8])> {
    pairs.iter().map(|(k, v)| (&k[..], &v[..])).collect()
}

/// Lookup keys: half hits drawn from `pairs`, half random misses.
fn generate_lookups(pairs: &[([u8; 8], [u8; 8])], count: usize, seed: u64) -> Vec<[u8; 8]> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            if rng.gen_bool(0.5) && !pairs.is_empty() {
                pairs[rng.gen_range(0..pairs.len())].0
            } else {
                rng.gen::<u64>().to_be_bytes()
            }
        })
        .collect()
}

// ============================================================================
// Benchmarks
// ============================================================================

struct BenchResult {
    scale: usize,
    build_ms: f64,
    insert_us_per_op: f64,
    lookup_ns_per_op: f64,
    bulk_ms: f64,
    merge_ms: f64,
    intersect_ms: f64,
    serialize_ms: f64,
    mem_bytes: usize,
    floor_bytes: usize,
}

fn bench_scale(n: usize) -> BenchResult {
    let pairs = generate_sorted_pairs(n, 42);
    let refs = as_refs(&pairs);
    let lookup_count = n.clamp(10_000, 200_000);
    let lookups = generate_lookups(&pairs, lookup_count, 99);

    // Build from sorted pairs.
    let baseline = current_allocated();
    let start = Instant::now();
    let dict = PackedDict::new(KEY_SIZE, VALUE_SIZE)
        .unwrap()
        .from_sorted_pairs(&refs)
        .unwrap();
    let build_ms = start.elapsed().as_secs_f64() * 1000.0;
    let mem_bytes = current_allocated() - baseline;

    // Point inserts: persistent style, so each insert copies the buffer.
    // Kept to a bounded count at every scale.
    let insert_count = n.max(1).min(1_000);
    let mut rng = SmallRng::seed_from_u64(7);
    let insert_keys: Vec<[u8; 8]> = (0..insert_count)
        .map(|_| rng.gen::<u64>().to_be_bytes())
        .collect();
    let start = Instant::now();
    let mut head = dict.clone();
    for k in &insert_keys {
        head = head.insert(k, &[0u8; 8]).unwrap();
    }
    let insert_us_per_op = start.elapsed().as_secs_f64() * 1e6 / insert_count as f64;
    black_box(&head);

    // Lookups.
    let start = Instant::now();
    for k in &lookups {
        black_box(dict.get(k).unwrap());
    }
    let lookup_ns_per_op = start.elapsed().as_secs_f64() * 1e9 / lookups.len() as f64;

    // Bulk insert of a 10% batch.
    let batch = generate_sorted_pairs(n / 10 + 1, 1337);
    let batch_refs = as_refs(&batch);
    let start = Instant::now();
    let bulked = dict.bulk_insert(&batch_refs).unwrap();
    let bulk_ms = start.elapsed().as_secs_f64() * 1000.0;
    black_box(&bulked);

    // Merge a 10% overlay.
    let overlay = PackedDict::new(KEY_SIZE, VALUE_SIZE)
        .unwrap()
        .from_sorted_pairs(&batch_refs)
        .unwrap();
    let start = Instant::now();
    let merged = merge(&overlay, &dict).unwrap();
    let merge_ms = start.elapsed().as_secs_f64() * 1000.0;
    black_box(&merged);

    // Intersection of four overlapping inputs.
    let inputs: Vec<PackedDict> = (0..4)
        .map(|i| {
            let p = generate_sorted_pairs(n / 2 + 1, 42 + i);
            PackedDict::new(KEY_SIZE, VALUE_SIZE)
                .unwrap()
                .from_sorted_pairs(&as_refs(&p))
                .unwrap()
        })
        .collect();
    let input_refs: Vec<&PackedDict> = inputs.iter().collect();
    let start = Instant::now();
    let common = intersection(&input_refs).unwrap();
    let intersect_ms = start.elapsed().as_secs_f64() * 1000.0;
    black_box(&common);

    // Serialize + reload.
    let start = Instant::now();
    let blob = dict.serialize();
    let reloaded = PackedDict::deserialize(&blob).unwrap();
    let serialize_ms = start.elapsed().as_secs_f64() * 1000.0;
    black_box(&reloaded);

    BenchResult {
        scale: n,
        build_ms,
        insert_us_per_op,
        lookup_ns_per_op,
        bulk_ms,
        merge_ms,
        intersect_ms,
        serialize_ms,
        mem_bytes,
        floor_bytes: dict.expected_size(n),
    }
}

// ============================================================================
// Report
// ============================================================================

fn format_count(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{}M", n / 1_000_000)
    } else if n >= 1_000 {
        format!("{}K", n / 1_000)
    } else {
        format!("{n}")
    }
}

fn format_bytes(n: usize) -> String {
    if n >= 1 << 20 {
        format!("{:.1} MiB", n as f64 / (1 << 20) as f64)
    } else if n >= 1 << 10 {
        format!("{:.1} KiB", n as f64 / (1 << 10) as f64)
    } else {
        format!("{n} B")
    }
}

fn report(r: &BenchResult) {
    println!("\n--- {} entries ---", format_count(r.scale));
    println!("  Build (from_sorted_pairs): {:>10.2} ms", r.build_ms);
    println!("  Point insert:              {:>10.2} us/op", r.insert_us_per_op);
    println!("  Lookup:                    {:>10.1} ns/op", r.lookup_ns_per_op);
    println!("  Bulk insert (10% batch):   {:>10.2} ms", r.bulk_ms);
    println!("  Merge (10% overlay):       {:>10.2} ms", r.merge_ms);
    println!("  Intersection (4 inputs):   {:>10.2} ms", r.intersect_ms);
    println!("  Serialize + reload:        {:>10.2} ms", r.serialize_ms);
    println!(
        "  Memory: {} (packed floor {}, overhead {:.2}%)",
        format_bytes(r.mem_bytes),
        format_bytes(r.floor_bytes),
        if r.floor_bytes > 0 {
            (r.mem_bytes as f64 / r.floor_bytes as f64 - 1.0) * 100.0
        } else {
            0.0
        }
    );
}

fn main() {
    println!("{}", "=".repeat(72));
    println!(
        "  PackedDict benchmark -- {}B keys, {}B values, {}B records",
        KEY_SIZE,
        VALUE_SIZE,
        KEY_SIZE + VALUE_SIZE
    );
    println!("{}", "=".repeat(72));

    for n in [10_000, 100_000, 1_000_000] {
        report(&bench_scale(n));
    }
}
