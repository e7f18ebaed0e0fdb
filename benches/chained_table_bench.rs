use chained_table::{mix, ChainedTable, EntryPolicy};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

struct Rec {
    key: String,
    val: u64,
}

struct ByKey;

impl EntryPolicy<Rec> for ByKey {
    fn hash(&self, entry: &Rec) -> u32 {
        mix::hash_bytes(entry.key.as_bytes())
    }

    fn equal(&self, a: &Rec, b: &Rec) -> bool {
        a.key == b.key
    }
}

fn probe(k: &str) -> Rec {
    Rec {
        key: k.to_string(),
        val: 0,
    }
}

fn filled(seed: u64, n: usize) -> (ChainedTable<Rec, ByKey>, Vec<String>) {
    let mut t = ChainedTable::with_policy(ByKey);
    let keys: Vec<_> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        t.set(Rec {
            key: k.clone(),
            val: i as u64,
        });
    }
    (t, keys)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("chained_table_insert_10k", |b| {
        b.iter_batched(
            || ChainedTable::<Rec, ByKey>::with_policy(ByKey),
            |mut t| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    t.set(Rec {
                        key: key(x),
                        val: i as u64,
                    });
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_reserved(c: &mut Criterion) {
    c.bench_function("chained_table_insert_10k_reserved", |b| {
        b.iter_batched(
            || {
                let mut t = ChainedTable::<Rec, ByKey>::with_policy(ByKey);
                t.reserve(10_000);
                t
            },
            |mut t| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    t.set(Rec {
                        key: key(x),
                        val: i as u64,
                    });
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_u32_identity(c: &mut Criterion) {
    c.bench_function("chained_table_insert_u32_100k", |b| {
        b.iter_batched(
            || {
                ChainedTable::<u32, _>::with_policy(chained_table::FnPolicy::new(
                    |v: &u32| *v,
                    |a: &u32, b: &u32| a == b,
                ))
            },
            |mut t| {
                for v in 0..100_000u32 {
                    t.set(v);
                }
                black_box(t.len())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("chained_table_get_hit", |b| {
        let (t, keys) = filled(7, 20_000);
        let probes: Vec<_> = keys.iter().map(|k| probe(k)).collect();
        let mut it = probes.iter().cycle();
        b.iter(|| {
            let q = it.next().unwrap();
            black_box(t.get(q).map(|r| r.val));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("chained_table_get_miss", |b| {
        let (t, _keys) = filled(11, 10_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            let q = probe(&key(miss.next().unwrap()));
            black_box(t.get(&q).is_some());
        })
    });
}

fn bench_delete_reinsert(c: &mut Criterion) {
    c.bench_function("chained_table_delete_reinsert", |b| {
        let (mut t, keys) = filled(13, 10_000);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            let q = probe(k);
            black_box(t.delete(&q));
            t.set(q);
        })
    });
}

fn bench_mix(c: &mut Criterion) {
    c.bench_function("mix_hash_bytes_16", |b| {
        let bytes = *b"0123456789abcdef";
        b.iter(|| black_box(mix::hash_bytes(black_box(&bytes))))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_insert_reserved, bench_insert_u32_identity,
        bench_get_hit, bench_get_miss, bench_delete_reinsert, bench_mix
}
criterion_main!(benches);
