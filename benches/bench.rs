use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use softlru::{FnHooks, LruCache};

fn put_get(c: &mut Criterion) {
    c.bench_function("lru_put_get", |b| {
        let cache = LruCache::new(1024).unwrap();
        let mut i = 0u64;

        b.iter(|| {
            i = i.wrapping_add(1);
            cache.put(i % 2048, i).unwrap();
            cache.get(&(i % 1024)).unwrap()
        });
    });
}

fn weighted_eviction(c: &mut Criterion) {
    c.bench_function("lru_weighted_eviction", |b| {
        let hooks = FnHooks::new().with_weight(|_: &u64, value: &Vec<u8>| value.len() as isize);
        let cache = LruCache::with_hooks(64 * 1024, hooks).unwrap();
        let data: Vec<Vec<u8>> = (0..256)
            .map(|_| vec![0; rand::random_range(16..1024)])
            .collect();
        let mut i = 0usize;

        b.iter(|| {
            i = i.wrapping_add(1);
            cache.put(i as u64, data[i % data.len()].clone()).unwrap();
        });
    });
}

fn contended_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    for threads in [1, 2, 4, 8].iter() {
        group.bench_with_input(format!("{}_threads", threads), threads, |b, &size| {
            let cache = Arc::new(LruCache::new(4096).unwrap());

            b.iter(|| {
                const OPS: u64 = 1000;
                crossbeam::scope(|s| {
                    for t in 0..size as u64 {
                        let cache = &cache;
                        s.spawn(move |_| {
                            for i in 0..OPS {
                                let key = (t * OPS + i) % 8192;
                                if cache.get(&key).unwrap().is_none() {
                                    cache.put(key, i).unwrap();
                                }
                            }
                        });
                    }
                })
                .unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, put_get, weighted_eviction, contended_access);
criterion_main!(benches);
