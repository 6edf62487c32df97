//! Throughput benchmarks for wordstm transactions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wordstm::Region;

fn bench_read_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("ro_read");

    for words in [1usize, 16, 256].iter() {
        let region = Region::new(4096, 8).unwrap();
        let base = region.start() as usize;

        group.throughput(Throughput::Elements(*words as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), words, |b, &words| {
            let mut out = vec![0u8; words * 8];
            b.iter(|| {
                let mut tx = region.begin(true);
                // SAFETY: in-bounds, 8-aligned benchmark buffers.
                unsafe {
                    tx.read(base as *const u8, words * 8, out.as_mut_ptr())
                        .unwrap();
                }
                tx.commit().unwrap();
                black_box(&out);
            });
        });
    }

    group.finish();
}

fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("rw_commit");

    for words in [1usize, 16, 256].iter() {
        let region = Region::new(4096, 8).unwrap();
        let base = region.start() as usize;

        group.throughput(Throughput::Elements(*words as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), words, |b, &words| {
            let payload = vec![0xABu8; words * 8];
            b.iter(|| {
                let mut tx = region.begin(false);
                // SAFETY: in-bounds, 8-aligned benchmark buffers.
                unsafe {
                    tx.write(payload.as_ptr(), words * 8, base as *mut u8)
                        .unwrap();
                }
                tx.commit().unwrap();
            });
        });
    }

    group.finish();
}

fn bench_increment(c: &mut Criterion) {
    let region = Region::new(64, 8).unwrap();
    let counter = region.start() as usize;

    c.bench_function("transact_increment", |b| {
        b.iter(|| {
            let v = region.transact(false, |tx| {
                let mut buf = [0u8; 8];
                // SAFETY: in-bounds, 8-aligned benchmark buffers.
                unsafe { tx.read(counter as *const u8, 8, buf.as_mut_ptr())? };
                let next = u64::from_ne_bytes(buf) + 1;
                let bytes = next.to_ne_bytes();
                unsafe { tx.write(bytes.as_ptr(), 8, counter as *mut u8)? };
                Ok(next)
            });
            black_box(v);
        });
    });
}

criterion_group!(benches, bench_read_only, bench_commit, bench_increment);
criterion_main!(benches);
