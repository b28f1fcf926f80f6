use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dbpack::model::GuardList;
use dbpack::number::{Number, normalize_pool};
use dbpack::{Packet, allocate};

const DB_SIZE: usize = 250;

/// Raw pool cells the way a real backend holds them: a mix of clean rows,
/// formatted rows and the occasional short garbage entry.
fn raw_pool(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 10 {
            0 => format!("+62 812-{:04}-{:04}", i % 10_000, i / 10_000),
            9 => "123".to_string(), // malformed, dropped by normalization
            _ => format!("62812{i:08}"),
        })
        .collect()
}

fn guards() -> GuardList {
    let raw: Vec<String> = (0..10).map(|i| format!("0899000000{i}")).collect();
    GuardList::from_raw(&raw)
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for count in [10_000usize, 100_000, 1_000_000] {
        let raw = raw_pool(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &raw, |b, raw| {
            b.iter(|| black_box(normalize_pool(raw)));
        });
    }

    group.finish();
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");

    for packets in [1usize, 5, 10] {
        let pool: Vec<Number> = normalize_pool(raw_pool(packets * DB_SIZE * 2));
        let guards = guards();
        group.bench_with_input(
            BenchmarkId::from_parameter(packets),
            &packets,
            |b, &packets| {
                b.iter(|| {
                    black_box(allocate(packets, pool.clone(), &guards, 7, DB_SIZE).unwrap())
                });
            },
        );
    }

    group.finish();
}

fn bench_drain_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_pool");
    group.sample_size(10);

    // Repeated single-packet jobs until the pool runs dry, the dominant
    // production access pattern.
    let pool: Vec<Number> = normalize_pool(raw_pool(100 * DB_SIZE));
    let guards = guards();
    group.bench_function("100_jobs", |b| {
        b.iter(|| {
            let mut pool = pool.clone();
            let mut pointer = 0;
            let mut produced = 0usize;
            while let Ok(alloc) = allocate(1, pool, &guards, pointer, DB_SIZE) {
                produced += alloc.packets.len();
                pool = alloc.remainder;
                pointer = alloc.new_pointer;
            }
            black_box(produced)
        });
    });

    group.finish();
}

fn bench_packet_shape(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_shape");

    // Cost of cloning a full allocation result, which the renderer consumes.
    let pool: Vec<Number> = normalize_pool(raw_pool(10 * DB_SIZE * 2));
    let alloc = allocate(10, pool, &guards(), 0, DB_SIZE).unwrap();
    group.bench_function("clone_10_packets", |b| {
        b.iter(|| {
            let packets: Vec<Packet> = black_box(alloc.packets.clone());
            packets
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_normalize,
    bench_allocate,
    bench_drain_pool,
    bench_packet_shape,
);

criterion_main!(benches);
