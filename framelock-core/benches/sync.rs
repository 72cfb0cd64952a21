use criterion::{black_box, criterion_group, criterion_main, Criterion};
use framelock_core::ellip;
use framelock_core::{FrameGenerator, FrameSynchronizer, SyncProperties};

fn bench_frame_recovery(c: &mut Criterion) {
    let mut framer = FrameGenerator::new();
    let header: [u8; 24] = std::array::from_fn(|i| i as u8);
    let payload: [u8; 64] = std::array::from_fn(|i| (i * 5) as u8);
    let samples = framer.generate(&header, &payload);

    c.bench_function("synchronize_one_frame", |b| {
        b.iter(|| {
            let frames = std::cell::Cell::new(0usize);
            let mut sync = FrameSynchronizer::new(SyncProperties::default(), |_| {
                frames.set(frames.get() + 1);
            })
            .unwrap();
            sync.execute(black_box(&samples));
            black_box(frames.get())
        })
    });
}

fn bench_elliptic_kernel(c: &mut Criterion) {
    c.bench_function("ellipdeg", |b| {
        b.iter(|| ellip::ellipdeg(black_box(5.0), black_box(0.1), 7).unwrap())
    });
    c.bench_function("cd", |b| {
        b.iter(|| ellip::cd(black_box(0.3), black_box(0.8), 7).unwrap())
    });
}

criterion_group!(benches, bench_frame_recovery, bench_elliptic_kernel);
criterion_main!(benches);
