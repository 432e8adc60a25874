//! Row flip throughput for common frame sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use video_texture::video::flip_rows;

fn bench_flip_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("flip_rows");

    for &(width, height, pad) in &[(1280u32, 720u32, 0usize), (1920, 1080, 0), (1920, 1080, 64), (3840, 2160, 0)] {
        let stride = width as usize * 4 + pad;
        let data = vec![0x7Fu8; stride * height as usize];

        group.throughput(Throughput::Bytes((width as u64) * (height as u64) * 4));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}+{}", width, height, pad)),
            &data,
            |b, data| b.iter(|| flip_rows(black_box(data), stride, width, height)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_flip_rows);
criterion_main!(benches);
