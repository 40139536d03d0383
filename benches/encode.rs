use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qr_toolkit::models::{ECLevel, EncodingRequest, StyleSpec, Version};
use qr_toolkit::{encode, render};

fn bench_encode_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_url");
    for level in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
        let request = EncodingRequest::new("https://example.com/some/fairly/long/path?id=1234")
            .with_ec_level(level);
        group.bench_with_input(BenchmarkId::from_parameter(level), &request, |b, request| {
            b.iter(|| encode(black_box(request)))
        });
    }
    group.finish();
}

fn bench_encode_version_40(c: &mut Criterion) {
    let payload: Vec<u8> = (0..1200u32).map(|i| b'a' + (i % 26) as u8).collect();
    let request = EncodingRequest::new(payload)
        .with_ec_level(ECLevel::M)
        .with_fixed_version(Version::new(40).unwrap());
    c.bench_function("encode_v40_m", |b| b.iter(|| encode(black_box(&request))));
}

fn bench_render(c: &mut Criterion) {
    let symbol = encode(&EncodingRequest::new("render benchmark")).unwrap();
    let style = StyleSpec::default();
    c.bench_function("render_10ppm", |b| {
        b.iter(|| render(black_box(&symbol), black_box(&style), 10, 4))
    });
}

criterion_group!(benches, bench_encode_levels, bench_encode_version_40, bench_render);
criterion_main!(benches);
