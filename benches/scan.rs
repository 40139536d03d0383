use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::DynamicImage;
use qr_toolkit::models::{EncodingRequest, StyleSpec, Version};
use qr_toolkit::{PreparedImage, ScanOptions, detect, encode, render, scan_image};

fn rendered(version: u8, ppm: u32) -> DynamicImage {
    let request = EncodingRequest::new("scan benchmark payload")
        .with_fixed_version(Version::new(version).unwrap());
    let symbol = encode(&request).unwrap();
    DynamicImage::ImageRgba8(render(&symbol, &StyleSpec::default(), ppm, 4).unwrap().image)
}

fn bench_blank(c: &mut Criterion) {
    let image = vec![128u8; 640 * 480 * 3];
    c.bench_function("detect_blank_640x480_rgb", |b| {
        b.iter(|| detect(black_box(&image), black_box(640), black_box(480)))
    });
}

fn bench_prepare(c: &mut Criterion) {
    let image = rendered(10, 8);
    c.bench_function("prepare_v10_8ppm", |b| {
        b.iter(|| PreparedImage::from_dynamic(black_box(&image)))
    });
}

fn bench_scan(c: &mut Criterion) {
    let options = ScanOptions::default();
    for (version, ppm) in [(2u8, 6u32), (10, 5), (25, 4)] {
        let prepared = PreparedImage::from_dynamic(&rendered(version, ppm));
        c.bench_function(&format!("scan_v{version}_{ppm}ppm"), |b| {
            b.iter(|| scan_image(black_box(&prepared), &options))
        });
    }
}

criterion_group!(benches, bench_blank, bench_prepare, bench_scan);
criterion_main!(benches);
