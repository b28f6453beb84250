//! Benchmarks for random access into tar archives.
//!
//! Run with: cargo bench --bench archive_seek
//!
//! Compares an uncompressed `.tar`, where reads jump to indexed offsets,
//! against a `.tar.gz`, where backward reads restart decompression.

use std::path::Path;

use criterion::Criterion;
use framestore::{ReadOptions, SequenceReader, SequenceWriter, WriteOptions};
use image::{DynamicImage, Rgb, RgbImage};

const FRAME_COUNT: i64 = 64;

fn write_archive(directory: &Path, name: &str) -> String {
    let path = format!("{}::frame_%04d.png", directory.join(name).display());
    let mut writer = SequenceWriter::open(&path, &WriteOptions::default()).unwrap();
    for frame in 0..FRAME_COUNT {
        let shade = (frame * 4) as u8;
        let image = RgbImage::from_pixel(64, 48, Rgb([shade, 255 - shade, 128]));
        writer.write(&DynamicImage::ImageRgb8(image), None).unwrap();
    }
    writer.close().unwrap();
    path
}

/// Frame numbers visited out of order, with several backward jumps.
fn scattered_frames() -> Vec<i64> {
    (0..FRAME_COUNT).map(|index| (index * 37) % FRAME_COUNT).collect()
}

fn benchmark_archive_random_access(criterion: &mut Criterion) {
    let directory = tempfile::tempdir().unwrap();
    let plain = write_archive(directory.path(), "frames.tar");
    let gzip = write_archive(directory.path(), "frames.tar.gz");
    let frames = scattered_frames();
    let options = ReadOptions::default();

    let mut group = criterion.benchmark_group("archive random access");
    for (label, path) in [("tar", &plain), ("tar.gz", &gzip)] {
        let mut reader = SequenceReader::open(path, None, None, &options).unwrap();
        group.bench_function(label, |bencher| {
            bencher.iter(|| {
                for &frame in &frames {
                    let _image = reader.read(frame).unwrap();
                }
            });
        });
    }
    group.finish();
}

fn benchmark_archive_open(criterion: &mut Criterion) {
    let directory = tempfile::tempdir().unwrap();
    let gzip = write_archive(directory.path(), "frames.tgz");
    let options = ReadOptions::default();

    criterion.bench_function("open and index tgz", |bencher| {
        bencher.iter(|| {
            let _reader = SequenceReader::open(&gzip, None, None, &options).unwrap();
        });
    });
}

criterion::criterion_group!(benches, benchmark_archive_random_access, benchmark_archive_open);
criterion::criterion_main!(benches);
