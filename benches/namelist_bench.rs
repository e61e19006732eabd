use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Cursor;
use zip_path::{implied_dirs, ZipArchive, ZipPath};

fn bench_implied_dirs(c: &mut Criterion) {
    // Deep-ish tree: 64 top-level dirs, 8 subdirs each, 4096 files
    let names: Vec<String> = (0..4096)
        .map(|i| format!("dir{}/sub{}/file{}.txt", i % 64, i % 8, i))
        .collect();

    c.bench_function("implied_dirs_4096", |b| {
        b.iter(|| implied_dirs(black_box(&names).iter().map(String::as_str)))
    });
}

fn bench_iterdir_huge(c: &mut Criterion) {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
    for i in 0..8192 {
        let name = i.to_string();
        archive.write_entry(&name, name.as_bytes()).unwrap();
    }
    let root = ZipPath::new(archive);

    c.bench_function("iterdir_8192", |b| {
        b.iter(|| root.iterdir().unwrap().count())
    });
}

fn bench_glob_recursive(c: &mut Criterion) {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
    for i in 0..2048 {
        archive
            .write_entry(&format!("dir{}/file{}.txt", i % 32, i), b"x")
            .unwrap();
    }
    let root = ZipPath::new(archive);

    c.bench_function("rglob_2048", |b| {
        b.iter(|| root.rglob("*.txt").unwrap().count())
    });
}

criterion_group!(
    benches,
    bench_implied_dirs,
    bench_iterdir_huge,
    bench_glob_recursive
);
criterion_main!(benches);
