#[cfg(feature = "zstd-support")]
#[test]
fn zstd_entries_round_trip_through_paths() {
    use tempfile::tempdir;
    use zip_path::{CompressionMethod, ZipArchive, ZipPath};

    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("zstd_test.zip");

    {
        let mut archive = ZipArchive::create(&zip_path).unwrap();
        archive
            .write_entry_with_method(
                "test1.txt",
                b"Hello from Zstd compression!",
                CompressionMethod::Zstd,
            )
            .unwrap();
        let data = vec![42u8; 10000];
        archive
            .write_entry_with_method("dir/test2.bin", &data, CompressionMethod::Zstd)
            .unwrap();
        archive.finish().unwrap();
    }

    let root = ZipPath::open(&zip_path).unwrap();
    assert_eq!(
        root.join("test1.txt").read_bytes().unwrap(),
        b"Hello from Zstd compression!"
    );
    let data = root.join("dir").join("test2.bin").read_bytes().unwrap();
    assert_eq!(data.len(), 10000);
    assert!(data.iter().all(|&b| b == 42));
}
