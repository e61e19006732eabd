//! Shared fixtures: a representative archive exercising a file at the root,
//! nested files, sibling files, a directory containing only a directory,
//! and a directory of mixed extensions.
//!
//! ```text
//! .
//! ├── a.txt
//! ├── b
//! │   ├── c.txt
//! │   ├── d
//! │   │   └── e.txt
//! │   └── f.txt
//! ├── g
//! │   └── h
//! │       └── i.txt
//! └── j
//!     ├── k.bin
//!     ├── l.baz
//!     └── m.bar
//! ```

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use zip_path::{implied_dirs, CompressionMethod, ZipArchive};

pub type MemArchive = ZipArchive<Cursor<Vec<u8>>>;

pub const ALPHAREP_ENTRIES: &[(&str, &str)] = &[
    ("a.txt", "content of a"),
    ("b/c.txt", "content of c"),
    ("b/d/e.txt", "content of e"),
    ("b/f.txt", "content of f"),
    ("g/h/i.txt", "content of i"),
    ("j/k.bin", "content of k"),
    ("j/l.baz", "content of l"),
    ("j/m.bar", "content of m"),
];

/// The fixture as most tools write it: no explicit directory entries
pub fn alpharep() -> MemArchive {
    let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
    for (name, contents) in ALPHAREP_ENTRIES {
        archive.write_entry(name, contents.as_bytes()).unwrap();
    }
    archive.set_file_name(Some("alpharep.zip".into()));
    archive
}

/// The fixture with an explicit entry injected for every implied directory
pub fn alpharep_with_dirs() -> MemArchive {
    let mut archive = alpharep();
    let names: Vec<String> = archive.entry_names().map(str::to_string).collect();
    for dir in implied_dirs(names.iter().map(String::as_str)) {
        archive
            .write_entry_with_method(&dir, b"", CompressionMethod::Stored)
            .unwrap();
    }
    archive
}

/// Both directory-entry variants; behavior under test must not depend on
/// whether directories are explicit
pub fn alpharep_variants() -> Vec<MemArchive> {
    vec![alpharep(), alpharep_with_dirs()]
}

/// Write the fixture to disk as a complete, reopenable archive
pub fn write_alpharep_to(path: &Path) {
    let mut archive = ZipArchive::create(path).unwrap();
    for (name, contents) in ALPHAREP_ENTRIES {
        archive.write_entry(name, contents.as_bytes()).unwrap();
    }
    archive.finish().unwrap();
}
