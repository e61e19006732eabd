//! Directory completion - reconstructs the directory tree implied by a flat
//! entry namespace
//!
//! ZIP archives store a flat list of entry names and frequently omit explicit
//! directory entries; a directory exists only because some entry's name has it
//! as a prefix. [`CompleteDirs`] wraps an archive handle and exposes a
//! *completed* namelist (raw names plus every implied directory, each with a
//! trailing separator) together with constant-time membership queries, so the
//! path layer never rescans the archive.

use crate::archive::ZipArchive;
use crate::error::Result;
use indexmap::IndexSet;
use std::cell::RefCell;
use std::io::{Read, Seek, Write};
use std::path::PathBuf;

/// Walk a path towards the root, yielding the path itself and then each
/// ancestor: `b/d/f` yields `b/d/f`, `b/d`, `b`. A trailing separator is
/// stripped first so directory names don't yield themselves twice.
fn ancestry(path: &str) -> Ancestry<'_> {
    Ancestry {
        rest: path.trim_end_matches('/'),
    }
}

struct Ancestry<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let current = self.rest;
        self.rest = match current.rfind('/') {
            Some(i) => &current[..i],
            None => "",
        };
        Some(current)
    }
}

/// Compute the directory names implied by a sequence of entry names.
///
/// Every proper ancestor of every name becomes a candidate directory
/// (trailing separator appended); candidates already present verbatim in the
/// input are dropped. The result is deduplicated preserving first occurrence,
/// so it is stable across inputs that already contain some explicit
/// directories and is empty when the namespace is already complete.
pub fn implied_dirs<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let raw: IndexSet<&str> = names.iter().copied().collect();

    let mut implied = IndexSet::new();
    for name in &names {
        for parent in ancestry(name).skip(1) {
            let dir = format!("{}/", parent);
            if !raw.contains(dir.as_str()) {
                implied.insert(dir);
            }
        }
    }
    implied.into_iter().collect()
}

struct NameCache {
    /// Raw entry count the cache was derived from; a mismatch against the
    /// live handle means an entry was written since and the cache is stale
    raw_count: usize,
    /// Completed namelist: raw names in archive order, implied directories
    /// appended, with O(1) membership
    names: IndexSet<String>,
}

/// Shared wrapper around an archive handle that serves completed-namelist
/// queries from a cache.
///
/// The cache is derived once per adoption of the handle and rebuilt whenever
/// a write through the same handle changes the raw entry count, so paths
/// constructed before a write observe entries written after it.
pub struct CompleteDirs<S> {
    archive: RefCell<ZipArchive<S>>,
    cache: RefCell<Option<NameCache>>,
}

impl<S: Read + Seek> CompleteDirs<S> {
    /// Adopt an archive handle
    pub fn new(archive: ZipArchive<S>) -> Self {
        CompleteDirs {
            archive: RefCell::new(archive),
            cache: RefCell::new(None),
        }
    }

    fn with_names<T>(&self, f: impl FnOnce(&IndexSet<String>) -> T) -> T {
        let raw_count = self.archive.borrow().len();
        let mut cache = self.cache.borrow_mut();
        if cache.as_ref().is_some_and(|c| c.raw_count != raw_count) {
            *cache = None;
        }
        let cache = cache.get_or_insert_with(|| {
            let archive = self.archive.borrow();
            let mut names: IndexSet<String> =
                archive.entry_names().map(str::to_string).collect();
            for dir in implied_dirs(archive.entry_names()) {
                names.insert(dir);
            }
            NameCache { raw_count, names }
        });
        f(&cache.names)
    }

    /// The completed namelist: raw entry names in archive order, then
    /// implied directory names
    pub fn namelist(&self) -> Vec<String> {
        self.with_names(|names| names.iter().cloned().collect())
    }

    /// Whether a name (file or directory form) exists in the completed set
    pub fn contains(&self, name: &str) -> bool {
        self.with_names(|names| names.contains(name))
    }

    /// Resolve an ambiguous join target: a name that only exists in its
    /// directory form gains the trailing separator, anything else passes
    /// through unchanged (existence is the caller's concern).
    pub fn find(&self, name: &str) -> String {
        self.with_names(|names| {
            let dirname = format!("{}/", name);
            if !names.contains(name) && names.contains(dirname.as_str()) {
                dirname
            } else {
                name.to_string()
            }
        })
    }

    /// Read an entry's decompressed contents through the shared handle
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        self.archive.borrow_mut().read_entry(name)
    }

    /// The archive's on-disk file name, if any
    pub fn file_name(&self) -> Option<PathBuf> {
        self.archive.borrow().file_name().map(PathBuf::from)
    }

    /// Associate (or clear) the archive's on-disk file name
    pub fn set_file_name(&self, name: Option<PathBuf>) {
        self.archive.borrow_mut().set_file_name(name);
    }
}

impl<S: Read + Write + Seek> CompleteDirs<S> {
    /// Append an entry through the shared handle; the namelist cache notices
    /// the new raw entry count on the next query
    pub fn write_entry(&self, name: &str, data: &[u8]) -> Result<()> {
        self.archive.borrow_mut().write_entry(name, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestry_walks_to_root() {
        let collect = |p: &str| ancestry(p).map(str::to_string).collect::<Vec<_>>();
        assert_eq!(collect("b/d"), ["b/d", "b"]);
        assert_eq!(collect("b/d/f/"), ["b/d/f", "b/d", "b"]);
        assert_eq!(collect("b"), ["b"]);
        assert!(collect("").is_empty());
    }

    #[test]
    fn implied_dirs_from_flat_names() {
        let dirs = implied_dirs(["a.txt", "b/c.txt", "b/d/e.txt", "g/h/i.txt"]);
        assert_eq!(dirs, ["b/", "b/d/", "g/h/", "g/"]);
    }

    #[test]
    fn implied_dirs_skips_explicit_entries() {
        let dirs = implied_dirs(["b/", "b/c.txt", "b/d/e.txt"]);
        assert_eq!(dirs, ["b/d/"]);
    }

    #[test]
    fn implied_dirs_idempotent() {
        let names = vec!["a.txt".to_string(), "b/c.txt".to_string()];
        let first = implied_dirs(names.iter().map(String::as_str));
        let completed: Vec<String> = names.iter().cloned().chain(first.clone()).collect();
        assert!(implied_dirs(completed.iter().map(String::as_str)).is_empty());
        assert_eq!(first, ["b/"]);
    }

    #[test]
    fn rootless_names_contribute_nothing() {
        assert!(implied_dirs(["a.txt", "b"]).is_empty());
    }
}
