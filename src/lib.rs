//! # zip-path: Hierarchical Path Navigation over ZIP Archives
//!
//! `zip-path` makes the entries of a ZIP archive addressable and traversable
//! as a directory tree, without extracting anything. Archives store a flat
//! list of names with separators embedded in them, and many omit explicit
//! directory entries entirely; this crate reconstructs the full directory
//! structure from that flat namespace and implements path semantics - join,
//! parent, name/suffix decomposition, iteration, globbing - on top of it.
//!
//! ## Features
//!
//! - **Implied directories**: a directory that exists only as a prefix of
//!   some entry's name still lists, joins and globs like a real one
//! - **Cached lookups**: the completed namelist is derived once per archive
//!   and shared by every path, with O(1) existence checks
//! - **Mutation aware**: entries written through an already-wrapped handle
//!   show up in subsequent queries
//! - **Glob matching**: `*`, `?`, bracket classes and `**/` recursive
//!   descent, applied per path segment
//! - **Text or binary reads**: entry contents as bytes, or decoded text in
//!   any `encoding_rs` encoding with strict/replace/ignore error handling
//!
//! ## Quick Start
//!
//! ### Navigating an archive
//!
//! ```
//! use std::io::Cursor;
//! use zip_path::{ZipArchive, ZipPath};
//!
//! let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
//! archive.write_entry("a.txt", b"content of a")?;
//! archive.write_entry("b/c.txt", b"content of c")?;
//! archive.write_entry("b/d/e.txt", b"content of e")?;
//!
//! let root = ZipPath::new(archive);
//! let names: Vec<String> = root
//!     .iterdir()?
//!     .map(|child| child.at().to_string())
//!     .collect();
//! assert_eq!(names, ["a.txt", "b/"]);
//!
//! let e = root.join("b").join("d").join("e.txt");
//! assert_eq!(e.read_text()?, "content of e");
//! # Ok::<(), zip_path::ZipPathError>(())
//! ```
//!
//! ### Globbing
//!
//! ```
//! use std::io::Cursor;
//! use zip_path::{ZipArchive, ZipPath};
//!
//! let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
//! archive.write_entry("a.txt", b"a")?;
//! archive.write_entry("b/c.txt", b"c")?;
//!
//! let root = ZipPath::new(archive);
//! // `*` does not cross directory boundaries...
//! assert_eq!(root.glob("*.txt")?.count(), 1);
//! // ...but `rglob` descends
//! assert_eq!(root.rglob("*.txt")?.count(), 2);
//! # Ok::<(), zip_path::ZipPathError>(())
//! ```
//!
//! ### Opening an archive on disk
//!
//! ```no_run
//! use zip_path::ZipPath;
//!
//! let root = ZipPath::open("archive.zip")?;
//! for entry in root.rglob("*.toml")? {
//!     println!("{}: {} bytes", entry.at(), entry.read_bytes()?.len());
//! }
//! # Ok::<(), zip_path::ZipPathError>(())
//! ```

pub mod archive;
pub mod complete;
pub mod error;
pub mod path;
pub mod pattern;

pub use archive::{CompressionMethod, ZipArchive, ZipEntry};
pub use complete::{implied_dirs, CompleteDirs};
pub use error::{Result, ZipPathError};
pub use path::{EntryReader, ErrorHandling, OpenOptions, ZipPath};
pub use pattern::GlobPattern;
