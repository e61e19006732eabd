//! Path navigation over an archive - join, traverse, glob and read entries
//! as if the archive were a directory tree
//!
//! A [`ZipPath`] pairs a shared [`CompleteDirs`] layer with an `at` string:
//! the slash-separated location inside the archive, empty for the root, with
//! a trailing separator marking a directory. Every operation is a pure
//! function of that pair; derived paths share the layer, so the namelist is
//! computed once per archive, not once per path.

use crate::archive::ZipArchive;
use crate::complete::CompleteDirs;
use crate::error::{Result, ZipPathError};
use crate::pattern::GlobPattern;
use encoding_rs::{Encoding, UTF_8};
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{self, Cursor, Read, Seek, Write};
use std::ops::Div;
use std::path::{Path as StdPath, PathBuf};
use std::rc::Rc;

/// How text decoding reacts to malformed byte sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorHandling {
    /// Fail with a decode error
    Strict,
    /// Substitute the replacement character
    Replace,
    /// Drop the malformed sequence
    Ignore,
}

/// Options for opening an entry: binary or text mode, and for text mode the
/// character encoding and error-handling strategy.
///
/// Binary mode is mutually exclusive with the text options; combining them
/// is rejected when the entry is opened.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    binary: bool,
    encoding: Option<&'static Encoding>,
    errors: Option<ErrorHandling>,
}

impl OpenOptions {
    /// Text mode; defaults to UTF-8 with strict error handling
    pub fn text() -> Self {
        OpenOptions {
            binary: false,
            encoding: None,
            errors: None,
        }
    }

    /// Binary mode
    pub fn binary() -> Self {
        OpenOptions {
            binary: true,
            encoding: None,
            errors: None,
        }
    }

    /// Set the text encoding (any `encoding_rs` encoding)
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Set the decoding error-handling strategy
    pub fn errors(mut self, errors: ErrorHandling) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Readable stream over an entry's contents.
///
/// The contents are decompressed (and in text mode decoded) when the entry
/// is opened, so the reader holds no borrow of the archive and needs no
/// explicit close.
pub struct EntryReader {
    cursor: Cursor<Vec<u8>>,
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

/// A location within a ZIP archive, navigable like a filesystem path.
///
/// Consider an archive with this structure:
///
/// ```text
/// .
/// ├── a.txt
/// └── b
///     ├── c.txt
///     └── d
///         └── e.txt
/// ```
///
/// ```
/// use std::io::Cursor;
/// use zip_path::{ZipArchive, ZipPath};
///
/// let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
/// archive.write_entry("a.txt", b"content of a")?;
/// archive.write_entry("b/c.txt", b"content of c")?;
/// archive.write_entry("b/d/e.txt", b"content of e")?;
///
/// let root = ZipPath::new(archive);
/// let b = root.join("b");
/// assert!(b.is_dir());
///
/// let c = b.join("c.txt");
/// assert_eq!(c.read_text()?, "content of c");
/// assert!(!b.join("missing.txt").exists());
/// # Ok::<(), zip_path::ZipPathError>(())
/// ```
pub struct ZipPath<S> {
    root: Rc<CompleteDirs<S>>,
    at: String,
}

impl<S> Clone for ZipPath<S> {
    fn clone(&self) -> Self {
        ZipPath {
            root: Rc::clone(&self.root),
            at: self.at.clone(),
        }
    }
}

/// Paths are equal when they share the same layer instance and location
impl<S> PartialEq for ZipPath<S> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.root, &other.root) && self.at == other.at
    }
}

impl<S> Eq for ZipPath<S> {}

impl<S> Hash for ZipPath<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.root) as usize).hash(state);
        self.at.hash(state);
    }
}

impl ZipPath<File> {
    /// Open an archive file and return its root path
    pub fn open<P: AsRef<StdPath>>(path: P) -> Result<Self> {
        Ok(ZipPath::new(ZipArchive::open(path)?))
    }

    /// Reconstruct a path from the pair produced by [`ZipPath::to_parts`],
    /// reopening the archive by file name.
    ///
    /// The restored path behaves identically for read operations; it does
    /// not share a handle with the original.
    pub fn from_parts<P: AsRef<StdPath>>(archive: P, at: impl Into<String>) -> Result<Self> {
        let mut path = ZipPath::open(archive)?;
        path.at = at.into();
        Ok(path)
    }
}

impl<S: Read + Seek> ZipPath<S> {
    /// Adopt an archive handle and return the root path
    pub fn new(archive: ZipArchive<S>) -> Self {
        ZipPath {
            root: Rc::new(CompleteDirs::new(archive)),
            at: String::new(),
        }
    }

    /// All derived paths are constructed here, sharing the layer
    fn derive(&self, at: String) -> Self {
        ZipPath {
            root: Rc::clone(&self.root),
            at,
        }
    }

    /// The location within the archive; empty for the root
    pub fn at(&self) -> &str {
        &self.at
    }

    /// The archive's on-disk file name, if it has one
    pub fn file_name(&self) -> Option<PathBuf> {
        self.root.file_name()
    }

    /// Clear or replace the archive's on-disk file name (affects every path
    /// sharing this archive)
    pub fn set_file_name(&self, name: Option<PathBuf>) {
        self.root.set_file_name(name);
    }

    /// Serialize to a `(archive file name, at)` pair; fails on an unnamed
    /// archive
    pub fn to_parts(&self) -> Result<(PathBuf, String)> {
        let file_name = self.root.file_name().ok_or(ZipPathError::UnnamedArchive)?;
        Ok((file_name, self.at.clone()))
    }

    /// True for the root and for any location ending in the separator;
    /// needs no archive access
    pub fn is_dir(&self) -> bool {
        self.at.is_empty() || self.at.ends_with('/')
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// Always false; symbolic links inside archives are not resolved
    pub fn is_symlink(&self) -> bool {
        false
    }

    /// Whether this location exists in the archive. The root is the
    /// container itself and always exists.
    pub fn exists(&self) -> bool {
        self.at.is_empty() || self.root.contains(&self.at)
    }

    /// Iterate the direct children of this directory, in namelist order.
    /// Fails with a not-a-directory error on a file path.
    pub fn iterdir(&self) -> Result<impl Iterator<Item = ZipPath<S>>> {
        if self.is_file() {
            return Err(ZipPathError::NotADirectory(self.at.clone()));
        }
        let base = self.at.trim_end_matches('/').to_string();
        let me = self.clone();
        Ok(self
            .root
            .namelist()
            .into_iter()
            .filter(move |name| parent_of(name) == base)
            .map(move |name| me.derive(name)))
    }

    /// Join one path component (which may itself contain separators).
    ///
    /// The result is normalized through the completion layer: joining to a
    /// directory without its trailing separator yields the directory form.
    pub fn join(&self, part: impl AsRef<str>) -> ZipPath<S> {
        let joined = join_at(&self.at, part.as_ref());
        self.derive(self.root.find(&joined))
    }

    /// Join several components, resolving after each step
    pub fn joinpath<I>(&self, parts: I) -> ZipPath<S>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        parts
            .into_iter()
            .fold(self.clone(), |path, part| path.join(part))
    }

    /// The containing directory within the archive; `None` at the root
    /// (the archive itself has no parent inside the archive - see
    /// [`ZipPath::container_dir`])
    pub fn parent(&self) -> Option<ZipPath<S>> {
        let stripped = self.at.trim_end_matches('/');
        if stripped.is_empty() {
            return None;
        }
        let parent_at = match stripped.rfind('/') {
            Some(i) => format!("{}/", &stripped[..i]),
            None => String::new(),
        };
        Some(self.derive(parent_at))
    }

    /// The final path component. For the root this is the archive's own
    /// file name, so it fails on an unnamed archive; for any other path it
    /// never fails.
    pub fn name(&self) -> Result<String> {
        let stripped = self.at.trim_end_matches('/');
        if stripped.is_empty() {
            let file_name = self.root.file_name().ok_or(ZipPathError::UnnamedArchive)?;
            let base = file_name
                .file_name()
                .ok_or(ZipPathError::UnnamedArchive)?;
            Ok(base.to_string_lossy().into_owned())
        } else {
            let base = match stripped.rfind('/') {
                Some(i) => &stripped[i + 1..],
                None => stripped,
            };
            Ok(base.to_string())
        }
    }

    /// The final component's extension, including the leading dot; empty
    /// when there is none. A lone leading dot (`.hgrc`) is not a suffix.
    pub fn suffix(&self) -> Result<String> {
        Ok(name_suffix(&self.name()?).to_string())
    }

    /// Every trailing dot-delimited extension, in order
    pub fn suffixes(&self) -> Result<Vec<String>> {
        Ok(name_suffixes(&self.name()?))
    }

    /// The final component without its last suffix
    pub fn stem(&self) -> Result<String> {
        let name = self.name()?;
        let suffix_len = name_suffix(&name).len();
        Ok(name[..name.len() - suffix_len].to_string())
    }

    /// The directory containing the archive itself on disk, per generic
    /// path rules (`.` when the file name has no directory component).
    /// This is the parent of the root; fails on an unnamed archive.
    pub fn container_dir(&self) -> Result<PathBuf> {
        let file_name = self.root.file_name().ok_or(ZipPathError::UnnamedArchive)?;
        let parent = file_name.parent().unwrap_or_else(|| StdPath::new(""));
        if parent.as_os_str().is_empty() {
            Ok(PathBuf::from("."))
        } else {
            Ok(parent.to_path_buf())
        }
    }

    /// Open this entry for reading in binary mode
    pub fn open(&self) -> Result<EntryReader> {
        self.open_with(&OpenOptions::binary())
    }

    /// Open this entry for reading with explicit options.
    ///
    /// Directories (including the root) fail with an is-a-directory error,
    /// missing entries with not-found, and binary mode combined with text
    /// options with invalid-argument.
    pub fn open_with(&self, options: &OpenOptions) -> Result<EntryReader> {
        if options.binary && (options.encoding.is_some() || options.errors.is_some()) {
            return Err(ZipPathError::InvalidArgument(
                "encoding arguments are not supported in binary mode".to_string(),
            ));
        }
        if self.is_dir() {
            return Err(ZipPathError::IsADirectory(self.at.clone()));
        }
        if !self.exists() {
            return Err(ZipPathError::EntryNotFound(self.at.clone()));
        }
        let raw = self.root.read_entry(&self.at)?;
        let bytes = if options.binary {
            raw
        } else {
            decode_text(&raw, options)?.into_bytes()
        };
        Ok(EntryReader {
            cursor: Cursor::new(bytes),
        })
    }

    /// Read the entry's full contents as bytes
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let mut reader = self.open()?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read the entry's full contents as UTF-8 text with strict error
    /// handling
    pub fn read_text(&self) -> Result<String> {
        self.read_text_with(&OpenOptions::text())
    }

    /// Read the entry's full contents as text with explicit encoding and
    /// error handling
    pub fn read_text_with(&self, options: &OpenOptions) -> Result<String> {
        if options.binary {
            return Err(ZipPathError::InvalidArgument(
                "read_text requires text-mode options".to_string(),
            ));
        }
        let mut reader = self.open_with(options)?;
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(text)
    }

    /// pathlib-style right-anchored match of this location against a
    /// non-recursive pattern. The root matches nothing.
    pub fn matches(&self, pattern: &str) -> bool {
        let compiled = match GlobPattern::new(pattern) {
            Ok(compiled) => compiled,
            Err(_) => return false,
        };
        let target = self.at.trim_end_matches('/');
        if target.is_empty() {
            return false;
        }
        let parts: Vec<&str> = target.split('/').collect();
        compiled.matches_right_anchored(&parts)
    }

    /// Yield every descendant whose path relative to this location matches
    /// the pattern, in namelist order. A `*` never crosses a separator; use
    /// `**/` or [`ZipPath::rglob`] for recursive descent. An empty pattern
    /// is invalid.
    pub fn glob(&self, pattern: &str) -> Result<impl Iterator<Item = ZipPath<S>>> {
        let compiled = GlobPattern::new(pattern)?;
        let base = self.at.clone();
        let me = self.clone();
        Ok(self
            .root
            .namelist()
            .into_iter()
            .filter(move |name| match name.strip_prefix(base.as_str()) {
                Some(rel) => {
                    let rel = rel.strip_suffix('/').unwrap_or(rel);
                    !rel.is_empty() && compiled.matches(rel)
                }
                None => false,
            })
            .map(move |name| me.derive(name)))
    }

    /// [`ZipPath::glob`] with a recursive-descent prefix: matches at any
    /// depth below this location
    pub fn rglob(&self, pattern: &str) -> Result<impl Iterator<Item = ZipPath<S>>> {
        if pattern.is_empty() {
            return Err(ZipPathError::InvalidArgument(
                "glob pattern must not be empty".to_string(),
            ));
        }
        self.glob(&format!("**/{}", pattern))
    }

    /// This location relative to an ancestor, as a slash-separated string.
    /// Fails when `other` is not an ancestor.
    pub fn relative_to(&self, other: &ZipPath<S>) -> Result<String> {
        let base = other.at.trim_end_matches('/');
        let target = self.at.trim_end_matches('/');
        if base.is_empty() {
            return Ok(target.to_string());
        }
        match target.strip_prefix(base) {
            Some("") => Ok(String::new()),
            Some(rest) if rest.starts_with('/') => Ok(rest[1..].to_string()),
            _ => Err(ZipPathError::NotAnAncestor(
                other.at.clone(),
                self.at.clone(),
            )),
        }
    }
}

impl<S: Read + Write + Seek> ZipPath<S> {
    /// Write an entry at this location through the shared handle. The new
    /// entry (and any directory it implies) is visible to every path
    /// sharing the archive.
    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        if self.is_dir() {
            return Err(ZipPathError::IsADirectory(self.at.clone()));
        }
        self.root.write_entry(&self.at, data)
    }

    /// Write UTF-8 text as an entry at this location
    pub fn write_text(&self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())
    }
}

impl<S: Read + Seek> Div<&str> for &ZipPath<S> {
    type Output = ZipPath<S>;

    fn div(self, rhs: &str) -> ZipPath<S> {
        self.join(rhs)
    }
}

impl<S: Read + Seek> Div<&str> for ZipPath<S> {
    type Output = ZipPath<S>;

    fn div(self, rhs: &str) -> ZipPath<S> {
        self.join(rhs)
    }
}

impl<S: Read + Seek> fmt::Display for ZipPath<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root.file_name() {
            Some(file_name) => write!(f, "{}/{}", file_name.display(), self.at),
            None => write!(f, "{}", self.at),
        }
    }
}

impl<S: Read + Seek> fmt::Debug for ZipPath<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZipPath({:?}, {:?})", self.root.file_name(), self.at)
    }
}

/// Directory portion of a name, trailing separator stripped
fn parent_of(name: &str) -> &str {
    let stripped = name.trim_end_matches('/');
    match stripped.rfind('/') {
        Some(i) => &stripped[..i],
        None => "",
    }
}

/// Slash-join `part` onto `at`, posix join semantics
fn join_at(at: &str, part: &str) -> String {
    if at.is_empty() {
        part.to_string()
    } else if part.is_empty() {
        if at.ends_with('/') {
            at.to_string()
        } else {
            format!("{}/", at)
        }
    } else if at.ends_with('/') {
        format!("{}{}", at, part)
    } else {
        format!("{}/{}", at, part)
    }
}

fn name_suffix(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 && i < name.len() - 1 => &name[i..],
        _ => "",
    }
}

fn name_suffixes(name: &str) -> Vec<String> {
    if name.ends_with('.') {
        return Vec::new();
    }
    name.trim_start_matches('.')
        .split('.')
        .skip(1)
        .map(|s| format!(".{}", s))
        .collect()
}

fn decode_text(bytes: &[u8], options: &OpenOptions) -> Result<String> {
    let encoding = options.encoding.unwrap_or(UTF_8);
    let errors = options.errors.unwrap_or(ErrorHandling::Strict);
    let (decoded, had_errors) = encoding.decode_with_bom_removal(bytes);
    match errors {
        ErrorHandling::Strict if had_errors => Err(ZipPathError::Decode(format!(
            "malformed {} data",
            encoding.name()
        ))),
        ErrorHandling::Ignore if had_errors => Ok(decoded
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER)
            .collect()),
        _ => Ok(decoded.into_owned()),
    }
}
