use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// How a source file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Already SQL: the whole file is a single block.
    RawSql,
    /// Markdown-like text scanned for fenced SQL blocks.
    Markdown,
}

impl SourceKind {
    /// Classify a path by extension (`.sql`, any case, is raw).
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("sql") => SourceKind::RawSql,
            _ => SourceKind::Markdown,
        }
    }
}

/// A source document loaded into memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let path = path.into();
        SourceFile {
            kind: SourceKind::of(&path),
            path,
            contents: contents.into(),
        }
    }

    /// Read a source from disk as UTF-8.
    pub fn read(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(SourceFile::new(path, contents))
    }

    /// Display name used in diagnostics and separators.
    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}
