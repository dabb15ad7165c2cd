//! Source map - registry of all files loaded into a compilation.
//!
//! The driver registers the main program here; the unit loader adds any
//! unit sources it pulls in. Spans refer back to these files through
//! their [`FileId`].

use std::path::{Path, PathBuf};

use crate::error::SourceMapError;
use crate::span::{FileId, Span};

/// One loaded source file.
#[derive(Debug)]
pub struct SourceFile {
    /// Path the file was loaded from.
    pub path: PathBuf,
    /// Full file content.
    pub content: String,
    /// Byte offset of the start of each line, for span resolution.
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(path: PathBuf, content: String) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            path,
            content,
            line_starts,
        }
    }

    /// Number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The 1-based line containing the given byte offset.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Text of a 1-based line, without the trailing newline.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|s| s - 1)
            .unwrap_or(self.content.len());
        self.content.get(start..end)
    }
}

/// All source files of one compilation.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Register a file and return its id.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile::new(path.into(), content));
        id
    }

    /// Load a file from disk and register it.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, SourceMapError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SourceMapError::ReadFailed(path.display().to_string(), e))?;
        Ok(self.add_file(path, content))
    }

    /// Look up a registered file.
    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.index())
    }

    /// Source text covered by a span, if in range.
    pub fn span_text(&self, span: Span) -> Option<&str> {
        self.get(span.file_id)?.content.get(span.start..span.end)
    }

    /// Iterate over all registered files.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, f)| (FileId(i), f))
    }
}
