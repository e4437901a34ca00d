use std::ops::Range;
use std::path::PathBuf;

/// One extracted unit of SQL: a fenced region or a whole raw SQL file.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlBlock {
    /// Block contents. Fenced blocks are already trimmed; raw files are kept
    /// verbatim and trimmed when the script is assembled.
    pub text: String,
    /// Path of the file the block came from.
    pub origin: PathBuf,
    /// The source file ID (for error reporting with codespan-reporting).
    pub file_id: usize,
    /// 1-based line of the opening fence (1 for raw files).
    pub line: usize,
    /// Byte span in source, fences included.
    pub span: Range<usize>,
    /// Text of the closest Markdown heading above the block.
    pub section: Option<String>,
}

impl SqlBlock {
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// First non-empty line of SQL, used for listings.
    pub fn first_line(&self) -> &str {
        self.text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }
}
