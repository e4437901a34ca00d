use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::block::SqlBlock;
use crate::error::Error;

/// Number of `=` characters in the rule under each block separator.
pub const RULE_WIDTH: usize = 60;

/// Formats extracted blocks into one SQL script.
#[derive(Debug, Clone)]
pub struct Assembler {
    header: String,
}

impl Assembler {
    pub fn new(header: impl Into<String>) -> Self {
        Assembler {
            header: header.into(),
        }
    }

    /// Header, then every block behind its separator, one blank line apart.
    pub fn render(&self, blocks: &[SqlBlock]) -> String {
        let mut out = String::from(self.header.trim_end());

        for (i, block) in blocks.iter().enumerate() {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            let _ = writeln!(out, "{}", separator(i + 1, block));
            let _ = writeln!(out, "-- {}", "=".repeat(RULE_WIDTH));
            out.push_str(&terminate(block.text.trim()));
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Render and write to `path`, replacing any previous file and creating
    /// missing parent directories.
    pub fn write(&self, blocks: &[SqlBlock], path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let script = self.render(blocks);
        fs::write(path, script).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), blocks = blocks.len(), "wrote script");
        Ok(())
    }
}

/// `-- Block <n>: <source> (<section>)`
fn separator(index: usize, block: &SqlBlock) -> String {
    let mut line = format!("-- Block {}: {}", index, block.origin.display());
    if let Some(section) = &block.section {
        let _ = write!(line, " ({})", section);
    }
    line
}

/// Make sure the statement text ends with `;`. When the last line carries a
/// `--` comment the terminator goes on a line of its own.
pub fn terminate(text: &str) -> Cow<'_, str> {
    if text.ends_with(';') {
        return Cow::Borrowed(text);
    }
    let last_line = text.lines().last().unwrap_or("");
    if last_line.contains("--") {
        Cow::Owned(format!("{}\n;", text))
    } else {
        Cow::Owned(format!("{};", text))
    }
}
