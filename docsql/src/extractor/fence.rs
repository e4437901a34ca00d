use serde::Deserialize;

/// Which info tags open an SQL block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagRule {
    /// Tag contains `sql` in any case: `sql`, `SQL`, `postgresql`, `sql-verbatim`.
    #[default]
    Contains,
    /// Tag is exactly `sql`.
    Exact,
}

impl TagRule {
    pub fn matches(self, tag: &str) -> bool {
        match self {
            TagRule::Contains => tag.to_ascii_lowercase().contains("sql"),
            TagRule::Exact => tag == "sql",
        }
    }
}

/// A fence line: three or more backticks or tildes plus an optional tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence<'a> {
    pub delimiter: char,
    pub width: usize,
    pub tag: &'a str,
}

impl<'a> Fence<'a> {
    /// Recognize a fence after trimming surrounding whitespace.
    pub fn parse(line: &'a str) -> Option<Self> {
        let trimmed = line.trim();
        let delimiter = trimmed.chars().next()?;
        if delimiter != '`' && delimiter != '~' {
            return None;
        }
        let width = trimmed.bytes().take_while(|&b| b == delimiter as u8).count();
        if width < 3 {
            return None;
        }
        Some(Fence {
            delimiter,
            width,
            tag: trimmed[width..].trim(),
        })
    }

    /// Whether this line ends a block opened by `open`. Any trailing tag is allowed.
    pub fn closes(&self, open: &Fence<'_>) -> bool {
        self.delimiter == open.delimiter
    }
}
