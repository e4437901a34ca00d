use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::extractor::{ExtractOptions, TagRule, UnclosedFence};

/// Default header: banner plus PostgreSQL session settings.
pub const DEFAULT_HEADER: &str = "\
-- Auto-generated from documentation. Do not edit by hand.
-- Para Shooting Committee of India Platform
-- Database: PostgreSQL 16+

SET client_encoding = 'UTF8';
SET standard_conforming_strings = on;
SET check_function_bodies = false;
SET client_min_messages = warning;
";

/// Sources in priority order: tables before the triggers and seeds that use them.
pub const DEFAULT_SOURCES: &[&str] = &[
    "docs/database/01-schema.md",
    "docs/database/02-audit-logging.md",
    "docs/database/03-refinements.sql",
    "docs/database/04-seed-data.md",
];

pub const DEFAULT_OUTPUT: &str = "infrastructure/database/01-init.sql";

/// Everything a run needs: inputs, destination, header and scan rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Source documents, highest priority first.
    pub sources: Vec<PathBuf>,
    /// Generated script location. Overwritten on every run.
    pub output: PathBuf,
    /// Text placed before the first block.
    pub header: String,
    pub tag_rule: TagRule,
    pub unclosed: UnclosedFence,
    /// Substrings that trigger a notice when a block contains them.
    pub notice_markers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sources: DEFAULT_SOURCES.iter().map(PathBuf::from).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            header: DEFAULT_HEADER.to_string(),
            tag_rule: TagRule::default(),
            unclosed: UnclosedFence::default(),
            notice_markers: vec!["event_relays".to_string()],
        }
    }
}

impl Config {
    /// Parse a TOML config. Relative paths are left as written.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, Error> {
        toml::from_str(text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a TOML config file; relative paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Config::from_toml_str(&text, path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    /// Re-root every relative path under `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        self.sources = self.sources.iter().map(|p| base.join(p)).collect();
        self.output = base.join(&self.output);
        self
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            tag_rule: self.tag_rule,
            unclosed: self.unclosed,
        }
    }
}
