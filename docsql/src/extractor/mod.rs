pub mod diagnostic;
pub mod fence;
pub mod scan;
pub mod sections;

pub use diagnostic::ExtractDiagnostic;
pub use fence::TagRule;

use std::io;
use std::path::Path;

use codespan_reporting::files::SimpleFiles;
use serde::Deserialize;
use tracing::debug;

use crate::block::SqlBlock;
use crate::extractor::sections::Outline;
use crate::source::{SourceFile, SourceKind};

/// What to do with an SQL fence that is still open at end of file.
/// Its content is dropped either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnclosedFence {
    #[default]
    Warn,
    Drop,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub tag_rule: TagRule,
    pub unclosed: UnclosedFence,
}

/// Blocks and diagnostics produced from one source.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub blocks: Vec<SqlBlock>,
    pub diagnostics: Vec<ExtractDiagnostic>,
    /// Set when the file could not be read.
    pub failure: Option<LoadFailure>,
}

impl Extraction {
    fn failed(failure: LoadFailure, diagnostic: ExtractDiagnostic) -> Self {
        Extraction {
            blocks: Vec::new(),
            diagnostics: vec![diagnostic],
            failure: Some(failure),
        }
    }
}

/// Why a path yielded nothing before scanning started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    Missing,
    Unreadable,
}

type BlockHook<'h> = Box<dyn FnMut(&SqlBlock) + 'h>;

/// Extractor entry point.
pub struct Extractor<'h> {
    options: ExtractOptions,
    hook: Option<BlockHook<'h>>,
}

impl<'h> Extractor<'h> {
    pub fn new(options: ExtractOptions) -> Self {
        Extractor {
            options,
            hook: None,
        }
    }

    /// Call `hook` with every block, in order, once its file has been scanned.
    pub fn with_block_hook(mut self, hook: impl FnMut(&SqlBlock) + 'h) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Read `path` fresh, register it in `files` and extract its blocks.
    /// A missing or unreadable file produces a warning and no blocks.
    pub fn extract_path(
        &mut self,
        path: &Path,
        files: &mut SimpleFiles<String, String>,
    ) -> Extraction {
        let source = match SourceFile::read(path) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let diag = ExtractDiagnostic::unlocated(format!(
                    "source file not found: {}",
                    path.display()
                ))
                .with_note("the file contributes no blocks");
                return Extraction::failed(LoadFailure::Missing, diag);
            }
            Err(e) => {
                let diag = ExtractDiagnostic::unlocated(format!(
                    "cannot read '{}': {}",
                    path.display(),
                    e
                ))
                .with_note("the file contributes no blocks");
                return Extraction::failed(LoadFailure::Unreadable, diag);
            }
        };

        let file_id = files.add(source.name(), source.contents.clone());
        self.extract(&source, file_id)
    }

    /// Extract blocks from an already loaded source.
    pub fn extract(&mut self, source: &SourceFile, file_id: usize) -> Extraction {
        let extraction = match source.kind {
            SourceKind::RawSql => self.extract_raw(source, file_id),
            SourceKind::Markdown => self.extract_markdown(source, file_id),
        };

        if let Some(hook) = self.hook.as_mut() {
            extraction.blocks.iter().for_each(|block| hook(block));
        }
        extraction
    }

    fn extract_raw(&self, source: &SourceFile, file_id: usize) -> Extraction {
        let mut extraction = Extraction::default();
        if source.contents.trim().is_empty() {
            debug!(source = %source.name(), "raw SQL file is empty");
            return extraction;
        }
        extraction.blocks.push(SqlBlock {
            text: source.contents.clone(),
            origin: source.path.clone(),
            file_id,
            line: 1,
            span: 0..source.contents.len(),
            section: None,
        });
        extraction
    }

    fn extract_markdown(&self, source: &SourceFile, file_id: usize) -> Extraction {
        let output = scan::scan(&source.contents, self.options.tag_rule);
        let outline = Outline::of(&source.contents);

        let blocks = output
            .regions
            .into_iter()
            .map(|region| {
                debug!(source = %source.name(), line = region.line, "found SQL block");
                SqlBlock {
                    section: outline.section_at(region.span.start).map(str::to_string),
                    text: region.text,
                    origin: source.path.clone(),
                    file_id,
                    line: region.line,
                    span: region.span,
                }
            })
            .collect();

        let mut diagnostics = Vec::new();
        if let (Some(unclosed), UnclosedFence::Warn) = (output.unclosed, self.options.unclosed) {
            diagnostics.push(
                ExtractDiagnostic::warning(
                    format!("SQL block opened on line {} is never closed", unclosed.line),
                    unclosed.span,
                    file_id,
                )
                .with_note("its content was dropped"),
            );
        }

        Extraction {
            blocks,
            diagnostics,
            failure: None,
        }
    }
}
