use std::path::{Path, PathBuf};

use codespan_reporting::files::SimpleFiles;
use tracing::info;

use crate::Collection;
use crate::block::SqlBlock;
use crate::config::Config;
use crate::error::Error;
use crate::extractor::{Extractor, LoadFailure};
use crate::script::Assembler;

/// What one configured source contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub path: PathBuf,
    pub status: SourceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Loaded { blocks: usize },
    Missing,
    Unreadable,
}

/// Extract every configured source in priority order.
///
/// Each source is registered in `files` so diagnostics can point into it.
/// `hook` sees every block as it is produced.
pub fn collect<'h>(
    config: &Config,
    files: &mut SimpleFiles<String, String>,
    hook: impl FnMut(&SqlBlock) + 'h,
) -> Collection {
    let mut extractor = Extractor::new(config.extract_options()).with_block_hook(hook);
    let mut collection = Collection::default();

    for path in &config.sources {
        info!("processing {}", display_name(path));
        let extraction = extractor.extract_path(path, files);

        let status = match extraction.failure {
            Some(LoadFailure::Missing) => SourceStatus::Missing,
            Some(LoadFailure::Unreadable) => SourceStatus::Unreadable,
            None => SourceStatus::Loaded {
                blocks: extraction.blocks.len(),
            },
        };
        collection.sources.push(SourceSummary {
            path: path.clone(),
            status,
        });
        collection.blocks.extend(extraction.blocks);
        collection.diagnostics.extend(extraction.diagnostics);
    }

    collection
}

/// Collect all sources and write the assembled script to `config.output`.
pub fn build<'h>(
    config: &Config,
    files: &mut SimpleFiles<String, String>,
    hook: impl FnMut(&SqlBlock) + 'h,
) -> Result<Collection, Error> {
    let collection = collect(config, files, hook);
    Assembler::new(config.header.as_str()).write(&collection.blocks, &config.output)?;
    Ok(collection)
}

/// Report blocks that mention one of `markers`, with the line they start on.
pub fn marker_notices<'m>(
    markers: &'m [String],
    mut notify: impl FnMut(&str, &SqlBlock) + 'm,
) -> impl FnMut(&SqlBlock) + 'm {
    move |block| {
        for marker in markers.iter().filter(|m| block.contains(m)) {
            notify(marker, block);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
