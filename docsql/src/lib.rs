pub mod block;
pub mod config;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod script;
pub mod source;

pub use config::Config;
pub use error::Error;
pub use extractor::{ExtractDiagnostic, Extraction, Extractor};
pub use script::Assembler;

use crate::block::SqlBlock;

/// The ordered SQL blocks gathered from every configured source.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Blocks in file priority order, then document order.
    pub blocks: Vec<SqlBlock>,
    /// Warnings and notes raised while reading sources.
    pub diagnostics: Vec<ExtractDiagnostic>,
    /// One entry per configured source, in priority order.
    pub sources: Vec<pipeline::SourceSummary>,
}
