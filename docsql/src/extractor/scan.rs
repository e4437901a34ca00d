use std::ops::Range;

use crate::extractor::fence::{Fence, TagRule};

/// A fenced SQL region found by the scanner, before it is turned into a block.
#[derive(Debug, Clone, PartialEq)]
pub struct FencedRegion {
    /// Trimmed contents, never empty.
    pub text: String,
    /// 1-based line of the opening fence.
    pub line: usize,
    /// From the start of the opening fence to the end of the closing fence.
    pub span: Range<usize>,
}

/// An SQL fence that was still open at end of file.
#[derive(Debug, Clone, PartialEq)]
pub struct UnclosedRegion {
    pub line: usize,
    /// Span of the opening fence line.
    pub span: Range<usize>,
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub regions: Vec<FencedRegion>,
    pub unclosed: Option<UnclosedRegion>,
}

// ---------------------------------------------------------------------------
// Scan state
// ---------------------------------------------------------------------------

struct OpenFence<'a> {
    fence: Fence<'a>,
    line: usize,
    fence_span: Range<usize>,
    body: String,
}

struct ScanState<'a> {
    rule: TagRule,
    open: Option<OpenFence<'a>>,
    regions: Vec<FencedRegion>,
}

impl<'a> ScanState<'a> {
    fn line(&mut self, raw: &'a str, line_no: usize, span: Range<usize>) {
        let fence = Fence::parse(raw);

        match self.open.take() {
            Some(open) if fence.is_some_and(|f| f.closes(&open.fence)) => {
                self.close(open, span.end);
            }
            Some(mut open) => {
                open.body.push_str(raw);
                self.open = Some(open);
            }
            None => {
                if let Some(fence) = fence.filter(|f| self.rule.matches(f.tag)) {
                    self.open = Some(OpenFence {
                        fence,
                        line: line_no,
                        fence_span: span,
                        body: String::new(),
                    });
                }
            }
        }
    }

    fn close(&mut self, open: OpenFence<'a>, end: usize) {
        let text = open.body.trim();
        if text.is_empty() {
            return;
        }
        self.regions.push(FencedRegion {
            text: text.to_string(),
            line: open.line,
            span: open.fence_span.start..end,
        });
    }

    fn finish(self) -> ScanOutput {
        ScanOutput {
            regions: self.regions,
            unclosed: self.open.map(|open| UnclosedRegion {
                line: open.line,
                span: open.fence_span,
            }),
        }
    }
}

/// Walk `source` line by line and collect every fenced region whose tag
/// satisfies `rule`. Lines keep their terminators inside a region.
pub fn scan(source: &str, rule: TagRule) -> ScanOutput {
    let mut state = ScanState {
        rule,
        open: None,
        regions: Vec::new(),
    };

    let mut offset = 0;
    for (idx, raw) in source.split_inclusive('\n').enumerate() {
        let span = offset..offset + raw.len();
        offset = span.end;
        state.line(raw, idx + 1, span);
    }

    state.finish()
}
