use std::path::{Path, PathBuf};

use serde::Deserialize;

use docsql::ExtractDiagnostic;
use docsql::extractor::{ExtractOptions, Extractor, TagRule, UnclosedFence};
use docsql::source::SourceFile;

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    /// Human-readable fixture description.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tag_rule: TagRule,

    #[serde(default)]
    pub unclosed: UnclosedFence,

    /// Exact text of every extracted block, in order.
    #[serde(default)]
    pub expect_blocks: Option<Vec<String>>,

    #[serde(default)]
    pub expect_count: Option<usize>,

    /// Section label of every extracted block, in order ("" for none).
    #[serde(default)]
    pub expect_sections: Option<Vec<String>>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.test.md` file into its TOML frontmatter and Markdown body.
fn parse_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, body))
}

pub enum Outcome {
    Pass,
    Fail(String),
}

pub struct FixtureResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: Outcome,
}

fn run_fixture(path: &Path) -> FixtureResult {
    let fail = |description: Option<String>, reason: String| FixtureResult {
        path: path.to_path_buf(),
        description,
        outcome: Outcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, body) = match parse_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let options = ExtractOptions {
        tag_rule: config.tag_rule,
        unclosed: config.unclosed,
    };
    // Classify as Markdown regardless of the fixture's own name.
    let source = SourceFile::new("fixture.md", body);
    let extraction = Extractor::new(options).extract(&source, 0);

    let texts: Vec<&str> = extraction.blocks.iter().map(|b| b.text.as_str()).collect();
    let sections: Vec<&str> = extraction
        .blocks
        .iter()
        .map(|b| b.section.as_deref().unwrap_or(""))
        .collect();

    let mismatch = check_count(config.expect_count, texts.len())
        .or_else(|| check_list("blocks", config.expect_blocks.as_deref(), &texts))
        .or_else(|| check_list("sections", config.expect_sections.as_deref(), &sections))
        .or_else(|| {
            config
                .expect_warnings
                .as_deref()
                .and_then(|expected| check_warnings(body, &extraction.diagnostics, expected))
        });

    match mismatch {
        Some(reason) => fail(description, reason),
        None => FixtureResult {
            path: path.to_path_buf(),
            description,
            outcome: Outcome::Pass,
        },
    }
}

fn check_count(expected: Option<usize>, actual: usize) -> Option<String> {
    match expected {
        Some(n) if n != actual => Some(format!("expected {} block(s), got {}", n, actual)),
        _ => None,
    }
}

fn check_list(what: &str, expected: Option<&[String]>, actual: &[&str]) -> Option<String> {
    let expected = expected?;
    if expected.len() != actual.len() {
        return Some(format!(
            "expected {} {}, got {}\n  actual: {:?}",
            expected.len(),
            what,
            actual.len(),
            actual
        ));
    }
    expected
        .iter()
        .zip(actual)
        .enumerate()
        .find(|(_, (e, a))| e.trim() != a.trim())
        .map(|(i, (e, a))| {
            format!(
                "{}[{}] mismatch\n  expected: {:?}\n  actual:   {:?}",
                what, i, e, a
            )
        })
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    diagnostics: &[ExtractDiagnostic],
    expected: &[ExpectedWarning],
) -> Option<String> {
    let actual: Vec<&ExtractDiagnostic> = diagnostics.iter().filter(|d| d.is_warning()).collect();

    if actual.len() != expected.len() {
        let msgs: Vec<String> = actual.iter().map(|w| format!("  - {}", w.message)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            if msgs.is_empty() {
                "    (none)".to_string()
            } else {
                msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        let Some(expected_line) = expected.line else {
            continue;
        };
        match &actual.span {
            Some(span) => {
                let actual_line = byte_offset_to_line(source, span.start);
                if actual_line != expected_line {
                    return Some(format!(
                        "warning[{}]: expected on line {}, but span is on line {}",
                        i, expected_line, actual_line
                    ));
                }
            }
            None => {
                return Some(format!(
                    "warning[{}]: expected on line {}, but warning has no span",
                    i, expected_line
                ));
            }
        }
    }

    None
}

/// Find `.test.md` files under `root`, sorted.
fn discover(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    collect_fixtures(root, &mut out);
    out.sort();
    out
}

fn collect_fixtures(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".test.md"))
        {
            out.push(path);
        }
    }
}

/// Print the fixtures that `run_fixtures` would run.
pub fn list_fixtures(path: &Path) {
    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        discover(path)
    };
    if files.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
    }
    for file in files {
        println!("{}", file.display());
    }
}

fn label(no_color: bool, pass: bool) -> &'static str {
    match (no_color, pass) {
        (true, true) => "PASS",
        (true, false) => "FAIL",
        (false, true) => "\x1b[32mPASS\x1b[0m",
        (false, false) => "\x1b[31mFAIL\x1b[0m",
    }
}

/// Run all `.test.md` fixtures under `path` (or a single file).
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_fixtures(path: &Path, no_color: bool) -> i32 {
    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        discover(path)
    };

    if files.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }

    let mut failures: Vec<FixtureResult> = Vec::new();
    let mut passed = 0usize;

    for file in &files {
        let result = run_fixture(file);
        let name = result.description.clone().unwrap_or_else(|| {
            file.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
                .to_string()
        });

        match result.outcome {
            Outcome::Pass => {
                passed += 1;
                eprintln!("  {}  {}", label(no_color, true), name);
            }
            Outcome::Fail(_) => {
                eprintln!("  {}  {}", label(no_color, false), name);
                failures.push(result);
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let Outcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        let ok = if no_color { "ok" } else { "\x1b[32mok\x1b[0m" };
        eprintln!("test result: {}. {} passed, 0 failed", ok, passed);
        0
    } else {
        let bad = if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" };
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            bad,
            passed,
            failed,
            passed + failed
        );
        1
    }
}
