mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::info;

use docsql::extractor::TagRule;
use docsql::pipeline::{self, SourceStatus};
use docsql::{Assembler, Collection, Config, ExtractDiagnostic};

const SUBCOMMANDS: &[&str] = &["build", "list", "test", "help"];
const DEFAULT_CONFIG: &str = "docsql.toml";

#[derive(Parser)]
#[command(name = "docsql", version, about = "Assemble an SQL init script from fenced blocks in docs")]
struct Cli {
    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract all sources and write the script
    Build(BuildArgs),

    /// List extracted blocks without writing anything
    List(SourceArgs),

    /// Run .test.md extraction fixtures
    Test(TestArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Config file (defaults to ./docsql.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only accept fences tagged exactly `sql`
    #[arg(long)]
    exact_tags: bool,
}

#[derive(clap::Args)]
struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Write the script here instead of the configured output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extract and report, but don't write the script
    #[arg(long)]
    check: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// List fixtures and exit
    #[arg(long)]
    list: bool,
}

fn main() {
    let mut args: Vec<String> = std::env::args().collect();
    default_to_build(&mut args);

    let cli = Cli::parse_from(&args);
    init_tracing(cli.quiet);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Build(build_args) => do_build(build_args, color_choice),
        Command::List(source_args) => do_list(source_args, color_choice),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list {
                test_runner::list_fixtures(path);
                return;
            }
            process::exit(test_runner::run_fixtures(path, cli.no_color));
        }
    }
}

/// `docsql` and `docsql --output x.sql` behave like `docsql build ...`.
/// Only the first positional argument is checked; values of flags that take
/// one are skipped so `--output test` is not mistaken for a subcommand.
fn default_to_build(args: &mut Vec<String>) {
    let mut rest = args.iter().skip(1);
    let mut first_pos = None;
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-h" | "--help" | "-V" | "--version" => return,
            "-o" | "--output" | "-c" | "--config" => {
                rest.next();
            }
            a if a.starts_with('-') => {}
            a => {
                first_pos = Some(a);
                break;
            }
        }
    }

    if !first_pos.is_some_and(|a| SUBCOMMANDS.contains(&a)) {
        args.insert(1, "build".to_string());
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "docsql=warn" } else { "docsql=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &SourceArgs) -> Config {
    let path = args.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG);
        default.is_file().then_some(default)
    });

    let mut config = match path {
        Some(path) => Config::load(&path).unwrap_or_else(|e| {
            eprintln!("error: {}", e);
            process::exit(1);
        }),
        None => Config::default(),
    };

    if args.exact_tags {
        config.tag_rule = TagRule::Exact;
    }
    config
}

fn do_build(args: BuildArgs, color_choice: ColorChoice) {
    let mut config = load_config(&args.source);
    if let Some(output) = args.output {
        config.output = output;
    }

    let (files, collection, written) = collect_and_write(&config, args.check);

    // Source warnings come first so a failed write does not hide them.
    emit_diagnostics(color_choice, &files, &collection.diagnostics);
    log_sources(&collection);

    if let Err(e) = written {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    if args.check {
        println!(
            "ok: {} SQL blocks found ({} not written)",
            collection.blocks.len(),
            config.output.display()
        );
    } else {
        println!(
            "✓ Extracted {} SQL blocks to {}",
            collection.blocks.len(),
            config.output.display()
        );
    }
}

/// Extract every source, then write the script unless `check_only`.
/// The collection is returned even when the write fails.
fn collect_and_write(
    config: &Config,
    check_only: bool,
) -> (SimpleFiles<String, String>, Collection, Result<(), docsql::Error>) {
    let mut files = SimpleFiles::new();
    let hook = pipeline::marker_notices(&config.notice_markers, |marker, block| {
        info!("  found {} block at line {}", marker, block.line);
    });
    let collection = pipeline::collect(config, &mut files, hook);

    let written = if check_only {
        Ok(())
    } else {
        Assembler::new(config.header.as_str()).write(&collection.blocks, &config.output)
    };
    (files, collection, written)
}

fn do_list(args: SourceArgs, color_choice: ColorChoice) {
    let config = load_config(&args);
    let mut files = SimpleFiles::new();
    let collection = pipeline::collect(&config, &mut files, |_| {});

    emit_diagnostics(color_choice, &files, &collection.diagnostics);

    for (i, block) in collection.blocks.iter().enumerate() {
        let section = block
            .section
            .as_deref()
            .map(|s| format!(" ({})", s))
            .unwrap_or_default();
        println!(
            "{:>4}  {}:{}{}  {}",
            i + 1,
            block.origin.display(),
            block.line,
            section,
            block.first_line()
        );
    }
}

fn log_sources(collection: &Collection) {
    for summary in &collection.sources {
        match summary.status {
            SourceStatus::Loaded { blocks } => {
                info!("{}: {} block(s)", summary.path.display(), blocks)
            }
            SourceStatus::Missing => info!("{}: missing", summary.path.display()),
            SourceStatus::Unreadable => info!("{}: unreadable", summary.path.display()),
        }
    }
}

fn emit_diagnostics(
    color_choice: ColorChoice,
    files: &SimpleFiles<String, String>,
    diagnostics: &[ExtractDiagnostic],
) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for diag in diagnostics {
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diag.to_diagnostic());
    }
}

#[cfg(test)]
mod tests {
    use super::{collect_and_write, default_to_build};

    use docsql::Config;

    fn resolved(args: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        default_to_build(&mut args);
        args
    }

    #[test]
    fn bare_invocation_builds() {
        assert_eq!(resolved(&["docsql"]), vec!["docsql", "build"]);
    }

    #[test]
    fn flag_value_named_like_a_subcommand() {
        assert_eq!(
            resolved(&["docsql", "--output", "test"]),
            vec!["docsql", "build", "--output", "test"]
        );
        assert_eq!(
            resolved(&["docsql", "-c", "list", "--quiet"]),
            vec!["docsql", "build", "-c", "list", "--quiet"]
        );
    }

    #[test]
    fn explicit_subcommand_is_kept() {
        assert_eq!(
            resolved(&["docsql", "--no-color", "test", "fixtures"]),
            vec!["docsql", "--no-color", "test", "fixtures"]
        );
        assert_eq!(resolved(&["docsql", "list"]), vec!["docsql", "list"]);
    }

    #[test]
    fn failed_write_keeps_source_warnings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.md"), "```sql\nSELECT 1\n```\n").unwrap();
        std::fs::write(dir.path().join("blocker"), "").unwrap();

        let config = Config {
            sources: vec!["missing.md".into(), "ok.md".into()],
            output: "blocker/init.sql".into(),
            ..Config::default()
        }
        .relative_to(dir.path());

        let (_files, collection, written) = collect_and_write(&config, false);
        assert!(matches!(written, Err(docsql::Error::CreateDir { .. })));
        assert_eq!(collection.blocks.len(), 1);
        assert_eq!(collection.diagnostics.len(), 1);
        assert!(collection.diagnostics[0].message.contains("not found"));
    }

    #[test]
    fn check_only_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.md"), "```sql\nSELECT 1\n```\n").unwrap();

        let config = Config {
            sources: vec!["ok.md".into()],
            output: "out/init.sql".into(),
            ..Config::default()
        }
        .relative_to(dir.path());

        let (_files, collection, written) = collect_and_write(&config, true);
        assert!(written.is_ok());
        assert_eq!(collection.blocks.len(), 1);
        assert!(!config.output.exists());
    }

    #[test]
    fn help_is_left_alone() {
        assert_eq!(resolved(&["docsql", "--help"]), vec!["docsql", "--help"]);
    }
}
