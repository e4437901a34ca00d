use std::fs;
use std::path::Path;

use codespan_reporting::files::SimpleFiles;
use docsql::Config;
use docsql::extractor::TagRule;
use docsql::pipeline::{self, SourceStatus};

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// The default four-document layout inside a scratch directory.
fn project() -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "docs/database/01-schema.md",
        "# Schema\n\n## Users\n\n```sql\nCREATE TABLE users (id int)\n```\n\n## Relays\n\n```sql\nCREATE TABLE event_relays (id int);\n```\n",
    );
    write(
        dir.path(),
        "docs/database/02-audit-logging.md",
        "# Audit\n\n```sql\nCREATE TABLE audit_log (id int);\n```\n",
    );
    write(
        dir.path(),
        "docs/database/03-refinements.sql",
        "ALTER TABLE users ADD name text;\n",
    );
    write(
        dir.path(),
        "docs/database/04-seed-data.md",
        "# Seeds\n\n```sql\nINSERT INTO users VALUES (1, 'admin');\n```\n",
    );
    let config = Config::default().relative_to(dir.path());
    (dir, config)
}

fn texts(collection: &docsql::Collection) -> Vec<&str> {
    collection.blocks.iter().map(|b| b.text.trim()).collect()
}

#[test]
fn blocks_follow_priority_then_document_order() {
    let (_dir, config) = project();
    let mut files = SimpleFiles::new();
    let collection = pipeline::collect(&config, &mut files, |_| {});
    assert_eq!(
        texts(&collection),
        vec![
            "CREATE TABLE users (id int)",
            "CREATE TABLE event_relays (id int);",
            "CREATE TABLE audit_log (id int);",
            "ALTER TABLE users ADD name text;",
            "INSERT INTO users VALUES (1, 'admin');",
        ]
    );
    assert!(collection.diagnostics.is_empty());
}

#[test]
fn build_writes_one_separator_per_block() {
    let (dir, config) = project();
    let mut files = SimpleFiles::new();
    let collection = pipeline::build(&config, &mut files, |_| {}).unwrap();

    let script = fs::read_to_string(dir.path().join("infrastructure/database/01-init.sql")).unwrap();
    assert_eq!(script.matches("-- Block ").count(), collection.blocks.len());
    assert!(script.starts_with("-- Auto-generated from documentation"));
    assert!(script.contains("CREATE TABLE users (id int);"));
    assert!(script.contains("(Users)"));
}

#[test]
fn build_is_idempotent() {
    let (_dir, config) = project();
    pipeline::build(&config, &mut SimpleFiles::new(), |_| {}).unwrap();
    let first = fs::read(&config.output).unwrap();
    pipeline::build(&config, &mut SimpleFiles::new(), |_| {}).unwrap();
    assert_eq!(fs::read(&config.output).unwrap(), first);
}

#[test]
fn missing_source_warns_and_run_completes() {
    let (dir, mut config) = project();
    config.sources.insert(1, dir.path().join("docs/database/nope.md"));

    let mut files = SimpleFiles::new();
    let collection = pipeline::build(&config, &mut files, |_| {}).unwrap();

    assert_eq!(collection.blocks.len(), 5);
    assert_eq!(collection.diagnostics.len(), 1);
    assert!(collection.diagnostics[0].message.contains("not found"));
    assert_eq!(collection.sources[1].status, SourceStatus::Missing);
    assert_eq!(collection.sources[0].status, SourceStatus::Loaded { blocks: 2 });
    assert!(config.output.exists());
}

#[test]
fn unreadable_sources_warn_and_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("adir.md")).unwrap();
    fs::write(dir.path().join("bad.md"), [0xff, 0xfe, b'\n']).unwrap();
    write(dir.path(), "ok.md", "```sql\nSELECT 1\n```\n");

    let config = Config {
        sources: vec!["adir.md".into(), "bad.md".into(), "ok.md".into()],
        output: "out/init.sql".into(),
        header: String::new(),
        ..Config::default()
    }
    .relative_to(dir.path());

    let collection = pipeline::build(&config, &mut SimpleFiles::new(), |_| {}).unwrap();

    let statuses: Vec<SourceStatus> = collection.sources.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            SourceStatus::Unreadable,
            SourceStatus::Unreadable,
            SourceStatus::Loaded { blocks: 1 },
        ]
    );
    assert_eq!(collection.diagnostics.len(), 2);
    assert!(collection.diagnostics[0].message.contains("cannot read"));
    assert!(collection.diagnostics[0].message.contains("adir.md"));
    assert!(collection.diagnostics[1].message.contains("cannot read"));
    assert!(collection.diagnostics[1].message.contains("bad.md"));

    let script = fs::read_to_string(&config.output).unwrap();
    assert!(script.starts_with("-- Block 1: "));
    assert!(script.ends_with("SELECT 1;\n"));
}

#[test]
fn marker_notice_reports_start_line() {
    let (_dir, config) = project();
    let mut notices = Vec::new();
    {
        let hook = pipeline::marker_notices(&config.notice_markers, |marker, block| {
            notices.push((marker.to_string(), block.line))
        });
        pipeline::collect(&config, &mut SimpleFiles::new(), hook);
    }
    assert_eq!(notices, vec![("event_relays".to_string(), 11)]);
}

#[test]
fn exact_rule_from_config() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "doc.md",
        "```sql\nA;\n```\n```sql-verbatim\nB;\n```\n",
    );
    write(
        dir.path(),
        "docsql.toml",
        "sources = [\"doc.md\"]\noutput = \"out/init.sql\"\nheader = \"\"\ntag_rule = \"exact\"\n",
    );

    let config = Config::load(&dir.path().join("docsql.toml")).unwrap();
    assert_eq!(config.tag_rule, TagRule::Exact);
    assert_eq!(config.output, dir.path().join("out/init.sql"));

    let collection = pipeline::build(&config, &mut SimpleFiles::new(), |_| {}).unwrap();
    assert_eq!(texts(&collection), vec!["A;"]);
}

#[test]
fn config_defaults_fill_missing_keys() {
    let config = Config::from_toml_str("output = \"x.sql\"\n", Path::new("docsql.toml")).unwrap();
    assert_eq!(config.sources, Config::default().sources);
    assert_eq!(config.tag_rule, TagRule::Contains);
}

#[test]
fn config_rejects_unknown_keys() {
    let err = Config::from_toml_str("sourcez = []\n", Path::new("docsql.toml")).unwrap_err();
    assert!(matches!(err, docsql::Error::ConfigParse { .. }));
}

#[test]
fn missing_config_is_an_error() {
    let err = Config::load(Path::new("/nonexistent/docsql.toml")).unwrap_err();
    assert!(matches!(err, docsql::Error::ConfigRead { .. }));
}
