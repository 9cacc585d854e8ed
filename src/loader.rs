//! CSV loading.
//!
//! Finds year-stamped Scorecard files in the data directory and bulk-loads
//! each one into its own table, letting DuckDB's `read_csv_auto` infer the
//! schema. Each table is dropped and recreated, so reruns are idempotent.
//!
//! A failure on one file is reported and the run moves on to the next. There
//! is no rollback: if the drop succeeds and the create fails, the table is gone
//! until the next successful load.

use anyhow::{bail, Context, Result};
use duckdb::Connection;
use globset::Glob;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::catalog;
use crate::config::Config;
use crate::db::{self, quote_ident, quote_literal};
use crate::naming;

/// A candidate input file and the table it maps to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    /// `None` when the name carries no year token; such files are skipped.
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTable {
    pub file: String,
    pub table: String,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub file: String,
    pub table: String,
    pub message: String,
}

/// Outcome of a load run.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: Vec<LoadedTable>,
    pub skipped: Vec<String>,
    pub failed: Vec<LoadFailure>,
}

/// Lists files directly inside `data_dir` whose names match `file_glob`,
/// sorted by file name.
pub fn discover(data_dir: &Path, file_glob: &str) -> Result<Vec<SourceFile>> {
    if !data_dir.is_dir() {
        bail!("Data directory does not exist: {}", data_dir.display());
    }

    let matcher = Glob::new(file_glob)
        .with_context(|| format!("Invalid file glob: '{}'", file_glob))?
        .compile_matcher();

    let mut files = Vec::new();
    for entry in WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if !matcher.is_match(&file_name) {
            continue;
        }

        let table = naming::table_name_for(&file_name);
        files.push(SourceFile {
            path: entry.path().to_path_buf(),
            file_name,
            table,
        });
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// Replaces `table` with the contents of the CSV at `path` and returns its row count.
pub fn load_file(conn: &Connection, path: &Path, table: &str) -> Result<u64> {
    let ident = quote_ident(table);
    let source = quote_literal(&path.to_string_lossy());

    conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", ident))?;
    conn.execute_batch(&format!(
        "CREATE TABLE {} AS SELECT * FROM read_csv_auto({})",
        ident, source
    ))?;

    Ok(catalog::count_rows(conn, table)?)
}

/// Loads every file in order, printing progress to stdout.
///
/// Files without a year token are skipped; per-file errors are recorded and
/// do not stop the run.
pub fn load_files(conn: &Connection, files: &[SourceFile]) -> LoadReport {
    let mut report = LoadReport::default();

    for file in files {
        let Some(table) = &file.table else {
            println!("Skipping {} - couldn't extract year", file.file_name);
            warn!(file = %file.file_name, "no year token in file name, skipping");
            report.skipped.push(file.file_name.clone());
            continue;
        };

        println!("Processing {} -> table '{}'...", file.file_name, table);

        match load_file(conn, &file.path, table) {
            Ok(rows) => {
                println!("  Inserted {} rows", rows);
                report.loaded.push(LoadedTable {
                    file: file.file_name.clone(),
                    table: table.clone(),
                    rows,
                });
            }
            Err(e) => {
                println!("  Error processing {}: {}", file.file_name, e);
                warn!(file = %file.file_name, table = %table, error = %e, "load failed");
                report.failed.push(LoadFailure {
                    file: file.file_name.clone(),
                    table: table.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

/// Runs the `load` command.
///
/// `data_dir` overrides `[loader].data_dir`. With `dry_run` the database is
/// not opened; only the file-to-table mapping is printed.
pub fn run_load(config: &Config, data_dir: Option<PathBuf>, dry_run: bool) -> Result<LoadReport> {
    let data_dir = data_dir.unwrap_or_else(|| config.loader.data_dir.clone());
    let files = discover(&data_dir, &config.loader.file_glob)?;

    if dry_run {
        println!("load (dry-run)");
        println!("  files found: {}", files.len());
        let mut report = LoadReport::default();
        for file in &files {
            match &file.table {
                Some(table) => println!("  {} -> {}", file.file_name, table),
                None => {
                    println!("  {} -> skipped", file.file_name);
                    report.skipped.push(file.file_name.clone());
                }
            }
        }
        return Ok(report);
    }

    println!("Found {} MERGED files to process", files.len());

    let conn = db::open(config)?;
    let report = load_files(&conn, &files);
    drop(conn);

    println!();
    println!(
        "loaded: {}, skipped: {}, failed: {}",
        report.loaded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    println!("Done! Database saved to {}", config.db.path.display());

    Ok(report)
}
