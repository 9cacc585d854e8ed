//! Database overview and CLI query output.
//!
//! `scorecard stats` shows what the loader produced: file size, total rows,
//! and per-table row and column counts. `scorecard query` runs the same gated
//! SELECT as `POST /api/query` and prints a tab-separated table.

use anyhow::Result;

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::query::{self, QueryResult};

/// Runs the stats command: query the database and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let conn = db::open_read_only(config)?;
    let tables = catalog::summarize(&conn)?;
    drop(conn);

    let size = std::fs::metadata(&config.db.path)?.len();
    let total_rows: u64 = tables.iter().map(|t| t.rows).sum();

    println!("Scorecard Explorer: Database Stats");
    println!("===================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(size));
    println!("  Tables:      {}", tables.len());
    println!("  Rows:        {}", total_rows);

    if !tables.is_empty() {
        println!();
        println!("  {:<24} {:>10} {:>8}", "TABLE", "ROWS", "COLUMNS");
        println!("  {}", "-".repeat(44));
        for t in &tables {
            println!("  {:<24} {:>10} {:>8}", t.name, t.rows, t.columns);
        }
    }

    println!();
    Ok(())
}

/// Runs the query command against a read-only connection.
pub fn run_query(config: &Config, sql: &str) -> Result<()> {
    // Reject before touching the database, as the API does.
    query::check_select(sql)?;

    let conn = db::open_read_only(config)?;
    let result = query::run_query(&conn, sql, config.server.max_query_rows)?;
    print!("{}", render_tsv(&result));
    Ok(())
}

fn render_tsv(result: &QueryResult) -> String {
    let mut out = result.columns.join("\t");
    out.push('\n');
    for row in &result.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| match v {
                serde_json::Value::Null => "NULL".to_string(),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    if result.truncated {
        out.push_str(&format!("(truncated to {} rows)\n", result.rows.len()));
    }
    out
}

/// Size of the database file, in the largest unit that keeps it at or above 1.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
