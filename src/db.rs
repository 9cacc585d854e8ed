use anyhow::{bail, Context, Result};
use duckdb::{AccessMode, Connection};

use crate::config::Config;

/// Opens the database for writing, creating the file (and its parent
/// directory) if missing.
pub fn open(config: &Config) -> Result<Connection> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    Ok(conn)
}

/// Opens an existing database in read-only access mode.
pub fn open_read_only(config: &Config) -> Result<Connection> {
    let db_path = &config.db.path;
    if !db_path.exists() {
        bail!("Database file does not exist: {}", db_path.display());
    }

    let flags = duckdb::Config::default().access_mode(AccessMode::ReadOnly)?;
    let conn = Connection::open_with_flags(db_path, flags)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    Ok(conn)
}

/// Quotes an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a string literal for interpolation into SQL.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_at(path: std::path::PathBuf) -> Config {
        let mut cfg = Config::default();
        cfg.db.path = path;
        cfg
    }

    #[test]
    fn quoting() {
        assert_eq!(quote_ident("scorecard_2023_24"), "\"scorecard_2023_24\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_literal("/data/o'neil.csv"), "'/data/o''neil.csv'");
    }

    #[test]
    fn open_creates_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let cfg = config_at(tmp.path().join("nested").join("data.duckdb"));
        let conn = open(&cfg).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        drop(conn);
        assert!(cfg.db.path.exists());
    }

    #[test]
    fn read_only_requires_existing_file() {
        let tmp = TempDir::new().unwrap();
        let cfg = config_at(tmp.path().join("missing.duckdb"));
        let err = open_read_only(&cfg).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn read_only_rejects_writes() {
        let tmp = TempDir::new().unwrap();
        let cfg = config_at(tmp.path().join("data.duckdb"));
        {
            let conn = open(&cfg).unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
                .unwrap();
        }

        let conn = open_read_only(&cfg).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert!(conn.execute_batch("DROP TABLE t").is_err());
    }
}
