//! Ad-hoc read-only SQL.
//!
//! A statement is accepted when, after trimming, it starts with `SELECT`
//! (any case). This is a prefix check and not a parser; the API additionally
//! runs every statement on a read-only connection.

use duckdb::arrow::datatypes::DataType;
use duckdb::{Connection, Statement};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{ExplorerError, Result};
use crate::values;

/// Result of a custom query, capped at the configured row limit.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
    /// `true` when the statement produced more rows than were returned.
    pub truncated: bool,
}

/// Validates the statement and returns it trimmed.
pub fn check_select(sql: &str) -> Result<&str> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(ExplorerError::EmptyQuery);
    }
    let is_select = trimmed
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SELECT"));
    if !is_select {
        return Err(ExplorerError::NotSelect);
    }
    Ok(trimmed)
}

/// Runs a caller-supplied SELECT and returns at most `max_rows` rows.
pub fn run_query(conn: &Connection, sql: &str, max_rows: usize) -> Result<QueryResult> {
    let sql = check_select(sql)?;
    let mut stmt = conn.prepare(sql)?;
    let (columns, rows, truncated) = read_rows(&mut stmt, max_rows)?;
    Ok(QueryResult {
        columns,
        rows,
        truncated,
    })
}

/// Executes a prepared statement and reads up to `limit` rows.
///
/// Returns the column names, the rows, and whether at least one further row
/// was available.
pub(crate) fn read_rows(
    stmt: &mut Statement<'_>,
    limit: usize,
) -> Result<(Vec<String>, Vec<Vec<JsonValue>>, bool)> {
    let mut rows = Vec::new();
    let mut more = false;

    let mut zoned: Option<Vec<bool>> = None;

    let mut result = stmt.query([])?;
    while let Some(row) = result.next()? {
        if rows.len() == limit {
            more = true;
            break;
        }
        let flags = zoned.get_or_insert_with(|| zoned_columns(row.as_ref()));
        let mut values = Vec::with_capacity(flags.len());
        for (i, &tz) in flags.iter().enumerate() {
            values.push(values::cell_to_json(row.get_ref(i)?, tz));
        }
        rows.push(values);
    }
    // Column metadata is only readable once the row cursor is released.
    drop(result);

    let columns = stmt.column_names();
    Ok((columns, rows, more))
}

/// Marks the result columns typed `TIMESTAMP WITH TIME ZONE`.
fn zoned_columns(stmt: &Statement<'_>) -> Vec<bool> {
    (0..stmt.column_count())
        .map(|i| matches!(stmt.column_type(i), DataType::Timestamp(_, Some(_))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_gate() {
        assert_eq!(check_select("  select 1\n").unwrap(), "select 1");
        assert!(check_select("SELECT * FROM t").is_ok());
        assert!(check_select("SeLeCt 2").is_ok());
        assert!(matches!(check_select(""), Err(ExplorerError::EmptyQuery)));
        assert!(matches!(check_select("   \t"), Err(ExplorerError::EmptyQuery)));
        assert!(matches!(
            check_select("DROP TABLE x"),
            Err(ExplorerError::NotSelect)
        ));
        assert!(matches!(
            check_select("WITH a AS (SELECT 1) SELECT * FROM a"),
            Err(ExplorerError::NotSelect)
        ));
        assert!(matches!(check_select("sel"), Err(ExplorerError::NotSelect)));
    }

    #[test]
    fn select_one() {
        let conn = Connection::open_in_memory().unwrap();
        let result = run_query(&conn, "select 1", 1000).unwrap();
        assert_eq!(result.columns, vec!["1".to_string()]);
        assert_eq!(result.rows, vec![vec![json!(1)]]);
        assert!(!result.truncated);
    }

    #[test]
    fn truncates_at_row_cap() {
        let conn = Connection::open_in_memory().unwrap();
        let result = run_query(&conn, "SELECT range AS n FROM range(1500)", 1000).unwrap();
        assert_eq!(result.columns, vec!["n".to_string()]);
        assert_eq!(result.rows.len(), 1000);
        assert_eq!(result.rows[0], vec![json!(0)]);
        assert_eq!(result.rows[999], vec![json!(999)]);
        assert!(result.truncated);
    }

    #[test]
    fn exactly_cap_rows_is_not_truncated() {
        let conn = Connection::open_in_memory().unwrap();
        let result = run_query(&conn, "SELECT range FROM range(10)", 10).unwrap();
        assert_eq!(result.rows.len(), 10);
        assert!(!result.truncated);
    }

    #[test]
    fn empty_result_keeps_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (unitid INTEGER, instnm VARCHAR)")
            .unwrap();
        let result = run_query(&conn, "SELECT * FROM t", 1000).unwrap();
        assert_eq!(result.columns, vec!["unitid", "instnm"]);
        assert!(result.rows.is_empty());
        assert!(!result.truncated);
    }

    #[test]
    fn engine_errors_are_verbatim() {
        let conn = Connection::open_in_memory().unwrap();
        let err = run_query(&conn, "SELECT * FROM missing_table", 1000).unwrap_err();
        assert!(matches!(err, ExplorerError::Engine(_)));
        assert!(err.to_string().contains("missing_table"));
    }

    #[test]
    fn nested_and_enum_cells_are_json() {
        let conn = Connection::open_in_memory().unwrap();
        let result = run_query(
            &conn,
            "SELECT 'a'::ENUM('a', 'b') AS e, [1, 2, 3] AS l, {'x': 1} AS s, \
             MAP {'k': 'v'} AS m, INTERVAL 3 DAY AS i, 5 AS after",
            1000,
        )
        .unwrap();
        assert_eq!(result.columns, vec!["e", "l", "s", "m", "i", "after"]);
        assert_eq!(
            result.rows,
            vec![vec![
                json!("a"),
                json!([1, 2, 3]),
                json!({"x": 1}),
                json!({"k": "v"}),
                json!("3 days"),
                json!(5),
            ]]
        );
    }

    #[test]
    fn zoned_timestamps_keep_offset() {
        let conn = Connection::open_in_memory().unwrap();
        let result = run_query(
            &conn,
            "SELECT TIMESTAMPTZ '2023-01-01 00:00:00+00' AS tz, \
             TIMESTAMP '2023-01-01 00:00:00' AS plain",
            1000,
        )
        .unwrap();
        assert_eq!(
            result.rows,
            vec![vec![json!("2023-01-01 00:00:00+00"), json!("2023-01-01 00:00:00")]]
        );
    }

    #[test]
    fn rejected_statement_is_not_executed() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE x (a INTEGER)").unwrap();
        assert!(run_query(&conn, "DROP TABLE x", 1000).is_err());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM x", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
