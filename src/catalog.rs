//! Table listing, schema inspection, and paginated reads.
//!
//! Every operation that names a table first checks it against the live
//! table list; names are only ever interpolated as quoted identifiers.

use duckdb::Connection;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::db::quote_ident;
use crate::error::{ExplorerError, Result};
use crate::query::read_rows;

/// One column of a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// A page of rows from one table.
#[derive(Debug, Clone, Serialize)]
pub struct TablePage {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// Row and column counts for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: u64,
    pub columns: usize,
}

/// Normalized pagination parameters: `page >= 1`, `1 <= per_page <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Builds a request from raw query-string values.
    ///
    /// Missing or non-integer values fall back to page 1 and
    /// `default_per_page`. Values below 1 are raised to 1 and `per_page` is
    /// clamped to `max_per_page`.
    pub fn from_params(
        page: Option<&str>,
        per_page: Option<&str>,
        default_per_page: u64,
        max_per_page: u64,
    ) -> Self {
        let page = parse_int(page).unwrap_or(1).max(1) as u64;
        let per_page = parse_int(per_page)
            .map(|n| n.max(1) as u64)
            .unwrap_or(default_per_page)
            .min(max_per_page)
            .max(1);
        Self { page, per_page }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.per_page)
            .min(i64::MAX as u64)
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// `ceil(total / per_page)`.
pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Table names in the order DuckDB reports them.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SHOW TABLES")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Fails with [`ExplorerError::TableNotFound`] unless `name` is a current table.
pub fn ensure_table(conn: &Connection, name: &str) -> Result<()> {
    if list_tables(conn)?.iter().any(|t| t == name) {
        Ok(())
    } else {
        Err(ExplorerError::TableNotFound(name.to_string()))
    }
}

/// Column names and types in definition order.
pub fn describe_table(conn: &Connection, name: &str) -> Result<Vec<ColumnInfo>> {
    ensure_table(conn, name)?;
    columns_of(conn, name)
}

fn columns_of(conn: &Connection, name: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("DESCRIBE {}", quote_ident(name)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                column: row.get(0)?,
                data_type: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Number of rows currently stored in a table. The table must exist.
pub fn count_rows(conn: &Connection, name: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(name)),
        [],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

/// Reads one page of a table in its natural stored order.
pub fn fetch_page(conn: &Connection, name: &str, request: PageRequest) -> Result<TablePage> {
    ensure_table(conn, name)?;

    let total = count_rows(conn, name)?;
    let columns = columns_of(conn, name)?
        .into_iter()
        .map(|c| c.column)
        .collect();

    let sql = format!(
        "SELECT * FROM {} LIMIT {} OFFSET {}",
        quote_ident(name),
        request.per_page,
        request.offset()
    );
    let mut stmt = conn.prepare(&sql)?;
    let (_, rows, _) = read_rows(&mut stmt, request.per_page as usize)?;

    Ok(TablePage {
        columns,
        rows,
        total,
        page: request.page,
        per_page: request.per_page,
        total_pages: total_pages(total, request.per_page),
    })
}

/// Row and column counts for every table.
pub fn summarize(conn: &Connection) -> Result<Vec<TableSummary>> {
    let mut summaries = Vec::new();
    for name in list_tables(conn)? {
        let rows = count_rows(conn, &name)?;
        let columns = columns_of(conn, &name)?.len();
        summaries.push(TableSummary {
            name,
            rows,
            columns,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded(rows: u64) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE scorecard_2023_24 AS
             SELECT range AS unitid, 'inst_' || range::VARCHAR AS instnm
             FROM range({})",
            rows
        ))
        .unwrap();
        conn
    }

    fn req(page: u64, per_page: u64) -> PageRequest {
        PageRequest { page, per_page }
    }

    #[test]
    fn page_request_defaults_and_clamps() {
        assert_eq!(
            PageRequest::from_params(None, None, 100, 1000),
            req(1, 100)
        );
        assert_eq!(
            PageRequest::from_params(Some("3"), Some("25"), 100, 1000),
            req(3, 25)
        );
        assert_eq!(
            PageRequest::from_params(Some("2"), Some("5000"), 100, 1000),
            req(2, 1000)
        );
        assert_eq!(
            PageRequest::from_params(Some("abc"), Some("x"), 100, 1000),
            req(1, 100)
        );
        assert_eq!(
            PageRequest::from_params(Some("0"), Some("-5"), 100, 1000),
            req(1, 1)
        );
        assert_eq!(
            PageRequest::from_params(Some("-4"), Some("0"), 100, 1000),
            req(1, 1)
        );
    }

    #[test]
    fn offsets() {
        assert_eq!(req(1, 100).offset(), 0);
        assert_eq!(req(3, 100).offset(), 200);
        assert_eq!(req(u64::MAX, 1000).offset(), i64::MAX as u64);
    }

    #[test]
    fn total_pages_is_ceiling() {
        assert_eq!(total_pages(0, 100), 0);
        assert_eq!(total_pages(1, 100), 1);
        assert_eq!(total_pages(100, 100), 1);
        assert_eq!(total_pages(101, 100), 2);
        assert_eq!(total_pages(250, 100), 3);
    }

    #[test]
    fn lists_and_checks_tables() {
        let conn = seeded(3);
        conn.execute_batch("CREATE TABLE scorecard_2022_23 (a INTEGER)")
            .unwrap();
        let mut tables = list_tables(&conn).unwrap();
        tables.sort();
        assert_eq!(tables, vec!["scorecard_2022_23", "scorecard_2023_24"]);
        assert!(ensure_table(&conn, "scorecard_2023_24").is_ok());
        assert!(matches!(
            ensure_table(&conn, "nope"),
            Err(ExplorerError::TableNotFound(_))
        ));
    }

    #[test]
    fn describes_in_definition_order() {
        let conn = seeded(1);
        let columns = describe_table(&conn, "scorecard_2023_24").unwrap();
        assert_eq!(
            columns,
            vec![
                ColumnInfo {
                    column: "unitid".into(),
                    data_type: "BIGINT".into()
                },
                ColumnInfo {
                    column: "instnm".into(),
                    data_type: "VARCHAR".into()
                },
            ]
        );
        let as_json = serde_json::to_value(&columns[0]).unwrap();
        assert_eq!(as_json, json!({"column": "unitid", "type": "BIGINT"}));
    }

    #[test]
    fn describe_unknown_table() {
        let conn = seeded(1);
        let err = describe_table(&conn, "scorecard_1900_01").unwrap_err();
        assert!(matches!(err, ExplorerError::TableNotFound(_)));
    }

    #[test]
    fn unknown_table_names_are_never_interpolated() {
        let conn = seeded(1);
        let err = fetch_page(&conn, "scorecard_2023_24; DROP TABLE scorecard_2023_24", req(1, 10))
            .unwrap_err();
        assert!(matches!(err, ExplorerError::TableNotFound(_)));
        assert_eq!(count_rows(&conn, "scorecard_2023_24").unwrap(), 1);
    }

    #[test]
    fn first_page_in_stored_order() {
        let conn = seeded(250);
        let page = fetch_page(&conn, "scorecard_2023_24", req(1, 100)).unwrap();
        assert_eq!(page.columns, vec!["unitid", "instnm"]);
        assert_eq!(page.rows.len(), 100);
        assert_eq!(page.rows[0], vec![json!(0), json!("inst_0")]);
        assert_eq!(page.total, 250);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 100);
    }

    #[test]
    fn last_partial_page() {
        let conn = seeded(250);
        let page = fetch_page(&conn, "scorecard_2023_24", req(3, 100)).unwrap();
        assert_eq!(page.rows.len(), 50);
        assert_eq!(page.rows[0][0], json!(200));
    }

    #[test]
    fn page_beyond_range_is_empty() {
        let conn = seeded(250);
        let page = fetch_page(&conn, "scorecard_2023_24", req(9, 100)).unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total, 250);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.columns.len(), 2);
    }

    #[test]
    fn empty_table() {
        let conn = seeded(0);
        let page = fetch_page(&conn, "scorecard_2023_24", req(1, 100)).unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn summaries() {
        let conn = seeded(7);
        let summaries = summarize(&conn).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "scorecard_2023_24");
        assert_eq!(summaries[0].rows, 7);
        assert_eq!(summaries[0].columns, 2);
    }
}
