//! Errors raised while browsing or querying the loaded tables.

/// Failures from the catalog and query layer.
///
/// The HTTP server maps each variant onto a status code; the CLI prints them.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// The requested table is not in the database.
    #[error("Table not found")]
    TableNotFound(String),

    /// The query body was blank.
    #[error("No query provided")]
    EmptyQuery,

    /// The query does not start with `SELECT`.
    #[error("Only SELECT queries are allowed")]
    NotSelect,

    /// DuckDB rejected or failed the statement. The engine message is kept verbatim.
    #[error("{0}")]
    Engine(#[from] duckdb::Error),
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
