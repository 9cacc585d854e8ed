//! # Scorecard Explorer
//!
//! Loads the yearly College Scorecard CSV files into a DuckDB database and
//! serves them through a small JSON HTTP API for browsing tables, inspecting
//! schemas, paging through rows, and running read-only queries.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ MERGED<yyyy>_<yy>_PP │──▶│    Loader    │──▶│    DuckDB    │
//! │      .csv files      │   │ read_csv_auto│   │  data.duckdb │
//! └──────────────────────┘   └──────────────┘   └──────┬───────┘
//!                                                      │ read-only
//!                                  ┌───────────────────┤
//!                                  ▼                   ▼
//!                             ┌──────────┐       ┌──────────┐
//!                             │   CLI    │       │   HTTP   │
//!                             │(scorecard│       │   API    │
//!                             └──────────┘       └──────────┘
//! ```
//!
//! The loader and the API never share a process; they are coupled only
//! through the database file.
//!
//! ## Quick Start
//!
//! ```bash
//! scorecard load                 # one table per MERGED file
//! scorecard stats                # row and column counts
//! scorecard query "SELECT COUNT(*) FROM scorecard_2023_24"
//! scorecard serve                # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connections and SQL quoting |
//! | [`naming`] | File name to table name mapping |
//! | [`loader`] | CSV discovery and bulk loading |
//! | [`catalog`] | Table listing, schemas, pagination |
//! | [`query`] | Gated ad-hoc `SELECT` execution |
//! | [`values`] | DuckDB cell to JSON conversion |
//! | [`server`] | HTTP API |
//! | [`stats`] | CLI reporting |
//! | [`error`] | Catalog and query errors |

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod naming;
pub mod query;
pub mod server;
pub mod stats;
pub mod values;
