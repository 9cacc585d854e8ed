//! Table naming for year-stamped Scorecard files.
//!
//! `MERGED2023_24_PP.csv` carries the academic-year token `2023_24`, which
//! becomes the table `scorecard_2023_24`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix shared by every loaded table.
pub const TABLE_PREFIX: &str = "scorecard_";

static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"MERGED(\d{4}_\d{2})_PP\.csv").expect("valid year pattern"));

/// Returns the `<yyyy>_<yy>` token embedded in a file name, if any.
pub fn extract_year(file_name: &str) -> Option<&str> {
    YEAR_TOKEN
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Maps a file name to its target table, or `None` if the name has no year token.
pub fn table_name_for(file_name: &str) -> Option<String> {
    extract_year(file_name).map(|year| format!("{}{}", TABLE_PREFIX, year))
}
