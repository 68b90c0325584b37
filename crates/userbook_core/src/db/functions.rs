//! Application-defined SQL functions used by user queries.
//!
//! SQLite's `lower()` and `LIKE` only fold ASCII, so search matching is done
//! in Rust where `to_lowercase` covers the full Unicode range.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// SQL name of the case-insensitive substring predicate.
///
/// Signature: `contains_folded(haystack TEXT NULL, folded_needle TEXT) -> INTEGER`.
/// The needle must already be lowercased by the caller; `NULL` haystacks
/// never match.
pub const CONTAINS_FOLDED_FN: &str = "contains_folded";

/// Installs (or replaces) the search helper functions on `conn`.
pub fn install_search_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CONTAINS_FOLDED_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack = ctx.get::<Option<String>>(0)?;
            let needle = ctx.get::<String>(1)?;
            Ok(haystack.is_some_and(|value| contains_folded(&value, &needle)))
        },
    )
}

/// Returns whether `haystack` contains an already-lowercased `needle`,
/// ignoring case.
pub fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    haystack.to_lowercase().contains(folded_needle)
}
