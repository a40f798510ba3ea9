//! FTS5 full-text search with BM25 ranking.
//!
//! Search runs against the `tasks_fts` external-content table defined in
//! [`super::schema`], which triggers keep in sync with `tasks`.
//!
//! # Column Weights (BM25)
//!
//! | Column      | Weight |
//! |-------------|--------|
//! | title       | 3.0    |
//! | description | 2.0    |
//!
//! # Tokenizer
//!
//! Porter stemmer + `unicode61` with prefix indexes on 2 and 3 characters, so
//! "running" matches "run" and `deploy*` matches "deployment".

use anyhow::{Context, Result};
use rusqlite::{Connection, ErrorCode, params};
use tracing::warn;

/// Default BM25 column weights: title=3, description=2.
pub const BM25_WEIGHT_TITLE: f64 = 3.0;
pub const BM25_WEIGHT_DESCRIPTION: f64 = 2.0;

/// A single ranked match. Lower `rank` is a better match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub task_id: i64,
    pub rank: f64,
}

/// Search the FTS5 index, best match first, ties broken by task id.
///
/// A query FTS5 cannot parse (unbalanced quotes, a bare operator, an unknown
/// column filter) yields no hits rather than an error.
///
/// # Errors
///
/// Returns an error if the statement cannot be prepared or a row cannot be
/// read for reasons other than query syntax.
pub fn search_bm25(conn: &Connection, query: &str) -> Result<Vec<SearchHit>> {
    match run_match(conn, query) {
        Ok(hits) => Ok(hits),
        Err(err) if is_query_syntax_error(&err) => {
            warn!(query, error = %err, "unparsable full-text query");
            Ok(Vec::new())
        }
        Err(err) => Err(err).with_context(|| format!("execute FTS5 search for '{query}'")),
    }
}

fn run_match(conn: &Connection, query: &str) -> rusqlite::Result<Vec<SearchHit>> {
    let mut stmt = conn.prepare_cached(
        "SELECT f.rowid, bm25(tasks_fts, ?1, ?2) AS rank \
         FROM tasks_fts f \
         WHERE tasks_fts MATCH ?3 \
         ORDER BY rank, f.rowid",
    )?;

    let rows = stmt.query_map(
        params![BM25_WEIGHT_TITLE, BM25_WEIGHT_DESCRIPTION, query],
        |row| {
            Ok(SearchHit {
                task_id: row.get(0)?,
                rank: row.get(1)?,
            })
        },
    )?;
    rows.collect()
}

fn is_query_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::Unknown
                && message.as_deref().is_some_and(|msg| {
                    msg.starts_with("fts5:")
                        || msg.contains("syntax error")
                        || msg.starts_with("no such column")
                        || msg.starts_with("unknown special query")
                        || msg.starts_with("unterminated string")
                })
        }
        _ => false,
    }
}
