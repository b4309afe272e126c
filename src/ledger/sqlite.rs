/*!
 * Primary SQLite store for the completion ledger.
 *
 * The connection is opened per operation and dropped immediately, so no
 * long-held lock blocks other processes reading the same project
 * directory.
 */

use std::path::Path;

use rusqlite::{Connection, params};

use crate::errors::LedgerError;
use crate::ledger::TranslationRecord;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS translations (
    filename TEXT PRIMARY KEY,
    source_lang TEXT NOT NULL,
    target_lang TEXT NOT NULL,
    status TEXT NOT NULL,
    timestamp TEXT NOT NULL
)";

fn open(path: &Path) -> Result<Connection, LedgerError> {
    let conn = Connection::open(path)
        .map_err(|e| LedgerError::PrimaryUnavailable(e.to_string()))?;
    conn.execute(SCHEMA, [])
        .map_err(|e| LedgerError::PrimaryUnavailable(e.to_string()))?;
    Ok(conn)
}

/// Upsert one record, keyed by filename
pub fn record(path: &Path, rec: &TranslationRecord) -> Result<(), LedgerError> {
    let conn = open(path)?;
    conn.execute(
        "INSERT OR REPLACE INTO translations (filename, source_lang, target_lang, status, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            rec.filename,
            rec.source_lang,
            rec.target_lang,
            rec.status,
            rec.timestamp
        ],
    )
    .map_err(|e| LedgerError::PrimaryUnavailable(e.to_string()))?;
    Ok(())
}

/// Whether a record exists for the filename
pub fn contains(path: &Path, filename: &str) -> Result<bool, LedgerError> {
    let conn = open(path)?;
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM translations WHERE filename = ?1",
            params![filename],
            |row| row.get(0),
        )
        .map_err(|e| LedgerError::PrimaryUnavailable(e.to_string()))?;
    Ok(count > 0)
}

/// All records, ordered by filename
pub fn list(path: &Path) -> Result<Vec<TranslationRecord>, LedgerError> {
    let conn = open(path)?;
    let mut stmt = conn
        .prepare(
            "SELECT filename, source_lang, target_lang, status, timestamp
             FROM translations ORDER BY filename",
        )
        .map_err(|e| LedgerError::PrimaryUnavailable(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(TranslationRecord {
                filename: row.get(0)?,
                source_lang: row.get(1)?,
                target_lang: row.get(2)?,
                status: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })
        .map_err(|e| LedgerError::PrimaryUnavailable(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(|e| LedgerError::PrimaryUnavailable(e.to_string()))?);
    }
    Ok(records)
}
