/*!
 * JSON sidecar fallback for the completion ledger.
 *
 * Best-effort replacement used when the SQLite store cannot be opened.
 * The sidecar may diverge from the primary store; it is never merged
 * back.
 */

use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::LedgerError;
use crate::file_utils::FileManager;
use crate::ledger::TranslationRecord;

type RecordMap = BTreeMap<String, TranslationRecord>;

fn load(path: &Path) -> Result<RecordMap, LedgerError> {
    if !FileManager::file_exists(path) {
        return Ok(RecordMap::new());
    }
    let text = FileManager::read_to_string(path)
        .map_err(|e| LedgerError::FallbackFailed(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| LedgerError::FallbackFailed(e.to_string()))
}

fn store(path: &Path, records: &RecordMap) -> Result<(), LedgerError> {
    let text = serde_json::to_string_pretty(records)
        .map_err(|e| LedgerError::FallbackFailed(e.to_string()))?;
    FileManager::write_atomic(path, &text)
        .map_err(|e| LedgerError::FallbackFailed(e.to_string()))
}

/// Upsert one record, keyed by filename
pub fn record(path: &Path, rec: &TranslationRecord) -> Result<(), LedgerError> {
    let mut records = load(path)?;
    records.insert(rec.filename.clone(), rec.clone());
    store(path, &records)
}

/// Whether a record exists for the filename
pub fn contains(path: &Path, filename: &str) -> Result<bool, LedgerError> {
    Ok(load(path)?.contains_key(filename))
}

/// All records, ordered by filename
pub fn list(path: &Path) -> Result<Vec<TranslationRecord>, LedgerError> {
    Ok(load(path)?.into_values().collect())
}
