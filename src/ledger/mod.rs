/*!
 * Completion ledger: durable record of which files have been translated.
 *
 * The primary store is a small SQLite database in the project's state
 * directory. When it cannot be used, operations transparently fall back
 * to a JSON sidecar next to it. The fallback is best-effort: it may
 * diverge from the primary store and is never merged back.
 *
 * A file only counts as translated when both a ledger record exists and
 * the expected output artifact is still on disk.
 */

mod sidecar;
mod sqlite;

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;
use crate::file_utils::FileManager;

/// Directory under the project root holding ledger state
const STATE_DIR: &str = ".chaptrans";
/// Primary store file name
const DB_FILE: &str = "translations.db";
/// Sidecar fallback file name
const SIDECAR_FILE: &str = "translations.json";

/// One persisted translation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Source file name, the record key
    pub filename: String,
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
    /// Record status, currently always "translated"
    pub status: String,
    /// RFC 3339 timestamp of the last write
    pub timestamp: String,
}

/// Completion ledger for one project directory
#[derive(Debug)]
pub struct Ledger {
    db_path: PathBuf,
    sidecar_path: PathBuf,
}

impl Ledger {
    /// Open the ledger for a project directory, creating the state
    /// directory if needed. No database connection is held.
    pub fn open(project_dir: &Path) -> Result<Self, LedgerError> {
        let state_dir = project_dir.join(STATE_DIR);
        FileManager::ensure_dir(&state_dir)
            .map_err(|e| LedgerError::PrimaryUnavailable(e.to_string()))?;

        Ok(Self {
            db_path: state_dir.join(DB_FILE),
            sidecar_path: state_dir.join(SIDECAR_FILE),
        })
    }

    /// Record a successful translation. Recording the same filename
    /// again overwrites the previous record.
    pub fn record(
        &self,
        filename: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<(), LedgerError> {
        let rec = TranslationRecord {
            filename: filename.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            status: "translated".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };

        match sqlite::record(&self.db_path, &rec) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Primary ledger store unavailable, using sidecar: {}", e);
                sidecar::record(&self.sidecar_path, &rec)
            }
        }
    }

    /// Whether the file is translated: a ledger record must exist AND
    /// the output artifact must still be on disk.
    pub fn is_translated(&self, filename: &str, output_path: &Path) -> bool {
        if !FileManager::file_exists(output_path) {
            return false;
        }

        match sqlite::contains(&self.db_path, filename) {
            Ok(found) => found,
            Err(e) => {
                warn!("Primary ledger store unavailable, using sidecar: {}", e);
                sidecar::contains(&self.sidecar_path, filename).unwrap_or(false)
            }
        }
    }

    /// All records, ordered by filename
    pub fn list_all(&self) -> Result<Vec<TranslationRecord>, LedgerError> {
        match sqlite::list(&self.db_path) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!("Primary ledger store unavailable, using sidecar: {}", e);
                sidecar::list(&self.sidecar_path)
            }
        }
    }
}
