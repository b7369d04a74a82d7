//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the registrar. It uses
//! rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`. Single-statement writes under the
//! connection mutex give readers a consistent snapshot: they observe
//! the pre-write or post-write state, never a half-written row.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use registrar_core::{
    ChainHash, Fingerprint, ProposalId, ProposalRecord, RegistrationEntry, Sha256Hash,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via an internal mutex. All operations run on the
/// blocking thread pool to avoid stalling the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn entry_to_json(entry: &RegistrationEntry) -> Result<String> {
    serde_json::to_string(entry).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn entry_from_json(body: &str) -> Result<RegistrationEntry> {
    serde_json::from_str(body).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn chain_hash_hex(entry: &RegistrationEntry) -> Result<String> {
    entry
        .chain_hash
        .as_ref()
        .map(|h| h.to_hex())
        .ok_or(StoreError::NotChained)
}

#[async_trait]
impl Store for SqliteStore {
    async fn append_entry(&self, entry: &RegistrationEntry) -> Result<()> {
        let key = chain_hash_hex(entry)?;
        let body = entry_to_json(entry)?;
        let prev = entry.prev_chain_hash.to_string();
        let proof_name = entry.proof_name.clone();
        let timestamp = entry.timestamp;
        let fingerprint = entry
            .identity_fingerprint
            .as_ref()
            .map(|fp| fp.as_str().to_string());

        self.with_conn(move |conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT chain_hash FROM entries WHERE chain_hash = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(StoreError::Conflict(key));
            }

            conn.execute(
                "INSERT INTO entries
                    (chain_hash, prev_chain_hash, proof_name, timestamp, identity_fingerprint, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![key, prev, proof_name, timestamp, fingerprint, body],
            )?;
            tracing::debug!(chain_hash = %key, "entry appended");
            Ok(())
        })
        .await
    }

    async fn replace_entry(&self, entry: &RegistrationEntry) -> Result<()> {
        let key = chain_hash_hex(entry)?;
        let body = entry_to_json(entry)?;
        let fingerprint = entry
            .identity_fingerprint
            .as_ref()
            .map(|fp| fp.as_str().to_string());

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE entries SET body = ?1, identity_fingerprint = ?2 WHERE chain_hash = ?3",
                params![body, fingerprint, key],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(key));
            }
            Ok(())
        })
        .await
    }

    async fn load_entries(&self) -> Result<Vec<RegistrationEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT body FROM entries ORDER BY position")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut entries = Vec::new();
            for body in rows {
                entries.push(entry_from_json(&body?)?);
            }
            Ok(entries)
        })
        .await
    }

    async fn entry_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn tip(&self) -> Result<Option<ChainHash>> {
        self.with_conn(|conn| {
            let hex: Option<String> = conn
                .query_row(
                    "SELECT chain_hash FROM entries ORDER BY position DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;

            match hex {
                None => Ok(None),
                Some(hex) => {
                    let hash = Sha256Hash::from_hex(&hex)
                        .map_err(|e| StoreError::InvalidData(e.to_string()))?;
                    Ok(Some(ChainHash::Link(hash)))
                }
            }
        })
        .await
    }

    async fn put_registration(
        &self,
        fingerprint: &Fingerprint,
        entry: &RegistrationEntry,
    ) -> Result<()> {
        let fp = fingerprint.as_str().to_string();
        let body = entry_to_json(entry)?;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO registrations (fingerprint, body, registered_at)
                 VALUES (?1, ?2, ?3)",
                params![fp, body, now_secs()],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_registration(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<RegistrationEntry>> {
        let fp = fingerprint.as_str().to_string();

        self.with_conn(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM registrations WHERE fingerprint = ?1",
                    params![fp],
                    |row| row.get(0),
                )
                .optional()?;

            body.map(|b| entry_from_json(&b)).transpose()
        })
        .await
    }

    async fn list_registrations(&self) -> Result<Vec<(Fingerprint, RegistrationEntry)>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT fingerprint, body FROM registrations ORDER BY fingerprint")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut records = Vec::new();
            for row in rows {
                let (fp, body) = row?;
                records.push((Fingerprint::new(fp), entry_from_json(&body)?));
            }
            Ok(records)
        })
        .await
    }

    async fn put_proposal(&self, record: &ProposalRecord) -> Result<()> {
        let id = record.proposal_id.as_str().to_string();
        let submitted_by = record.submitted_by.as_str().to_string();
        let timestamp = record.timestamp;
        let body =
            serde_json::to_string(record).map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO proposals (proposal_id, submitted_by, timestamp, body)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, submitted_by, timestamp, body],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_proposal(&self, id: &ProposalId) -> Result<Option<ProposalRecord>> {
        let id = id.as_str().to_string();

        self.with_conn(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM proposals WHERE proposal_id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;

            body.map(|b| {
                serde_json::from_str(&b).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
        })
        .await
    }

    async fn list_proposals(&self) -> Result<Vec<ProposalRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT body FROM proposals ORDER BY proposal_id")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut records = Vec::new();
            for body in rows {
                let record = serde_json::from_str(&body?)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                records.push(record);
            }
            Ok(records)
        })
        .await
    }
}

/// Get current time in unix seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}
