mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{types::Type, Connection, Row};
use uuid::Uuid;

use crate::models::*;

const DOSE_COLUMNS: &str = "id, amount, timestamp, note";

/// Dose log storage, keyed by user identifier.
///
/// Every operation takes the user explicitly; there is no notion of a
/// current user. Writes are single statements, so concurrent edits to
/// different doses cannot overwrite each other.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened dose database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Dose operations
    // ============================================================

    /// All doses of `user_id`, newest first.
    pub fn list_doses(&self, user_id: &str) -> Result<Vec<Dose>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {DOSE_COLUMNS} FROM doses WHERE user_id = ?
             ORDER BY timestamp DESC, created_at DESC"
        ))?;

        let doses = stmt
            .query_map([user_id], dose_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(doses)
    }

    pub fn get_dose(&self, user_id: &str, id: &str) -> Result<Option<Dose>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {DOSE_COLUMNS} FROM doses WHERE user_id = ? AND id = ?"
        ))?;

        let mut rows = stmt.query([user_id, id])?;
        match rows.next()? {
            Some(row) => Ok(Some(dose_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn create_dose(&self, user_id: &str, input: NewDose) -> Result<Dose> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let dose = Dose {
            id: Uuid::new_v4().to_string(),
            amount: input.amount,
            timestamp: input.timestamp.trunc_subsecs(3),
            note: input.note,
        };

        conn.execute(
            "INSERT INTO doses (id, user_id, amount, timestamp, note, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                &dose.id,
                user_id,
                dose.amount,
                format_instant(&dose.timestamp),
                &dose.note,
                format_instant(&Utc::now()),
            ),
        )?;

        tracing::debug!(user_id, dose_id = %dose.id, amount = dose.amount, "Created dose");
        Ok(dose)
    }

    /// Replace amount, timestamp and note of an existing dose.
    ///
    /// A missing timestamp keeps the stored one. Returns `None` when the dose
    /// does not exist for this user.
    pub fn update_dose(&self, user_id: &str, id: &str, input: ValidDose) -> Result<Option<Dose>> {
        let Some(existing) = self.get_dose(user_id, id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let new = input.or_timestamp(existing.timestamp);
        let dose = Dose {
            id: existing.id,
            amount: new.amount,
            timestamp: new.timestamp.trunc_subsecs(3),
            note: new.note,
        };

        let rows = conn.execute(
            "UPDATE doses SET amount = ?, timestamp = ?, note = ? WHERE user_id = ? AND id = ?",
            (
                dose.amount,
                format_instant(&dose.timestamp),
                &dose.note,
                user_id,
                &dose.id,
            ),
        )?;

        // Deleted between the read and the write.
        if rows == 0 {
            return Ok(None);
        }

        tracing::debug!(user_id, dose_id = %dose.id, "Updated dose");
        Ok(Some(dose))
    }

    /// Rows of `user_id` as stored, in insertion order. Unlike
    /// [`list_doses`](Self::list_doses) this never parses the stored text, so
    /// it still works on rows that would fail to load.
    pub fn stored_doses(&self, user_id: &str) -> Result<Vec<StoredDose>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, amount, timestamp, note, created_at FROM doses WHERE user_id = ?
             ORDER BY created_at, rowid",
        )?;

        let rows = stmt
            .query_map([user_id], |row| {
                Ok(StoredDose {
                    id: row.get(0)?,
                    amount: row.get(1)?,
                    timestamp: row.get(2)?,
                    note: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Returns `false` when there was no such dose.
    pub fn delete_dose(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "DELETE FROM doses WHERE user_id = ? AND id = ?",
            [user_id, id],
        )?;
        Ok(rows > 0)
    }

    /// Remove every dose of `user_id`, returning how many were removed.
    pub fn clear_doses(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM doses WHERE user_id = ?", [user_id])?;
        tracing::info!(user_id, deleted = rows, "Cleared dose log");
        Ok(rows)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// `<data dir>/halflife.db` for this platform.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "halflife")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("halflife.db"))
}

fn dose_from_row(row: &Row) -> rusqlite::Result<Dose> {
    let raw: String = row.get(2)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(Dose {
        id: row.get(0)?,
        amount: row.get(1)?,
        timestamp,
        note: row.get(3)?,
    })
}

/// Fixed-width UTC form, so text order matches time order.
fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
