//! SQLite audit log implementation.

use crate::{AuditEntry, Result};
use rusqlite::{Connection, params};
use std::path::Path;

/// SQLite-backed, append-only audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open or create an audit log at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let log = Self { conn };
        log.init_schema()?;
        Ok(log)
    }

    /// Create an in-memory audit log (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let log = Self { conn };
        log.init_schema()?;
        Ok(log)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS audit (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                timestamp TEXT NOT NULL,
                capability TEXT NOT NULL,
                tier TEXT NOT NULL,
                outcome TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_audit_capability
                ON audit(capability, timestamp);
            "#,
        )?;
        Ok(())
    }

    /// Append an entry to the log.
    pub fn append(&self, entry: &AuditEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO audit (id, timestamp, capability, tier, outcome, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id.to_string(),
                entry.timestamp.to_rfc3339(),
                entry.capability,
                entry.tier_at_call.as_str(),
                entry.outcome.name(),
                serde_json::to_string(&entry.outcome)?,
            ],
        )?;
        Ok(())
    }

    /// The most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, capability, tier, data FROM
               (SELECT * FROM audit ORDER BY seq DESC LIMIT ?1)
             ORDER BY seq",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], read_row)?;
        Ok(rows.filter_map(|r| r.ok()).filter_map(decode).collect())
    }

    /// All entries for one capability, oldest first.
    pub fn for_capability(&self, capability: &str) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, capability, tier, data FROM audit
             WHERE capability = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map([capability], read_row)?;
        Ok(rows.filter_map(|r| r.ok()).filter_map(decode).collect())
    }

    /// Total number of entries.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM audit", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }
}

type Row = (String, String, String, String, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode((id, timestamp, capability, tier, data): Row) -> Option<AuditEntry> {
    Some(AuditEntry {
        id: id.parse().ok()?,
        timestamp: timestamp.parse().ok()?,
        capability,
        tier_at_call: tier.parse().ok()?,
        outcome: serde_json::from_str(&data).ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;
    use policy::TrustTier;

    #[test]
    fn append_and_query_by_capability() {
        let log = AuditLog::in_memory().unwrap();
        log.append(&AuditEntry::success("fs.read", TrustTier::Verified))
            .unwrap();
        log.append(&AuditEntry::denied(
            "fs.write",
            TrustTier::Untrusted,
            TrustTier::Trusted,
        ))
        .unwrap();
        log.append(&AuditEntry::failure("fs.read", TrustTier::Verified, "boom"))
            .unwrap();

        let entries = log.for_capability("fs.read").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].outcome.is_success());
        assert_eq!(
            entries[1].outcome,
            Outcome::Failure {
                error: "boom".into()
            }
        );
        assert_eq!(entries[1].tier_at_call, TrustTier::Verified);
        assert_eq!(log.count().unwrap(), 3);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let log = AuditLog::in_memory().unwrap();
        for name in ["a", "b", "c", "d"] {
            log.append(&AuditEntry::success(name, TrustTier::Trusted))
                .unwrap();
        }
        let names: Vec<_> = log
            .recent(2)
            .unwrap()
            .into_iter()
            .map(|e| e.capability)
            .collect();
        assert_eq!(names, vec!["c", "d"]);
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs/audit.db");
        let entry = AuditEntry::denied("fs.write", TrustTier::Verified, TrustTier::Trusted);
        AuditLog::open(&path).unwrap().append(&entry).unwrap();

        let reopened = AuditLog::open(&path).unwrap();
        let entries = reopened.recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, entry.id);
        assert_eq!(entries[0].outcome, entry.outcome);
    }
}
