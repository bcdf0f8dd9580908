//! Durable per-capability trust ledger.
//!
//! The ledger is a single JSON document shared by every process that points
//! at the same path. Each public operation re-reads the file, so a promotion
//! written by one process is visible to the next check in another. Writes go
//! to a temporary file in the same directory which is then renamed over the
//! original; readers see either the old document or the new one, never a
//! partial write. Concurrent writers are last-writer-wins.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use policy::TrustTier;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::{Error, Result};

/// The trust tier recorded for one capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustRecord {
    pub tier: TrustTier,
    pub updated_at: DateTime<Utc>,
}

/// Full ledger contents, keyed by capability name.
pub type LedgerState = BTreeMap<String, TrustRecord>;

/// File-backed trust ledger.
#[derive(Debug, Clone)]
pub struct TrustLedger {
    path: PathBuf,
}

impl TrustLedger {
    /// Use the ledger document at `path`. The file need not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current ledger.
    ///
    /// A missing file is an empty ledger. An unreadable or malformed file is
    /// logged and also treated as empty, so every capability falls back to
    /// untrusted.
    pub fn load(&self) -> LedgerState {
        match self.read() {
            Ok(state) => state,
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "trust ledger unreadable, treating every capability as untrusted"
                );
                LedgerState::new()
            }
        }
    }

    /// Atomically replace the ledger document with `state`.
    pub fn save(&self, state: &LedgerState) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, state)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;

        debug!(path = %self.path.display(), records = state.len(), "trust ledger saved");
        Ok(())
    }

    /// Current tier for `name`; untrusted when unrecorded.
    pub fn get_tier(&self, name: &str) -> TrustTier {
        tier_of(&self.load(), name)
    }

    /// Promote every non-destructive, untrusted capability to verified.
    ///
    /// Destructive capabilities are never touched. Returns how many were
    /// promoted.
    pub fn verify_all_safe<'a>(
        &self,
        capabilities: impl IntoIterator<Item = (&'a str, bool)>,
    ) -> Result<usize> {
        let promoted = self.mutate(|state, now| {
            let mut promoted = 0;
            for (name, destructive) in capabilities {
                if destructive || tier_of(state, name) != TrustTier::Untrusted {
                    continue;
                }
                if set_tier(state, name, TrustTier::Verified, now) {
                    promoted += 1;
                }
            }
            promoted
        })?;
        info!(promoted, "verified non-destructive capabilities");
        Ok(promoted)
    }

    /// Promote one capability straight to trusted, from any tier.
    ///
    /// Returns `false` when it was already trusted.
    pub fn trust(&self, name: &str) -> Result<bool> {
        let changed = self.mutate(|state, now| {
            set_tier(state, name, TrustTier::Trusted, now) as usize
        })?;
        if changed > 0 {
            info!(capability = name, "capability trusted");
        } else {
            debug!(capability = name, "capability already trusted");
        }
        Ok(changed > 0)
    }

    /// Promote every named capability to trusted. Returns how many changed.
    pub fn trust_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<usize> {
        let promoted = self.mutate(|state, now| {
            names
                .into_iter()
                .filter(|name| set_tier(state, name, TrustTier::Trusted, now))
                .count()
        })?;
        info!(promoted, "trusted all capabilities");
        Ok(promoted)
    }

    /// Demote one capability, or every capability when `name` is `None`,
    /// back to untrusted. Returns how many records were removed.
    pub fn reset(&self, name: Option<&str>) -> Result<usize> {
        let removed = self.mutate(|state, _| match name {
            Some(name) => state.remove(name).is_some() as usize,
            None => {
                let n = state.len();
                state.clear();
                n
            }
        })?;
        info!(capability = name.unwrap_or("*"), removed, "trust reset");
        Ok(removed)
    }

    fn read(&self) -> Result<LedgerState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no trust ledger yet");
                return Ok(LedgerState::new());
            }
            Err(e) => return Err(self.corrupt(e)),
        };
        serde_json::from_str(&content).map_err(|e| self.corrupt(e))
    }

    /// Load, apply `f`, and save when `f` reports a change.
    fn mutate<F>(&self, f: F) -> Result<usize>
    where
        F: FnOnce(&mut LedgerState, DateTime<Utc>) -> usize,
    {
        let mut state = match self.read() {
            Ok(state) => state,
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "trust ledger unreadable, starting from an empty ledger"
                );
                self.quarantine();
                LedgerState::new()
            }
        };

        let changed = f(&mut state, Utc::now());
        if changed > 0 {
            self.save(&state)?;
        }
        Ok(changed)
    }

    /// Move a corrupt ledger aside so the next save does not destroy it.
    ///
    /// The first copy goes to `<path>.corrupt`. Later ones get a timestamp
    /// suffix so earlier evidence is never overwritten.
    fn quarantine(&self) {
        let aside = self.quarantine_path();
        match fs::rename(&self.path, &aside) {
            Ok(()) => error!(path = %aside.display(), "corrupt trust ledger moved aside"),
            Err(e) => debug!(error = %e, "could not move corrupt trust ledger aside"),
        }
    }

    fn quarantine_path(&self) -> PathBuf {
        let mut aside = self.path.clone().into_os_string();
        aside.push(".corrupt");
        let first = PathBuf::from(&aside);
        if !first.exists() {
            return first;
        }
        aside.push(format!(".{}", Utc::now().format("%Y%m%dT%H%M%S%.9fZ")));
        PathBuf::from(aside)
    }

    fn corrupt(&self, reason: impl ToString) -> Error {
        Error::LedgerCorrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

fn tier_of(state: &LedgerState, name: &str) -> TrustTier {
    state.get(name).map(|r| r.tier).unwrap_or_default()
}

fn set_tier(state: &mut LedgerState, name: &str, tier: TrustTier, now: DateTime<Utc>) -> bool {
    if state.get(name).is_some_and(|r| r.tier == tier) {
        return false;
    }
    state.insert(
        name.to_string(),
        TrustRecord {
            tier,
            updated_at: now,
        },
    );
    true
}
