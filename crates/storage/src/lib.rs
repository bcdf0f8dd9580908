//! Durable state for toolgate: the trust ledger and the audit log.
//!
//! This crate owns everything that outlives a single process. The capability
//! catalog is rebuilt at every start, but the trust tiers granted to those
//! capabilities and the record of every gated invocation persist here.
//!
//! # Overview
//!
//! The storage layer holds two independent stores:
//!
//! 1. **Trust Ledger** - A JSON document mapping capability names to their
//!    trust tier. Several processes may share one ledger file; each public
//!    operation reloads it, and writes replace it atomically.
//!
//! 2. **Audit Log** - An append-only SQLite table recording every gated
//!    invocation, whether it succeeded, failed, or was denied.
//!
//! # Core Concepts
//!
//! ## TrustLedger
//!
//! The [`TrustLedger`] owns only a path. It never caches state between
//! calls, so a promotion written by another process is visible on the next
//! query. A missing file is an empty ledger. A corrupt file is logged and
//! also read as empty, which leaves every capability untrusted.
//!
//! ## AuditLog
//!
//! The [`AuditLog`] wraps a SQLite database. Each [`AuditEntry`] records the
//! capability, the trust tier at call time, and an [`Outcome`].
//!
//! # Example
//!
//! ```no_run
//! use policy::TrustTier;
//! use storage::{AuditEntry, AuditLog, TrustLedger};
//!
//! let ledger = TrustLedger::open("trust.json");
//! ledger.verify_all_safe([("fs.read", false), ("fs.write", true)])?;
//! assert_eq!(ledger.get_tier("fs.read"), TrustTier::Verified);
//! assert_eq!(ledger.get_tier("fs.write"), TrustTier::Untrusted);
//!
//! let audit = AuditLog::open("audit.db")?;
//! audit.append(&AuditEntry::success("fs.read", TrustTier::Verified))?;
//! for entry in audit.recent(10)? {
//!     println!("{}: {} {}", entry.timestamp, entry.capability, entry.outcome.name());
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod audit;
mod error;
mod ledger;
mod store;

pub use audit::{AuditEntry, Outcome};
pub use error::{Error, Result};
pub use ledger::{LedgerState, TrustLedger, TrustRecord};
pub use store::AuditLog;
