//! Toolgate runtime: capability catalog and gated execution.
//!
//! This crate builds the process-local catalog of invocable capabilities and
//! enforces the shared trust ledger immediately before every invocation.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **Capability**: A named handler plus its declared metadata. Static
//!   declarations are registered explicitly when a module loads.
//! - **DiscoverySource**: Anything that can enumerate capabilities at
//!   startup. Marked capabilities keep their metadata; everything else
//!   reachable gets a conservative synthesized descriptor.
//! - **Catalog**: The deduplicated, immutable `name -> descriptor` map.
//!   Static declarations shadow discovered ones.
//! - **GatedExecutor**: Resolves, classifies, checks the ledger, dispatches,
//!   and audits. It never writes the ledger.
//! - **Registry**: One handle over all of the above.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{Capability, Catalog, HandlerError, Registry};
//! use serde_json::{json, Value};
//! use storage::{AuditLog, TrustLedger};
//!
//! fn read(_: &Value) -> Result<Value, HandlerError> {
//!     Ok(json!("contents"))
//! }
//!
//! # fn example() -> runtime::Result<()> {
//! let mut builder = Catalog::builder();
//! builder.register_static([Capability::new("fs.read", "Read a file", read)])?;
//! let registry = Registry::new(
//!     builder.build()?,
//!     TrustLedger::open("trust.json"),
//!     AuditLog::open("audit.db")?,
//! );
//!
//! registry.verify_all_safe()?;
//! let contents = registry.invoke("fs.read", &json!({"path": "README.md"}))?;
//! println!("{contents}");
//! # Ok(())
//! # }
//! ```

mod capability;
mod catalog;
mod discovery;
mod error;
mod executor;
mod registry;

pub use capability::{Capability, CapabilityDescriptor, Handler, HandlerError, Source};
pub use catalog::{Catalog, CatalogBuilder, build_catalog};
pub use discovery::{Candidate, DiscoverySource, RegistrationSource, discover_dynamic};
pub use error::{Error, Result};
pub use executor::{GatedExecutor, InvocationOutcome};
pub use registry::{CapabilityStatus, Registry};
