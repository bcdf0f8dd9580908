//! Trust-gated capability policy.
//!
//! Core principle: **nothing runs without an explicit trust tier.** Unknown
//! capabilities are untrusted, untrusted capabilities never run, and
//! destructive capabilities need the highest tier.

mod classify;
mod error;
mod policy;
mod tier;

pub use classify::{Classification, Classifier, Provenance, Reason, destructive_verb, tokenize};
pub use error::{Error, Result};
pub use policy::{Decision, Denial, Remediation, authorize};
pub use tier::TrustTier;
