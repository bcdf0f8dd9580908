//! The enforcement point every invocation passes through.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use policy::{Decision, Denial, TrustTier, authorize};
use serde_json::Value;
use storage::{AuditEntry, AuditLog, TrustLedger};
use tracing::{debug, error, warn};

use crate::{Catalog, Error, HandlerError, Result};

/// How a gated invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    /// The handler ran and returned a value.
    Ok(Value),
    /// Refused before dispatch; the handler never ran.
    Denied(Denial),
    /// No capability with this name is in the catalog.
    NotFound(String),
    /// The handler ran and failed.
    Failed {
        name: String,
        tier: TrustTier,
        error: HandlerError,
    },
}

impl InvocationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, InvocationOutcome::Ok(_))
    }

    pub fn into_result(self) -> Result<Value> {
        match self {
            InvocationOutcome::Ok(value) => Ok(value),
            InvocationOutcome::Denied(denial) => Err(Error::PermissionDenied(denial)),
            InvocationOutcome::NotFound(name) => Err(Error::CapabilityNotFound { name }),
            InvocationOutcome::Failed { name, tier, error } => Err(Error::HandlerExecution {
                name,
                tier,
                source: error,
            }),
        }
    }
}

/// Authorizes and dispatches invocations against a catalog and ledger.
///
/// The ledger is read on every call and never written, so a successful
/// invocation cannot widen future trust.
pub struct GatedExecutor<'a> {
    catalog: &'a Catalog,
    ledger: &'a TrustLedger,
    audit: &'a AuditLog,
}

impl<'a> GatedExecutor<'a> {
    pub fn new(catalog: &'a Catalog, ledger: &'a TrustLedger, audit: &'a AuditLog) -> Self {
        Self {
            catalog,
            ledger,
            audit,
        }
    }

    /// Invoke `name`, returning the handler's value or an error.
    pub fn invoke(&self, name: &str, args: &Value) -> Result<Value> {
        self.try_invoke(name, args).into_result()
    }

    /// Invoke `name`, reporting every outcome as a value.
    pub fn try_invoke(&self, name: &str, args: &Value) -> InvocationOutcome {
        let Some(descriptor) = self.catalog.get(name) else {
            warn!(capability = name, "invocation of unknown capability");
            return InvocationOutcome::NotFound(name.to_string());
        };

        let destructive = self.catalog.is_destructive(descriptor);
        let tier = self.ledger.get_tier(name);

        if let Decision::Deny(denial) = authorize(name, destructive, tier) {
            warn!(
                capability = name,
                current = %tier,
                required = %denial.required,
                "invocation denied"
            );
            self.record(AuditEntry::denied(name, tier, denial.required));
            return InvocationOutcome::Denied(denial);
        }

        debug!(capability = name, %tier, destructive, "dispatching");
        let result = panic::catch_unwind(AssertUnwindSafe(|| descriptor.call(args)))
            .unwrap_or_else(|payload| {
                error!(capability = name, "capability handler panicked");
                Err(HandlerError::Execution(format!(
                    "handler panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        match result {
            Ok(value) => {
                self.record(AuditEntry::success(name, tier));
                InvocationOutcome::Ok(value)
            }
            Err(e) => {
                warn!(capability = name, error = %e, "capability failed");
                self.record(AuditEntry::failure(name, tier, e.to_string()));
                InvocationOutcome::Failed {
                    name: name.to_string(),
                    tier,
                    error: e,
                }
            }
        }
    }

    fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.append(&entry) {
            error!(
                capability = %entry.capability,
                outcome = entry.outcome.name(),
                error = %e,
                "failed to write audit entry"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
