//! Audit entry types for the invocation trail.

use chrono::{DateTime, Utc};
use policy::TrustTier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a gated invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The handler ran and returned a value.
    Success,
    /// The handler ran and failed.
    Failure { error: String },
    /// The invocation was refused before dispatch.
    Denied { required: TrustTier },
}

impl Outcome {
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure { .. } => "failure",
            Outcome::Denied { .. } => "denied",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// One record in the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub capability: String,
    pub tier_at_call: TrustTier,
    pub outcome: Outcome,
}

impl AuditEntry {
    pub fn new(capability: impl Into<String>, tier_at_call: TrustTier, outcome: Outcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            capability: capability.into(),
            tier_at_call,
            outcome,
        }
    }

    pub fn success(capability: impl Into<String>, tier_at_call: TrustTier) -> Self {
        Self::new(capability, tier_at_call, Outcome::Success)
    }

    pub fn failure(
        capability: impl Into<String>,
        tier_at_call: TrustTier,
        error: impl Into<String>,
    ) -> Self {
        Self::new(
            capability,
            tier_at_call,
            Outcome::Failure {
                error: error.into(),
            },
        )
    }

    pub fn denied(
        capability: impl Into<String>,
        tier_at_call: TrustTier,
        required: TrustTier,
    ) -> Self {
        Self::new(capability, tier_at_call, Outcome::Denied { required })
    }
}
