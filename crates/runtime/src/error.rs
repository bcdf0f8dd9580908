use policy::{Denial, TrustTier};
use thiserror::Error;

use crate::HandlerError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("capability not found: {name}")]
    CapabilityNotFound { name: String },

    #[error("permission denied: {0}")]
    PermissionDenied(Denial),

    #[error("capability '{name}' failed (tier {tier}): {source}")]
    HandlerExecution {
        name: String,
        tier: TrustTier,
        source: HandlerError,
    },

    #[error("capability '{name}' declared more than once")]
    DuplicateStatic { name: String },

    #[error(transparent)]
    Storage(#[from] storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
