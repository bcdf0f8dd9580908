use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// How much latitude the current session has to invoke a capability.
///
/// Tiers are totally ordered: `Untrusted < Verified < Trusted`. A name with
/// no recorded tier is always `Untrusted`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    #[default]
    Untrusted,
    Verified,
    Trusted,
}

impl TrustTier {
    pub const ALL: [TrustTier; 3] = [Self::Untrusted, Self::Verified, Self::Trusted];

    /// The minimum tier needed to invoke a capability.
    pub fn required_for(destructive: bool) -> Self {
        if destructive {
            Self::Trusted
        } else {
            Self::Verified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untrusted => "untrusted",
            Self::Verified => "verified",
            Self::Trusted => "trusted",
        }
    }

    /// Whether this tier permits invoking a capability of the given kind.
    pub fn permits(&self, destructive: bool) -> bool {
        *self >= Self::required_for(destructive)
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "untrusted" => Ok(Self::Untrusted),
            "verified" => Ok(Self::Verified),
            "trusted" => Ok(Self::Trusted),
            other => Err(Error::InvalidTier(other.to_string())),
        }
    }
}
