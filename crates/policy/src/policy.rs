//! Authorization decisions.

use std::fmt;

use crate::TrustTier;

/// The promotion that would unblock a denied invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remediation {
    /// Promote every non-destructive capability to verified.
    VerifyAllSafe,
    /// Promote this one capability to trusted.
    TrustTool(String),
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VerifyAllSafe => f.write_str("verify_all_safe() (`toolgate verify`)"),
            Self::TrustTool(name) => {
                write!(f, "trust_tool(\"{name}\") (`toolgate trust {name}`)")
            }
        }
    }
}

/// Why an invocation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub capability: String,
    pub current: TrustTier,
    pub required: TrustTier,
    pub remediation: Remediation,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' requires {} but is {}; run {}",
            self.capability, self.required, self.current, self.remediation
        )
    }
}

/// Result of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Check whether a capability at `current` tier may be invoked.
///
/// Destructive capabilities need [`TrustTier::Trusted`]; everything else
/// needs at least [`TrustTier::Verified`].
pub fn authorize(capability: &str, destructive: bool, current: TrustTier) -> Decision {
    let required = TrustTier::required_for(destructive);
    if current >= required {
        return Decision::Allow;
    }

    let remediation = if destructive {
        Remediation::TrustTool(capability.to_string())
    } else {
        Remediation::VerifyAllSafe
    };

    Decision::Deny(Denial {
        capability: capability.to_string(),
        current,
        required,
        remediation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destructive_allowed_only_when_trusted() {
        assert!(!authorize("fs.write", true, TrustTier::Untrusted).is_allowed());
        assert!(!authorize("fs.write", true, TrustTier::Verified).is_allowed());
        assert!(authorize("fs.write", true, TrustTier::Trusted).is_allowed());
    }

    #[test]
    fn safe_allowed_from_verified() {
        assert!(!authorize("fs.read", false, TrustTier::Untrusted).is_allowed());
        assert!(authorize("fs.read", false, TrustTier::Verified).is_allowed());
        assert!(authorize("fs.read", false, TrustTier::Trusted).is_allowed());
    }

    #[test]
    fn denial_names_remediation() {
        let Decision::Deny(denial) = authorize("fs.write", true, TrustTier::Verified) else {
            panic!("expected denial");
        };
        assert_eq!(denial.required, TrustTier::Trusted);
        assert_eq!(denial.current, TrustTier::Verified);
        assert_eq!(denial.remediation, Remediation::TrustTool("fs.write".into()));
        assert!(denial.to_string().contains("trust_tool(\"fs.write\")"));

        let Decision::Deny(denial) = authorize("fs.read", false, TrustTier::Untrusted) else {
            panic!("expected denial");
        };
        assert_eq!(denial.remediation, Remediation::VerifyAllSafe);
        assert!(denial.to_string().contains("verify_all_safe()"));
    }
}
