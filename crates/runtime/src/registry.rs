//! The programmatic surface: catalog, trust administration, and gated
//! invocation behind one handle.

use policy::{Reason, TrustTier};
use serde::Serialize;
use serde_json::Value;
use storage::{AuditLog, TrustLedger};
use tracing::warn;

use crate::{
    CapabilityDescriptor, Catalog, Error, GatedExecutor, InvocationOutcome, Result, Source,
};

/// One row of [`Registry::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityStatus {
    pub name: String,
    pub source: Source,
    pub destructive: bool,
    pub reason: String,
    pub tier: TrustTier,
}

/// A trust-gated capability registry.
pub struct Registry {
    catalog: Catalog,
    ledger: TrustLedger,
    audit: AuditLog,
}

impl Registry {
    pub fn new(catalog: Catalog, ledger: TrustLedger, audit: AuditLog) -> Self {
        Self {
            catalog,
            ledger,
            audit,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &TrustLedger {
        &self.ledger
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn list_capabilities(&self) -> Vec<&CapabilityDescriptor> {
        self.catalog.list_all().collect()
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.catalog.get(name)
    }

    /// Current tier of `name`; untrusted for anything never promoted.
    pub fn get_tier(&self, name: &str) -> TrustTier {
        self.ledger.get_tier(name)
    }

    /// Every capability with its classification and current tier.
    pub fn status(&self) -> Vec<CapabilityStatus> {
        let state = self.ledger.load();
        self.catalog
            .list_all()
            .map(|d| CapabilityStatus {
                name: d.name.clone(),
                source: d.source,
                destructive: self.catalog.is_destructive(d),
                reason: reason_label(d.reason()),
                tier: state.get(&d.name).map(|r| r.tier).unwrap_or_default(),
            })
            .collect()
    }

    /// Promote every non-destructive, untrusted capability to verified.
    pub fn verify_all_safe(&self) -> Result<usize> {
        let capabilities = self
            .catalog
            .list_all()
            .map(|d| (d.name.as_str(), self.catalog.is_destructive(d)));
        Ok(self.ledger.verify_all_safe(capabilities)?)
    }

    /// Promote one catalog capability to trusted.
    pub fn trust_tool(&self, name: &str) -> Result<()> {
        if !self.catalog.contains(name) {
            return Err(Error::CapabilityNotFound {
                name: name.to_string(),
            });
        }
        self.ledger.trust(name)?;
        Ok(())
    }

    /// Promote every catalog capability, destructive ones included, to
    /// trusted.
    pub fn trust_all(&self) -> Result<usize> {
        let destructive = self
            .catalog
            .list_all()
            .filter(|d| self.catalog.is_destructive(d))
            .count();
        warn!(
            capabilities = self.catalog.len(),
            destructive, "granting trusted to every capability"
        );
        let names = self.catalog.list_all().map(|d| d.name.as_str());
        Ok(self.ledger.trust_all(names)?)
    }

    /// Demote `name`, or everything when `None`, to untrusted.
    ///
    /// Names outside this catalog may be reset too, since the ledger is
    /// shared with processes whose catalogs differ.
    pub fn reset(&self, name: Option<&str>) -> Result<usize> {
        Ok(self.ledger.reset(name)?)
    }

    pub fn executor(&self) -> GatedExecutor<'_> {
        GatedExecutor::new(&self.catalog, &self.ledger, &self.audit)
    }

    pub fn invoke(&self, name: &str, args: &Value) -> Result<Value> {
        self.executor().invoke(name, args)
    }

    pub fn try_invoke(&self, name: &str, args: &Value) -> InvocationOutcome {
        self.executor().try_invoke(name, args)
    }
}

fn reason_label(reason: Reason) -> String {
    match reason {
        Reason::VerbMatch(stem) => format!("verb:{stem}"),
        Reason::KnownDestructive | Reason::KnownSafe => "table".to_string(),
        Reason::Annotated => "declared".to_string(),
        Reason::NoVerbMatch => "no-verb".to_string(),
        Reason::UnannotatedDefault => "conservative".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Capability, HandlerError, RegistrationSource};
    use serde_json::json;
    use storage::Outcome;
    use tempfile::TempDir;

    fn ok(_: &Value) -> std::result::Result<Value, HandlerError> {
        Ok(json!("ok"))
    }

    fn registry(dir: &TempDir) -> Registry {
        let mut builder = Catalog::builder();
        builder
            .register_static([
                Capability::new("fs.read", "Read a file", ok),
                Capability::new("fs.write", "Write a file", ok),
            ])
            .unwrap();
        Registry::new(
            builder.build().unwrap(),
            TrustLedger::open(dir.path().join("trust.json")),
            AuditLog::in_memory().unwrap(),
        )
    }

    #[test]
    fn read_write_scenario() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        let args = json!({});

        assert_eq!(reg.get_tier("fs.read"), TrustTier::Untrusted);
        assert_eq!(reg.get_tier("fs.write"), TrustTier::Untrusted);
        assert!(matches!(
            reg.invoke("fs.read", &args),
            Err(Error::PermissionDenied(_))
        ));

        assert_eq!(reg.verify_all_safe().unwrap(), 1);
        assert_eq!(reg.get_tier("fs.read"), TrustTier::Verified);
        assert_eq!(reg.get_tier("fs.write"), TrustTier::Untrusted);

        assert_eq!(reg.invoke("fs.read", &args).unwrap(), json!("ok"));
        assert!(matches!(
            reg.invoke("fs.write", &args),
            Err(Error::PermissionDenied(_))
        ));

        reg.trust_tool("fs.write").unwrap();
        assert_eq!(reg.get_tier("fs.write"), TrustTier::Trusted);
        assert_eq!(reg.invoke("fs.write", &args).unwrap(), json!("ok"));

        let entries = reg.audit().for_capability("fs.write").unwrap();
        let last = entries.last().unwrap();
        assert_eq!(last.outcome, Outcome::Success);
        assert_eq!(last.tier_at_call, TrustTier::Trusted);
    }

    #[test]
    fn trust_tool_requires_catalog_entry() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        assert!(matches!(
            reg.trust_tool("fs.nope"),
            Err(Error::CapabilityNotFound { .. })
        ));
        assert_eq!(reg.get_tier("fs.nope"), TrustTier::Untrusted);
    }

    #[test]
    fn verify_never_touches_destructive() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        reg.verify_all_safe().unwrap();
        reg.verify_all_safe().unwrap();
        assert_eq!(reg.get_tier("fs.write"), TrustTier::Untrusted);

        reg.trust_tool("fs.write").unwrap();
        reg.verify_all_safe().unwrap();
        assert_eq!(reg.get_tier("fs.write"), TrustTier::Trusted);
    }

    #[test]
    fn trust_all_covers_destructive_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        assert_eq!(reg.trust_all().unwrap(), 2);
        let once = reg.ledger().load();
        assert_eq!(reg.trust_all().unwrap(), 0);
        assert_eq!(reg.ledger().load(), once);
        assert!(reg.status().iter().all(|s| s.tier == TrustTier::Trusted));
    }

    #[test]
    fn reset_demotes() {
        let dir = TempDir::new().unwrap();
        let reg = registry(&dir);
        reg.trust_all().unwrap();
        reg.reset(Some("fs.write")).unwrap();
        assert_eq!(reg.get_tier("fs.write"), TrustTier::Untrusted);
        assert_eq!(reg.get_tier("fs.read"), TrustTier::Trusted);
        reg.reset(None).unwrap();
        assert_eq!(reg.get_tier("fs.read"), TrustTier::Untrusted);
    }

    #[test]
    fn second_process_sees_promotion() {
        let dir = TempDir::new().unwrap();
        let first = registry(&dir);
        let second = registry(&dir);

        assert!(second.try_invoke("fs.write", &json!({})) != InvocationOutcome::Ok(json!("ok")));
        first.trust_tool("fs.write").unwrap();
        assert!(second.try_invoke("fs.write", &json!({})).is_ok());
    }

    #[test]
    fn status_reports_classification() {
        let dir = TempDir::new().unwrap();
        let source = RegistrationSource::new("db").reachable("database.dropTable", ok);
        let mut builder = Catalog::builder();
        builder
            .register_static([Capability::new("fs.read", "", ok)])
            .unwrap()
            .discover_dynamic(&[&source]);
        let reg = Registry::new(
            builder.build().unwrap(),
            TrustLedger::open(dir.path().join("trust.json")),
            AuditLog::in_memory().unwrap(),
        );

        let status = reg.status();
        assert_eq!(status.len(), 2);
        let drop = status.iter().find(|s| s.name == "database.dropTable").unwrap();
        assert!(drop.destructive);
        assert_eq!(drop.source, Source::Discovered);
        assert_eq!(drop.reason, "verb:drop");
        assert_eq!(drop.tier, TrustTier::Untrusted);

        assert_eq!(reg.verify_all_safe().unwrap(), 1);
        assert_eq!(reg.get_tier("database.dropTable"), TrustTier::Untrusted);
    }
}
