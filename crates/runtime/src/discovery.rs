//! Dynamic capability discovery.
//!
//! A [`DiscoverySource`] enumerates candidates from loaded code. How it does
//! so (a registration call at module load, a manifest, a plugin host) is up
//! to the source. Discovery runs two ordered passes over all sources:
//!
//! 1. candidates explicitly marked exposable, with their declared metadata;
//! 2. every other reachable callable, synthesized into a conservative
//!    descriptor.
//!
//! A pass-1 result always beats a pass-2 result with the same name.

use std::collections::BTreeMap;
use std::sync::Arc;

use policy::{Classifier, Provenance};
use tracing::{debug, warn};

use crate::capability::{Capability, CapabilityDescriptor, Handler, Source};

/// One thing a source found.
#[derive(Clone)]
pub enum Candidate {
    /// Explicitly marked for exposure, with declared metadata.
    Exposed(Capability),
    /// A reachable public callable with no annotation.
    Reachable {
        name: String,
        handler: Arc<dyn Handler>,
    },
}

impl Candidate {
    pub fn name(&self) -> &str {
        match self {
            Candidate::Exposed(cap) => &cap.name,
            Candidate::Reachable { name, .. } => name,
        }
    }
}

/// A pluggable origin of discovered capabilities.
pub trait DiscoverySource {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn enumerate(&self) -> Vec<Candidate>;
}

/// A source populated by explicit registration calls when a module loads.
#[derive(Clone)]
pub struct RegistrationSource {
    name: String,
    candidates: Vec<Candidate>,
}

impl RegistrationSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
        }
    }

    /// Mark a capability as exposable.
    pub fn expose(mut self, capability: Capability) -> Self {
        self.candidates.push(Candidate::Exposed(capability));
        self
    }

    /// Register an unannotated callable.
    pub fn reachable(mut self, name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.candidates.push(Candidate::Reachable {
            name: name.into(),
            handler: Arc::new(handler),
        });
        self
    }
}

impl DiscoverySource for RegistrationSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn enumerate(&self) -> Vec<Candidate> {
        self.candidates.clone()
    }
}

/// Run both discovery passes over `sources`, in order.
///
/// When two sources produce the same name within one pass, the first
/// source's descriptor is kept and the more restrictive classification wins.
pub fn discover_dynamic(
    sources: &[&dyn DiscoverySource],
    classifier: &Classifier,
) -> Vec<CapabilityDescriptor> {
    let mut exposed = BTreeMap::new();
    let mut reachable = BTreeMap::new();

    for source in sources {
        for candidate in source.enumerate() {
            match candidate {
                Candidate::Exposed(cap) => {
                    let desc = cap.describe(Source::Discovered, Provenance::Declared, classifier);
                    merge(&mut exposed, desc, source.name());
                }
                Candidate::Reachable { name, handler } => {
                    let description = format!("auto-discovered from {}", source.name());
                    let cap = Capability {
                        name,
                        description,
                        schema: None,
                        destructive: None,
                        handler,
                    };
                    let desc =
                        cap.describe(Source::Discovered, Provenance::Synthesized, classifier);
                    merge(&mut reachable, desc, source.name());
                }
            }
        }
    }

    for (name, desc) in reachable {
        if exposed.contains_key(&name) {
            debug!(capability = %name, "reachable callable already exposed explicitly");
            continue;
        }
        exposed.insert(name, desc);
    }

    exposed.into_values().collect()
}

fn merge(
    found: &mut BTreeMap<String, CapabilityDescriptor>,
    desc: CapabilityDescriptor,
    source: &str,
) {
    let Some(existing) = found.get_mut(&desc.name) else {
        found.insert(desc.name.clone(), desc);
        return;
    };

    if existing.destructive() == desc.destructive() {
        debug!(capability = %desc.name, source, "duplicate discovered capability ignored");
        return;
    }

    warn!(
        capability = %desc.name,
        source,
        "discovered capability classified differently by two sources, treating as destructive"
    );
    existing.escalate();
}
