//! The process-local capability catalog.

use std::collections::BTreeMap;

use policy::{Classifier, Provenance};
use tracing::{debug, info, warn};

use crate::capability::{Capability, CapabilityDescriptor, Source};
use crate::discovery::{DiscoverySource, discover_dynamic};
use crate::{Error, Result};

/// Immutable `name -> descriptor` map, rebuilt at every process start.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<String, CapabilityDescriptor>,
    classifier: Classifier,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new(Classifier::new())
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.entries.get(name)
    }

    /// Every descriptor, ordered by name.
    pub fn list_all(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.entries.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify `descriptor` now.
    ///
    /// The build-time classification and a fresh run are combined so a
    /// capability is destructive if either says so.
    pub fn is_destructive(&self, descriptor: &CapabilityDescriptor) -> bool {
        descriptor.destructive() || descriptor.classify(&self.classifier).destructive
    }
}

/// Collects static declarations and discovered capabilities into a [`Catalog`].
pub struct CatalogBuilder {
    classifier: Classifier,
    statics: Vec<CapabilityDescriptor>,
    dynamic: Vec<CapabilityDescriptor>,
}

impl CatalogBuilder {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            statics: Vec::new(),
            dynamic: Vec::new(),
        }
    }

    /// Add explicit declarations.
    ///
    /// A name declared twice is an error, whether within this call or
    /// across calls.
    pub fn register_static(
        &mut self,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Result<&mut Self> {
        for cap in capabilities {
            if self.statics.iter().any(|d| d.name == cap.name) {
                return Err(Error::DuplicateStatic { name: cap.name });
            }
            let desc = cap.describe(Source::Static, Provenance::Declared, &self.classifier);
            debug!(
                capability = %desc.name,
                destructive = desc.destructive(),
                reason = %desc.reason(),
                "static capability registered"
            );
            self.statics.push(desc);
        }
        Ok(self)
    }

    /// Run discovery over `sources` and keep the results.
    pub fn discover_dynamic(&mut self, sources: &[&dyn DiscoverySource]) -> &mut Self {
        let found = discover_dynamic(sources, &self.classifier);
        debug!(count = found.len(), "dynamic capabilities discovered");
        self.dynamic.extend(found);
        self
    }

    pub fn build(self) -> Result<Catalog> {
        build_catalog(self.statics, self.dynamic, self.classifier)
    }
}

/// Merge static and dynamic descriptors. Static wins on a name collision.
pub fn build_catalog(
    statics: Vec<CapabilityDescriptor>,
    dynamic: Vec<CapabilityDescriptor>,
    classifier: Classifier,
) -> Result<Catalog> {
    let mut entries = BTreeMap::new();

    for desc in statics {
        if entries.contains_key(&desc.name) {
            return Err(Error::DuplicateStatic { name: desc.name });
        }
        entries.insert(desc.name.clone(), desc);
    }

    for desc in dynamic {
        let Some(existing) = entries.get_mut(&desc.name) else {
            entries.insert(desc.name.clone(), desc);
            continue;
        };
        if existing.source == Source::Static {
            warn!(capability = %desc.name, "discovered capability shadowed by static declaration");
            continue;
        }
        if desc.destructive() && !existing.destructive() {
            existing.escalate();
        }
        debug!(capability = %desc.name, "duplicate discovered capability ignored");
    }

    info!(capabilities = entries.len(), "catalog built");
    Ok(Catalog {
        entries,
        classifier,
    })
}
