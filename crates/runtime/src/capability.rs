//! Capability declarations, descriptors, and the handler contract.

use std::fmt;
use std::sync::Arc;

use policy::{Classification, Classifier, Provenance, Reason};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors a capability handler may return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum HandlerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

/// The boundary between the gate and whatever a capability actually does.
pub trait Handler: Send + Sync {
    fn call(&self, args: &Value) -> Result<Value, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Value) -> Result<Value, HandlerError> + Send + Sync,
{
    fn call(&self, args: &Value) -> Result<Value, HandlerError> {
        self(args)
    }
}

/// Where a catalog entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Static,
    Discovered,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Static => f.write_str("static"),
            Source::Discovered => f.write_str("discovered"),
        }
    }
}

/// An explicit capability declaration, before classification.
#[derive(Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub schema: Option<Value>,
    /// The capability's own claim about whether it is destructive.
    pub destructive: Option<bool>,
    pub(crate) handler: Arc<dyn Handler>,
}

impl Capability {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: None,
            destructive: None,
            handler: Arc::new(handler),
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn destructive(mut self, destructive: bool) -> Self {
        self.destructive = Some(destructive);
        self
    }

    pub(crate) fn describe(
        self,
        source: Source,
        provenance: Provenance,
        classifier: &Classifier,
    ) -> CapabilityDescriptor {
        let classification = classifier.classify(&self.name, self.destructive, provenance);
        CapabilityDescriptor {
            name: self.name,
            description: self.description,
            schema: self.schema,
            source,
            annotation: self.destructive,
            provenance,
            classification,
            handler: self.handler,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("destructive", &self.destructive)
            .finish_non_exhaustive()
    }
}

/// A classified catalog entry.
#[derive(Clone)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub schema: Option<Value>,
    pub source: Source,
    pub(crate) annotation: Option<bool>,
    pub(crate) provenance: Provenance,
    pub(crate) classification: Classification,
    handler: Arc<dyn Handler>,
}

impl CapabilityDescriptor {
    pub fn destructive(&self) -> bool {
        self.classification.destructive
    }

    /// Why the classifier decided [`destructive`](Self::destructive).
    pub fn reason(&self) -> Reason {
        self.classification.reason
    }

    /// Re-run classification against `classifier`.
    pub fn classify(&self, classifier: &Classifier) -> Classification {
        classifier.classify(&self.name, self.annotation, self.provenance)
    }

    /// Raise to destructive, e.g. when another source disagrees.
    pub(crate) fn escalate(&mut self) {
        self.annotation = Some(true);
        self.classification = Classification {
            destructive: true,
            reason: Reason::Annotated,
        };
    }

    pub(crate) fn call(&self, args: &Value) -> Result<Value, HandlerError> {
        self.handler.call(args)
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("destructive", &self.classification.destructive)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(args: &Value) -> Result<Value, HandlerError> {
        Ok(args.clone())
    }

    #[test]
    fn closures_are_handlers() {
        let cap = Capability::new("text.echo", "Echo input", echo);
        let desc = cap.describe(Source::Static, Provenance::Declared, &Classifier::new());
        assert_eq!(desc.call(&json!({"a": 1})).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn describe_classifies() {
        let classifier = Classifier::new();
        let desc = Capability::new("db.truncate", "", echo).describe(
            Source::Static,
            Provenance::Declared,
            &classifier,
        );
        assert!(desc.destructive());
        assert_eq!(desc.reason(), Reason::VerbMatch("truncate"));
        assert_eq!(desc.classify(&classifier), desc.classification);
    }

    #[test]
    fn escalate_survives_reclassification() {
        let classifier = Classifier::new();
        let mut desc = Capability::new("report.preview", "", echo)
            .destructive(false)
            .describe(Source::Discovered, Provenance::Declared, &classifier);
        assert!(!desc.destructive());
        desc.escalate();
        assert!(desc.destructive());
        assert!(desc.classify(&classifier).destructive);
    }
}
