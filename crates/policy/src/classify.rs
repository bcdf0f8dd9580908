//! Destructive classification of capability names.

use std::collections::HashSet;
use std::fmt;

/// Capabilities known to mutate state outside the calling process.
const KNOWN_DESTRUCTIVE: &[&str] = &[
    "fs.write",
    "fs.delete",
    "fs.move",
    "fs.chmod",
    "git.commit",
    "git.push",
    "git.checkout",
    "git.rebase",
    "shell.exec",
    "http.request",
    "process.spawn",
    "secrets.read",
];

/// Capabilities known to be read-only.
const KNOWN_SAFE: &[&str] = &[
    "fs.read",
    "fs.list",
    "fs.exists",
    "git.status",
    "git.log",
    "git.diff",
    "git.show",
    "doc.parse",
    "http.get",
];

/// Verb stems indicating mutation, deletion, or execution.
const DESTRUCTIVE_VERBS: &[&str] = &[
    "write",
    "delete",
    "del",
    "remove",
    "rm",
    "execute",
    "exec",
    "run",
    "spawn",
    "kill",
    "destroy",
    "drop",
    "truncate",
    "send",
    "post",
    "put",
    "patch",
    "update",
    "modify",
    "create",
    "insert",
    "append",
    "overwrite",
    "move",
    "rename",
    "purge",
    "erase",
    "wipe",
    "push",
    "commit",
    "install",
    "uninstall",
    "upload",
    "set",
    "reset",
];

const SUFFIXES: &[&str] = &["s", "es", "d", "ed", "ing"];

/// Where a descriptor's metadata came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// A static declaration, or a discovered capability that was explicitly
    /// marked exposable.
    Declared,
    /// A default descriptor synthesized for an unannotated callable.
    Synthesized,
}

/// Why a capability was classified the way it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    KnownDestructive,
    KnownSafe,
    Annotated,
    VerbMatch(&'static str),
    NoVerbMatch,
    UnannotatedDefault,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KnownDestructive => f.write_str("listed as destructive"),
            Self::KnownSafe => f.write_str("listed as safe"),
            Self::Annotated => f.write_str("declared by the capability"),
            Self::VerbMatch(stem) => write!(f, "name contains destructive verb '{stem}'"),
            Self::NoVerbMatch => f.write_str("no destructive verb in name"),
            Self::UnannotatedDefault => f.write_str("unannotated discovered capability"),
        }
    }
}

/// Classification result with reasoning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub destructive: bool,
    pub reason: Reason,
}

impl Classification {
    fn new(destructive: bool, reason: Reason) -> Self {
        Self {
            destructive,
            reason,
        }
    }
}

/// Decides whether a capability is destructive.
///
/// Classification is a pure function of the name, the capability's own
/// annotation, and its provenance. Nothing is cached, so a rebuilt catalog
/// always sees the current tables.
#[derive(Debug, Clone)]
pub struct Classifier {
    known_destructive: HashSet<String>,
    known_safe: HashSet<String>,
}

impl Classifier {
    /// Creates a classifier with the built-in tables.
    pub fn new() -> Self {
        Self {
            known_destructive: KNOWN_DESTRUCTIVE.iter().map(|s| s.to_string()).collect(),
            known_safe: KNOWN_SAFE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Adds a name to the known-destructive table.
    pub fn with_destructive(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.known_safe.remove(&name);
        self.known_destructive.insert(name);
        self
    }

    /// Adds a name to the known-safe table.
    pub fn with_safe(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.known_destructive.remove(&name);
        self.known_safe.insert(name);
        self
    }

    /// Classify a capability.
    ///
    /// Order: known-destructive table, a `true` annotation, known-safe table,
    /// a `false` annotation, the verb pattern, then the provenance default.
    pub fn classify(
        &self,
        name: &str,
        annotation: Option<bool>,
        provenance: Provenance,
    ) -> Classification {
        if self.known_destructive.contains(name) {
            return Classification::new(true, Reason::KnownDestructive);
        }
        if annotation == Some(true) {
            return Classification::new(true, Reason::Annotated);
        }
        if self.known_safe.contains(name) {
            return Classification::new(false, Reason::KnownSafe);
        }
        if annotation == Some(false) {
            return Classification::new(false, Reason::Annotated);
        }
        if let Some(stem) = destructive_verb(name) {
            return Classification::new(true, Reason::VerbMatch(stem));
        }
        match provenance {
            Provenance::Declared => Classification::new(false, Reason::NoVerbMatch),
            Provenance::Synthesized => Classification::new(true, Reason::UnannotatedDefault),
        }
    }

    pub fn is_destructive(
        &self,
        name: &str,
        annotation: Option<bool>,
        provenance: Provenance,
    ) -> bool {
        self.classify(name, annotation, provenance).destructive
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the first destructive verb stem found among the name's tokens.
pub fn destructive_verb(name: &str) -> Option<&'static str> {
    tokenize(name).iter().find_map(|token| {
        DESTRUCTIVE_VERBS
            .iter()
            .copied()
            .find(|stem| token_matches(token, stem))
    })
}

/// Split a capability name into lowercase word tokens.
///
/// Separators are any non-alphanumeric character; camelCase and
/// `ACRONYMWord` boundaries also split.
pub fn tokenize(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            flush(&mut current, &mut tokens);
            continue;
        }
        // current is non-empty only if chars[i - 1] was alphanumeric
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_lower) {
                flush(&mut current, &mut tokens);
            }
        }
        current.extend(c.to_lowercase());
    }
    flush(&mut current, &mut tokens);
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn token_matches(token: &str, stem: &str) -> bool {
    if token == stem {
        return true;
    }
    let Some(rest) = token.strip_prefix(stem) else {
        // writing, executing
        return stem
            .strip_suffix('e')
            .and_then(|base| token.strip_prefix(base))
            .is_some_and(|rest| rest == "ing");
    };
    if SUFFIXES.contains(&rest) {
        return true;
    }
    // dropped, running
    let Some(last) = stem.chars().last() else {
        return false;
    };
    rest.strip_prefix(last)
        .is_some_and(|rest| rest == "ed" || rest == "ing")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_separators_and_camel_case() {
        assert_eq!(tokenize("database.dropTable"), vec!["database", "drop", "table"]);
        assert_eq!(tokenize("fs_write-file"), vec!["fs", "write", "file"]);
        assert_eq!(tokenize("HTTPPostJson"), vec!["http", "post", "json"]);
        assert_eq!(tokenize("v2Update"), vec!["v2", "update"]);
        assert!(tokenize("..").is_empty());
    }

    #[test]
    fn verb_matching_handles_inflections() {
        assert_eq!(destructive_verb("files.deleted"), Some("delete"));
        assert_eq!(destructive_verb("jobs.running"), Some("run"));
        assert_eq!(destructive_verb("table.dropped"), Some("drop"));
        assert_eq!(destructive_verb("log.writing"), Some("write"));
        assert_eq!(destructive_verb("mail.sends"), Some("send"));
        assert_eq!(destructive_verb("weather.forecast"), None);
        // substring inside an unrelated word is not a match
        assert_eq!(destructive_verb("settings.read"), None);
        assert_eq!(destructive_verb("runtime.info"), None);
    }

    #[test]
    fn discovered_drop_table_is_destructive() {
        let classifier = Classifier::new();
        let c = classifier.classify("database.dropTable", None, Provenance::Synthesized);
        assert!(c.destructive);
        assert_eq!(c.reason, Reason::VerbMatch("drop"));
    }

    #[test]
    fn known_tables_take_precedence() {
        let classifier = Classifier::new();
        let c = classifier.classify("fs.write", Some(false), Provenance::Declared);
        assert!(c.destructive);
        assert_eq!(c.reason, Reason::KnownDestructive);

        let c = classifier.classify("fs.read", None, Provenance::Synthesized);
        assert!(!c.destructive);
        assert_eq!(c.reason, Reason::KnownSafe);
    }

    #[test]
    fn destructive_annotation_beats_safe_table() {
        let classifier = Classifier::new();
        let c = classifier.classify("fs.read", Some(true), Provenance::Declared);
        assert!(c.destructive);
        assert_eq!(c.reason, Reason::Annotated);
    }

    #[test]
    fn safe_annotation_beats_verb_pattern() {
        let classifier = Classifier::new();
        let c = classifier.classify("report.create_preview", Some(false), Provenance::Declared);
        assert!(!c.destructive);
    }

    #[test]
    fn provenance_default_applies_only_without_verb() {
        let classifier = Classifier::new();
        assert!(!classifier.is_destructive("weather.forecast", None, Provenance::Declared));
        let c = classifier.classify("weather.forecast", None, Provenance::Synthesized);
        assert!(c.destructive);
        assert_eq!(c.reason, Reason::UnannotatedDefault);
    }

    #[test]
    fn custom_tables_override_builtins() {
        let classifier = Classifier::new()
            .with_safe("jobs.run_report")
            .with_destructive("fs.read");
        assert!(!classifier.is_destructive("jobs.run_report", None, Provenance::Synthesized));
        assert!(classifier.is_destructive("fs.read", None, Provenance::Declared));
    }

    #[test]
    fn classification_is_deterministic() {
        let a = Classifier::new();
        let b = Classifier::new();
        for name in ["a.b", "x.kill", "cacheFlush", "db.dropTable"] {
            for provenance in [Provenance::Declared, Provenance::Synthesized] {
                assert_eq!(
                    a.classify(name, None, provenance),
                    b.classify(name, None, provenance)
                );
            }
        }
    }
}
