//! Qualified names and namespace import resolution
//!
//! PHP namespaces, classes, functions and constants are case-insensitive;
//! property names are not. `QualifiedName` normalizes accordingly: it keeps
//! the original spelling for display but compares and hashes case-folded,
//! except for the simple name of a field member.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::tree::{Name, UseKind};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QualifiedNameError {
    #[error("a qualified name needs at least one segment")]
    Empty,
}

/// Fully-segmented namespace path plus simple name, e.g. `App\Http\Kernel`.
///
/// Immutable; created once and shared by value. Equality and hashing use the
/// case-folded segments, so `App\Foo` == `app\foo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifiedName {
    parts: Vec<String>,
    /// Set for field members: the last segment compares case-sensitively.
    case_sensitive_tail: bool,
}

impl QualifiedName {
    pub fn new<I, S>(parts: I) -> Result<Self, QualifiedNameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() {
            return Err(QualifiedNameError::Empty);
        }
        Ok(Self {
            parts,
            case_sensitive_tail: false,
        })
    }

    /// A single-segment name in the global namespace.
    pub fn global(simple: &str) -> Self {
        Self {
            parts: vec![simple.to_string()],
            case_sensitive_tail: false,
        }
    }

    /// Concatenation: `self` as namespace prefix of `relative`.
    pub fn resolve(&self, relative: &QualifiedName) -> QualifiedName {
        let mut parts = self.parts.clone();
        parts.extend(relative.parts.iter().cloned());
        QualifiedName {
            parts,
            case_sensitive_tail: relative.case_sensitive_tail,
        }
    }

    /// Appends one segment, keeping case-insensitive comparison. Used for
    /// classes, methods and constants nested under a namespace or class.
    pub fn member(&self, simple: &str) -> QualifiedName {
        let mut parts = self.parts.clone();
        parts.push(simple.to_string());
        QualifiedName {
            parts,
            case_sensitive_tail: false,
        }
    }

    /// Appends a field name, which stays case-sensitive: `$c->foo` and
    /// `$c->Foo` are different properties.
    pub fn field_member(&self, simple: &str) -> QualifiedName {
        let mut parts = self.parts.clone();
        parts.push(simple.to_string());
        QualifiedName {
            parts,
            case_sensitive_tail: true,
        }
    }

    /// Re-roots a name whose first segment matched an import alias: the
    /// alias's original name replaces that segment, the tail is kept.
    pub fn from_alias(original: &QualifiedName, tail: &[String]) -> QualifiedName {
        let mut parts = original.parts.clone();
        parts.extend(tail.iter().cloned());
        QualifiedName {
            parts,
            case_sensitive_tail: false,
        }
    }

    pub fn simple_name(&self) -> &str {
        self.parts.last().expect("qualified names are non-empty")
    }

    pub fn segments(&self) -> &[String] {
        &self.parts
    }

    /// True for single-segment names (global namespace).
    pub fn is_unqualified(&self) -> bool {
        self.parts.len() == 1
    }
}

impl From<&Name> for QualifiedName {
    fn from(name: &Name) -> Self {
        debug_assert!(!name.parts.is_empty());
        QualifiedName {
            parts: name.parts.clone(),
            case_sensitive_tail: false,
        }
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        if self.parts.len() != other.parts.len()
            || self.case_sensitive_tail != other.case_sensitive_tail
        {
            return false;
        }
        let tail = self.parts.len() - 1;
        for (i, (a, b)) in self.parts.iter().zip(&other.parts).enumerate() {
            let sensitive = self.case_sensitive_tail && i == tail;
            let matches = if sensitive {
                a == b
            } else {
                a.eq_ignore_ascii_case(b)
            };
            if !matches {
                return false;
            }
        }
        true
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.len().hash(state);
        self.case_sensitive_tail.hash(state);
        let tail = self.parts.len() - 1;
        for (i, part) in self.parts.iter().enumerate() {
            if self.case_sensitive_tail && i == tail {
                part.hash(state);
            } else {
                part.to_ascii_lowercase().hash(state);
            }
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("\\"))
    }
}

/// Import aliases of one namespace, keyed by case-folded alias.
///
/// Built incrementally while walking a file: only `use` statements already
/// seen textually are visible at a given point, matching PHP's top-down
/// declarative import semantics.
#[derive(Debug, Clone, Default)]
pub struct UseMap {
    classes: HashMap<String, QualifiedName>,
    functions: HashMap<String, QualifiedName>,
    constants: HashMap<String, QualifiedName>,
}

impl UseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: UseKind, alias: &str, original: QualifiedName) {
        let table = match kind {
            UseKind::Class => &mut self.classes,
            UseKind::Function => &mut self.functions,
            UseKind::Const => &mut self.constants,
        };
        table.insert(alias.to_ascii_lowercase(), original);
    }

    fn alias_for(&self, kind: UseKind, first_segment: &str) -> Option<&QualifiedName> {
        let table = match kind {
            UseKind::Class => &self.classes,
            UseKind::Function => &self.functions,
            UseKind::Const => &self.constants,
        };
        table.get(&first_segment.to_ascii_lowercase())
    }

    /// Resolves a class-like source name to its qualified form:
    /// fully-qualified names stand alone, then the alias table (first
    /// segment only), then the current namespace.
    pub fn qualify_type(&self, name: &Name, namespace: Option<&QualifiedName>) -> QualifiedName {
        if name.fully_qualified {
            return QualifiedName::from(name);
        }
        if let Some(aliased) = self.apply_alias(UseKind::Class, name) {
            return aliased;
        }
        match namespace {
            Some(ns) => ns.resolve(&QualifiedName::from(name)),
            None => QualifiedName::from(name),
        }
    }

    /// Resolves a function or constant name as far as imports and the
    /// namespace syntax allow. Single-segment names return `None`: PHP falls
    /// back dynamically for those, and the caller decides between the
    /// current namespace and the global one (see the name resolver).
    pub fn qualify_callable(
        &self,
        kind: UseKind,
        name: &Name,
        namespace: Option<&QualifiedName>,
    ) -> Option<QualifiedName> {
        if name.fully_qualified {
            return Some(QualifiedName::from(name));
        }
        if name.is_simple() {
            return self.alias_for(kind, &name.parts[0]).cloned();
        }
        // Compound names go through the class/namespace alias table, like
        // `use A\B; B\foo();`.
        if let Some(aliased) = self.apply_alias(UseKind::Class, name) {
            return Some(aliased);
        }
        Some(match namespace {
            Some(ns) => ns.resolve(&QualifiedName::from(name)),
            None => QualifiedName::from(name),
        })
    }

    fn apply_alias(&self, kind: UseKind, name: &Name) -> Option<QualifiedName> {
        let original = self.alias_for(kind, &name.parts[0])?;
        Some(QualifiedName::from_alias(original, &name.parts[1..]))
    }
}
