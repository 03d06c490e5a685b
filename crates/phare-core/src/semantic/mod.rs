//! Per-file semantic analysis
//!
//! Two passes over one file's tree: the scope builder declares every symbol
//! into a scope graph, then the name resolver matches each identifier or
//! variable occurrence against those declarations.

pub mod builder;
pub mod resolver;
pub mod scope;
pub mod symbols;

pub use builder::{FileScopes, ScopeBuilder};
pub use resolver::{NameResolver, SemanticModel};
pub use scope::{AncestorIter, Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbols::{
    AssignedValue, Symbol, SymbolId, SymbolKind, SymbolTable, UnresolvedReference,
};

use crate::names::{QualifiedName, UseMap};
use crate::tree::{Name, UseKind, UseStmt};

/// Namespace and import-alias context at one point of a file walk.
///
/// Both passes maintain their own copy while traversing, which naturally
/// gives PHP's top-down import visibility: an alias only applies to names
/// that occur after its `use` statement.
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    namespace: Option<QualifiedName>,
    uses: UseMap,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entering a namespace declaration resets the alias table.
    pub fn enter_namespace(&mut self, name: Option<&Name>) {
        self.namespace = name.map(QualifiedName::from);
        self.uses = UseMap::new();
    }

    pub fn add_use(&mut self, stmt: &UseStmt) {
        for clause in &stmt.clauses {
            let alias = clause
                .alias
                .clone()
                .unwrap_or_else(|| clause.name.last().to_string());
            self.uses
                .insert(stmt.kind, &alias, QualifiedName::from(&clause.name));
        }
    }

    pub fn namespace(&self) -> Option<&QualifiedName> {
        self.namespace.as_ref()
    }

    /// Qualified form of a simple name declared in the current namespace.
    pub fn qualified(&self, simple: &str) -> QualifiedName {
        match &self.namespace {
            Some(ns) => ns.member(simple),
            None => QualifiedName::global(simple),
        }
    }

    pub fn qualify_type(&self, name: &Name) -> QualifiedName {
        self.uses.qualify_type(name, self.namespace.as_ref())
    }

    pub fn qualify_callable(&self, kind: UseKind, name: &Name) -> Option<QualifiedName> {
        self.uses.qualify_callable(kind, name, self.namespace.as_ref())
    }
}
