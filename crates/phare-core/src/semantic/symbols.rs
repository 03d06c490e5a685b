//! Symbol table for one analyzed file
//!
//! Every declaration found by the scope builder becomes a `Symbol`; usage
//! sites recorded by the resolver point back at it. Symbols are mutated only
//! by the pass that owns them and are read-only once both passes finish.

use std::collections::HashMap;

use id_arena::{Arena, Id};

use super::scope::{ScopeId, ScopeTree};
use crate::names::QualifiedName;
use crate::tree::{LiteralKind, Modifier, Span};

pub type SymbolId = Id<Symbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Field,
    Constant,
    Function,
    Method,
    Class,
}

impl SymbolKind {
    /// PHP compares class, function and method names case-insensitively;
    /// variables, fields and constants keep their case.
    pub fn case_insensitive(self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Class
        )
    }
}

/// PHP keeps separate name spaces for values, callables, types and
/// constants: `class Foo` and `function foo` coexist in one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NameGroup {
    Value,
    Callable,
    Type,
    Constant,
}

impl NameGroup {
    fn of(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Field => NameGroup::Value,
            SymbolKind::Function | SymbolKind::Method => NameGroup::Callable,
            SymbolKind::Class => NameGroup::Type,
            SymbolKind::Constant => NameGroup::Constant,
        }
    }
}

/// One tracked value assigned to a variable-like symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedValue {
    pub span: Span,
    /// Present when the assigned expression was a literal.
    pub literal: Option<LiteralKind>,
}

#[derive(Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub scope: ScopeId,
    pub declaration: Span,
    /// Only kinds that have one: classes, functions, methods, fields.
    pub qualified_name: Option<QualifiedName>,
    pub usages: Vec<Span>,
    pub modifiers: Vec<Modifier>,
    assigned_value: Option<AssignedValue>,
    /// Assigned more than once or from something non-trackable.
    value_poisoned: bool,
}

impl Symbol {
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// The single value ever assigned to this symbol, if there was exactly
    /// one and it was trackable.
    pub fn unique_assigned_value(&self) -> Option<&AssignedValue> {
        if self.value_poisoned {
            None
        } else {
            self.assigned_value.as_ref()
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnresolvedReference {
    pub name: String,
    pub span: Span,
    pub scope: ScopeId,
    /// Qualified form the name would have had, when derivable. Cross-file
    /// consumers feed this to the project index.
    pub qualified_name: Option<QualifiedName>,
}

pub struct SymbolTable {
    arena: Arena<Symbol>,
    by_scope: HashMap<ScopeId, HashMap<(NameGroup, String), SymbolId>>,
    by_qualified_name: HashMap<QualifiedName, SymbolId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_scope: HashMap::new(),
            by_qualified_name: HashMap::new(),
        }
    }

    fn scope_key(kind: SymbolKind, name: &str) -> (NameGroup, String) {
        let name = if kind.case_insensitive() {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };
        (NameGroup::of(kind), name)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn declare(
        &mut self,
        tree: &mut ScopeTree,
        name: &str,
        kind: SymbolKind,
        scope: ScopeId,
        declaration: Span,
        qualified_name: Option<QualifiedName>,
        modifiers: Vec<Modifier>,
    ) -> SymbolId {
        let id = self.arena.alloc_with_id(|id| Symbol {
            id,
            name: name.to_string(),
            kind,
            scope,
            declaration,
            qualified_name: qualified_name.clone(),
            usages: Vec::new(),
            modifiers,
            assigned_value: None,
            value_poisoned: false,
        });

        self.by_scope
            .entry(scope)
            .or_default()
            .insert(Self::scope_key(kind, name), id);
        if let Some(qn) = qualified_name {
            self.by_qualified_name.insert(qn, id);
        }
        tree.get_mut(scope).symbols.push(id);

        id
    }

    /// Makes an existing symbol visible in another scope without moving its
    /// declaration. `global $x;` and `static $x;` inside a function alias
    /// the global symbol into the function scope this way.
    pub fn alias_into_scope(&mut self, scope: ScopeId, id: SymbolId) {
        let (kind, name) = {
            let symbol = &self.arena[id];
            (symbol.kind, symbol.name.clone())
        };
        self.by_scope
            .entry(scope)
            .or_default()
            .insert(Self::scope_key(kind, &name), id);
    }

    /// Direct lookup in one scope, no chain walk.
    pub fn symbol_in_scope(&self, name: &str, kind: SymbolKind, scope: ScopeId) -> Option<SymbolId> {
        self.by_scope
            .get(&scope)?
            .get(&Self::scope_key(kind, name))
            .copied()
    }

    /// Variable lookup honoring capture rules: the walk stops at the first
    /// function-like scope that does not capture its enclosing scope, so a
    /// closure never sees an outer function's locals while an arrow
    /// function sees them as if they were its own.
    pub fn lookup_variable(&self, name: &str, scope: ScopeId, tree: &ScopeTree) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(found) = self.symbol_in_scope(name, SymbolKind::Variable, id) {
                return Some(found);
            }
            let scope = tree.get(id);
            if scope.kind.is_function_like() && !scope.captures_enclosing {
                return None;
            }
            current = scope.parent;
        }
        None
    }

    /// Plain scope-chain lookup. Variable resolution goes through the name
    /// resolver instead, which honors capture rules between scopes.
    pub fn lookup(
        &self,
        name: &str,
        kind: SymbolKind,
        scope: ScopeId,
        tree: &ScopeTree,
    ) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(found) = self.symbol_in_scope(name, kind, id) {
                return Some(found);
            }
            current = tree.get(id).parent;
        }
        None
    }

    /// Lookup by qualified name among this file's declarations.
    pub fn find_qualified(&self, name: &QualifiedName) -> Option<SymbolId> {
        self.by_qualified_name.get(name).copied()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.arena[id]
    }

    pub fn add_usage(&mut self, id: SymbolId, span: Span) {
        self.arena[id].usages.push(span);
    }

    /// Records an assignment for single-value tracking. `None` means the
    /// value was not trackable and poisons the symbol; so does a second
    /// assignment.
    pub fn record_assignment(&mut self, id: SymbolId, value: Option<AssignedValue>) {
        let symbol = &mut self.arena[id];
        if symbol.value_poisoned {
            return;
        }
        match (symbol.assigned_value.as_ref(), value) {
            (None, Some(value)) => symbol.assigned_value = Some(value),
            _ => {
                symbol.assigned_value = None;
                symbol.value_poisoned = true;
            }
        }
    }

    pub fn symbols_in_scope<'a>(
        &'a self,
        tree: &'a ScopeTree,
        scope: ScopeId,
    ) -> impl Iterator<Item = &'a Symbol> {
        tree.get(scope).symbols.iter().map(|&id| &self.arena[id])
    }

    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.arena.iter().map(|(_, s)| s)
    }
}
