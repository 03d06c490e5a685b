//! Scope tree for one analyzed file
//!
//! Lexical scopes (global, namespace, function, method, closure, arrow
//! function, class) form a tree. Scopes are arena-allocated and referenced
//! by id everywhere else, so parent links, superclass links and symbol
//! ownership never need owning pointers.

use id_arena::{Arena, Id};

use super::symbols::SymbolId;
use crate::tree::Span;

pub type ScopeId = Id<Scope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Namespace,
    Function,
    Method,
    Closure,
    ArrowFunction,
    Class,
}

impl ScopeKind {
    /// Function-like scopes stop variable lookup from walking outward,
    /// unless the scope captures its enclosing scope (arrow functions).
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            ScopeKind::Function | ScopeKind::Method | ScopeKind::Closure | ScopeKind::ArrowFunction
        )
    }
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub span: Span,
    /// For class scopes whose superclass is declared in the same file:
    /// member lookup falls through to that scope.
    pub superclass_scope: Option<ScopeId>,
    /// Arrow functions see the enclosing scope's variables as if local.
    pub captures_enclosing: bool,
    /// A `compact()` call with a non-literal argument was seen here; any
    /// local variable may be considered used from that point on.
    pub has_unresolved_compact: bool,
    /// Symbols declared directly in this scope, in insertion order.
    pub symbols: Vec<SymbolId>,
}

pub struct ScopeTree {
    arena: Arena<Scope>,
    root: Option<ScopeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn create_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, span: Span) -> ScopeId {
        let captures = kind == ScopeKind::ArrowFunction;
        let id = self.arena.alloc_with_id(|id| Scope {
            id,
            kind,
            parent,
            children: Vec::new(),
            span,
            superclass_scope: None,
            captures_enclosing: captures,
            has_unresolved_compact: false,
            symbols: Vec::new(),
        });

        if let Some(parent_id) = parent {
            self.arena[parent_id].children.push(id);
        }

        if self.root.is_none() {
            self.root = Some(id);
        }

        id
    }

    pub fn root(&self) -> Option<ScopeId> {
        self.root
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.arena[id]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.arena[id]
    }

    pub fn parent(&self, id: ScopeId) -> Option<&Scope> {
        self.arena[id].parent.map(|p| &self.arena[p])
    }

    pub fn set_superclass_scope(&mut self, class_scope: ScopeId, superclass_scope: ScopeId) {
        self.arena[class_scope].superclass_scope = Some(superclass_scope);
    }

    pub fn mark_unresolved_compact(&mut self, id: ScopeId) {
        self.arena[id].has_unresolved_compact = true;
    }

    pub fn ancestors(&self, id: ScopeId) -> AncestorIter<'_> {
        AncestorIter {
            tree: self,
            current: Some(id),
        }
    }

    /// The innermost function-like scope at or above `id`, or the global
    /// scope. `global` and `static` statements declare into the scope
    /// returned by walking this to the root.
    pub fn enclosing_function_like(&self, id: ScopeId) -> ScopeId {
        for scope in self.ancestors(id) {
            if scope.kind.is_function_like() || scope.kind == ScopeKind::Global {
                return scope.id;
            }
        }
        id
    }
}

pub struct AncestorIter<'a> {
    tree: &'a ScopeTree,
    current: Option<ScopeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = &'a Scope;

    fn next(&mut self) -> Option<Self::Item> {
        let current_id = self.current?;
        let scope = &self.tree.arena[current_id];
        self.current = scope.parent;
        Some(scope)
    }
}
