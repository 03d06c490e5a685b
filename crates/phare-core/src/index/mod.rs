//! Cross-file project symbol index
//!
//! Aggregates declaration facts from every analyzed file plus the built-in
//! base types, and lazily links them into a class/function symbol graph.
//! Resolution is memoized per qualified name: each name maps to exactly one
//! arena node forever, names without a fact map to one shared Unknown node,
//! and inheritance cycles terminate because the node is registered in the
//! memo table before its superclass is resolved.

pub mod builtins;
pub mod facts;
pub mod harvester;

pub use facts::{
    ClassFact, FileFacts, FunctionFact, MethodFact, ParameterFact, Visibility,
};
pub use harvester::harvest;

use std::collections::{HashMap, HashSet};

use id_arena::{Arena, Id};
use tracing::{debug, trace};

use crate::config::Config;
use crate::names::QualifiedName;
use crate::tree::{ClassKind, Span};
use crate::trilean::Trilean;

pub type TypeId = Id<TypeSymbol>;
pub type FunctionId = Id<FunctionSymbol>;

/// A linked class, interface, trait or enum symbol — or the Unknown
/// sentinel for a name with no discoverable declaration.
pub struct TypeSymbol {
    pub id: TypeId,
    pub name: QualifiedName,
    /// `None` marks the Unknown sentinel.
    kind: Option<ClassKind>,
    superclass: Option<TypeId>,
    interfaces: Vec<TypeId>,
    /// Keyed by lowercased method name.
    methods: HashMap<String, MethodFact>,
    declaration: Option<Span>,
}

impl TypeSymbol {
    pub fn is_unknown(&self) -> bool {
        self.kind.is_none()
    }

    pub fn kind(&self) -> Option<ClassKind> {
        self.kind
    }

    pub fn superclass(&self) -> Option<TypeId> {
        self.superclass
    }

    pub fn interfaces(&self) -> &[TypeId] {
        &self.interfaces
    }

    pub fn declared_method(&self, name: &str) -> Option<&MethodFact> {
        self.methods.get(&name.to_ascii_lowercase())
    }

    pub fn declared_methods(&self) -> impl Iterator<Item = &MethodFact> {
        self.methods.values()
    }

    /// `None` for Unknown symbols and seeded built-ins.
    pub fn declaration(&self) -> Option<Span> {
        self.declaration
    }
}

/// A linked function symbol, or its Unknown sentinel (empty parameters,
/// no location, both flags false).
pub struct FunctionSymbol {
    pub id: FunctionId,
    pub name: QualifiedName,
    known: bool,
    pub params: Vec<ParameterFact>,
    pub has_return: bool,
    pub uses_func_get_args: bool,
    declaration: Option<Span>,
}

impl FunctionSymbol {
    pub fn is_unknown(&self) -> bool {
        !self.known
    }

    pub fn declaration(&self) -> Option<Span> {
        self.declaration
    }
}

pub struct ProjectIndex {
    types: Arena<TypeSymbol>,
    functions: Arena<FunctionSymbol>,
    /// Memo tables: resolved nodes, placeholders mid-resolution, and
    /// Unknown sentinels all live here under their qualified name.
    type_ids: HashMap<QualifiedName, TypeId>,
    function_ids: HashMap<QualifiedName, FunctionId>,
    class_facts: HashMap<QualifiedName, ClassFact>,
    function_facts: HashMap<QualifiedName, FunctionFact>,
    ambiguous_types: HashSet<QualifiedName>,
    ambiguous_functions: HashSet<QualifiedName>,
}

impl Default for ProjectIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        let mut index = Self {
            types: Arena::new(),
            functions: Arena::new(),
            type_ids: HashMap::new(),
            function_ids: HashMap::new(),
            class_facts: HashMap::new(),
            function_facts: HashMap::new(),
            ambiguous_types: HashSet::new(),
            ambiguous_functions: HashSet::new(),
        };
        for fact in builtins::builtin_facts(&config.stubs) {
            index.register_class(fact);
        }
        index
    }

    /// Registers one file's harvested facts. Facts should be added before
    /// resolution queries run; a duplicate qualified name marks the name
    /// ambiguous so later resolution yields Unknown instead of guessing.
    pub fn add_file(&mut self, facts: FileFacts) {
        for class in facts.classes {
            self.register_class(class);
        }
        for function in facts.functions {
            let name = function.name.clone();
            if self.function_facts.insert(name.clone(), function).is_some() {
                debug!(name = %name, "duplicate function declaration");
                self.ambiguous_functions.insert(name);
            }
        }
    }

    fn register_class(&mut self, fact: ClassFact) {
        let name = fact.name.clone();
        if self.class_facts.insert(name.clone(), fact).is_some() {
            debug!(name = %name, "duplicate class declaration");
            self.ambiguous_types.insert(name);
        }
    }

    /// Resolves the type symbol for a qualified name, linking its hierarchy
    /// on first access. Always returns the same id for the same name.
    pub fn type_symbol(&mut self, name: &QualifiedName) -> TypeId {
        if let Some(&id) = self.type_ids.get(name) {
            return id;
        }
        if self.ambiguous_types.contains(name) {
            debug!(name = %name, "ambiguous class name resolves to unknown");
            return self.unknown_type(name);
        }
        let Some(fact) = self.class_facts.get(name).cloned() else {
            trace!(name = %name, "no class fact, memoizing unknown");
            return self.unknown_type(name);
        };

        // Register the node before resolving the hierarchy: a cycle that
        // reaches back here finds this id in the memo table instead of
        // re-entering resolution.
        let methods = fact
            .methods
            .into_iter()
            .map(|m| (m.name.to_ascii_lowercase(), m))
            .collect();
        let declaration = (!fact.declaration.is_none()).then_some(fact.declaration);
        let id = self.types.alloc_with_id(|id| TypeSymbol {
            id,
            name: fact.name.clone(),
            kind: Some(fact.kind),
            superclass: None,
            interfaces: Vec::new(),
            methods,
            declaration,
        });
        self.type_ids.insert(name.clone(), id);

        let superclass = fact.superclass.as_ref().map(|s| self.type_symbol(s));
        let interfaces: Vec<TypeId> =
            fact.interfaces.iter().map(|i| self.type_symbol(i)).collect();
        let node = &mut self.types[id];
        node.superclass = superclass;
        node.interfaces = interfaces;
        trace!(name = %name, "linked class symbol");

        id
    }

    fn unknown_type(&mut self, name: &QualifiedName) -> TypeId {
        let id = self.types.alloc_with_id(|id| TypeSymbol {
            id,
            name: name.clone(),
            kind: None,
            superclass: None,
            interfaces: Vec::new(),
            methods: HashMap::new(),
            declaration: None,
        });
        self.type_ids.insert(name.clone(), id);
        id
    }

    pub fn function_symbol(&mut self, name: &QualifiedName) -> FunctionId {
        if let Some(&id) = self.function_ids.get(name) {
            return id;
        }
        let fact = if self.ambiguous_functions.contains(name) {
            debug!(name = %name, "ambiguous function name resolves to unknown");
            None
        } else {
            self.function_facts.get(name).cloned()
        };

        let id = match fact {
            Some(fact) => self.functions.alloc_with_id(|id| FunctionSymbol {
                id,
                name: fact.name.clone(),
                known: true,
                params: fact.params,
                has_return: fact.has_return,
                uses_func_get_args: fact.uses_func_get_args,
                declaration: Some(fact.declaration),
            }),
            None => self.functions.alloc_with_id(|id| FunctionSymbol {
                id,
                name: name.clone(),
                known: false,
                params: Vec::new(),
                has_return: false,
                uses_func_get_args: false,
                declaration: None,
            }),
        };
        self.function_ids.insert(name.clone(), id);
        id
    }

    pub fn get_type(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id]
    }

    pub fn get_function(&self, id: FunctionId) -> &FunctionSymbol {
        &self.functions[id]
    }

    /// Walks the superclass chain. True when `target` is this type or an
    /// ancestor class, False when the chain ends without it, Unknown when
    /// the chain reaches an Unknown node first.
    pub fn is_or_subclass_of(&self, id: TypeId, target: &QualifiedName) -> Trilean {
        let mut visited = HashSet::new();
        let mut current = id;
        loop {
            if !visited.insert(current) {
                // Walked a full cycle without finding the target.
                return Trilean::False;
            }
            let node = &self.types[current];
            if node.is_unknown() {
                return Trilean::Unknown;
            }
            if node.name == *target {
                return Trilean::True;
            }
            match node.superclass {
                Some(next) => current = next,
                None => return Trilean::False,
            }
        }
    }

    /// Like [`is_or_subclass_of`](Self::is_or_subclass_of) but also
    /// searches the transitive interface set.
    pub fn is_subtype_of(&self, id: TypeId, target: &QualifiedName) -> Trilean {
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        let mut saw_unknown = false;
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let node = &self.types[current];
            if node.is_unknown() {
                saw_unknown = true;
                continue;
            }
            if node.name == *target {
                return Trilean::True;
            }
            if let Some(superclass) = node.superclass {
                stack.push(superclass);
            }
            stack.extend(node.interfaces.iter().copied());
        }
        if saw_unknown {
            Trilean::Unknown
        } else {
            Trilean::False
        }
    }

    /// Whether `method_name` declared on `class` overrides a method of an
    /// ancestor class or implemented interface. A private method never
    /// overrides, and a private ancestor method can never be overridden.
    pub fn is_overriding(&self, class: TypeId, method_name: &str) -> Trilean {
        let node = &self.types[class];
        if node.is_unknown() {
            return Trilean::Unknown;
        }
        if let Some(method) = node.declared_method(method_name) {
            if method.visibility == Visibility::Private {
                return Trilean::False;
            }
        }

        let mut visited = HashSet::from([class]);
        let mut stack: Vec<TypeId> = node
            .superclass
            .into_iter()
            .chain(node.interfaces.iter().copied())
            .collect();
        let mut saw_unknown = false;
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let ancestor = &self.types[current];
            if ancestor.is_unknown() {
                saw_unknown = true;
                continue;
            }
            if let Some(method) = ancestor.declared_method(method_name) {
                if method.visibility != Visibility::Private {
                    return Trilean::True;
                }
                // Private in this ancestor; a non-private declaration
                // further up would still count, keep walking.
            }
            if let Some(superclass) = ancestor.superclass {
                stack.push(superclass);
            }
            stack.extend(ancestor.interfaces.iter().copied());
        }
        if saw_unknown {
            Trilean::Unknown
        } else {
            Trilean::False
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Span;

    fn qn(parts: &[&str]) -> QualifiedName {
        QualifiedName::new(parts.iter().copied()).unwrap()
    }

    fn method(name: &str, visibility: Visibility) -> MethodFact {
        MethodFact {
            name: name.to_string(),
            visibility,
            is_static: false,
            is_abstract: false,
            is_final: false,
            params: Vec::new(),
            has_return: false,
            uses_func_get_args: false,
            is_test: false,
            has_return_type: false,
            returns_void: false,
            declaration: Span::NONE,
        }
    }

    #[test]
    fn inheritance_cycle_resolves_with_shared_identity() {
        let mut index = ProjectIndex::new();
        index.add_file(FileFacts {
            classes: vec![
                ClassFact::stub(qn(&["A"]), crate::tree::ClassKind::Class)
                    .with_superclass(qn(&["B"])),
                ClassFact::stub(qn(&["B"]), crate::tree::ClassKind::Class)
                    .with_superclass(qn(&["A"])),
            ],
            functions: Vec::new(),
        });

        let a = index.type_symbol(&qn(&["A"]));
        let b = index.type_symbol(&qn(&["B"]));
        assert_eq!(index.get_type(a).superclass(), Some(b));
        assert_eq!(index.get_type(b).superclass(), Some(a));

        // Ancestry over the cycle terminates.
        assert_eq!(index.is_or_subclass_of(a, &qn(&["B"])), Trilean::True);
        assert_eq!(index.is_or_subclass_of(a, &qn(&["Missing"])), Trilean::False);
    }

    #[test]
    fn unknown_lookups_are_identity_stable() {
        let mut index = ProjectIndex::new();
        let first = index.type_symbol(&qn(&["No", "Such", "Class"]));
        let second = index.type_symbol(&qn(&["no", "such", "class"]));

        assert_eq!(first, second);
        assert!(index.get_type(first).is_unknown());
    }

    #[test]
    fn duplicate_declarations_resolve_to_unknown() {
        let mut index = ProjectIndex::new();
        let fact = ClassFact::stub(qn(&["App", "Twice"]), crate::tree::ClassKind::Class);
        index.add_file(FileFacts {
            classes: vec![fact.clone()],
            functions: Vec::new(),
        });
        index.add_file(FileFacts {
            classes: vec![fact],
            functions: Vec::new(),
        });

        let id = index.type_symbol(&qn(&["App", "Twice"]));
        assert!(index.get_type(id).is_unknown());
    }

    #[test]
    fn ancestry_through_a_missing_link_is_unknown_not_false() {
        let mut index = ProjectIndex::new();
        // A extends B; B is never declared; C exists independently.
        index.add_file(FileFacts {
            classes: vec![
                ClassFact::stub(qn(&["A"]), crate::tree::ClassKind::Class)
                    .with_superclass(qn(&["B"])),
                ClassFact::stub(qn(&["C"]), crate::tree::ClassKind::Class),
            ],
            functions: Vec::new(),
        });

        let a = index.type_symbol(&qn(&["A"]));
        // B might extend C for all we know.
        assert_eq!(index.is_or_subclass_of(a, &qn(&["C"])), Trilean::Unknown);
        // But A itself is still a match before the chain goes dark.
        assert_eq!(index.is_or_subclass_of(a, &qn(&["A"])), Trilean::True);
    }

    #[test]
    fn subtype_includes_transitive_builtin_interfaces() {
        let mut index = ProjectIndex::new();
        index.add_file(FileFacts {
            classes: vec![ClassFact::stub(
                qn(&["App", "MyException"]),
                crate::tree::ClassKind::Class,
            )
            .with_superclass(qn(&["RuntimeException"]))],
            functions: Vec::new(),
        });

        let id = index.type_symbol(&qn(&["App", "MyException"]));
        // MyException → RuntimeException → Exception → (implements) Throwable.
        assert_eq!(index.is_subtype_of(id, &qn(&["Throwable"])), Trilean::True);
        // The narrower class-only query does not look at interfaces.
        assert_eq!(
            index.is_or_subclass_of(id, &qn(&["Throwable"])),
            Trilean::False
        );
    }

    #[test]
    fn private_subclass_method_does_not_override() {
        let mut index = ProjectIndex::new();
        index.add_file(FileFacts {
            classes: vec![
                {
                    let mut c1 = ClassFact::stub(qn(&["C1"]), crate::tree::ClassKind::Class);
                    c1.methods.push(method("m", Visibility::Public));
                    c1
                },
                {
                    let mut c2 = ClassFact::stub(qn(&["C2"]), crate::tree::ClassKind::Class)
                        .with_superclass(qn(&["C1"]));
                    c2.methods.push(method("m", Visibility::Private));
                    c2
                },
            ],
            functions: Vec::new(),
        });

        let c2 = index.type_symbol(&qn(&["C2"]));
        assert_eq!(index.is_overriding(c2, "m"), Trilean::False);
    }

    #[test]
    fn private_parent_method_cannot_be_overridden() {
        let mut index = ProjectIndex::new();
        index.add_file(FileFacts {
            classes: vec![
                {
                    let mut base = ClassFact::stub(qn(&["Base"]), crate::tree::ClassKind::Class);
                    base.methods.push(method("helper", Visibility::Private));
                    base
                },
                {
                    let mut child = ClassFact::stub(qn(&["Child"]), crate::tree::ClassKind::Class)
                        .with_superclass(qn(&["Base"]));
                    child.methods.push(method("helper", Visibility::Public));
                    child
                },
            ],
            functions: Vec::new(),
        });

        let child = index.type_symbol(&qn(&["Child"]));
        assert_eq!(index.is_overriding(child, "helper"), Trilean::False);
    }

    #[test]
    fn override_through_interface_and_unknown_parent() {
        let mut index = ProjectIndex::new();
        index.add_file(FileFacts {
            classes: vec![
                {
                    let mut iface =
                        ClassFact::stub(qn(&["Renderable"]), crate::tree::ClassKind::Interface);
                    iface.methods.push(method("render", Visibility::Public));
                    iface
                },
                {
                    let mut class = ClassFact::stub(qn(&["Widget"]), crate::tree::ClassKind::Class)
                        .with_interface(qn(&["Renderable"]));
                    class.methods.push(method("render", Visibility::Public));
                    class.methods.push(method("draw", Visibility::Public));
                    class
                },
                {
                    let mut vague = ClassFact::stub(qn(&["Vague"]), crate::tree::ClassKind::Class)
                        .with_superclass(qn(&["Elsewhere", "Base"]));
                    vague.methods.push(method("anything", Visibility::Public));
                    vague
                },
            ],
            functions: Vec::new(),
        });

        let widget = index.type_symbol(&qn(&["Widget"]));
        assert_eq!(index.is_overriding(widget, "render"), Trilean::True);
        assert_eq!(index.is_overriding(widget, "draw"), Trilean::False);

        // With an unresolved parent the answer stays open.
        let vague = index.type_symbol(&qn(&["Vague"]));
        assert_eq!(index.is_overriding(vague, "anything"), Trilean::Unknown);
    }

    #[test]
    fn namespaced_and_global_functions_are_distinct() {
        let mut index = ProjectIndex::new();
        index.add_file(FileFacts {
            classes: Vec::new(),
            functions: vec![FunctionFact {
                name: qn(&["App", "strlen"]),
                params: Vec::new(),
                has_return: true,
                uses_func_get_args: false,
                has_return_type: false,
                returns_void: false,
                declaration: Span::new(10, 16),
            }],
        });

        let namespaced = index.function_symbol(&qn(&["App", "strlen"]));
        let global = index.function_symbol(&qn(&["strlen"]));
        assert_ne!(namespaced, global);
        assert!(!index.get_function(namespaced).is_unknown());
        assert!(index.get_function(global).is_unknown());
        assert!(!index.get_function(global).has_return);
        assert!(index.get_function(global).params.is_empty());

        // Unknown functions are memoized too.
        assert_eq!(global, index.function_symbol(&qn(&["strlen"])));
    }

    #[test]
    fn case_insensitive_method_lookup() {
        let mut index = ProjectIndex::new();
        index.add_file(FileFacts {
            classes: vec![{
                let mut c = ClassFact::stub(qn(&["App", "Svc"]), crate::tree::ClassKind::Class);
                c.methods.push(method("handleRequest", Visibility::Public));
                c
            }],
            functions: Vec::new(),
        });

        let id = index.type_symbol(&qn(&["App", "Svc"]));
        assert!(index.get_type(id).declared_method("HANDLEREQUEST").is_some());
    }
}
