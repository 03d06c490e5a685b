//! Name resolver: second pass over one file's tree
//!
//! Walks the same structure the scope builder walked, rebuilding the
//! namespace context incrementally, and matches every variable and name
//! occurrence against the declared symbols. Occurrences that cannot be
//! matched within the file are recorded as unresolved references, carrying
//! the qualified form a cross-file consumer would look up in the project
//! index.

use std::collections::{HashMap, HashSet};

use super::builder::{FileScopes, ScopeBuilder, COMPACT};
use super::scope::{ScopeId, ScopeTree};
use super::symbols::{SymbolId, SymbolKind, SymbolTable, UnresolvedReference};
use super::NamespaceContext;
use crate::names::QualifiedName;
use crate::tree::{
    Callee, ClassMember, ClassRef, ClosureExpr, Expr, File, MemberName, Name, NamespaceBody, Span,
    Stmt, UseKind, Var,
};

/// Fully resolved view of one file, output of both semantic passes.
pub struct SemanticModel {
    pub scope_tree: ScopeTree,
    pub symbol_table: SymbolTable,
    scopes_by_span: HashMap<Span, ScopeId>,
    resolutions: HashMap<Span, SymbolId>,
    unresolved: Vec<UnresolvedReference>,
}

impl SemanticModel {
    /// Runs the scope builder and the name resolver over one file.
    pub fn analyze(file: &File) -> SemanticModel {
        let scopes = ScopeBuilder::build(file);
        NameResolver::run(file, scopes)
    }

    /// The symbol an occurrence at `span` resolved to, if any.
    pub fn resolution(&self, span: Span) -> Option<SymbolId> {
        self.resolutions.get(&span).copied()
    }

    /// Declaration span of whatever the occurrence at `span` resolved to.
    pub fn declaration_of(&self, span: Span) -> Option<Span> {
        self.resolution(span)
            .map(|id| self.symbol_table.get(id).declaration)
    }

    /// Scope whose defining node has exactly this span.
    pub fn scope_at(&self, span: Span) -> Option<ScopeId> {
        self.scopes_by_span.get(&span).copied()
    }

    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    pub fn resolutions(&self) -> impl Iterator<Item = (Span, SymbolId)> + '_ {
        self.resolutions.iter().map(|(&span, &id)| (span, id))
    }
}

/// Class context while resolving inside a class body.
struct ClassContext {
    scope: ScopeId,
}

pub struct NameResolver {
    scope_tree: ScopeTree,
    symbol_table: SymbolTable,
    scopes_by_span: HashMap<Span, ScopeId>,
    class_scopes: HashMap<QualifiedName, ScopeId>,
    declaration_spans: HashSet<Span>,
    resolutions: HashMap<Span, SymbolId>,
    unresolved: Vec<UnresolvedReference>,
    current_scope: ScopeId,
    ctx: NamespaceContext,
    class_stack: Vec<ClassContext>,
}

impl NameResolver {
    pub fn run(file: &File, scopes: FileScopes) -> SemanticModel {
        let root = scopes.scope_tree.root().expect("builder created a root");
        let mut resolver = Self {
            scope_tree: scopes.scope_tree,
            symbol_table: scopes.symbol_table,
            scopes_by_span: scopes.scopes_by_span,
            class_scopes: scopes.class_scopes,
            declaration_spans: scopes.declaration_spans,
            resolutions: HashMap::new(),
            unresolved: Vec::new(),
            current_scope: root,
            ctx: NamespaceContext::new(),
            class_stack: Vec::new(),
        };

        for stmt in &file.stmts {
            resolver.visit_stmt(stmt);
        }

        SemanticModel {
            scope_tree: resolver.scope_tree,
            symbol_table: resolver.symbol_table,
            scopes_by_span: resolver.scopes_by_span,
            resolutions: resolver.resolutions,
            unresolved: resolver.unresolved,
        }
    }

    fn enter(&mut self, span: Span) -> ScopeId {
        let saved = self.current_scope;
        self.current_scope = *self
            .scopes_by_span
            .get(&span)
            .expect("builder created a scope for this node");
        saved
    }

    fn record(&mut self, id: SymbolId, span: Span) {
        self.symbol_table.add_usage(id, span);
        self.resolutions.insert(span, id);
    }

    fn record_unresolved(
        &mut self,
        name: String,
        span: Span,
        qualified_name: Option<QualifiedName>,
    ) {
        self.unresolved.push(UnresolvedReference {
            name,
            span,
            scope: self.current_scope,
            qualified_name,
        });
    }

    fn current_class(&self) -> Option<&ClassContext> {
        self.class_stack.last()
    }

    // -- statements ---------------------------------------------------------

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Namespace(ns) => match &ns.body {
                NamespaceBody::Braced(body) => {
                    let saved_ctx = self.ctx.clone();
                    let saved_scope = self.enter(ns.span);
                    self.ctx.enter_namespace(ns.name.as_ref());
                    for stmt in body {
                        self.visit_stmt(stmt);
                    }
                    self.current_scope = saved_scope;
                    self.ctx = saved_ctx;
                }
                NamespaceBody::Unbraced => {
                    self.ctx.enter_namespace(ns.name.as_ref());
                    self.enter(ns.span);
                }
            },
            Stmt::Use(stmt) => self.ctx.add_use(stmt),
            Stmt::Function(decl) => {
                let saved = self.enter(decl.span);
                for param in &decl.params {
                    if let Some(default) = &param.default {
                        self.visit_expr(default);
                    }
                }
                self.visit_stmts(&decl.body);
                self.current_scope = saved;
            }
            Stmt::Class(decl) => {
                let saved = self.enter(decl.span);
                self.class_stack.push(ClassContext {
                    scope: self.current_scope,
                });

                if let Some(extends) = &decl.extends {
                    self.resolve_type_name(extends);
                }
                for implemented in &decl.implements {
                    self.resolve_type_name(implemented);
                }

                for member in &decl.members {
                    match member {
                        ClassMember::Method(method) => {
                            for param in &method.params {
                                if let Some(default) = &param.default {
                                    self.visit_expr(default);
                                }
                            }
                            if let Some(body) = &method.body {
                                let outer = self.enter(method.span);
                                self.visit_stmts(body);
                                self.current_scope = outer;
                            }
                        }
                        ClassMember::Property(prop) => {
                            for entry in &prop.entries {
                                if let Some(default) = &entry.default {
                                    self.visit_expr(default);
                                }
                            }
                        }
                        ClassMember::Const(decl) => {
                            for entry in &decl.entries {
                                self.visit_expr(&entry.value);
                            }
                        }
                    }
                }

                self.class_stack.pop();
                self.current_scope = saved;
            }
            Stmt::Const(stmt) => {
                for entry in &stmt.entries {
                    self.visit_expr(&entry.value);
                }
            }
            // The builder declared these; the var spans are declaration
            // sites, not reads.
            Stmt::Global(_) => {}
            Stmt::StaticVars(stmt) => {
                for static_var in &stmt.vars {
                    if let Some(default) = &static_var.default {
                        self.visit_expr(default);
                    }
                }
            }
            Stmt::Expr(expr) => self.visit_expr(expr),
            Stmt::Echo(exprs) => {
                for expr in exprs {
                    self.visit_expr(expr);
                }
            }
            Stmt::Return(ret) => {
                if let Some(expr) = &ret.expr {
                    self.visit_expr(expr);
                }
            }
            Stmt::If(stmt) => {
                self.visit_expr(&stmt.cond);
                self.visit_stmts(&stmt.then);
                for (cond, body) in &stmt.elseifs {
                    self.visit_expr(cond);
                    self.visit_stmts(body);
                }
                if let Some(body) = &stmt.else_branch {
                    self.visit_stmts(body);
                }
            }
            Stmt::While(stmt) => {
                self.visit_expr(&stmt.cond);
                self.visit_stmts(&stmt.body);
            }
            Stmt::DoWhile(stmt) => {
                self.visit_stmts(&stmt.body);
                self.visit_expr(&stmt.cond);
            }
            Stmt::For(stmt) => {
                for expr in stmt.init.iter().chain(&stmt.cond).chain(&stmt.update) {
                    self.visit_expr(expr);
                }
                self.visit_stmts(&stmt.body);
            }
            Stmt::Foreach(stmt) => {
                self.visit_expr(&stmt.expr);
                self.visit_var(&stmt.value);
                if let Some(key) = &stmt.key {
                    self.visit_var(key);
                }
                self.visit_stmts(&stmt.body);
            }
            Stmt::Switch(stmt) => {
                self.visit_expr(&stmt.cond);
                for case in &stmt.cases {
                    if let Some(test) = &case.test {
                        self.visit_expr(test);
                    }
                    self.visit_stmts(&case.body);
                }
            }
            Stmt::Try(stmt) => {
                self.visit_stmts(&stmt.body);
                for catch in &stmt.catches {
                    for ty in &catch.types {
                        self.resolve_type_name(ty);
                    }
                    self.visit_stmts(&catch.body);
                }
                if let Some(body) = &stmt.finally {
                    self.visit_stmts(body);
                }
            }
            Stmt::Throw(expr) => self.visit_expr(expr),
            Stmt::Block(body) => self.visit_stmts(body),
            Stmt::Nop => {}
        }
    }

    fn visit_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
    }

    // -- expressions --------------------------------------------------------

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable(var) => self.visit_var(var),
            Expr::Literal(_) => {}
            Expr::Assign(assign) => {
                match &assign.target {
                    Expr::Variable(var) => self.visit_var(var),
                    other => self.visit_expr(other),
                }
                self.visit_expr(&assign.value);
            }
            Expr::Binary(bin) => {
                use crate::tree::BinaryOp;
                self.visit_expr(&bin.left);
                // `$x instanceof Foo` names a type on the right-hand side.
                if bin.op == BinaryOp::Instanceof {
                    if let Expr::ConstFetch(name) = &bin.right {
                        self.resolve_type_name(name);
                        return;
                    }
                }
                self.visit_expr(&bin.right);
            }
            Expr::Unary(unary) => self.visit_expr(&unary.expr),
            Expr::Ternary(ternary) => {
                self.visit_expr(&ternary.cond);
                if let Some(then) = &ternary.then {
                    self.visit_expr(then);
                }
                self.visit_expr(&ternary.else_branch);
            }
            Expr::Array(array) => {
                for item in &array.items {
                    if let Some(key) = &item.key {
                        self.visit_expr(key);
                    }
                    self.visit_expr(&item.value);
                }
            }
            Expr::FunctionCall(call) => {
                match &call.callee {
                    Callee::Name(name) => self.resolve_function_call(name, &call.args),
                    // Dynamic callee: the variable read resolves, the call
                    // target stays unknown.
                    Callee::Dynamic(callee) => self.visit_expr(callee),
                }
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            Expr::MethodCall(_) => self.visit_method_chain(expr),
            Expr::PropertyFetch(fetch) => {
                self.visit_expr(&fetch.receiver);
                if let MemberName::Fixed { name, span } = &fetch.prop {
                    if let Some(scope) = self.receiver_class_scope(&fetch.receiver) {
                        self.resolve_member(scope, SymbolKind::Field, name, *span);
                    }
                } else if let MemberName::Dynamic(member) = &fetch.prop {
                    self.visit_expr(member);
                }
            }
            Expr::StaticCall(call) => {
                let scope = self.resolve_class_ref(&call.class);
                if let MemberName::Fixed { name, span } = &call.method {
                    if let Some(scope) = scope {
                        self.resolve_member(scope, SymbolKind::Method, name, *span);
                    }
                } else if let MemberName::Dynamic(member) = &call.method {
                    self.visit_expr(member);
                }
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            Expr::StaticPropertyFetch(fetch) => {
                let scope = self.resolve_class_ref(&fetch.class);
                if let MemberName::Fixed { name, span } = &fetch.prop {
                    if let Some(scope) = scope {
                        self.resolve_member(scope, SymbolKind::Field, name, *span);
                    }
                } else if let MemberName::Dynamic(member) = &fetch.prop {
                    self.visit_expr(member);
                }
            }
            Expr::ClassConstFetch(fetch) => {
                let scope = self.resolve_class_ref(&fetch.class);
                // `Foo::class` is a name literal, not a constant access.
                if !fetch.constant.eq_ignore_ascii_case("class") {
                    if let Some(scope) = scope {
                        self.resolve_member(
                            scope,
                            SymbolKind::Constant,
                            &fetch.constant,
                            fetch.constant_span,
                        );
                    }
                }
            }
            Expr::ConstFetch(name) => self.resolve_const_fetch(name),
            Expr::New(new) => {
                self.resolve_class_ref(&new.class);
                for arg in &new.args {
                    self.visit_expr(arg);
                }
            }
            Expr::Closure(closure) => self.visit_closure(closure),
            Expr::ArrowFunction(arrow) => {
                let saved = self.enter(arrow.span);
                for param in &arrow.params {
                    if let Some(default) = &param.default {
                        self.visit_expr(default);
                    }
                }
                self.visit_expr(&arrow.body);
                self.current_scope = saved;
            }
            Expr::Yield(expr) => {
                if let Some(inner) = &expr.expr {
                    self.visit_expr(inner);
                }
            }
            Expr::Isset(isset) => {
                for expr in &isset.exprs {
                    self.visit_expr(expr);
                }
            }
            Expr::Cast(cast) => self.visit_expr(&cast.expr),
        }
    }

    /// `$a->b()->c()->d()` is unwound with an explicit stack so resolution
    /// depth does not grow with chain length.
    fn visit_method_chain(&mut self, expr: &Expr) {
        let mut chain: Vec<&crate::tree::MethodCallExpr> = Vec::new();
        let mut current = expr;
        while let Expr::MethodCall(call) = current {
            chain.push(call);
            current = &call.receiver;
        }
        self.visit_expr(current);

        // Only the innermost receiver can be a known class; return types
        // are not tracked, so every later link has an unknown receiver.
        let mut receiver_scope = self.receiver_class_scope(current);
        for call in chain.into_iter().rev() {
            match &call.method {
                MemberName::Fixed { name, span } => {
                    if let Some(scope) = receiver_scope {
                        self.resolve_member(scope, SymbolKind::Method, name, *span);
                    }
                }
                MemberName::Dynamic(member) => self.visit_expr(member),
            }
            for arg in &call.args {
                self.visit_expr(arg);
            }
            receiver_scope = None;
        }
    }

    fn visit_closure(&mut self, closure: &ClosureExpr) {
        // `use ($x)` reads the enclosing variable before entering the
        // closure scope. The copy inside the closure was declared by the
        // builder; the read is a usage of the outer symbol.
        for capture in &closure.uses {
            if let Some(outer) =
                self.symbol_table
                    .lookup_variable(&capture.var.name, self.current_scope, &self.scope_tree)
            {
                self.symbol_table.add_usage(outer, capture.var.span);
            }
        }

        let saved = self.enter(closure.span);
        for param in &closure.params {
            if let Some(default) = &param.default {
                self.visit_expr(default);
            }
        }
        self.visit_stmts(&closure.body);
        self.current_scope = saved;
    }

    // -- occurrence resolution ----------------------------------------------

    fn visit_var(&mut self, var: &Var) {
        // Declaration sites were handled by the builder.
        if self.declaration_spans.contains(&var.span) {
            return;
        }
        match self
            .symbol_table
            .lookup_variable(&var.name, self.current_scope, &self.scope_tree)
        {
            Some(id) => self.record(id, var.span),
            None => self.record_unresolved(var.name.clone(), var.span, None),
        }
    }

    fn resolve_function_call(&mut self, name: &Name, args: &[Expr]) {
        if name.is_simple() && name.last().eq_ignore_ascii_case(COMPACT) {
            self.resolve_compact_arguments(args);
            return;
        }

        match self.ctx.qualify_callable(UseKind::Function, name) {
            Some(qn) => match self.symbol_table.find_qualified(&qn) {
                Some(id) => self.record(id, name.span),
                None => self.record_unresolved(name.last().to_string(), name.span, Some(qn)),
            },
            // Unimported simple name: a declaration visible from here wins,
            // otherwise PHP falls back to the global namespace.
            None => {
                if let Some(id) = self.symbol_table.lookup(
                    name.last(),
                    SymbolKind::Function,
                    self.current_scope,
                    &self.scope_tree,
                ) {
                    self.record(id, name.span);
                    return;
                }
                let qn = QualifiedName::global(name.last());
                match self.symbol_table.find_qualified(&qn) {
                    Some(id) => self.record(id, name.span),
                    None => self.record_unresolved(name.last().to_string(), name.span, Some(qn)),
                }
            }
        }
    }

    /// `compact('a', 'b')` reads `$a` and `$b` by name; each literal
    /// argument resolves like a variable occurrence at the literal's span.
    fn resolve_compact_arguments(&mut self, args: &[Expr]) {
        for arg in args {
            let Expr::Literal(lit) = arg else { continue };
            let Some(raw) = lit.as_string() else { continue };
            let var_name = format!("${raw}");
            match self
                .symbol_table
                .lookup_variable(&var_name, self.current_scope, &self.scope_tree)
            {
                Some(id) => self.record(id, lit.span),
                None => self.record_unresolved(var_name, lit.span, None),
            }
        }
    }

    fn resolve_const_fetch(&mut self, name: &Name) {
        match self.ctx.qualify_callable(UseKind::Const, name) {
            Some(qn) => match self.symbol_table.find_qualified(&qn) {
                Some(id) => self.record(id, name.span),
                None => self.record_unresolved(name.last().to_string(), name.span, Some(qn)),
            },
            None => {
                if let Some(id) = self.symbol_table.lookup(
                    name.last(),
                    SymbolKind::Constant,
                    self.current_scope,
                    &self.scope_tree,
                ) {
                    self.record(id, name.span);
                    return;
                }
                let qn = QualifiedName::global(name.last());
                match self.symbol_table.find_qualified(&qn) {
                    Some(id) => self.record(id, name.span),
                    None => self.record_unresolved(name.last().to_string(), name.span, Some(qn)),
                }
            }
        }
    }

    /// Resolves a name in type position and returns the matching class
    /// scope when the class is declared in this file.
    fn resolve_type_name(&mut self, name: &Name) -> Option<ScopeId> {
        let qn = self.ctx.qualify_type(name);
        match self.symbol_table.find_qualified(&qn) {
            Some(id) => self.record(id, name.span),
            None => self.record_unresolved(name.last().to_string(), name.span, Some(qn.clone())),
        }
        self.class_scopes.get(&qn).copied()
    }

    fn resolve_class_ref(&mut self, class: &ClassRef) -> Option<ScopeId> {
        match class {
            ClassRef::Name(name) => self.resolve_type_name(name),
            ClassRef::SelfKeyword(_) | ClassRef::StaticKeyword(_) => {
                self.current_class().map(|c| c.scope)
            }
            ClassRef::ParentKeyword(_) => {
                let class = self.current_class()?.scope;
                self.scope_tree.get(class).superclass_scope
            }
            ClassRef::Dynamic(expr) => {
                self.visit_expr(expr);
                None
            }
        }
    }

    /// The class scope an instance member access on `receiver` looks in.
    /// Only `$this` is tracked; other receivers have unknown types.
    fn receiver_class_scope(&self, receiver: &Expr) -> Option<ScopeId> {
        match receiver {
            Expr::Variable(var) if var.name == "$this" => self.current_class().map(|c| c.scope),
            _ => None,
        }
    }

    /// Member lookup in a class scope, falling through the same-file
    /// superclass chain. The chain only ever points to classes declared
    /// earlier in the file, so it cannot loop.
    fn resolve_member(&mut self, scope: ScopeId, kind: SymbolKind, name: &str, span: Span) {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(found) = self.symbol_table.symbol_in_scope(name, kind, id) {
                self.record(found, span);
                return;
            }
            current = self.scope_tree.get(id).superclass_scope;
        }
        self.record_unresolved(name.to_string(), span, None);
    }
}
