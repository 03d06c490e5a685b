//! Scope graph builder: first pass over one file's tree
//!
//! Declares every symbol into its scope, builds the per-namespace alias
//! tables and links same-file class scopes to their superclass scopes. Name
//! uses are not resolved here; that is the resolver's pass.

use std::collections::{HashMap, HashSet};

use super::scope::{ScopeId, ScopeKind, ScopeTree};
use super::symbols::{AssignedValue, SymbolId, SymbolKind, SymbolTable};
use super::NamespaceContext;
use crate::names::QualifiedName;
use crate::tree::{
    Callee, ClassDecl, ClassKind, ClassMember, ClosureExpr, Expr, File, FunctionDecl, MethodDecl,
    Modifier, NamespaceBody, Param, Span, Stmt, Var,
};

/// Name of the builtin that reads local variables by name at runtime.
/// A call with a non-literal argument defeats precise local-variable
/// resolution in the surrounding scope.
pub(crate) const COMPACT: &str = "compact";

/// Scope graph of one file, output of the builder and input to the resolver.
pub struct FileScopes {
    pub scope_tree: ScopeTree,
    pub symbol_table: SymbolTable,
    pub(crate) scopes_by_span: HashMap<Span, ScopeId>,
    pub(crate) class_scopes: HashMap<QualifiedName, ScopeId>,
    pub(crate) declaration_spans: HashSet<Span>,
}

pub struct ScopeBuilder {
    scope_tree: ScopeTree,
    symbol_table: SymbolTable,
    scopes_by_span: HashMap<Span, ScopeId>,
    class_scopes: HashMap<QualifiedName, ScopeId>,
    declaration_spans: HashSet<Span>,
    current_scope: Option<ScopeId>,
    ctx: NamespaceContext,
}

impl ScopeBuilder {
    fn new() -> Self {
        Self {
            scope_tree: ScopeTree::new(),
            symbol_table: SymbolTable::new(),
            scopes_by_span: HashMap::new(),
            class_scopes: HashMap::new(),
            declaration_spans: HashSet::new(),
            current_scope: None,
            ctx: NamespaceContext::new(),
        }
    }

    pub fn build(file: &File) -> FileScopes {
        let mut builder = Self::new();
        let global = builder
            .scope_tree
            .create_scope(ScopeKind::Global, None, Span::NONE);
        builder.current_scope = Some(global);

        for stmt in &file.stmts {
            builder.visit_stmt(stmt);
        }

        FileScopes {
            scope_tree: builder.scope_tree,
            symbol_table: builder.symbol_table,
            scopes_by_span: builder.scopes_by_span,
            class_scopes: builder.class_scopes,
            declaration_spans: builder.declaration_spans,
        }
    }

    fn current(&self) -> ScopeId {
        self.current_scope.expect("builder always has a scope")
    }

    fn global_scope(&self) -> ScopeId {
        self.scope_tree.root().expect("root scope exists")
    }

    /// The scope that owns local variables at the current position: the
    /// innermost function-like scope, or the global scope at file level.
    fn variable_home(&self) -> ScopeId {
        self.scope_tree.enclosing_function_like(self.current())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Namespace(ns) => match &ns.body {
                NamespaceBody::Braced(body) => {
                    let saved_ctx = self.ctx.clone();
                    let saved_scope = self.current_scope;
                    self.ctx.enter_namespace(ns.name.as_ref());

                    let scope = self.scope_tree.create_scope(
                        ScopeKind::Namespace,
                        self.current_scope,
                        ns.span,
                    );
                    self.scopes_by_span.insert(ns.span, scope);
                    self.current_scope = Some(scope);
                    for stmt in body {
                        self.visit_stmt(stmt);
                    }
                    self.current_scope = saved_scope;
                    self.ctx = saved_ctx;
                }
                NamespaceBody::Unbraced => {
                    // Applies to the rest of the file; no restore.
                    self.ctx.enter_namespace(ns.name.as_ref());
                    let scope = self.scope_tree.create_scope(
                        ScopeKind::Namespace,
                        Some(self.global_scope()),
                        ns.span,
                    );
                    self.scopes_by_span.insert(ns.span, scope);
                    self.current_scope = Some(scope);
                }
            },
            Stmt::Use(stmt) => self.ctx.add_use(stmt),
            Stmt::Function(decl) => self.visit_function_decl(decl),
            Stmt::Class(decl) => self.visit_class_decl(decl),
            Stmt::Const(stmt) => {
                for entry in &stmt.entries {
                    let qn = self.ctx.qualified(&entry.name);
                    self.declare(
                        &entry.name,
                        SymbolKind::Constant,
                        self.current(),
                        entry.name_span,
                        Some(qn),
                        Vec::new(),
                    );
                    self.visit_expr(&entry.value);
                }
            }
            Stmt::Global(stmt) => {
                for var in &stmt.vars {
                    self.import_global_variable(var);
                }
            }
            Stmt::StaticVars(stmt) => {
                for static_var in &stmt.vars {
                    let id = self.import_global_variable(&static_var.var);
                    if let Some(default) = &static_var.default {
                        self.record_assignment(id, default);
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
                if let Some(key) = &stmt.key {
                    let id = self.declare_variable(key);
                    self.symbol_table.record_assignment(id, None);
                }
                let id = self.declare_variable(&stmt.value);
                // Iteration assigns an unknown number of values.
                self.symbol_table.record_assignment(id, None);
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
                    if let Some(var) = &catch.var {
                        let id = self.declare_variable(var);
                        self.symbol_table.record_assignment(id, None);
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

    fn visit_function_decl(&mut self, decl: &FunctionDecl) {
        let qn = self.ctx.qualified(&decl.name);
        self.declare(
            &decl.name,
            SymbolKind::Function,
            self.current(),
            decl.name_span,
            Some(qn),
            Vec::new(),
        );
        self.enter_function_like(ScopeKind::Function, decl.span, &decl.params, false);
        self.visit_stmts(&decl.body);
        self.leave_scope();
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        let qn = self.ctx.qualified(&decl.name);
        let modifiers = match decl.kind {
            ClassKind::AbstractClass => vec![Modifier::Abstract],
            ClassKind::FinalClass => vec![Modifier::Final],
            _ => Vec::new(),
        };
        self.declare(
            &decl.name,
            SymbolKind::Class,
            self.current(),
            decl.name_span,
            Some(qn.clone()),
            modifiers,
        );

        let parent = self.current_scope;
        let class_scope = self
            .scope_tree
            .create_scope(ScopeKind::Class, parent, decl.span);
        self.scopes_by_span.insert(decl.span, class_scope);
        self.class_scopes.insert(qn.clone(), class_scope);

        // Member lookup falls through to the superclass only when it was
        // declared earlier in this same file. The link therefore always
        // points backwards, which keeps the fallthrough chain acyclic.
        if let Some(extends) = &decl.extends {
            let super_qn = self.ctx.qualify_type(extends);
            if let Some(&super_scope) = self.class_scopes.get(&super_qn) {
                self.scope_tree.set_superclass_scope(class_scope, super_scope);
            }
        }

        self.current_scope = Some(class_scope);

        for member in &decl.members {
            match member {
                ClassMember::Method(method) => self.visit_method(&qn, class_scope, method),
                ClassMember::Property(prop) => {
                    for entry in &prop.entries {
                        self.declare(
                            &entry.name,
                            SymbolKind::Field,
                            class_scope,
                            entry.name_span,
                            Some(qn.field_member(&entry.name)),
                            prop.modifiers.clone(),
                        );
                        if let Some(default) = &entry.default {
                            self.visit_expr(default);
                        }
                    }
                }
                ClassMember::Const(decl) => {
                    for entry in &decl.entries {
                        self.declare(
                            &entry.name,
                            SymbolKind::Constant,
                            class_scope,
                            entry.name_span,
                            Some(qn.member(&entry.name)),
                            decl.modifiers.clone(),
                        );
                        self.visit_expr(&entry.value);
                    }
                }
            }
        }

        self.current_scope = parent;
    }

    fn visit_method(&mut self, class_qn: &QualifiedName, class_scope: ScopeId, method: &MethodDecl) {
        self.declare(
            &method.name,
            SymbolKind::Method,
            class_scope,
            method.name_span,
            Some(class_qn.member(&method.name)),
            method.modifiers.clone(),
        );

        // Promoted constructor parameters double as field declarations.
        if method.name.eq_ignore_ascii_case("__construct") {
            for param in &method.params {
                if !param.promoted.is_empty() {
                    let field = param.var.name.trim_start_matches('$');
                    self.declare(
                        field,
                        SymbolKind::Field,
                        class_scope,
                        param.var.span,
                        Some(class_qn.field_member(field)),
                        param.promoted.clone(),
                    );
                }
            }
        }

        if let Some(body) = &method.body {
            let is_static = method.modifiers.contains(&Modifier::Static);
            self.enter_function_like(ScopeKind::Method, method.span, &method.params, !is_static);
            self.visit_stmts(body);
            self.leave_scope();
        }
    }

    fn enter_function_like(
        &mut self,
        kind: ScopeKind,
        span: Span,
        params: &[Param],
        binds_this: bool,
    ) {
        let scope = self
            .scope_tree
            .create_scope(kind, self.current_scope, span);
        self.scopes_by_span.insert(span, scope);
        self.current_scope = Some(scope);

        if binds_this {
            self.symbol_table.declare(
                &mut self.scope_tree,
                "$this",
                SymbolKind::Variable,
                scope,
                Span::NONE,
                None,
                Vec::new(),
            );
        }

        for param in params {
            self.declare(
                &param.var.name,
                SymbolKind::Parameter,
                scope,
                param.var.span,
                None,
                param.promoted.clone(),
            );
            if let Some(default) = &param.default {
                self.visit_expr(default);
            }
        }
    }

    fn leave_scope(&mut self) {
        let parent = self.scope_tree.get(self.current()).parent;
        self.current_scope = parent;
    }

    fn declare(
        &mut self,
        name: &str,
        kind: SymbolKind,
        scope: ScopeId,
        span: Span,
        qualified_name: Option<QualifiedName>,
        modifiers: Vec<Modifier>,
    ) -> SymbolId {
        if !span.is_none() {
            self.declaration_spans.insert(span);
        }
        self.symbol_table.declare(
            &mut self.scope_tree,
            name,
            kind,
            scope,
            span,
            qualified_name,
            modifiers,
        )
    }

    /// First write to `$x` in a scope declares it; later writes reuse the
    /// visible symbol.
    fn declare_variable(&mut self, var: &Var) -> SymbolId {
        if let Some(id) =
            self.symbol_table
                .lookup_variable(&var.name, self.current(), &self.scope_tree)
        {
            return id;
        }
        let home = self.variable_home();
        self.declare(&var.name, SymbolKind::Variable, home, var.span, None, Vec::new())
    }

    /// `global $x;` / `static $x;`: the symbol lives in the global scope and
    /// is aliased into the current function scope, so every such statement
    /// in the file shares one symbol.
    fn import_global_variable(&mut self, var: &Var) -> SymbolId {
        let global = self.global_scope();
        let id = match self
            .symbol_table
            .symbol_in_scope(&var.name, SymbolKind::Variable, global)
        {
            Some(id) => id,
            None => self.declare(&var.name, SymbolKind::Variable, global, var.span, None, Vec::new()),
        };
        let home = self.variable_home();
        if home != global {
            self.symbol_table.alias_into_scope(home, id);
        }
        id
    }

    fn record_assignment(&mut self, id: SymbolId, value: &Expr) {
        let literal = match value {
            Expr::Literal(lit) => Some(lit.kind.clone()),
            _ => None,
        };
        self.symbol_table.record_assignment(
            id,
            Some(AssignedValue {
                span: value.span(),
                literal,
            }),
        );
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable(_) | Expr::Literal(_) | Expr::ConstFetch(_) => {}
            Expr::Assign(assign) => {
                if let Expr::Variable(var) = &assign.target {
                    let id = self.declare_variable(var);
                    if assign.by_ref {
                        // Reference assignments defeat value tracking.
                        self.symbol_table.record_assignment(id, None);
                    } else {
                        self.record_assignment(id, &assign.value);
                    }
                } else {
                    self.visit_expr(&assign.target);
                }
                self.visit_expr(&assign.value);
            }
            Expr::Binary(bin) => {
                self.visit_expr(&bin.left);
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
                    Callee::Name(name) => {
                        if name.is_simple() && name.last().eq_ignore_ascii_case(COMPACT) {
                            self.visit_compact_call(&call.args);
                        }
                    }
                    Callee::Dynamic(callee) => self.visit_expr(callee),
                }
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            Expr::MethodCall(call) => {
                self.visit_expr(&call.receiver);
                if let crate::tree::MemberName::Dynamic(member) = &call.method {
                    self.visit_expr(member);
                }
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            Expr::PropertyFetch(fetch) => {
                self.visit_expr(&fetch.receiver);
                if let crate::tree::MemberName::Dynamic(member) = &fetch.prop {
                    self.visit_expr(member);
                }
            }
            Expr::StaticCall(call) => {
                self.visit_class_ref(&call.class);
                if let crate::tree::MemberName::Dynamic(member) = &call.method {
                    self.visit_expr(member);
                }
                for arg in &call.args {
                    self.visit_expr(arg);
                }
            }
            Expr::StaticPropertyFetch(fetch) => {
                self.visit_class_ref(&fetch.class);
                if let crate::tree::MemberName::Dynamic(member) = &fetch.prop {
                    self.visit_expr(member);
                }
            }
            Expr::ClassConstFetch(fetch) => self.visit_class_ref(&fetch.class),
            Expr::New(new) => {
                self.visit_class_ref(&new.class);
                for arg in &new.args {
                    self.visit_expr(arg);
                }
            }
            Expr::Closure(closure) => self.visit_closure(closure),
            Expr::ArrowFunction(arrow) => {
                self.enter_function_like(ScopeKind::ArrowFunction, arrow.span, &arrow.params, false);
                self.visit_expr(&arrow.body);
                self.leave_scope();
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

    fn visit_class_ref(&mut self, class: &crate::tree::ClassRef) {
        if let crate::tree::ClassRef::Dynamic(expr) = class {
            self.visit_expr(expr);
        }
    }

    fn visit_closure(&mut self, closure: &ClosureExpr) {
        let enclosing = self.current();
        let scope = self
            .scope_tree
            .create_scope(ScopeKind::Closure, Some(enclosing), closure.span);
        self.scopes_by_span.insert(closure.span, scope);
        self.current_scope = Some(scope);

        // `use ($x)` copies the enclosing variable into the closure; the
        // copy is a new declaration here, the read of the outer variable is
        // recorded by the resolver.
        for capture in &closure.uses {
            self.declare(
                &capture.var.name,
                SymbolKind::Variable,
                scope,
                capture.var.span,
                None,
                Vec::new(),
            );
        }

        for param in &closure.params {
            self.declare(
                &param.var.name,
                SymbolKind::Parameter,
                scope,
                param.var.span,
                None,
                Vec::new(),
            );
            if let Some(default) = &param.default {
                self.visit_expr(default);
            }
        }

        self.visit_stmts(&closure.body);
        self.current_scope = Some(enclosing);
    }

    /// `compact('a', 'b')` reads `$a` and `$b`; `compact($names)` can read
    /// anything, which taints the whole scope.
    fn visit_compact_call(&mut self, args: &[Expr]) {
        let any_dynamic = args.iter().any(|arg| {
            !matches!(arg, Expr::Literal(lit) if lit.as_string().is_some())
        });
        if any_dynamic {
            let home = self.variable_home();
            self.scope_tree.mark_unresolved_compact(home);
        }
    }
}
