//! Declaration harvester: one file's tree to declaration facts
//!
//! A pure function over the tree. Carries its own namespace/alias tracking
//! (the same incremental view the semantic passes build) and records declared
//! superclass/interface names fully qualified but unchecked. Derived flags
//! come from a bounded sub-walk that never descends into nested
//! function-likes, so a `return` inside a closure does not count as the
//! enclosing function returning.

use crate::config::TestsConfig;
use crate::index::facts::{
    ClassFact, FileFacts, FunctionFact, MethodFact, ParameterFact, Visibility,
};
use crate::semantic::NamespaceContext;
use crate::tree::{
    Callee, ClassDecl, ClassMember, Expr, File, FunctionDecl, MethodDecl, Modifier, Name,
    NamespaceBody, Param, Stmt,
};

const FUNC_GET_ARGS: &str = "func_get_args";

pub fn harvest(file: &File, tests: &TestsConfig) -> FileFacts {
    let mut harvester = Harvester {
        ctx: NamespaceContext::new(),
        facts: FileFacts::default(),
        tests,
    };
    harvester.visit_stmts(&file.stmts);
    harvester.facts
}

struct Harvester<'a> {
    ctx: NamespaceContext,
    facts: FileFacts,
    tests: &'a TestsConfig,
}

impl Harvester<'_> {
    fn visit_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Namespace(ns) => match &ns.body {
                NamespaceBody::Braced(body) => {
                    let saved = self.ctx.clone();
                    self.ctx.enter_namespace(ns.name.as_ref());
                    self.visit_stmts(body);
                    self.ctx = saved;
                }
                NamespaceBody::Unbraced => self.ctx.enter_namespace(ns.name.as_ref()),
            },
            Stmt::Use(stmt) => self.ctx.add_use(stmt),
            Stmt::Function(decl) => {
                let fact = self.function_fact(decl);
                self.facts.functions.push(fact);
            }
            Stmt::Class(decl) => {
                let fact = self.class_fact(decl);
                self.facts.classes.push(fact);
            }
            // Conditionally declared functions and classes still count.
            Stmt::If(stmt) => {
                self.visit_stmts(&stmt.then);
                for (_, body) in &stmt.elseifs {
                    self.visit_stmts(body);
                }
                if let Some(body) = &stmt.else_branch {
                    self.visit_stmts(body);
                }
            }
            Stmt::While(stmt) => self.visit_stmts(&stmt.body),
            Stmt::DoWhile(stmt) => self.visit_stmts(&stmt.body),
            Stmt::For(stmt) => self.visit_stmts(&stmt.body),
            Stmt::Foreach(stmt) => self.visit_stmts(&stmt.body),
            Stmt::Switch(stmt) => {
                for case in &stmt.cases {
                    self.visit_stmts(&case.body);
                }
            }
            Stmt::Try(stmt) => {
                self.visit_stmts(&stmt.body);
                for catch in &stmt.catches {
                    self.visit_stmts(&catch.body);
                }
                if let Some(body) = &stmt.finally {
                    self.visit_stmts(body);
                }
            }
            Stmt::Block(body) => self.visit_stmts(body),
            _ => {}
        }
    }

    fn function_fact(&self, decl: &FunctionDecl) -> FunctionFact {
        let flags = BodyFlags::of(&decl.body);
        FunctionFact {
            name: self.ctx.qualified(&decl.name),
            params: decl.params.iter().map(parameter_fact).collect(),
            has_return: flags.has_return,
            uses_func_get_args: flags.uses_func_get_args,
            has_return_type: decl.return_type.is_some(),
            returns_void: decl.return_type.as_ref().is_some_and(|t| t.is_void()),
            declaration: decl.name_span,
        }
    }

    fn class_fact(&self, decl: &ClassDecl) -> ClassFact {
        let methods = decl
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::Method(method) => Some(self.method_fact(method)),
                _ => None,
            })
            .collect();

        ClassFact {
            name: self.ctx.qualified(&decl.name),
            kind: decl.kind,
            superclass: decl.extends.as_ref().map(|n| self.ctx.qualify_type(n)),
            interfaces: decl
                .implements
                .iter()
                .map(|n| self.ctx.qualify_type(n))
                .collect(),
            methods,
            declaration: decl.name_span,
        }
    }

    fn method_fact(&self, method: &MethodDecl) -> MethodFact {
        let flags = method
            .body
            .as_deref()
            .map(BodyFlags::of)
            .unwrap_or_default();

        MethodFact {
            name: method.name.clone(),
            visibility: Visibility::from_modifiers(&method.modifiers),
            is_static: method.modifiers.contains(&Modifier::Static),
            is_abstract: method.modifiers.contains(&Modifier::Abstract),
            is_final: method.modifiers.contains(&Modifier::Final),
            params: method.params.iter().map(parameter_fact).collect(),
            has_return: flags.has_return,
            uses_func_get_args: flags.uses_func_get_args,
            is_test: self.is_test_method(method),
            has_return_type: method.return_type.is_some(),
            returns_void: method.return_type.as_ref().is_some_and(|t| t.is_void()),
            declaration: method.name_span,
        }
    }

    fn is_test_method(&self, method: &MethodDecl) -> bool {
        if self
            .tests
            .prefixes
            .iter()
            .any(|p| starts_with_ignore_case(&method.name, p))
        {
            return true;
        }
        if let Some(doc) = &method.doc_comment {
            if self.tests.annotations.iter().any(|a| doc.contains(a.as_str())) {
                return true;
            }
        }
        method.attributes.iter().any(|attr| {
            self.tests
                .attributes
                .iter()
                .any(|wanted| attribute_matches(attr, wanted))
        })
    }
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// An attribute matches a configured name either exactly or by its last
/// segment, so `#[Test]` and `#[PHPUnit\Framework\Attributes\Test]` both
/// match `"Test"`.
fn attribute_matches(attr: &Name, wanted: &str) -> bool {
    if attr.last().eq_ignore_ascii_case(wanted) {
        return true;
    }
    attr.parts.join("\\").eq_ignore_ascii_case(wanted)
}

fn parameter_fact(param: &Param) -> ParameterFact {
    ParameterFact {
        name: param.var.name.clone(),
        type_hint: param.type_hint.as_ref().map(|t| t.text.clone()),
        has_default: param.default.is_some(),
        variadic: param.variadic,
        by_ref: param.by_ref,
    }
}

/// Flags derived from a function or method body. The walk stays inside the
/// body it was given: nested closures, arrow functions, named functions and
/// classes are skipped.
#[derive(Default)]
struct BodyFlags {
    has_return: bool,
    uses_func_get_args: bool,
}

impl BodyFlags {
    fn of(stmts: &[Stmt]) -> Self {
        let mut flags = Self::default();
        flags.scan_stmts(stmts);
        flags
    }

    fn scan_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.scan_stmt(stmt);
        }
    }

    fn scan_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Return(ret) => {
                if let Some(expr) = &ret.expr {
                    self.has_return = true;
                    self.scan_expr(expr);
                }
            }
            Stmt::Function(_) | Stmt::Class(_) => {}
            Stmt::Expr(expr) | Stmt::Throw(expr) => self.scan_expr(expr),
            Stmt::Echo(exprs) => {
                for expr in exprs {
                    self.scan_expr(expr);
                }
            }
            Stmt::If(stmt) => {
                self.scan_expr(&stmt.cond);
                self.scan_stmts(&stmt.then);
                for (cond, body) in &stmt.elseifs {
                    self.scan_expr(cond);
                    self.scan_stmts(body);
                }
                if let Some(body) = &stmt.else_branch {
                    self.scan_stmts(body);
                }
            }
            Stmt::While(stmt) => {
                self.scan_expr(&stmt.cond);
                self.scan_stmts(&stmt.body);
            }
            Stmt::DoWhile(stmt) => {
                self.scan_stmts(&stmt.body);
                self.scan_expr(&stmt.cond);
            }
            Stmt::For(stmt) => {
                for expr in stmt.init.iter().chain(&stmt.cond).chain(&stmt.update) {
                    self.scan_expr(expr);
                }
                self.scan_stmts(&stmt.body);
            }
            Stmt::Foreach(stmt) => {
                self.scan_expr(&stmt.expr);
                self.scan_stmts(&stmt.body);
            }
            Stmt::Switch(stmt) => {
                self.scan_expr(&stmt.cond);
                for case in &stmt.cases {
                    if let Some(test) = &case.test {
                        self.scan_expr(test);
                    }
                    self.scan_stmts(&case.body);
                }
            }
            Stmt::Try(stmt) => {
                self.scan_stmts(&stmt.body);
                for catch in &stmt.catches {
                    self.scan_stmts(&catch.body);
                }
                if let Some(body) = &stmt.finally {
                    self.scan_stmts(body);
                }
            }
            Stmt::Block(body) => self.scan_stmts(body),
            _ => {}
        }
    }

    fn scan_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Yield(inner) => {
                // A generator "returns" values through yield.
                self.has_return = true;
                if let Some(expr) = &inner.expr {
                    self.scan_expr(expr);
                }
            }
            Expr::FunctionCall(call) => {
                if let Callee::Name(name) = &call.callee {
                    if name.is_simple() && name.last().eq_ignore_ascii_case(FUNC_GET_ARGS) {
                        self.uses_func_get_args = true;
                    }
                } else if let Callee::Dynamic(callee) = &call.callee {
                    self.scan_expr(callee);
                }
                for arg in &call.args {
                    self.scan_expr(arg);
                }
            }
            Expr::Closure(_) | Expr::ArrowFunction(_) => {}
            Expr::Assign(e) => {
                self.scan_expr(&e.target);
                self.scan_expr(&e.value);
            }
            Expr::Binary(e) => {
                self.scan_expr(&e.left);
                self.scan_expr(&e.right);
            }
            Expr::Unary(e) => self.scan_expr(&e.expr),
            Expr::Ternary(e) => {
                self.scan_expr(&e.cond);
                if let Some(then) = &e.then {
                    self.scan_expr(then);
                }
                self.scan_expr(&e.else_branch);
            }
            Expr::Array(e) => {
                for item in &e.items {
                    if let Some(key) = &item.key {
                        self.scan_expr(key);
                    }
                    self.scan_expr(&item.value);
                }
            }
            Expr::MethodCall(e) => {
                self.scan_expr(&e.receiver);
                for arg in &e.args {
                    self.scan_expr(arg);
                }
            }
            Expr::PropertyFetch(e) => self.scan_expr(&e.receiver),
            Expr::StaticCall(e) => {
                for arg in &e.args {
                    self.scan_expr(arg);
                }
            }
            Expr::New(e) => {
                for arg in &e.args {
                    self.scan_expr(arg);
                }
            }
            Expr::Isset(e) => {
                for expr in &e.exprs {
                    self.scan_expr(expr);
                }
            }
            Expr::Cast(e) => self.scan_expr(&e.expr),
            _ => {}
        }
    }
}
