//! Integration tests for the per-file semantic pipeline
//!
//! Builds trees the way the parser layer would and checks resolution
//! behavior across namespaces, aliases, closures and variable scoping.

use phare_core::names::QualifiedName;
use phare_core::semantic::{SemanticModel, SymbolKind};
use phare_core::tree::{
    AssignExpr, Callee, ClassRef, ClosureExpr, ClosureUse, Expr, File, FunctionCallExpr,
    FunctionDecl, GlobalStmt, Literal, Name, NamespaceBody, NamespaceStmt, NewExpr, Param, Span,
    Stmt, UseClause, UseKind, UseStmt, Var,
};

fn sp(lo: u32, hi: u32) -> Span {
    Span::new(lo, hi)
}

fn assign(name: &str, lo: u32, hi: u32, value: Expr) -> Stmt {
    let span = sp(lo, value.span().hi);
    Stmt::Expr(Expr::Assign(Box::new(AssignExpr {
        target: Expr::Variable(Var::new(name, sp(lo, hi))),
        value,
        by_ref: false,
        span,
    })))
}

fn function(name: &str, name_span: Span, span: Span, params: Vec<Param>, body: Vec<Stmt>) -> Stmt {
    Stmt::Function(FunctionDecl {
        name: name.to_string(),
        name_span,
        params,
        return_type: None,
        body,
        doc_comment: None,
        attributes: Vec::new(),
        span,
    })
}

fn new_class(name: Name, span: Span) -> Stmt {
    Stmt::Expr(Expr::New(Box::new(NewExpr {
        class: ClassRef::Name(name),
        args: Vec::new(),
        span,
    })))
}

/// `namespace N1; use A as B; new A(); new B();`
///
/// The unaliased `A` resolves namespace-relative to `N1\A`; the alias `B`
/// points at the global `A` even though the target looks unrelated.
#[test]
fn alias_overrides_namespace_relative_resolution() {
    let file = File::new(vec![
        Stmt::Namespace(NamespaceStmt {
            name: Some(Name::unqualified("N1", sp(10, 12))),
            body: NamespaceBody::Unbraced,
            span: sp(0, 13),
        }),
        Stmt::Use(UseStmt {
            kind: UseKind::Class,
            clauses: vec![UseClause {
                name: Name::unqualified("A", sp(18, 19)),
                alias: Some("B".to_string()),
            }],
            span: sp(14, 25),
        }),
        new_class(Name::unqualified("A", sp(30, 31)), sp(26, 33)),
        new_class(Name::unqualified("B", sp(40, 41)), sp(36, 43)),
    ]);

    let model = SemanticModel::analyze(&file);

    let qualified: Vec<_> = model
        .unresolved()
        .iter()
        .filter_map(|r| r.qualified_name.clone())
        .collect();
    assert_eq!(
        qualified,
        vec![
            QualifiedName::new(["N1", "A"]).unwrap(),
            QualifiedName::global("A"),
        ]
    );
    assert_eq!(qualified[0].to_string(), "N1\\A");
}

#[test]
fn global_statement_shares_one_symbol_across_functions() {
    let make_fn = |name: &str, name_span: Span, span: Span, global_span: Span, use_span: Span| {
        function(
            name,
            name_span,
            span,
            Vec::new(),
            vec![
                Stmt::Global(GlobalStmt {
                    vars: vec![Var::new("$counter", global_span)],
                    span: global_span,
                }),
                Stmt::Echo(vec![Expr::Variable(Var::new("$counter", use_span))]),
            ],
        )
    };

    let file = File::new(vec![
        make_fn("first", sp(9, 14), sp(0, 60), sp(20, 28), sp(40, 48)),
        make_fn("second", sp(70, 76), sp(62, 130), sp(82, 90), sp(100, 108)),
    ]);

    let model = SemanticModel::analyze(&file);

    let a = model.resolution(sp(40, 48)).expect("first read resolves");
    let b = model.resolution(sp(100, 108)).expect("second read resolves");
    assert_eq!(a, b);

    let symbol = model.symbol_table.get(a);
    assert_eq!(symbol.kind, SymbolKind::Variable);
    assert_eq!(symbol.usages, vec![sp(40, 48), sp(100, 108)]);
}

#[test]
fn closure_capture_and_arrow_transparency_in_one_function() {
    // function f() { $x = 1; $c = function () use ($x) { return $x; };
    //                $a = fn () => $x; }
    let closure = Expr::Closure(Box::new(ClosureExpr {
        params: Vec::new(),
        uses: vec![ClosureUse {
            var: Var::new("$x", sp(50, 52)),
            by_ref: false,
        }],
        body: vec![Stmt::Return(phare_core::tree::ReturnStmt {
            expr: Some(Expr::Variable(Var::new("$x", sp(60, 62)))),
            span: sp(53, 63),
        })],
        is_static: false,
        span: sp(40, 70),
    }));
    let arrow = Expr::ArrowFunction(Box::new(phare_core::tree::ArrowFunctionExpr {
        params: Vec::new(),
        body: Expr::Variable(Var::new("$x", sp(90, 92))),
        is_static: false,
        span: sp(80, 94),
    }));
    let file = File::new(vec![function(
        "f",
        sp(9, 10),
        sp(0, 100),
        Vec::new(),
        vec![
            assign("$x", 20, 22, Expr::Literal(Literal::int(1, sp(25, 26)))),
            assign("$c", 30, 32, closure),
            assign("$a", 75, 77, arrow),
        ],
    )]);

    let model = SemanticModel::analyze(&file);

    let outer = model.resolution(sp(90, 92)).expect("arrow body resolves");
    assert_eq!(model.symbol_table.get(outer).declaration, sp(20, 22));

    // The closure body resolves to the captured copy, not the outer local.
    let inner = model.resolution(sp(60, 62)).expect("closure body resolves");
    assert_ne!(inner, outer);
    assert_eq!(model.symbol_table.get(inner).declaration, sp(50, 52));

    // The capture itself reads the outer variable.
    assert!(model.symbol_table.get(outer).usages.contains(&sp(50, 52)));
}

#[test]
fn compact_with_literal_and_dynamic_arguments() {
    let literal_call = Expr::FunctionCall(Box::new(FunctionCallExpr {
        callee: Callee::Name(Name::unqualified("compact", sp(30, 37))),
        args: vec![Expr::Literal(Literal::string("seen", sp(38, 44)))],
        span: sp(30, 45),
    }));
    let dynamic_call = Expr::FunctionCall(Box::new(FunctionCallExpr {
        callee: Callee::Name(Name::unqualified("compact", sp(50, 57))),
        args: vec![Expr::Variable(Var::new("$keys", sp(58, 63)))],
        span: sp(50, 64),
    }));
    let file = File::new(vec![function(
        "payload",
        sp(9, 16),
        sp(0, 70),
        vec![Param::new(Var::new("$keys", sp(17, 22)))],
        vec![
            assign("$seen", 24, 29, Expr::Literal(Literal::int(1, sp(32, 33)))),
            Stmt::Expr(literal_call),
            Stmt::Expr(dynamic_call),
        ],
    )]);

    let model = SemanticModel::analyze(&file);

    // 'seen' resolves like an occurrence of $seen.
    assert_eq!(model.declaration_of(sp(38, 44)), Some(sp(24, 29)));

    // The dynamic call taints the function scope.
    let scope = model.scope_at(sp(0, 70)).unwrap();
    assert!(model.scope_tree.get(scope).has_unresolved_compact);
}

#[test]
fn braced_namespace_restores_context_for_later_code() {
    let file = File::new(vec![
        Stmt::Namespace(NamespaceStmt {
            name: Some(Name::unqualified("App", sp(10, 13))),
            body: NamespaceBody::Braced(vec![new_class(
                Name::unqualified("Widget", sp(20, 26)),
                sp(16, 28),
            )]),
            span: sp(0, 30),
        }),
        new_class(Name::unqualified("Widget", sp(40, 46)), sp(36, 48)),
    ]);

    let model = SemanticModel::analyze(&file);

    let qualified: Vec<_> = model
        .unresolved()
        .iter()
        .filter_map(|r| r.qualified_name.clone())
        .collect();
    assert_eq!(
        qualified,
        vec![
            QualifiedName::new(["App", "Widget"]).unwrap(),
            QualifiedName::global("Widget"),
        ]
    );
}
