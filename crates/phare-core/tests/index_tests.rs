//! Integration tests for the cross-file project index
//!
//! Each scenario harvests facts from trees the way the parser layer would
//! hand them over, spread across several "files", and checks the linked
//! symbol graph: cycle tolerance, unknown memoization, three-valued
//! ancestry and override answers.

use phare_core::names::QualifiedName;
use phare_core::tree::{
    ClassDecl, ClassKind, ClassMember, File, MethodDecl, Modifier, Name, NamespaceBody,
    NamespaceStmt, Span, Stmt,
};
use phare_core::trilean::Trilean;
use phare_core::{AnalysisEngine, ProjectIndex};

fn qn(parts: &[&str]) -> QualifiedName {
    QualifiedName::new(parts.iter().copied()).unwrap()
}

fn class(name: &str, extends: Option<&str>, members: Vec<ClassMember>) -> Stmt {
    Stmt::Class(ClassDecl {
        name: name.to_string(),
        name_span: Span::NONE,
        kind: ClassKind::Class,
        extends: extends.map(|n| Name::unqualified(n, Span::NONE)),
        implements: Vec::new(),
        members,
        doc_comment: None,
        attributes: Vec::new(),
        span: Span::NONE,
    })
}

fn method(name: &str, modifiers: Vec<Modifier>) -> ClassMember {
    ClassMember::Method(MethodDecl {
        name: name.to_string(),
        name_span: Span::NONE,
        modifiers,
        params: Vec::new(),
        return_type: None,
        body: Some(Vec::new()),
        doc_comment: None,
        attributes: Vec::new(),
        span: Span::NONE,
    })
}

fn namespaced(ns: &str, stmts: Vec<Stmt>) -> File {
    let mut all = vec![Stmt::Namespace(NamespaceStmt {
        name: Some(Name::unqualified(ns, Span::NONE)),
        body: NamespaceBody::Unbraced,
        span: Span::NONE,
    })];
    all.extend(stmts);
    File::new(all)
}

fn index_files(files: &[File]) -> ProjectIndex {
    let engine = AnalysisEngine::new();
    let mut index = engine.new_index();
    for file in files {
        let analysis = engine.analyze_file(file);
        index.add_file(analysis.facts);
    }
    index
}

#[test]
fn cross_file_inheritance_cycle_terminates_with_shared_nodes() {
    let file_a = namespaced("App", vec![class("A", Some("B"), Vec::new())]);
    let file_b = namespaced("App", vec![class("B", Some("A"), Vec::new())]);
    let mut index = index_files(&[file_a, file_b]);

    let a = index.type_symbol(&qn(&["App", "A"]));
    let b = index.type_symbol(&qn(&["App", "B"]));

    assert_eq!(index.get_type(a).superclass(), Some(b));
    assert_eq!(index.get_type(b).superclass(), Some(a));
    assert_eq!(index.is_or_subclass_of(a, &qn(&["App", "B"])), Trilean::True);
    assert_eq!(index.is_or_subclass_of(b, &qn(&["App", "A"])), Trilean::True);
    assert_eq!(
        index.is_or_subclass_of(a, &qn(&["App", "Other"])),
        Trilean::False
    );
}

#[test]
fn repeated_unknown_lookups_return_the_same_node() {
    let mut index = ProjectIndex::new();

    let first = index.type_symbol(&qn(&["Vendor", "Gone"]));
    let second = index.type_symbol(&qn(&["Vendor", "Gone"]));
    assert_eq!(first, second);
    assert!(index.get_type(first).is_unknown());

    // The unknown node still knows what name it stands for.
    assert_eq!(index.get_type(first).name.to_string(), "Vendor\\Gone");
}

#[test]
fn partial_knowledge_yields_unknown_not_false() {
    // App\Repo extends App\Base; App\Base extends Vendor\Orm\Model, which
    // is not indexed anywhere.
    let repo_file = namespaced("App", vec![class("Repo", Some("Base"), Vec::new())]);
    let base_file = namespaced(
        "App",
        vec![Stmt::Class(ClassDecl {
            name: "Base".to_string(),
            name_span: Span::NONE,
            kind: ClassKind::Class,
            extends: Some(Name::new(["Vendor", "Orm", "Model"], true, Span::NONE)),
            implements: Vec::new(),
            members: Vec::new(),
            doc_comment: None,
            attributes: Vec::new(),
            span: Span::NONE,
        })],
    );
    let mut index = index_files(&[repo_file, base_file]);

    let repo = index.type_symbol(&qn(&["App", "Repo"]));
    assert_eq!(index.is_or_subclass_of(repo, &qn(&["App", "Base"])), Trilean::True);
    // Whether Vendor\Orm\Model descends from anything else is unknowable.
    assert_eq!(
        index.is_or_subclass_of(repo, &qn(&["App", "Unrelated"])),
        Trilean::Unknown
    );
    assert_eq!(
        index.is_subtype_of(repo, &qn(&["Countable"])),
        Trilean::Unknown
    );
}

#[test]
fn private_method_does_not_override() {
    // class C1 { function m() {} }
    // class C2 extends C1 { private function m() {} }
    let file = File::new(vec![
        class("C1", None, vec![method("m", Vec::new())]),
        class("C2", Some("C1"), vec![method("m", vec![Modifier::Private])]),
    ]);
    let mut index = index_files(&[file]);

    let c2 = index.type_symbol(&qn(&["C2"]));
    assert_eq!(index.is_overriding(c2, "m"), Trilean::False);

    // The public counterpart does override.
    let file2 = File::new(vec![
        class("D1", None, vec![method("m", Vec::new())]),
        class("D2", Some("D1"), vec![method("m", vec![Modifier::Public])]),
    ]);
    let mut index2 = index_files(&[file2]);
    let d2 = index2.type_symbol(&qn(&["D2"]));
    assert_eq!(index2.is_overriding(d2, "m"), Trilean::True);
}

#[test]
fn duplicate_class_across_files_goes_dark() {
    let one = File::new(vec![class("Helper", None, Vec::new())]);
    let two = File::new(vec![class("Helper", None, Vec::new())]);
    let mut index = index_files(&[one, two]);

    let id = index.type_symbol(&qn(&["Helper"]));
    assert!(index.get_type(id).is_unknown());
}

#[test]
fn user_exception_is_a_throwable_subtype() {
    let file = namespaced(
        "App",
        vec![Stmt::Class(ClassDecl {
            name: "NotFound".to_string(),
            name_span: Span::NONE,
            kind: ClassKind::Class,
            extends: Some(Name::new(["RuntimeException"], true, Span::NONE)),
            implements: Vec::new(),
            members: Vec::new(),
            doc_comment: None,
            attributes: Vec::new(),
            span: Span::NONE,
        })],
    );
    let mut index = index_files(&[file]);

    let id = index.type_symbol(&qn(&["App", "NotFound"]));
    assert_eq!(index.is_subtype_of(id, &qn(&["Throwable"])), Trilean::True);
    assert_eq!(
        index.is_or_subclass_of(id, &qn(&["Exception"])),
        Trilean::True
    );
}
