//! Parsed-syntax contract consumed by the semantic passes
//!
//! The parser lives outside this crate; these types are the node model it
//! must produce. The hierarchy is a closed set of variants so that the two
//! traversal passes in `semantic` and the harvester in `index` can match
//! exhaustively — adding a node kind forces every match site to be updated.

use serde::{Deserialize, Serialize};

/// Byte range of a node in its source file.
///
/// Spans double as node identities within one file: usage lists and
/// resolution maps are keyed by the span of the occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub lo: u32,
    pub hi: u32,
}

impl Span {
    /// Placeholder for synthesized nodes with no source location.
    pub const NONE: Span = Span { lo: 0, hi: 0 };

    pub fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    pub fn is_none(&self) -> bool {
        *self == Span::NONE
    }
}

/// A possibly qualified source-level name such as `Foo`, `A\B\C` or `\Foo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub parts: Vec<String>,
    /// Written with a leading backslash (`\Foo`).
    pub fully_qualified: bool,
    pub span: Span,
}

impl Name {
    pub fn new<I, S>(parts: I, fully_qualified: bool, span: Span) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            fully_qualified,
            span,
        }
    }

    pub fn unqualified(name: &str, span: Span) -> Self {
        Self::new([name], false, span)
    }

    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1
    }

    pub fn last(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }
}

/// A `$variable` occurrence. The name keeps its `$` sigil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub span: Span,
}

impl Var {
    pub fn new(name: &str, span: Span) -> Self {
        Self {
            name: name.to_string(),
            span,
        }
    }
}

/// Raw text of a declared parameter or return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHint {
    pub text: String,
}

impl TypeHint {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn is_void(&self) -> bool {
        self.text.eq_ignore_ascii_case("void")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Readonly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub var: Var,
    pub type_hint: Option<TypeHint>,
    pub default: Option<Expr>,
    pub variadic: bool,
    pub by_ref: bool,
    /// Constructor property promotion modifiers, empty for plain parameters.
    pub promoted: Vec<Modifier>,
}

impl Param {
    pub fn new(var: Var) -> Self {
        Self {
            var,
            type_hint: None,
            default: None,
            variadic: false,
            by_ref: false,
            promoted: Vec::new(),
        }
    }
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    pub stmts: Vec<Stmt>,
}

impl File {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Namespace(NamespaceStmt),
    Use(UseStmt),
    Function(FunctionDecl),
    Class(ClassDecl),
    Const(ConstStmt),
    Global(GlobalStmt),
    StaticVars(StaticVarsStmt),
    Expr(Expr),
    Echo(Vec<Expr>),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    Foreach(ForeachStmt),
    Switch(SwitchStmt),
    Try(TryStmt),
    Throw(Expr),
    Block(Vec<Stmt>),
    Nop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceStmt {
    /// `None` for the anonymous `namespace { ... }` form.
    pub name: Option<Name>,
    pub body: NamespaceBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceBody {
    /// `namespace N { ... }` — the namespace ends with the closing brace.
    Braced(Vec<Stmt>),
    /// `namespace N;` — applies to everything that follows in the file.
    Unbraced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseKind {
    Class,
    Function,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseClause {
    pub name: Name,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseStmt {
    pub kind: UseKind,
    pub clauses: Vec<UseClause>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub name_span: Span,
    pub params: Vec<Param>,
    pub return_type: Option<TypeHint>,
    pub body: Vec<Stmt>,
    pub doc_comment: Option<String>,
    pub attributes: Vec<Name>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    AbstractClass,
    FinalClass,
    Interface,
    Trait,
    Enum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub name_span: Span,
    pub kind: ClassKind,
    pub extends: Option<Name>,
    /// Implemented interfaces; for an interface, the extended interfaces.
    pub implements: Vec<Name>,
    pub members: Vec<ClassMember>,
    pub doc_comment: Option<String>,
    pub attributes: Vec<Name>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Method(MethodDecl),
    Property(PropertyDecl),
    Const(ClassConstDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub name_span: Span,
    pub modifiers: Vec<Modifier>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeHint>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<Stmt>>,
    pub doc_comment: Option<String>,
    pub attributes: Vec<Name>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub modifiers: Vec<Modifier>,
    pub type_hint: Option<TypeHint>,
    pub entries: Vec<PropertyEntry>,
    pub span: Span,
}

/// One declared property; the name is stored without its `$` sigil,
/// matching the `$obj->name` access syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    pub name: String,
    pub name_span: Span,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassConstDecl {
    pub modifiers: Vec<Modifier>,
    pub entries: Vec<ConstEntry>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstEntry {
    pub name: String,
    pub name_span: Span,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstStmt {
    pub entries: Vec<ConstEntry>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalStmt {
    pub vars: Vec<Var>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticVar {
    pub var: Var,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticVarsStmt {
    pub vars: Vec<StaticVar>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub expr: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then: Vec<Stmt>,
    pub elseifs: Vec<(Expr, Vec<Stmt>)>,
    pub else_branch: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStmt {
    pub body: Vec<Stmt>,
    pub cond: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Vec<Expr>,
    pub cond: Vec<Expr>,
    pub update: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeachStmt {
    pub expr: Expr,
    pub key: Option<Var>,
    pub value: Var,
    pub by_ref: bool,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub cond: Expr,
    pub cases: Vec<SwitchCase>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Vec<Stmt>,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub types: Vec<Name>,
    /// `catch (E $e)` binds `$e`; `catch (E)` binds nothing.
    pub var: Option<Var>,
    pub body: Vec<Stmt>,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Variable(Var),
    Assign(Box<AssignExpr>),
    Binary(Box<BinaryExpr>),
    Unary(Box<UnaryExpr>),
    Ternary(Box<TernaryExpr>),
    Literal(Literal),
    Array(ArrayExpr),
    FunctionCall(Box<FunctionCallExpr>),
    MethodCall(Box<MethodCallExpr>),
    PropertyFetch(Box<PropertyFetchExpr>),
    StaticCall(Box<StaticCallExpr>),
    StaticPropertyFetch(Box<StaticPropertyFetchExpr>),
    ClassConstFetch(Box<ClassConstFetchExpr>),
    ConstFetch(Name),
    New(Box<NewExpr>),
    Closure(Box<ClosureExpr>),
    ArrowFunction(Box<ArrowFunctionExpr>),
    Yield(Box<YieldExpr>),
    Isset(IssetExpr),
    Cast(Box<CastExpr>),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Variable(v) => v.span,
            Expr::Assign(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Ternary(e) => e.span,
            Expr::Literal(l) => l.span,
            Expr::Array(e) => e.span,
            Expr::FunctionCall(e) => e.span,
            Expr::MethodCall(e) => e.span,
            Expr::PropertyFetch(e) => e.span,
            Expr::StaticCall(e) => e.span,
            Expr::StaticPropertyFetch(e) => e.span,
            Expr::ClassConstFetch(e) => e.span,
            Expr::ConstFetch(n) => n.span,
            Expr::New(e) => e.span,
            Expr::Closure(e) => e.span,
            Expr::ArrowFunction(e) => e.span,
            Expr::Yield(e) => e.span,
            Expr::Isset(e) => e.span,
            Expr::Cast(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub target: Expr,
    pub value: Expr,
    pub by_ref: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    Coalesce,
    Instanceof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Expr,
    pub right: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpr {
    pub cond: Expr,
    /// `None` for the short form `$a ?: $b`.
    pub then: Option<Expr>,
    pub else_branch: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

impl Literal {
    pub fn string(value: &str, span: Span) -> Self {
        Self {
            kind: LiteralKind::String(value.to_string()),
            span,
        }
    }

    pub fn int(value: i64, span: Span) -> Self {
        Self {
            kind: LiteralKind::Int(value),
            span,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            LiteralKind::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub items: Vec<ArrayItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
}

/// Callee of a plain function call: a name or a dynamic expression (`$f()`).
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Name(Name),
    Dynamic(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallExpr {
    pub callee: Callee,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// Member name in `->` / `::` access: a fixed identifier or `{$expr}`.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberName {
    Fixed { name: String, span: Span },
    Dynamic(Box<Expr>),
}

impl MemberName {
    pub fn fixed(name: &str, span: Span) -> Self {
        MemberName::Fixed {
            name: name.to_string(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallExpr {
    pub receiver: Expr,
    pub method: MemberName,
    pub args: Vec<Expr>,
    pub nullsafe: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFetchExpr {
    pub receiver: Expr,
    pub prop: MemberName,
    pub nullsafe: bool,
    pub span: Span,
}

/// Class part of `::` access and `new`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassRef {
    Name(Name),
    SelfKeyword(Span),
    StaticKeyword(Span),
    ParentKeyword(Span),
    Dynamic(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticCallExpr {
    pub class: ClassRef,
    pub method: MemberName,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// `C::$prop` — the member keeps its `$` sigil in source but is stored
/// without it, like instance properties.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPropertyFetchExpr {
    pub class: ClassRef,
    pub prop: MemberName,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassConstFetchExpr {
    pub class: ClassRef,
    pub constant: String,
    pub constant_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub class: ClassRef,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureUse {
    pub var: Var,
    pub by_ref: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureExpr {
    pub params: Vec<Param>,
    pub uses: Vec<ClosureUse>,
    pub body: Vec<Stmt>,
    pub is_static: bool,
    pub span: Span,
}

/// `fn (...) => expr` — captures the enclosing scope implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunctionExpr {
    pub params: Vec<Param>,
    pub body: Expr,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldExpr {
    pub expr: Option<Expr>,
    pub from: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssetExpr {
    pub exprs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub ty: String,
    pub expr: Expr,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_none_is_recognized() {
        assert!(Span::NONE.is_none());
        assert!(!Span::new(1, 4).is_none());
    }

    #[test]
    fn name_helpers() {
        let n = Name::new(["A", "B", "C"], false, Span::NONE);
        assert!(!n.is_simple());
        assert_eq!(n.last(), "C");

        let simple = Name::unqualified("Foo", Span::NONE);
        assert!(simple.is_simple());
        assert_eq!(simple.last(), "Foo");
    }

    #[test]
    fn void_hint_is_case_insensitive() {
        assert!(TypeHint::new("void").is_void());
        assert!(TypeHint::new("Void").is_void());
        assert!(!TypeHint::new("int").is_void());
    }

    #[test]
    fn expr_span_covers_all_variants() {
        let sp = Span::new(3, 9);
        let var = Expr::Variable(Var::new("$x", sp));
        assert_eq!(var.span(), sp);

        let lit = Expr::Literal(Literal::int(42, sp));
        assert_eq!(lit.span(), sp);
    }
}
