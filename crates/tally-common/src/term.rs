//! The untyped intermediate representation.
//!
//! Lowering produces `Term` trees from checked surface syntax; the type
//! checker consumes them and produces the elaborated, typed form. Local
//! variables are already resolved to de Bruijn indices by lowering, so the
//! checker never sees raw names except for display.

use serde::Serialize;

use crate::builtin::Builtin;
use crate::span::Span;

/// A reference to a locally bound variable.
///
/// `index` is a de Bruijn index into the enclosing binder stack: 0 is the
/// innermost binder (the last lambda parameter or the nearest `let`). The
/// name is carried for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Var {
    pub name: String,
    pub index: u32,
}

impl Var {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Var { name: name.into(), index }
    }
}

/// A lambda parameter. Surface annotations do not survive lowering; the
/// checker invents a fresh type for every parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

impl Param {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Param { name: name.into(), span }
    }
}

/// A literal constant. Decimal and time literals keep their source lexeme;
/// the checker only needs the kind, and downstream passes parse the lexeme
/// with full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Literal {
    Int(i64),
    Decimal(String),
    Bool(bool),
    Str(String),
    Unit,
    Time(String),
    Guard(String),
}

/// An untyped IR term: a kind plus the source span it was lowered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    pub kind: TermKind,
    pub span: Span,
}

impl Term {
    pub fn new(kind: TermKind, span: Span) -> Self {
        Term { kind, span }
    }
}

/// The shape of an untyped IR term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TermKind {
    /// A locally bound variable.
    Var(Var),
    /// A reference that lowering could not resolve locally (a module-level
    /// or imported name). The checker rejects these.
    Free(String),
    /// A lambda. `name` is the surface definition name when one exists.
    /// `params` is non-empty.
    Lam {
        name: Option<String>,
        params: Vec<Param>,
        body: Box<Term>,
    },
    /// An application. `args` is non-empty and in source order.
    App { func: Box<Term>, args: Vec<Term> },
    /// A let binding. The bound value is generalized; the body sees it
    /// polymorphically.
    Let {
        name: String,
        rhs: Box<Term>,
        body: Box<Term>,
    },
    /// A sequence of terms; the block's value is the last term's. Non-empty.
    Block(Vec<Term>),
    /// A term that raises at runtime. Types as anything.
    Error { msg: String },
    /// A builtin operation, by tag.
    Builtin(Builtin),
    /// Dynamic field access on a value of unknown shape. Not supported by
    /// the checker.
    DynAccess { object: Box<Term>, field: String },
    /// A literal constant.
    Lit(Literal),
    /// An object literal. Fields are in source order; names must be unique.
    Object(Vec<(String, Term)>),
    /// A list literal. May be empty; all elements share one element type.
    List(Vec<Term>),
}
