//! The elaborated, typed intermediate representation.
//!
//! Inference produces a `TypedTerm` alongside every inferred type. The shape
//! mirrors the untyped IR, with types made explicit where the untyped form
//! left them implicit: every polymorphic definition gets a `TyAbs`, every
//! polymorphic use a `TyApp`, lambda parameters carry their types, and list
//! and error nodes carry the element/result type that unification chose.
//!
//! During inference the embedded types still reference unification cells;
//! de Bruijn closure rewrites them to the immutable `Ty::Bound` form before
//! the term leaves the engine.

use serde::Serialize;

use tally_common::{Builtin, Literal, Span, Var};

use crate::ty::{Ty, TyVar};

/// A type binder introduced by a `TyAbs`.
///
/// `var` is the generalized inference variable; `name` is the display name
/// the binder ends up with after closure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TyBinder {
    pub var: TyVar,
    pub name: String,
}

/// An elaborated term: a kind plus the source span carried over from the
/// untyped IR.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypedTerm {
    pub kind: TypedTermKind,
    pub span: Span,
}

impl TypedTerm {
    pub fn new(kind: TypedTermKind, span: Span) -> Self {
        TypedTerm { kind, span }
    }
}

/// The shape of an elaborated term.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TypedTermKind {
    /// A locally bound variable.
    Var(Var),
    /// A lambda; every parameter carries its inferred type.
    Lam {
        name: Option<String>,
        params: Vec<(String, Ty)>,
        body: Box<TypedTerm>,
    },
    /// An application. `args` is non-empty and in source order.
    App {
        func: Box<TypedTerm>,
        args: Vec<TypedTerm>,
    },
    /// A let binding. A polymorphic right-hand side is wrapped in `TyAbs`.
    Let {
        name: String,
        rhs: Box<TypedTerm>,
        body: Box<TypedTerm>,
    },
    /// A sequence of terms; the block's value is the last term's.
    Block(Vec<TypedTerm>),
    /// A term that raises at runtime, annotated with the type the use site
    /// required of it.
    Error { msg: String, ty: Ty },
    /// A builtin operation, by tag.
    Builtin(Builtin),
    /// A literal constant.
    Lit(Literal),
    /// An object literal. Fields are in source order.
    Object(Vec<(String, TypedTerm)>),
    /// A list literal with its element type made explicit.
    List { elem_ty: Ty, items: Vec<TypedTerm> },
    /// A type application: a polymorphic value used at the given type
    /// arguments. `args` is non-empty and in quantifier order.
    TyApp { term: Box<TypedTerm>, args: Vec<Ty> },
    /// A type abstraction: a polymorphic definition binding its quantified
    /// variables. `vars` is non-empty and in quantifier order.
    TyAbs {
        vars: Vec<TyBinder>,
        body: Box<TypedTerm>,
    },
}
