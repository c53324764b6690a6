//! Type representation for the Tally type system.
//!
//! Defines the core `Ty` enum, row types for records and tables, type
//! variables (`TyVar`), and polymorphic type schemes (`Scheme`). These form
//! the foundation of Hindley-Milner inference with row polymorphism.
//!
//! Two kinds of type variable coexist here. `Ty::Var` is a mutable inference
//! variable: an index into the unification table, whose cell moves through
//! the `TyVarValue` states below. `Ty::Bound` is an immutable de Bruijn
//! variable: it appears in closed schemes (the output of de Bruijn closure)
//! and in imported builtin signatures (the input to instantiation), never in
//! types still under inference.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A type variable, identified by a `u32` index into the unification table.
///
/// Variables are created during inference and unified with concrete types or
/// other variables. The `ena` crate handles the union-find mechanics; two
/// variables denote the same cell iff they have the same root.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TyVar(pub u32);

/// The contents of a type-variable cell.
///
/// Every cell starts `Unbound` at the level it was created. Unification
/// forwards it with `Link`; generalization freezes it as `Generalized`
/// (after which the variable is opaque and only instantiation can replace
/// it with something fresh).
#[derive(Clone, Debug, PartialEq)]
pub enum TyVarValue {
    /// A free inference variable, tagged with its creation level.
    Unbound { level: u32 },
    /// A quantified variable, owned by some enclosing scheme.
    Generalized,
    /// A forwarded variable. Reads follow links transparently.
    Link(Ty),
}

/// A de Bruijn type variable: an index relative to its binder, plus a
/// display name.
///
/// The `name` field is used ONLY for display in rendered types and error
/// messages. It is intentionally excluded from `PartialEq` and `Hash` so
/// that alpha-equivalent types compare equal.
#[derive(Clone, Debug, Serialize)]
pub struct NamedDeBruijn {
    pub index: u32,
    /// Display name assigned at closure time. NOT part of type identity.
    pub name: String,
}

impl NamedDeBruijn {
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        NamedDeBruijn { index, name: name.into() }
    }
}

impl PartialEq for NamedDeBruijn {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index // name intentionally excluded
    }
}

impl Eq for NamedDeBruijn {}

impl std::hash::Hash for NamedDeBruijn {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state); // name intentionally excluded
    }
}

impl fmt::Display for NamedDeBruijn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A primitive type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Prim {
    Int,
    Decimal,
    Bool,
    Str,
    Unit,
    Time,
    Guard,
}

impl fmt::Display for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Prim::Int => "Int",
            Prim::Decimal => "Decimal",
            Prim::Bool => "Bool",
            Prim::Str => "String",
            Prim::Unit => "Unit",
            Prim::Time => "Time",
            Prim::Guard => "Guard",
        };
        write!(f, "{}", name)
    }
}

/// A Tally type.
///
/// `Forall` only ever appears at scheme boundaries (the top of a closed
/// scheme or an imported signature), never beneath another constructor;
/// polymorphism is predicative.
#[derive(Clone, Debug, Serialize)]
pub enum Ty {
    /// An inference variable (unresolved during inference).
    Var(TyVar),
    /// A de Bruijn variable (closed schemes and imported signatures).
    Bound(NamedDeBruijn),
    /// A primitive type.
    Prim(Prim),
    /// A function type. Arrows are curried and right-associative.
    Fun(Box<Ty>, Box<Ty>),
    /// A homogeneous list type.
    List(Box<Ty>),
    /// A record type.
    Record(Row),
    /// A table type, sharing row structure with records.
    Table(Row),
    /// The opaque capability type.
    Cap,
    /// A quantified type. Binder names are display-only; occurrences refer
    /// to binders by de Bruijn index.
    Forall(Vec<String>, Box<Ty>),
}

/// A row: the shape shared by record and table types.
///
/// Field names within a row are unique, and iteration is always in
/// field-name order. A row is *closed* when it has no tail (its field set is
/// exact) and *open* when a tail variable stands for the unknown remainder.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Row {
    /// The closed empty row.
    Empty,
    /// An open row consisting solely of a row variable.
    Var(TyVar),
    /// A de Bruijn row variable (closed schemes and imported signatures).
    Bound(NamedDeBruijn),
    /// Known fields plus an optional open tail.
    Fields(BTreeMap<String, Ty>, Option<RowTail>),
}

/// The tail of an open row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum RowTail {
    /// An inference variable standing for the unknown remainder.
    Var(TyVar),
    /// A de Bruijn variable (closed form).
    Bound(NamedDeBruijn),
}

impl Row {
    /// Build a row from a field map and optional tail, normalizing the
    /// degenerate field-less shapes to their canonical constructors.
    pub fn from_parts(fields: BTreeMap<String, Ty>, tail: Option<RowTail>) -> Row {
        if fields.is_empty() {
            match tail {
                None => Row::Empty,
                Some(RowTail::Var(v)) => Row::Var(v),
                Some(RowTail::Bound(db)) => Row::Bound(db),
            }
        } else {
            Row::Fields(fields, tail)
        }
    }

    /// Whether the row is closed (its field set is exact).
    pub fn is_closed(&self) -> bool {
        match self {
            Row::Empty => true,
            Row::Var(_) | Row::Bound(_) => false,
            Row::Fields(_, tail) => tail.is_none(),
        }
    }
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Prim(Prim::Int)
    }

    pub fn decimal() -> Ty {
        Ty::Prim(Prim::Decimal)
    }

    pub fn bool() -> Ty {
        Ty::Prim(Prim::Bool)
    }

    pub fn string() -> Ty {
        Ty::Prim(Prim::Str)
    }

    pub fn unit() -> Ty {
        Ty::Prim(Prim::Unit)
    }

    pub fn time() -> Ty {
        Ty::Prim(Prim::Time)
    }

    pub fn guard() -> Ty {
        Ty::Prim(Prim::Guard)
    }

    /// Create a single-argument function type.
    pub fn fun(dom: Ty, cod: Ty) -> Ty {
        Ty::Fun(Box::new(dom), Box::new(cod))
    }

    /// Create a curried function type from a parameter list.
    pub fn arrow(params: Vec<Ty>, ret: Ty) -> Ty {
        params.into_iter().rev().fold(ret, |acc, p| Ty::fun(p, acc))
    }

    pub fn list(elem: Ty) -> Ty {
        Ty::List(Box::new(elem))
    }

    /// Create a closed record type from field/type pairs.
    pub fn record(fields: Vec<(&str, Ty)>) -> Ty {
        let map = fields.into_iter().map(|(k, t)| (k.to_string(), t)).collect();
        Ty::Record(Row::from_parts(map, None))
    }
}

impl PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ty::Var(a), Ty::Var(b)) => a == b,
            (Ty::Bound(a), Ty::Bound(b)) => a == b,
            (Ty::Prim(a), Ty::Prim(b)) => a == b,
            (Ty::Fun(d1, c1), Ty::Fun(d2, c2)) => d1 == d2 && c1 == c2,
            (Ty::List(a), Ty::List(b)) => a == b,
            (Ty::Record(a), Ty::Record(b)) => a == b,
            (Ty::Table(a), Ty::Table(b)) => a == b,
            (Ty::Cap, Ty::Cap) => true,
            // Binder names are display-only: quantifier count and body
            // decide equality.
            (Ty::Forall(v1, b1), Ty::Forall(v2, b2)) => v1.len() == v2.len() && b1 == b2,
            _ => false,
        }
    }
}

impl Eq for Ty {}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "?{}", v.0),
            Ty::Bound(db) => write!(f, "{}", db),
            Ty::Prim(p) => write!(f, "{}", p),
            Ty::Fun(dom, cod) => {
                // Parenthesize a function domain; arrows associate right.
                match dom.as_ref() {
                    Ty::Fun(..) | Ty::Forall(..) => write!(f, "({}) -> {}", dom, cod),
                    _ => write!(f, "{} -> {}", dom, cod),
                }
            }
            Ty::List(elem) => write!(f, "[{}]", elem),
            Ty::Record(row) => write!(f, "{{{}}}", row),
            Ty::Table(row) => write!(f, "table{{{}}}", row),
            Ty::Cap => write!(f, "Capability"),
            Ty::Forall(vars, body) => {
                write!(f, "forall")?;
                for v in vars {
                    write!(f, " {}", v)?;
                }
                write!(f, ". {}", body)
            }
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Empty => Ok(()),
            Row::Var(v) => write!(f, "?{}", v.0),
            Row::Bound(db) => write!(f, "{}", db),
            Row::Fields(fields, tail) => {
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                match tail {
                    Some(RowTail::Var(v)) => write!(f, " | ?{}", v.0),
                    Some(RowTail::Bound(db)) => write!(f, " | {}", db),
                    None => Ok(()),
                }
            }
        }
    }
}

/// A polymorphic type scheme: a type together with the inference variables
/// it quantifies, in first-visit order.
///
/// Schemes are the currency of the type environment: `generalize` produces
/// them at `let` bindings and `instantiate` opens them at use sites. The
/// quantified cells are in the `Generalized` state for the scheme's
/// lifetime.
#[derive(Clone, Debug)]
pub struct Scheme {
    /// The quantified type variables, in order of first occurrence.
    pub vars: Vec<TyVar>,
    /// The underlying type (may reference vars).
    pub ty: Ty,
}

impl Scheme {
    /// Create a monomorphic scheme (no quantified variables).
    pub fn mono(ty: Ty) -> Self {
        Scheme { vars: Vec::new(), ty }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = TyVarValue;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::UnifyValue for TyVarValue {
    type Error = ena::unify::NoError;

    /// Merge two cell states when their keys are unioned.
    ///
    /// Links dominate, then generalization; two unbound cells keep the
    /// lower level, which is what preserves the rank discipline when
    /// variables from different nesting depths are unified.
    fn unify_values(a: &Self, b: &Self) -> Result<Self, Self::Error> {
        Ok(match (a, b) {
            (TyVarValue::Link(t), _) | (_, TyVarValue::Link(t)) => TyVarValue::Link(t.clone()),
            (TyVarValue::Generalized, _) | (_, TyVarValue::Generalized) => TyVarValue::Generalized,
            (TyVarValue::Unbound { level: l1 }, TyVarValue::Unbound { level: l2 }) => {
                TyVarValue::Unbound { level: (*l1).min(*l2) }
            }
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
