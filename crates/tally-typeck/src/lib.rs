//! Tally type checker: Hindley-Milner inference with rows and elaboration.
//!
//! This crate implements type inference and elaboration for the Tally
//! untyped IR. Given a term, it produces a principal type scheme and a
//! typed term annotated with explicit type abstractions and applications,
//! both closed to de Bruijn form:
//!
//! - Hindley-Milner inference with let-polymorphism
//! - Level-based generalization (Remy's algorithm)
//! - Unification with occurs check and level lowering
//! - Row polymorphism for record and table types
//! - De Bruijn closure of schemes and elaborated terms
//!
//! # Architecture
//!
//! - [`ty`]: Core type representation (Ty, Row, TyVar, Scheme)
//! - [`unify`]: Unification engine with occurs check, rows, generalization,
//!   and instantiation
//! - [`infer`]: The inference driver over the untyped IR
//! - [`elab`]: The elaborated, typed IR
//! - [`debruijn`]: De Bruijn closure of schemes and terms
//! - [`builtins`]: Builtin signature registry
//! - [`error`]: Type error types with provenance tracking
//! - [`diagnostics`]: Ariadne-based diagnostic rendering

pub mod builtins;
pub mod debruijn;
pub mod diagnostics;
pub mod elab;
pub mod error;
pub mod infer;
pub mod ty;
pub mod unify;

use tally_common::Term;

use crate::builtins::BuiltinTypes;
use crate::elab::TypedTerm;
use crate::error::{ConstraintOrigin, TypeError};
use crate::infer::{wrap_ty_abs, Inferencer};
use crate::ty::Ty;

/// The result of a successful inference run.
#[derive(Debug)]
pub struct Inferred {
    /// The principal type scheme, closed: `Forall`-headed when polymorphic,
    /// the bare type otherwise.
    pub scheme: Ty,
    /// The elaborated term, closed: every polymorphic definition carries a
    /// `TyAbs` and every polymorphic use a `TyApp`.
    pub term: TypedTerm,
    /// The first unique id not allocated by this run, for downstream
    /// passes that keep allocating.
    pub next_unique: u32,
}

/// Infer and elaborate a term.
///
/// `supply` seeds the unique counter; `builtins` maps every builtin tag to
/// its closed signature and may be shared read-only across runs. The run
/// owns all of its mutable state (cells, level register) and drops it
/// before returning, so the outputs are pure data.
pub fn run_infer(
    supply: u32,
    builtins: &BuiltinTypes,
    term: &Term,
) -> Result<Inferred, TypeError> {
    let mut inf = Inferencer::new(supply, builtins);

    inf.ctx.enter_level();
    let result = inf.infer(term);
    inf.ctx.leave_level();
    let (ty, elab) = result?;

    let origin = ConstraintOrigin::Result { span: term.span };
    let scheme = inf.ctx.generalize(ty, &origin)?;
    let elab = wrap_ty_abs(&mut inf.ctx, elab, &scheme);

    let closed_scheme = debruijn::close_scheme(&mut inf.ctx, &scheme, &origin)?;
    let closed_term = debruijn::close_term(&mut inf.ctx, elab, &origin)?;

    Ok(Inferred {
        scheme: closed_scheme,
        term: closed_term,
        next_unique: inf.ctx.next_unique(),
    })
}
