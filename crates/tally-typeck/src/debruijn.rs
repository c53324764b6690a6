//! De Bruijn closure of schemes and elaborated terms.
//!
//! After the top-level generalization, the scheme and the term still
//! reference mutable unification cells. Closure converts both to the
//! immutable form: every binder list (`Forall`, `TyAbs`) assigns its
//! variables consecutive slots, and every occurrence becomes a
//! `NamedDeBruijn` whose index counts binders inward from its own position
//! (`depth - assigned - 1`, so index 0 is the innermost binder).
//!
//! The closed outputs carry no reference into the inference context, which
//! can be dropped wholesale afterwards.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::elab::{TyBinder, TypedTerm, TypedTermKind};
use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{NamedDeBruijn, Row, RowTail, Scheme, Ty, TyVar, TyVarValue};
use crate::unify::{splice_tail, InferCtx};

/// Display name for the binder in slot `index`: `a` through `z`, then
/// `t26`, `t27`, ... Names have no semantic role.
pub fn type_var_name(index: u32) -> String {
    if index < 26 {
        ((b'a' + index as u8) as char).to_string()
    } else {
        format!("t{}", index)
    }
}

/// Mapping from generalized cells (by root) to their assigned binder slot.
#[derive(Default)]
struct CloseEnv {
    assigned: FxHashMap<TyVar, u32>,
}

/// Close a scheme into a `Forall`-headed type (or the bare body when the
/// scheme quantifies nothing).
///
/// Quantifier slots are assigned in the scheme's variable order. Closing a
/// scheme whose body is already closed is the identity.
pub fn close_scheme(
    ctx: &mut InferCtx,
    scheme: &Scheme,
    origin: &ConstraintOrigin,
) -> Result<Ty, TypeError> {
    if scheme.vars.is_empty() {
        let body = ctx.resolve(scheme.ty.clone());
        if let Ty::Forall(..) = body {
            // Already closed; nothing to assign.
            return Ok(body);
        }
        let env = CloseEnv::default();
        return close_resolved(ctx, &env, 0, body, origin);
    }

    let mut env = CloseEnv::default();
    let mut names = Vec::with_capacity(scheme.vars.len());
    for (slot, v) in scheme.vars.iter().enumerate() {
        let root = ctx.root(*v);
        env.assigned.insert(root, slot as u32);
        names.push(type_var_name(slot as u32));
    }
    let depth = scheme.vars.len() as u32;
    let body = close_ty(ctx, &env, depth, scheme.ty.clone(), origin)?;
    Ok(Ty::Forall(names, Box::new(body)))
}

/// Close an elaborated term: rewrite every embedded type against the
/// binders in scope at its position.
pub fn close_term(
    ctx: &mut InferCtx,
    term: TypedTerm,
    origin: &ConstraintOrigin,
) -> Result<TypedTerm, TypeError> {
    let mut env = CloseEnv::default();
    close_term_at(ctx, &mut env, 0, term, origin)
}

fn close_term_at(
    ctx: &mut InferCtx,
    env: &mut CloseEnv,
    depth: u32,
    term: TypedTerm,
    origin: &ConstraintOrigin,
) -> Result<TypedTerm, TypeError> {
    let span = term.span;
    let kind = match term.kind {
        TypedTermKind::Var(v) => TypedTermKind::Var(v),
        TypedTermKind::Builtin(b) => TypedTermKind::Builtin(b),
        TypedTermKind::Lit(lit) => TypedTermKind::Lit(lit),

        TypedTermKind::Lam { name, params, body } => {
            let params = params
                .into_iter()
                .map(|(pname, ty)| Ok((pname, close_ty(ctx, env, depth, ty, origin)?)))
                .collect::<Result<Vec<_>, TypeError>>()?;
            TypedTermKind::Lam {
                name,
                params,
                body: Box::new(close_term_at(ctx, env, depth, *body, origin)?),
            }
        }

        TypedTermKind::App { func, args } => TypedTermKind::App {
            func: Box::new(close_term_at(ctx, env, depth, *func, origin)?),
            args: args
                .into_iter()
                .map(|a| close_term_at(ctx, env, depth, a, origin))
                .collect::<Result<Vec<_>, TypeError>>()?,
        },

        TypedTermKind::Let { name, rhs, body } => TypedTermKind::Let {
            name,
            rhs: Box::new(close_term_at(ctx, env, depth, *rhs, origin)?),
            body: Box::new(close_term_at(ctx, env, depth, *body, origin)?),
        },

        TypedTermKind::Block(terms) => TypedTermKind::Block(
            terms
                .into_iter()
                .map(|t| close_term_at(ctx, env, depth, t, origin))
                .collect::<Result<Vec<_>, TypeError>>()?,
        ),

        TypedTermKind::Error { msg, ty } => TypedTermKind::Error {
            msg,
            ty: close_ty(ctx, env, depth, ty, origin)?,
        },

        TypedTermKind::Object(fields) => TypedTermKind::Object(
            fields
                .into_iter()
                .map(|(name, t)| Ok((name, close_term_at(ctx, env, depth, t, origin)?)))
                .collect::<Result<Vec<_>, TypeError>>()?,
        ),

        TypedTermKind::List { elem_ty, items } => TypedTermKind::List {
            elem_ty: close_ty(ctx, env, depth, elem_ty, origin)?,
            items: items
                .into_iter()
                .map(|t| close_term_at(ctx, env, depth, t, origin))
                .collect::<Result<Vec<_>, TypeError>>()?,
        },

        TypedTermKind::TyApp { term, args } => TypedTermKind::TyApp {
            term: Box::new(close_term_at(ctx, env, depth, *term, origin)?),
            args: args
                .into_iter()
                .map(|t| close_ty(ctx, env, depth, t, origin))
                .collect::<Result<Vec<_>, TypeError>>()?,
        },

        TypedTermKind::TyAbs { vars, body } => {
            let count = vars.len() as u32;
            let mut closed_vars = Vec::with_capacity(vars.len());
            for (offset, binder) in vars.into_iter().enumerate() {
                let slot = depth + offset as u32;
                let root = ctx.root(binder.var);
                env.assigned.insert(root, slot);
                closed_vars.push(TyBinder {
                    var: binder.var,
                    name: type_var_name(slot),
                });
            }
            TypedTermKind::TyAbs {
                vars: closed_vars,
                body: Box::new(close_term_at(ctx, env, depth + count, *body, origin)?),
            }
        }
    };
    Ok(TypedTerm::new(kind, span))
}

fn close_ty(
    ctx: &mut InferCtx,
    env: &CloseEnv,
    depth: u32,
    ty: Ty,
    origin: &ConstraintOrigin,
) -> Result<Ty, TypeError> {
    let resolved = ctx.resolve(ty);
    close_resolved(ctx, env, depth, resolved, origin)
}

fn close_resolved(
    ctx: &mut InferCtx,
    env: &CloseEnv,
    depth: u32,
    ty: Ty,
    origin: &ConstraintOrigin,
) -> Result<Ty, TypeError> {
    match ty {
        Ty::Var(v) => close_var(ctx, env, depth, v, origin).map(Ty::Bound),
        Ty::Bound(db) => Ok(Ty::Bound(db)),
        Ty::Prim(_) | Ty::Cap => Ok(ty),
        Ty::Fun(dom, cod) => Ok(Ty::fun(
            close_resolved(ctx, env, depth, *dom, origin)?,
            close_resolved(ctx, env, depth, *cod, origin)?,
        )),
        Ty::List(elem) => Ok(Ty::list(close_resolved(ctx, env, depth, *elem, origin)?)),
        Ty::Record(row) => Ok(Ty::Record(close_row(ctx, env, depth, row, origin)?)),
        Ty::Table(row) => Ok(Ty::Table(close_row(ctx, env, depth, row, origin)?)),
        Ty::Forall(..) => Err(TypeError::Impredicative {
            ty,
            origin: origin.clone(),
        }),
    }
}

fn close_var(
    ctx: &mut InferCtx,
    env: &CloseEnv,
    depth: u32,
    v: TyVar,
    origin: &ConstraintOrigin,
) -> Result<NamedDeBruijn, TypeError> {
    let root = ctx.root(v);
    if let Some(&slot) = env.assigned.get(&root) {
        return Ok(NamedDeBruijn::new(depth - slot - 1, type_var_name(slot)));
    }
    match ctx.probe(root) {
        TyVarValue::Unbound { .. } => Err(TypeError::EscapedVariable {
            var: ctx.var_name(root),
            span: origin.span(),
        }),
        TyVarValue::Generalized => {
            unreachable!("generalized type variable without an enclosing binder")
        }
        TyVarValue::Link(_) => unreachable!("resolution left a forwarded variable"),
    }
}

fn close_row(
    ctx: &mut InferCtx,
    env: &CloseEnv,
    depth: u32,
    row: Row,
    origin: &ConstraintOrigin,
) -> Result<Row, TypeError> {
    match row {
        Row::Empty | Row::Bound(_) => Ok(row),
        Row::Var(v) => match ctx.probe(v) {
            TyVarValue::Link(inner) => {
                let inner = ctx.resolve(inner);
                match inner {
                    Ty::Record(r) => close_row(ctx, env, depth, r, origin),
                    other => Err(TypeError::RowLink {
                        found: other,
                        origin: origin.clone(),
                    }),
                }
            }
            _ => close_var(ctx, env, depth, v, origin).map(Row::Bound),
        },
        Row::Fields(fields, tail) => {
            let fields = fields
                .into_iter()
                .map(|(name, ty)| Ok((name, close_resolved(ctx, env, depth, ty, origin)?)))
                .collect::<Result<BTreeMap<String, Ty>, TypeError>>()?;
            match tail {
                None => Ok(Row::from_parts(fields, None)),
                Some(RowTail::Bound(db)) => Ok(Row::from_parts(fields, Some(RowTail::Bound(db)))),
                Some(RowTail::Var(v)) => match ctx.probe(v) {
                    TyVarValue::Link(inner) => {
                        let inner = ctx.resolve(inner);
                        match inner {
                            Ty::Record(r) => {
                                let closed = close_row(ctx, env, depth, r, origin)?;
                                Ok(splice_tail(fields, closed))
                            }
                            other => Err(TypeError::RowLink {
                                found: other,
                                origin: origin.clone(),
                            }),
                        }
                    }
                    _ => {
                        let db = close_var(ctx, env, depth, v, origin)?;
                        Ok(Row::from_parts(fields, Some(RowTail::Bound(db))))
                    }
                },
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tally_common::Span;

    fn origin() -> ConstraintOrigin {
        ConstraintOrigin::Result { span: Span::new(0, 0) }
    }

    #[test]
    fn binder_slot_names() {
        assert_eq!(type_var_name(0), "a");
        assert_eq!(type_var_name(1), "b");
        assert_eq!(type_var_name(25), "z");
        assert_eq!(type_var_name(26), "t26");
    }

    #[test]
    fn close_identity_scheme() {
        let mut ctx = InferCtx::new(0);
        ctx.enter_level();
        let a = ctx.fresh_var();
        let ty = Ty::fun(a.clone(), a);
        ctx.leave_level();

        let scheme = ctx.generalize(ty, &origin()).unwrap();
        let closed = close_scheme(&mut ctx, &scheme, &origin()).unwrap();
        assert_eq!(format!("{}", closed), "forall a. a -> a");
        match closed {
            Ty::Forall(names, body) => {
                assert_eq!(names, vec!["a".to_string()]);
                match *body {
                    Ty::Fun(dom, _) => {
                        assert_eq!(*dom, Ty::Bound(NamedDeBruijn::new(0, "a")));
                    }
                    other => panic!("expected a function body, got {}", other),
                }
            }
            other => panic!("expected a Forall, got {}", other),
        }
    }

    #[test]
    fn close_two_binder_scheme_indices() {
        let mut ctx = InferCtx::new(0);
        ctx.enter_level();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        let ty = Ty::fun(a, b);
        ctx.leave_level();

        let scheme = ctx.generalize(ty, &origin()).unwrap();
        let closed = close_scheme(&mut ctx, &scheme, &origin()).unwrap();
        // First-visited binder sits at slot 0; under two binders its index
        // counts inward: a is 1, b is 0.
        assert_eq!(format!("{}", closed), "forall a b. a -> b");
        match closed {
            Ty::Forall(_, body) => match *body {
                Ty::Fun(dom, cod) => {
                    assert_eq!(*dom, Ty::Bound(NamedDeBruijn::new(1, "a")));
                    assert_eq!(*cod, Ty::Bound(NamedDeBruijn::new(0, "b")));
                }
                other => panic!("expected a function body, got {}", other),
            },
            other => panic!("expected a Forall, got {}", other),
        }
    }

    #[test]
    fn closing_a_closed_scheme_is_identity() {
        let mut ctx = InferCtx::new(0);
        let closed = Ty::Forall(
            vec!["a".to_string()],
            Box::new(Ty::fun(
                Ty::Bound(NamedDeBruijn::new(0, "a")),
                Ty::Bound(NamedDeBruijn::new(0, "a")),
            )),
        );
        let again = close_scheme(&mut ctx, &Scheme::mono(closed.clone()), &origin()).unwrap();
        assert_eq!(again, closed);
    }

    #[test]
    fn unquantified_unbound_var_escapes() {
        let mut ctx = InferCtx::new(0);
        let a = ctx.fresh_var();
        let result = close_scheme(&mut ctx, &Scheme::mono(a), &origin());
        match result.unwrap_err() {
            TypeError::EscapedVariable { .. } => {}
            other => panic!("expected EscapedVariable, got {:?}", other),
        }
    }

    #[test]
    fn close_row_scheme() {
        let mut ctx = InferCtx::new(0);
        ctx.enter_level();
        let field = ctx.fresh_var();
        let tail = ctx.fresh_tvar();
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), field.clone());
        let row = Row::Fields(fields, Some(RowTail::Var(tail)));
        let ty = Ty::fun(Ty::Record(row), field);
        ctx.leave_level();

        let scheme = ctx.generalize(ty, &origin()).unwrap();
        assert_eq!(scheme.vars.len(), 2);
        let closed = close_scheme(&mut ctx, &scheme, &origin()).unwrap();
        assert_eq!(format!("{}", closed), "forall a b. {name: a | b} -> a");
    }
}
