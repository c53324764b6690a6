//! The inference driver.
//!
//! Walks the untyped IR, producing an inferred type and an elaborated term
//! for every node. Constraints go through the unification engine; `let`
//! right-hand sides are generalized at a deeper level and wrapped in
//! `TyAbs`, and every use of a polymorphic value is instantiated and
//! wrapped in `TyApp`.
//!
//! The environment is a plain stack of schemes: lowering already resolved
//! local variables to de Bruijn indices, so lookup is positional (index 0
//! is the innermost binder).

use std::collections::BTreeMap;

use tally_common::{Literal, Term, TermKind};

use crate::builtins::BuiltinTypes;
use crate::elab::{TyBinder, TypedTerm, TypedTermKind};
use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{Row, Scheme, Ty};
use crate::unify::InferCtx;

/// The inference driver: a context plus the builtin signature registry and
/// the environment stack.
pub struct Inferencer<'a> {
    pub ctx: InferCtx,
    builtins: &'a BuiltinTypes,
    env: Vec<Scheme>,
}

impl<'a> Inferencer<'a> {
    /// Create a driver whose uniques start at `supply`.
    pub fn new(supply: u32, builtins: &'a BuiltinTypes) -> Self {
        Inferencer {
            ctx: InferCtx::new(supply),
            builtins,
            env: Vec::new(),
        }
    }

    /// Infer a type and an elaboration for a term.
    pub fn infer(&mut self, term: &Term) -> Result<(Ty, TypedTerm), TypeError> {
        match &term.kind {
            TermKind::Var(var) => {
                let scheme = self
                    .env
                    .len()
                    .checked_sub(1 + var.index as usize)
                    .and_then(|slot| self.env.get(slot))
                    .cloned()
                    .ok_or_else(|| TypeError::UnboundVariable {
                        name: var.name.clone(),
                        index: var.index,
                        span: term.span,
                    })?;
                let (ty, args) = self.ctx.instantiate(&scheme);
                let elab = TypedTerm::new(TypedTermKind::Var(var.clone()), term.span);
                Ok((ty, wrap_ty_app(elab, args, term.span)))
            }

            TermKind::Free(name) => Err(TypeError::TopLevelReference {
                name: name.clone(),
                span: term.span,
            }),

            TermKind::Lam { name, params, body } => {
                let param_tys: Vec<Ty> = params.iter().map(|_| self.ctx.fresh_var()).collect();
                for ty in &param_tys {
                    self.env.push(Scheme::mono(ty.clone()));
                }
                let body_result = self.infer(body);
                self.env.truncate(self.env.len() - params.len());
                let (body_ty, body_elab) = body_result?;

                let ty = param_tys
                    .iter()
                    .rev()
                    .fold(body_ty, |acc, p| Ty::fun(p.clone(), acc));
                let elab_params = params
                    .iter()
                    .zip(&param_tys)
                    .map(|(p, ty)| (p.name.clone(), ty.clone()))
                    .collect();
                let elab = TypedTerm::new(
                    TypedTermKind::Lam {
                        name: name.clone(),
                        params: elab_params,
                        body: Box::new(body_elab),
                    },
                    term.span,
                );
                Ok((ty, elab))
            }

            TermKind::App { func, args } => {
                let (mut fn_ty, func_elab) = self.infer(func)?;
                let mut elab_args = Vec::with_capacity(args.len());
                for (idx, arg) in args.iter().enumerate() {
                    let (arg_ty, arg_elab) = self.infer(arg)?;
                    let result_ty = self.ctx.fresh_var();
                    let origin = ConstraintOrigin::AppArg {
                        call_span: term.span,
                        arg_span: arg.span,
                        arg_idx: idx,
                    };
                    self.ctx
                        .unify(fn_ty, Ty::fun(arg_ty, result_ty.clone()), &origin)?;
                    fn_ty = result_ty;
                    elab_args.push(arg_elab);
                }
                let elab = TypedTerm::new(
                    TypedTermKind::App {
                        func: Box::new(func_elab),
                        args: elab_args,
                    },
                    term.span,
                );
                Ok((fn_ty, elab))
            }

            TermKind::Let { name, rhs, body } => {
                self.ctx.enter_level();
                let rhs_result = self.infer(rhs);
                self.ctx.leave_level();
                let (rhs_ty, rhs_elab) = rhs_result?;

                let origin = ConstraintOrigin::LetBinding { span: rhs.span };
                let scheme = self.ctx.generalize(rhs_ty, &origin)?;
                let rhs_elab = wrap_ty_abs(&mut self.ctx, rhs_elab, &scheme);

                self.env.push(scheme);
                let body_result = self.infer(body);
                self.env.pop();
                let (body_ty, body_elab) = body_result?;

                let elab = TypedTerm::new(
                    TypedTermKind::Let {
                        name: name.clone(),
                        rhs: Box::new(rhs_elab),
                        body: Box::new(body_elab),
                    },
                    term.span,
                );
                Ok((body_ty, elab))
            }

            TermKind::Block(terms) => {
                let (first, rest) = terms.split_first().ok_or(TypeError::Unsupported {
                    construct: "empty block",
                    span: term.span,
                })?;
                let (mut last_ty, first_elab) = self.infer(first)?;
                let mut elab_terms = vec![first_elab];
                for t in rest {
                    let (ty, elab) = self.infer(t)?;
                    last_ty = ty;
                    elab_terms.push(elab);
                }
                Ok((
                    last_ty,
                    TypedTerm::new(TypedTermKind::Block(elab_terms), term.span),
                ))
            }

            TermKind::Error { msg } => {
                let ty = self.ctx.fresh_var();
                let elab = TypedTerm::new(
                    TypedTermKind::Error {
                        msg: msg.clone(),
                        ty: ty.clone(),
                    },
                    term.span,
                );
                Ok((ty, elab))
            }

            TermKind::Builtin(tag) => {
                let sig = self
                    .builtins
                    .signature(*tag)
                    .ok_or(TypeError::Unsupported {
                        construct: "builtin without a registered signature",
                        span: term.span,
                    })?
                    .clone();
                let origin = ConstraintOrigin::BuiltinUse { span: term.span };
                let (ty, args) = self.ctx.instantiate_imported(&sig, &origin)?;
                let elab = TypedTerm::new(TypedTermKind::Builtin(*tag), term.span);
                Ok((ty, wrap_ty_app(elab, args, term.span)))
            }

            TermKind::DynAccess { .. } => Err(TypeError::Unsupported {
                construct: "dynamic field access",
                span: term.span,
            }),

            TermKind::Lit(lit) => {
                let ty = match lit {
                    Literal::Int(_) => Ty::int(),
                    Literal::Decimal(_) => Ty::decimal(),
                    Literal::Bool(_) => Ty::bool(),
                    Literal::Str(_) => Ty::string(),
                    Literal::Unit => Ty::unit(),
                    Literal::Time(_) => Ty::time(),
                    Literal::Guard(_) => Ty::guard(),
                };
                Ok((ty, TypedTerm::new(TypedTermKind::Lit(lit.clone()), term.span)))
            }

            TermKind::Object(fields) => {
                let mut field_tys: BTreeMap<String, Ty> = BTreeMap::new();
                let mut elab_fields = Vec::with_capacity(fields.len());
                for (name, value) in fields {
                    let (ty, elab) = self.infer(value)?;
                    if field_tys.insert(name.clone(), ty).is_some() {
                        return Err(TypeError::Unsupported {
                            construct: "duplicate object field",
                            span: value.span,
                        });
                    }
                    elab_fields.push((name.clone(), elab));
                }
                // Object literals are closed rows: the field set is exact.
                let ty = Ty::Record(Row::from_parts(field_tys, None));
                Ok((
                    ty,
                    TypedTerm::new(TypedTermKind::Object(elab_fields), term.span),
                ))
            }

            TermKind::List(items) => {
                let elem_ty = self.ctx.fresh_var();
                let mut elab_items = Vec::with_capacity(items.len());
                for item in items {
                    let (ty, elab) = self.infer(item)?;
                    let origin = ConstraintOrigin::ListElement {
                        list_span: term.span,
                        elem_span: item.span,
                    };
                    self.ctx.unify(elem_ty.clone(), ty, &origin)?;
                    elab_items.push(elab);
                }
                // An empty list leaves the element free, to be generalized
                // at an enclosing let.
                let elab = TypedTerm::new(
                    TypedTermKind::List {
                        elem_ty: elem_ty.clone(),
                        items: elab_items,
                    },
                    term.span,
                );
                Ok((Ty::list(elem_ty), elab))
            }
        }
    }
}

/// Wrap a use of a polymorphic value in a `TyApp` when there are type
/// arguments to record.
pub(crate) fn wrap_ty_app(term: TypedTerm, args: Vec<Ty>, span: tally_common::Span) -> TypedTerm {
    if args.is_empty() {
        term
    } else {
        TypedTerm::new(
            TypedTermKind::TyApp {
                term: Box::new(term),
                args,
            },
            span,
        )
    }
}

/// Wrap a polymorphic definition in a `TyAbs` when the scheme quantifies
/// anything.
pub(crate) fn wrap_ty_abs(ctx: &mut InferCtx, term: TypedTerm, scheme: &Scheme) -> TypedTerm {
    if scheme.vars.is_empty() {
        return term;
    }
    let span = term.span;
    let vars = scheme
        .vars
        .iter()
        .map(|v| TyBinder {
            var: *v,
            name: ctx.var_name(*v),
        })
        .collect();
    TypedTerm::new(
        TypedTermKind::TyAbs {
            vars,
            body: Box::new(term),
        },
        span,
    )
}
