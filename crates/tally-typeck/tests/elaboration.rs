//! Tests for the elaborated output: explicit type abstraction and
//! application, per-parameter lambda types, and de Bruijn indices after
//! closure.

use tally_common::{Builtin, Literal, Param, Span, Term, TermKind, Var};
use tally_typeck::builtins::BuiltinTypes;
use tally_typeck::elab::TypedTermKind;
use tally_typeck::ty::{NamedDeBruijn, Prim, Ty};
use tally_typeck::{run_infer, Inferred};

// ── Helpers ────────────────────────────────────────────────────────────

fn sp() -> Span {
    Span::dummy()
}

fn term(kind: TermKind) -> Term {
    Term::new(kind, sp())
}

fn var(name: &str, index: u32) -> Term {
    term(TermKind::Var(Var::new(name, index)))
}

fn lam(params: &[&str], body: Term) -> Term {
    term(TermKind::Lam {
        name: None,
        params: params.iter().map(|p| Param::new(*p, sp())).collect(),
        body: Box::new(body),
    })
}

fn app(func: Term, args: Vec<Term>) -> Term {
    term(TermKind::App { func: Box::new(func), args })
}

fn let_(name: &str, rhs: Term, body: Term) -> Term {
    term(TermKind::Let {
        name: name.to_string(),
        rhs: Box::new(rhs),
        body: Box::new(body),
    })
}

fn int(n: i64) -> Term {
    term(TermKind::Lit(Literal::Int(n)))
}

fn builtin(tag: Builtin) -> Term {
    term(TermKind::Builtin(tag))
}

fn infer(t: &Term) -> Inferred {
    run_infer(0, &BuiltinTypes::standard(), t).expect("expected inference to succeed")
}

// ── Type abstraction ───────────────────────────────────────────────────

/// SCENARIO: the identity elaborates to TyAbs([a], fn (x: a) -> x).
#[test]
fn test_identity_elaboration() {
    let inferred = infer(&lam(&["x"], var("x", 0)));

    let (vars, body) = match inferred.term.kind {
        TypedTermKind::TyAbs { vars, body } => (vars, *body),
        other => panic!("expected a TyAbs at the root, got {:?}", other),
    };
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].name, "a");

    match body.kind {
        TypedTermKind::Lam { params, .. } => {
            assert_eq!(params.len(), 1);
            assert_eq!(params[0].0, "x");
            // Under one binder, the parameter's type is the innermost
            // de Bruijn variable.
            assert_eq!(params[0].1, Ty::Bound(NamedDeBruijn::new(0, "a")));
        }
        other => panic!("expected a Lam under the TyAbs, got {:?}", other),
    }
}

#[test]
fn test_monomorphic_term_has_no_ty_abs() {
    let inferred = infer(&int(1));
    assert!(matches!(inferred.term.kind, TypedTermKind::Lit(Literal::Int(1))));
}

// ── Type application ───────────────────────────────────────────────────

/// SCENARIO: let id = fn x -> x in id 1 records the instantiation as
/// TyApp(id, [Int]).
#[test]
fn test_let_polymorphism_elaboration() {
    let t = let_(
        "id",
        lam(&["x"], var("x", 0)),
        app(var("id", 0), vec![int(1)]),
    );
    let inferred = infer(&t);

    let (rhs, body) = match inferred.term.kind {
        TypedTermKind::Let { rhs, body, .. } => (*rhs, *body),
        other => panic!("expected a Let, got {:?}", other),
    };

    // The polymorphic right-hand side is a TyAbs.
    match rhs.kind {
        TypedTermKind::TyAbs { ref vars, .. } => assert_eq!(vars.len(), 1),
        other => panic!("expected a TyAbs right-hand side, got {:?}", other),
    }

    // The use site wraps the variable in TyApp with the chosen argument.
    let func = match body.kind {
        TypedTermKind::App { func, .. } => *func,
        other => panic!("expected an App body, got {:?}", other),
    };
    match func.kind {
        TypedTermKind::TyApp { term, args } => {
            assert!(matches!(term.kind, TypedTermKind::Var(_)));
            assert_eq!(args, vec![Ty::Prim(Prim::Int)]);
        }
        other => panic!("expected a TyApp around the use, got {:?}", other),
    }
}

#[test]
fn test_polymorphic_builtin_gets_ty_app() {
    // length [1] -- the builtin's quantifier is instantiated at Int.
    let t = app(
        builtin(Builtin::Length),
        vec![term(TermKind::List(vec![int(1)]))],
    );
    let inferred = infer(&t);

    let func = match inferred.term.kind {
        TypedTermKind::App { func, .. } => *func,
        other => panic!("expected an App, got {:?}", other),
    };
    match func.kind {
        TypedTermKind::TyApp { term, args } => {
            assert!(matches!(term.kind, TypedTermKind::Builtin(Builtin::Length)));
            assert_eq!(args, vec![Ty::Prim(Prim::Int)]);
        }
        other => panic!("expected a TyApp around the builtin, got {:?}", other),
    }
}

#[test]
fn test_monomorphic_builtin_has_no_ty_app() {
    let t = app(builtin(Builtin::Add), vec![int(1), int(2)]);
    let inferred = infer(&t);
    let func = match inferred.term.kind {
        TypedTermKind::App { func, .. } => *func,
        other => panic!("expected an App, got {:?}", other),
    };
    assert!(matches!(func.kind, TypedTermKind::Builtin(Builtin::Add)));
}

// ── Nested binders and de Bruijn indices ───────────────────────────────

/// A let-polymorphic binding nested under an outer quantifier: the inner
/// TyAbs binder gets the next slot, and occurrences count binders inward
/// from their own position.
#[test]
fn test_nested_ty_abs_indices() {
    // fn y -> let id = fn x -> x in id y
    // Scheme: forall a. a -> a, with an inner forall for id.
    let t = lam(
        &["y"],
        let_(
            "id",
            lam(&["x"], var("x", 0)),
            app(var("id", 0), vec![var("y", 1)]),
        ),
    );
    let inferred = infer(&t);
    assert_eq!(format!("{}", inferred.scheme), "forall a. a -> a");

    // Root: TyAbs([a], Lam y ...).
    let (outer_vars, outer_body) = match inferred.term.kind {
        TypedTermKind::TyAbs { vars, body } => (vars, *body),
        other => panic!("expected a TyAbs at the root, got {:?}", other),
    };
    assert_eq!(outer_vars.len(), 1);
    assert_eq!(outer_vars[0].name, "a");

    let lam_body = match outer_body.kind {
        TypedTermKind::Lam { params, body, .. } => {
            assert_eq!(params[0].1, Ty::Bound(NamedDeBruijn::new(0, "a")));
            *body
        }
        other => panic!("expected a Lam, got {:?}", other),
    };

    // The inner let's right-hand side binds the next slot, named "b".
    let (rhs, let_body) = match lam_body.kind {
        TypedTermKind::Let { rhs, body, .. } => (*rhs, *body),
        other => panic!("expected a Let, got {:?}", other),
    };
    match rhs.kind {
        TypedTermKind::TyAbs { vars, body } => {
            assert_eq!(vars.len(), 1);
            assert_eq!(vars[0].name, "b");
            match body.kind {
                TypedTermKind::Lam { params, .. } => {
                    // Inside the inner TyAbs, its own binder is innermost.
                    assert_eq!(params[0].1, Ty::Bound(NamedDeBruijn::new(0, "b")));
                }
                other => panic!("expected a Lam, got {:?}", other),
            }
        }
        other => panic!("expected an inner TyAbs, got {:?}", other),
    }

    // At the use site (under the outer binder only), id is instantiated at
    // the outer quantifier.
    let func = match let_body.kind {
        TypedTermKind::App { func, .. } => *func,
        other => panic!("expected an App, got {:?}", other),
    };
    match func.kind {
        TypedTermKind::TyApp { args, .. } => {
            assert_eq!(args, vec![Ty::Bound(NamedDeBruijn::new(0, "a"))]);
        }
        other => panic!("expected a TyApp, got {:?}", other),
    }
}

// ── Annotated nodes ────────────────────────────────────────────────────

#[test]
fn test_error_node_carries_required_type() {
    // int-to-str (error "boom"): the error node must be annotated Int.
    let t = app(
        builtin(Builtin::IntToStr),
        vec![term(TermKind::Error { msg: "boom".into() })],
    );
    let inferred = infer(&t);

    let args = match inferred.term.kind {
        TypedTermKind::App { args, .. } => args,
        other => panic!("expected an App, got {:?}", other),
    };
    match &args[0].kind {
        TypedTermKind::Error { msg, ty } => {
            assert_eq!(msg, "boom");
            assert_eq!(*ty, Ty::Prim(Prim::Int));
        }
        other => panic!("expected an Error node, got {:?}", other),
    }
}

#[test]
fn test_list_node_carries_element_type() {
    let t = term(TermKind::List(vec![int(1), int(2)]));
    let inferred = infer(&t);
    match inferred.term.kind {
        TypedTermKind::List { elem_ty, items } => {
            assert_eq!(elem_ty, Ty::Prim(Prim::Int));
            assert_eq!(items.len(), 2);
        }
        other => panic!("expected a List node, got {:?}", other),
    }
}

#[test]
fn test_lam_params_each_carry_their_type() {
    // fn x y -> + x y : both params close to Int.
    let t = lam(
        &["x", "y"],
        app(builtin(Builtin::Add), vec![var("x", 1), var("y", 0)]),
    );
    let inferred = infer(&t);
    assert_eq!(format!("{}", inferred.scheme), "Int -> Int -> Int");
    match inferred.term.kind {
        TypedTermKind::Lam { params, .. } => {
            assert_eq!(params[0], ("x".to_string(), Ty::Prim(Prim::Int)));
            assert_eq!(params[1], ("y".to_string(), Ty::Prim(Prim::Int)));
        }
        other => panic!("expected a Lam, got {:?}", other),
    }
}

// ── Round trip ─────────────────────────────────────────────────────────

/// A generalized binding instantiated at a single use keeps the same shape
/// as its definition: the TyApp argument at the use site is exactly the
/// enclosing binder.
#[test]
fn test_generalize_then_instantiate_round_trip() {
    // let id = fn x -> x in id
    let t = let_("id", lam(&["x"], var("x", 0)), var("id", 0));
    let inferred = infer(&t);
    assert_eq!(format!("{}", inferred.scheme), "forall a. a -> a");

    // Root TyAbs wraps the let; the body's use site applies id at the
    // root binder.
    let let_term = match inferred.term.kind {
        TypedTermKind::TyAbs { body, .. } => *body,
        other => panic!("expected a TyAbs at the root, got {:?}", other),
    };
    let body = match let_term.kind {
        TypedTermKind::Let { body, .. } => *body,
        other => panic!("expected a Let, got {:?}", other),
    };
    match body.kind {
        TypedTermKind::TyApp { args, .. } => {
            assert_eq!(args, vec![Ty::Bound(NamedDeBruijn::new(0, "a"))]);
        }
        other => panic!("expected a TyApp, got {:?}", other),
    }
}

// ── Spans survive elaboration ──────────────────────────────────────────

#[test]
fn test_spans_are_preserved() {
    let inner = Term::new(TermKind::Lit(Literal::Int(7)), Span::new(4, 5));
    let t = Term::new(
        TermKind::Block(vec![inner]),
        Span::new(0, 6),
    );
    let inferred = run_infer(0, &BuiltinTypes::standard(), &t).unwrap();
    assert_eq!(inferred.term.span, Span::new(0, 6));
    match inferred.term.kind {
        TypedTermKind::Block(items) => assert_eq!(items[0].span, Span::new(4, 5)),
        other => panic!("expected a Block, got {:?}", other),
    }
}
