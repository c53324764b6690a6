//! Row unification scenarios: closed object rows, open rows driven by
//! row-polymorphic signatures, field-order independence, and table rows.

use std::collections::BTreeMap;

use tally_common::{Literal, Span, Term, TermKind};
use tally_typeck::builtins::BuiltinTypes;
use tally_typeck::error::{ConstraintOrigin, TypeError};
use tally_typeck::ty::{NamedDeBruijn, Row, RowTail, Ty};
use tally_typeck::unify::InferCtx;
use tally_typeck::run_infer;

// ── Helpers ────────────────────────────────────────────────────────────

fn sp() -> Span {
    Span::dummy()
}

fn origin() -> ConstraintOrigin {
    ConstraintOrigin::Result { span: sp() }
}

fn object(fields: Vec<(&str, Term)>) -> Term {
    Term::new(
        TermKind::Object(
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        ),
        sp(),
    )
}

fn int(n: i64) -> Term {
    Term::new(TermKind::Lit(Literal::Int(n)), sp())
}

fn str_lit(s: &str) -> Term {
    Term::new(TermKind::Lit(Literal::Str(s.to_string())), sp())
}

/// The row-polymorphic field accessor for `name`:
/// forall a r. {name: a | r} -> a.
fn name_accessor_sig() -> Ty {
    let mut fields = BTreeMap::new();
    fields.insert("name".to_string(), Ty::Bound(NamedDeBruijn::new(1, "a")));
    let row = Row::Fields(fields, Some(RowTail::Bound(NamedDeBruijn::new(0, "r"))));
    Ty::Forall(
        vec!["a".to_string(), "r".to_string()],
        Box::new(Ty::fun(Ty::Record(row), Ty::Bound(NamedDeBruijn::new(1, "a")))),
    )
}

// ── Closed rows from object literals ───────────────────────────────────

#[test]
fn test_object_rows_are_field_order_independent() {
    let builtins = BuiltinTypes::standard();
    let ab = object(vec![("name", str_lit("x")), ("age", int(1))]);
    let ba = object(vec![("age", int(1)), ("name", str_lit("x"))]);

    let first = run_infer(0, &builtins, &ab).unwrap();
    let second = run_infer(0, &builtins, &ba).unwrap();
    assert_eq!(first.scheme, second.scheme);
    assert_eq!(format!("{}", first.scheme), "{age: Int, name: String}");
}

// ── Row-polymorphic signatures ─────────────────────────────────────────

/// SCENARIO: a field accessor of type forall a r. {name: a | r} -> a,
/// applied to {name: "x", age: 1}, yields String.
#[test]
fn test_row_polymorphic_field_access() {
    let mut ctx = InferCtx::new(0);
    ctx.enter_level();
    let sig = name_accessor_sig();
    let (opened, args) = ctx.instantiate_imported(&sig, &origin()).unwrap();
    assert_eq!(args.len(), 2);

    let (dom, cod) = match opened {
        Ty::Fun(d, c) => (*d, *c),
        other => panic!("expected a function, got {}", other),
    };

    let literal = Ty::record(vec![("age", Ty::int()), ("name", Ty::string())]);
    ctx.unify(dom, literal, &origin()).unwrap();

    assert_eq!(ctx.resolve(cod), Ty::string());
    // The row argument absorbed the remaining fields.
    match ctx.resolve(args[1].clone()) {
        Ty::Record(row) => {
            assert_eq!(
                row,
                Row::Fields(
                    [("age".to_string(), Ty::int())].into_iter().collect(),
                    None
                )
            );
        }
        other => panic!("expected the tail to resolve to a record, got {}", other),
    }
}

#[test]
fn test_row_polymorphic_access_keeps_its_generality() {
    // Unifying the accessor against two differently-shaped records in two
    // separate instantiations works fine.
    let mut ctx = InferCtx::new(0);
    ctx.enter_level();
    let sig = name_accessor_sig();

    for (record, expected) in [
        (Ty::record(vec![("name", Ty::int())]), Ty::int()),
        (
            Ty::record(vec![("active", Ty::bool()), ("name", Ty::time())]),
            Ty::time(),
        ),
    ] {
        let (opened, _) = ctx.instantiate_imported(&sig, &origin()).unwrap();
        let (dom, cod) = match opened {
            Ty::Fun(d, c) => (*d, *c),
            other => panic!("expected a function, got {}", other),
        };
        ctx.unify(dom, record, &origin()).unwrap();
        assert_eq!(ctx.resolve(cod), expected);
    }
}

#[test]
fn test_missing_field_fails() {
    let mut ctx = InferCtx::new(0);
    ctx.enter_level();
    let (opened, _) = ctx
        .instantiate_imported(&name_accessor_sig(), &origin())
        .unwrap();
    let dom = match opened {
        Ty::Fun(d, _) => *d,
        other => panic!("expected a function, got {}", other),
    };

    // {age: Int} has no `name` field.
    let literal = Ty::record(vec![("age", Ty::int())]);
    match ctx.unify(dom, literal, &origin()).unwrap_err() {
        TypeError::Mismatch { .. } => {}
        other => panic!("expected Mismatch, got {:?}", other),
    }
}

// ── Open rows meeting open rows ────────────────────────────────────────

#[test]
fn test_open_rows_accumulate_constraints() {
    let mut ctx = InferCtx::new(0);
    ctx.enter_level();

    // Two accessor-style constraints against the same record variable:
    // the record must carry both fields.
    let record = ctx.fresh_var();

    let mut want_name = BTreeMap::new();
    want_name.insert("name".to_string(), Ty::string());
    let name_tail = ctx.fresh_tvar();
    ctx.unify(
        record.clone(),
        Ty::Record(Row::Fields(want_name, Some(RowTail::Var(name_tail)))),
        &origin(),
    )
    .unwrap();

    let mut want_age = BTreeMap::new();
    want_age.insert("age".to_string(), Ty::int());
    let age_tail = ctx.fresh_tvar();
    ctx.unify(
        record.clone(),
        Ty::Record(Row::Fields(want_age, Some(RowTail::Var(age_tail)))),
        &origin(),
    )
    .unwrap();

    match ctx.resolve(record) {
        Ty::Record(Row::Fields(fields, Some(_))) => {
            assert_eq!(
                fields.keys().cloned().collect::<Vec<_>>(),
                vec!["age".to_string(), "name".to_string()]
            );
            assert_eq!(fields["name"], Ty::string());
            assert_eq!(fields["age"], Ty::int());
        }
        other => panic!("expected an open record with both fields, got {}", other),
    }
}

#[test]
fn test_open_row_field_types_still_unify() {
    let mut ctx = InferCtx::new(0);
    ctx.enter_level();

    let elem = ctx.fresh_var();
    let lt = ctx.fresh_tvar();
    let mut lf = BTreeMap::new();
    lf.insert("balance".to_string(), elem.clone());
    let left = Ty::Record(Row::Fields(lf, Some(RowTail::Var(lt))));

    let rt = ctx.fresh_tvar();
    let mut rf = BTreeMap::new();
    rf.insert("balance".to_string(), Ty::decimal());
    let right = Ty::Record(Row::Fields(rf, Some(RowTail::Var(rt))));

    ctx.unify(left, right, &origin()).unwrap();
    assert_eq!(ctx.resolve(elem), Ty::decimal());
}

// ── Tables ─────────────────────────────────────────────────────────────

#[test]
fn test_table_signature_constrains_row() {
    let mut ctx = InferCtx::new(0);
    ctx.enter_level();

    // A read-like signature: forall r. table{r} -> {r}.
    let sig = Ty::Forall(
        vec!["r".to_string()],
        Box::new(Ty::fun(
            Ty::Table(Row::Bound(NamedDeBruijn::new(0, "r"))),
            Ty::Record(Row::Bound(NamedDeBruijn::new(0, "r"))),
        )),
    );
    let (opened, _) = ctx.instantiate_imported(&sig, &origin()).unwrap();
    let (dom, cod) = match opened {
        Ty::Fun(d, c) => (*d, *c),
        other => panic!("expected a function, got {}", other),
    };

    let mut fields = BTreeMap::new();
    fields.insert("balance".to_string(), Ty::decimal());
    let accounts = Ty::Table(Row::Fields(fields, None));
    ctx.unify(dom, accounts, &origin()).unwrap();

    assert_eq!(
        ctx.resolve(cod),
        Ty::record(vec![("balance", Ty::decimal())])
    );
}

// ── Generalization over rows ───────────────────────────────────────────

#[test]
fn test_open_row_generalizes_field_and_tail() {
    let mut ctx = InferCtx::new(0);
    ctx.enter_level();
    let (opened, _) = ctx
        .instantiate_imported(&name_accessor_sig(), &origin())
        .unwrap();
    ctx.leave_level();

    // Left untouched, the opened accessor re-generalizes to its scheme.
    let scheme = ctx.generalize(opened, &origin()).unwrap();
    assert_eq!(scheme.vars.len(), 2);
    let closed = tally_typeck::debruijn::close_scheme(&mut ctx, &scheme, &origin()).unwrap();
    assert_eq!(format!("{}", closed), "forall a b. {name: a | b} -> a");
}
