//! Builtin signature registration.
//!
//! Maps every builtin tag to its closed type signature. Polymorphic
//! signatures are `Forall`-headed with de Bruijn occurrences (index 0 is
//! the innermost binder, so in `forall a b. ...` an occurrence of `a` is
//! index 1 and `b` is index 0). The registry is read-only during inference
//! and may be shared across runs.

use rustc_hash::FxHashMap;

use tally_common::Builtin;

use crate::ty::{NamedDeBruijn, Ty};

/// The builtin signature registry supplied to an inference run.
#[derive(Debug, Default)]
pub struct BuiltinTypes {
    sigs: FxHashMap<Builtin, Ty>,
}

impl BuiltinTypes {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a signature.
    pub fn insert(&mut self, tag: Builtin, sig: Ty) {
        self.sigs.insert(tag, sig);
    }

    /// Look up a tag's signature.
    pub fn signature(&self, tag: Builtin) -> Option<&Ty> {
        self.sigs.get(&tag)
    }

    /// The standard registry covering every builtin tag.
    pub fn standard() -> Self {
        let mut reg = BuiltinTypes::new();

        // ── Integer arithmetic ──────────────────────────────────────────

        let int_binop = Ty::arrow(vec![Ty::int(), Ty::int()], Ty::int());
        for tag in [
            Builtin::Add,
            Builtin::Sub,
            Builtin::Mul,
            Builtin::Div,
            Builtin::Mod,
            Builtin::BitAnd,
            Builtin::BitOr,
            Builtin::BitXor,
            Builtin::Shift,
        ] {
            reg.insert(tag, int_binop.clone());
        }

        let int_unop = Ty::fun(Ty::int(), Ty::int());
        for tag in [Builtin::Negate, Builtin::Abs, Builtin::BitNot] {
            reg.insert(tag, int_unop.clone());
        }

        // ── Decimal arithmetic ──────────────────────────────────────────

        let dec_binop = Ty::arrow(vec![Ty::decimal(), Ty::decimal()], Ty::decimal());
        for tag in [Builtin::DecAdd, Builtin::DecSub, Builtin::DecMul, Builtin::DecDiv] {
            reg.insert(tag, dec_binop.clone());
        }

        let dec_unop = Ty::fun(Ty::decimal(), Ty::decimal());
        for tag in [Builtin::DecNegate, Builtin::DecAbs] {
            reg.insert(tag, dec_unop.clone());
        }

        // Rounding takes a decimal down to an integer.
        let rounding = Ty::fun(Ty::decimal(), Ty::int());
        for tag in [Builtin::Round, Builtin::Truncate, Builtin::Ceiling, Builtin::Floor] {
            reg.insert(tag, rounding.clone());
        }

        // ── Integer comparisons ─────────────────────────────────────────

        let int_cmp = Ty::arrow(vec![Ty::int(), Ty::int()], Ty::bool());
        for tag in [
            Builtin::Lt,
            Builtin::Gt,
            Builtin::Leq,
            Builtin::Geq,
            Builtin::Eq,
            Builtin::Neq,
        ] {
            reg.insert(tag, int_cmp.clone());
        }

        // ── Logical operators ───────────────────────────────────────────

        reg.insert(Builtin::Not, Ty::fun(Ty::bool(), Ty::bool()));
        let bool_binop = Ty::arrow(vec![Ty::bool(), Ty::bool()], Ty::bool());
        reg.insert(Builtin::And, bool_binop.clone());
        reg.insert(Builtin::Or, bool_binop);

        // ── Polymorphic list and control operations ─────────────────────
        //
        // Occurrences count binders inward: in `forall a b. ...` an
        // occurrence of `a` is index 1 and `b` is index 0.

        let a1 = || bound(1, "a");
        let b0 = || bound(0, "b");
        let a0 = || bound(0, "a");

        // map : forall a b. (a -> b) -> [a] -> [b]
        reg.insert(
            Builtin::Map,
            forall2(
                Ty::arrow(vec![Ty::fun(a1(), b0()), Ty::list(a1())], Ty::list(b0())),
            ),
        );

        // fold : forall a b. (a -> b -> a) -> a -> [b] -> a
        reg.insert(
            Builtin::Fold,
            forall2(Ty::arrow(
                vec![Ty::arrow(vec![a1(), b0()], a1()), a1(), Ty::list(b0())],
                a1(),
            )),
        );

        // filter : forall a. (a -> Bool) -> [a] -> [a]
        reg.insert(
            Builtin::Filter,
            forall1(Ty::arrow(
                vec![Ty::fun(a0(), Ty::bool()), Ty::list(a0())],
                Ty::list(a0()),
            )),
        );

        // if : forall a. Bool -> (Unit -> a) -> (Unit -> a) -> a
        // Branches are thunks; only the taken branch is forced.
        reg.insert(
            Builtin::If,
            forall1(Ty::arrow(
                vec![
                    Ty::bool(),
                    Ty::fun(Ty::unit(), a0()),
                    Ty::fun(Ty::unit(), a0()),
                ],
                a0(),
            )),
        );

        // take, drop : forall a. Int -> [a] -> [a]
        let slice = forall1(Ty::arrow(vec![Ty::int(), Ty::list(a0())], Ty::list(a0())));
        reg.insert(Builtin::Take, slice.clone());
        reg.insert(Builtin::Drop, slice);

        // length : forall a. [a] -> Int
        reg.insert(Builtin::Length, forall1(Ty::fun(Ty::list(a0()), Ty::int())));

        // reverse : forall a. [a] -> [a]
        reg.insert(
            Builtin::Reverse,
            forall1(Ty::fun(Ty::list(a0()), Ty::list(a0()))),
        );

        // ── Monomorphic list and string operations ──────────────────────

        let int_list_endo = Ty::fun(Ty::list(Ty::int()), Ty::list(Ty::int()));
        reg.insert(Builtin::Distinct, int_list_endo.clone());
        reg.insert(Builtin::Sort, int_list_endo);

        reg.insert(
            Builtin::Concat,
            Ty::fun(Ty::list(Ty::string()), Ty::string()),
        );
        reg.insert(Builtin::IntToStr, Ty::fun(Ty::int(), Ty::string()));
        reg.insert(Builtin::StrToInt, Ty::fun(Ty::string(), Ty::int()));

        reg.insert(
            Builtin::Enumerate,
            Ty::arrow(vec![Ty::int(), Ty::int()], Ty::list(Ty::int())),
        );
        reg.insert(
            Builtin::EnumerateStep,
            Ty::arrow(vec![Ty::int(), Ty::int(), Ty::int()], Ty::list(Ty::int())),
        );

        // ── Contract operations ─────────────────────────────────────────

        reg.insert(
            Builtin::Enforce,
            Ty::arrow(vec![Ty::bool(), Ty::string()], Ty::unit()),
        );
        reg.insert(Builtin::EnforceGuard, Ty::fun(Ty::guard(), Ty::bool()));
        reg.insert(
            Builtin::AddTime,
            Ty::arrow(vec![Ty::time(), Ty::decimal()], Ty::time()),
        );
        reg.insert(
            Builtin::DiffTime,
            Ty::arrow(vec![Ty::time(), Ty::time()], Ty::decimal()),
        );

        reg
    }
}

/// A de Bruijn occurrence.
fn bound(index: u32, name: &str) -> Ty {
    Ty::Bound(NamedDeBruijn::new(index, name))
}

/// A signature quantifying one variable, `a`.
fn forall1(body: Ty) -> Ty {
    Ty::Forall(vec!["a".to_string()], Box::new(body))
}

/// A signature quantifying two variables, `a` and `b`.
fn forall2(body: Ty) -> Ty {
    Ty::Forall(vec!["a".to_string(), "b".to_string()], Box::new(body))
}
