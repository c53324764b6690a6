//! Unification engine for Hindley-Milner inference with rows.
//!
//! Implements the core unification algorithm on top of `ena`'s union-find
//! table: occurs check with level lowering, row unification, level-based
//! generalization (Remy's algorithm), and scheme instantiation.
//!
//! The level discipline is what makes generalization near-linear: every
//! unbound variable records the `let`-nesting level it was created at, and
//! the occurs check lowers the level of every variable it reaches to the
//! level of the variable being bound. Generalization then quantifies exactly
//! the variables whose level exceeds the current one, without traversing the
//! environment.

use std::collections::BTreeMap;

use ena::unify::InPlaceUnificationTable;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{NamedDeBruijn, Row, RowTail, Scheme, Ty, TyVar, TyVarValue};

/// The inference context -- owns the unification table, the unique supply
/// offset, and the level register.
///
/// A context belongs to exactly one inference run. All of its cells are
/// dropped with it; the closed outputs of a run never reference them.
pub struct InferCtx {
    /// The union-find unification table (ena). Cell levels live inside the
    /// table values so that var-var unions keep the minimum level.
    table: InPlaceUnificationTable<TyVar>,
    /// Current let-nesting level for generalization.
    current_level: u32,
    /// Offset added to table indices to form globally unique ids, so a
    /// downstream pass can continue allocating from `next_unique`.
    base_unique: u32,
}

impl InferCtx {
    /// Create a context whose uniques start at `supply`.
    pub fn new(supply: u32) -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
            current_level: 0,
            base_unique: supply,
        }
    }

    // ── Variable supply ─────────────────────────────────────────────────

    /// Allocate a fresh unbound type variable at the current level.
    pub fn fresh_tvar(&mut self) -> TyVar {
        self.table.new_key(TyVarValue::Unbound { level: self.current_level })
    }

    /// Allocate a fresh variable and wrap it as a type.
    pub fn fresh_var(&mut self) -> Ty {
        Ty::Var(self.fresh_tvar())
    }

    /// The first unique id not allocated by this context.
    pub fn next_unique(&self) -> u32 {
        self.base_unique + self.table.len() as u32
    }

    /// Display name of a variable's root cell. Has no semantic role.
    pub fn var_name(&mut self, v: TyVar) -> String {
        let root = self.table.find(v);
        format!("a_{}", self.base_unique + root.0)
    }

    // ── Cell access ─────────────────────────────────────────────────────

    /// Read a cell's current state.
    pub fn probe(&mut self, v: TyVar) -> TyVarValue {
        self.table.probe_value(v)
    }

    /// The union-find root of a variable.
    pub fn root(&mut self, v: TyVar) -> TyVar {
        self.table.find(v)
    }

    // ── Level register ──────────────────────────────────────────────────

    /// Enter a new binding level (brackets a `let` right-hand side).
    pub fn enter_level(&mut self) {
        self.current_level += 1;
    }

    /// Leave the current binding level.
    pub fn leave_level(&mut self) {
        debug_assert!(self.current_level > 0, "cannot leave level 0");
        self.current_level -= 1;
    }

    /// Current nesting level.
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Resolve a type by following links, normalizing variables to their
    /// union-find root and inlining row tails that have become ground.
    ///
    /// Normalizing to the root is what makes two unified-but-unbound
    /// variables appear as the same variable, which generalization and
    /// closure depend on.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.probe(v) {
                TyVarValue::Link(inner) => self.resolve(inner),
                _ => Ty::Var(self.table.find(v)),
            },
            Ty::Fun(dom, cod) => Ty::fun(self.resolve(*dom), self.resolve(*cod)),
            Ty::List(elem) => Ty::list(self.resolve(*elem)),
            Ty::Record(row) => Ty::Record(self.resolve_row(row)),
            Ty::Table(row) => Ty::Table(self.resolve_row(row)),
            Ty::Forall(vars, body) => Ty::Forall(vars, Box::new(self.resolve(*body))),
            other => other,
        }
    }

    /// Resolve a row: follow variable and tail links, flattening nested
    /// field sets into the enclosing row.
    ///
    /// A tail whose link turns out not to be a row is left in place here;
    /// the unification and generalization paths surface it as `RowLink`.
    pub fn resolve_row(&mut self, row: Row) -> Row {
        match row {
            Row::Empty | Row::Bound(_) => row,
            Row::Var(v) => match self.probe(v) {
                TyVarValue::Link(inner) => match self.resolve(inner) {
                    Ty::Record(r) => r,
                    Ty::Var(w) => Row::Var(w),
                    _ => Row::Var(self.table.find(v)),
                },
                _ => Row::Var(self.table.find(v)),
            },
            Row::Fields(fields, tail) => {
                let fields: BTreeMap<String, Ty> = fields
                    .into_iter()
                    .map(|(name, ty)| (name, self.resolve(ty)))
                    .collect();
                match tail {
                    None => Row::from_parts(fields, None),
                    Some(RowTail::Bound(db)) => Row::from_parts(fields, Some(RowTail::Bound(db))),
                    Some(RowTail::Var(v)) => match self.probe(v) {
                        TyVarValue::Link(inner) => match self.resolve(inner) {
                            Ty::Record(r) => splice_tail(fields, r),
                            Ty::Var(w) => Row::from_parts(fields, Some(RowTail::Var(w))),
                            _ => Row::from_parts(
                                fields,
                                Some(RowTail::Var(self.table.find(v))),
                            ),
                        },
                        _ => Row::from_parts(fields, Some(RowTail::Var(self.table.find(v)))),
                    },
                }
            }
        }
    }

    // ── Occurs check with level lowering ────────────────────────────────

    /// Check that `var` does not occur in `ty`, lowering the level of every
    /// unbound variable reached to `var`'s level along the way.
    ///
    /// The lowering keeps the rank invariant: anything reachable from `var`
    /// after the bind must not outlive `var`'s scope, so it must not carry
    /// a deeper level than `var` does.
    fn occurs(
        &mut self,
        var: TyVar,
        var_level: u32,
        ty: &Ty,
        whole: &Ty,
        origin: &ConstraintOrigin,
    ) -> Result<(), TypeError> {
        match ty {
            Ty::Var(w) => self.occurs_var(var, var_level, *w, whole, origin),
            Ty::Bound(_) | Ty::Prim(_) | Ty::Cap => Ok(()),
            Ty::Fun(dom, cod) => {
                self.occurs(var, var_level, dom, whole, origin)?;
                self.occurs(var, var_level, cod, whole, origin)
            }
            Ty::List(elem) => self.occurs(var, var_level, elem, whole, origin),
            Ty::Record(row) | Ty::Table(row) => {
                self.occurs_row(var, var_level, row, whole, origin)
            }
            Ty::Forall(..) => Err(TypeError::Impredicative {
                ty: ty.clone(),
                origin: origin.clone(),
            }),
        }
    }

    fn occurs_var(
        &mut self,
        var: TyVar,
        var_level: u32,
        w: TyVar,
        whole: &Ty,
        origin: &ConstraintOrigin,
    ) -> Result<(), TypeError> {
        match self.probe(w) {
            TyVarValue::Link(inner) => self.occurs(var, var_level, &inner, whole, origin),
            TyVarValue::Generalized => Ok(()),
            TyVarValue::Unbound { level } => {
                if self.table.find(var) == self.table.find(w) {
                    Err(TypeError::InfiniteType {
                        var: self.var_name(var),
                        ty: whole.clone(),
                        origin: origin.clone(),
                    })
                } else {
                    self.table
                        .unify_var_value(w, TyVarValue::Unbound { level: level.min(var_level) })
                        .expect("lowering an unbound var's level cannot fail");
                    Ok(())
                }
            }
        }
    }

    fn occurs_row(
        &mut self,
        var: TyVar,
        var_level: u32,
        row: &Row,
        whole: &Ty,
        origin: &ConstraintOrigin,
    ) -> Result<(), TypeError> {
        match row {
            Row::Empty | Row::Bound(_) => Ok(()),
            Row::Var(w) => self.occurs_var(var, var_level, *w, whole, origin),
            Row::Fields(fields, tail) => {
                for ty in fields.values() {
                    self.occurs(var, var_level, ty, whole, origin)?;
                }
                match tail {
                    Some(RowTail::Var(w)) => self.occurs_var(var, var_level, *w, whole, origin),
                    _ => Ok(()),
                }
            }
        }
    }

    // ── Unification ─────────────────────────────────────────────────────

    /// Unify two types, making them structurally equal.
    ///
    /// Both types are resolved first, then compared: identical roots
    /// succeed, variables are bound (after the occurs check), congruent
    /// constructors recurse, and anything else is a mismatch.
    pub fn unify(&mut self, a: Ty, b: Ty, origin: &ConstraintOrigin) -> Result<(), TypeError> {
        let a = self.resolve(a);
        let b = self.resolve(b);

        match (a, b) {
            (Ty::Var(v1), Ty::Var(v2)) => {
                if self.table.find(v1) == self.table.find(v2) {
                    return Ok(());
                }
                match (self.probe(v1), self.probe(v2)) {
                    (TyVarValue::Unbound { .. }, TyVarValue::Unbound { .. }) => {
                        self.table
                            .unify_var_var(v1, v2)
                            .expect("unifying two unbound vars cannot fail");
                        Ok(())
                    }
                    // A generalized variable re-encountered here is opaque.
                    _ => Ok(()),
                }
            }

            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => self.unify_var(v, ty, origin),

            (Ty::Prim(p1), Ty::Prim(p2)) if p1 == p2 => Ok(()),
            (Ty::Cap, Ty::Cap) => Ok(()),
            (Ty::Bound(a), Ty::Bound(b)) if a == b => Ok(()),

            (Ty::Fun(d1, c1), Ty::Fun(d2, c2)) => {
                self.unify(*d1, *d2, origin)?;
                self.unify(*c1, *c2, origin)
            }

            (Ty::List(e1), Ty::List(e2)) => self.unify(*e1, *e2, origin),

            (Ty::Record(r1), Ty::Record(r2)) => self.unify_row(r1, r2, origin),
            (Ty::Table(r1), Ty::Table(r2)) => self.unify_row(r1, r2, origin),

            (a, b) => Err(TypeError::Mismatch {
                expected: a,
                found: b,
                origin: origin.clone(),
            }),
        }
    }

    /// Bind a variable to a non-variable type.
    fn unify_var(&mut self, v: TyVar, ty: Ty, origin: &ConstraintOrigin) -> Result<(), TypeError> {
        match self.probe(v) {
            TyVarValue::Link(inner) => self.unify(inner, ty, origin),
            TyVarValue::Generalized => Ok(()),
            TyVarValue::Unbound { level } => {
                self.occurs(v, level, &ty, &ty, origin)?;
                self.table
                    .unify_var_value(v, TyVarValue::Link(ty))
                    .expect("linking an unbound var cannot fail");
                Ok(())
            }
        }
    }

    // ── Row unification ─────────────────────────────────────────────────

    /// Unify two rows.
    ///
    /// Shared fields unify pairwise in field-name order. Open rows absorb
    /// the other side's surplus fields through their tail; a closed row
    /// admits no surplus. When both rows are open, each tail is bound to
    /// the other side's surplus with its own fresh tail; the two fresh
    /// tails are not linked here and meet only if a later constraint
    /// requires it.
    pub fn unify_row(&mut self, left: Row, right: Row, origin: &ConstraintOrigin) -> Result<(), TypeError> {
        match (left, right) {
            (Row::Var(v), Row::Var(w)) => self.unify(Ty::Var(v), Ty::Var(w), origin),
            (Row::Var(v), r) | (r, Row::Var(v)) => self.bind_row_var(v, r, origin),

            (Row::Empty, Row::Empty) => Ok(()),

            (Row::Bound(a), Row::Bound(b)) if a == b => Ok(()),
            // A generalized row is opaque, like a generalized variable.
            (Row::Bound(_), _) | (_, Row::Bound(_)) => Ok(()),

            (Row::Fields(fields, tail), Row::Empty) | (Row::Empty, Row::Fields(fields, tail)) => {
                if !fields.is_empty() {
                    return Err(row_mismatch(Row::Fields(fields, tail), Row::Empty, origin));
                }
                match tail {
                    Some(RowTail::Var(v)) => self.bind_row_var(v, Row::Empty, origin),
                    _ => Ok(()),
                }
            }

            (Row::Fields(lf, lt), Row::Fields(rf, rt)) => {
                self.unify_fields(lf, lt, rf, rt, origin)
            }
        }
    }

    fn unify_fields(
        &mut self,
        lf: BTreeMap<String, Ty>,
        lt: Option<RowTail>,
        rf: BTreeMap<String, Ty>,
        rt: Option<RowTail>,
        origin: &ConstraintOrigin,
    ) -> Result<(), TypeError> {
        // Shared fields first, in name order.
        for (name, lty) in &lf {
            if let Some(rty) = rf.get(name) {
                self.unify(lty.clone(), rty.clone(), origin)?;
            }
        }

        let l_only: BTreeMap<String, Ty> = lf
            .iter()
            .filter(|(name, _)| !rf.contains_key(*name))
            .map(|(name, ty)| (name.clone(), ty.clone()))
            .collect();
        let r_only: BTreeMap<String, Ty> = rf
            .iter()
            .filter(|(name, _)| !lf.contains_key(*name))
            .map(|(name, ty)| (name.clone(), ty.clone()))
            .collect();

        match (lt, rt) {
            (None, None) => {
                if l_only.is_empty() && r_only.is_empty() {
                    Ok(())
                } else {
                    Err(row_mismatch(
                        Row::from_parts(lf, None),
                        Row::from_parts(rf, None),
                        origin,
                    ))
                }
            }
            (Some(lt), None) => {
                // The open row's known fields must be a subset of the
                // closed row's.
                if !l_only.is_empty() {
                    return Err(row_mismatch(
                        Row::from_parts(lf, Some(lt)),
                        Row::from_parts(rf, None),
                        origin,
                    ));
                }
                self.bind_tail(lt, Row::from_parts(r_only, None), origin)
            }
            (None, Some(rt)) => {
                if !r_only.is_empty() {
                    return Err(row_mismatch(
                        Row::from_parts(lf, None),
                        Row::from_parts(rf, Some(rt)),
                        origin,
                    ));
                }
                self.bind_tail(rt, Row::from_parts(l_only, None), origin)
            }
            (Some(lt), Some(rt)) => {
                let l_fresh = self.fresh_tvar();
                let r_fresh = self.fresh_tvar();
                self.bind_tail(lt, Row::from_parts(r_only, Some(RowTail::Var(l_fresh))), origin)?;
                self.bind_tail(rt, Row::from_parts(l_only, Some(RowTail::Var(r_fresh))), origin)
            }
        }
    }

    fn bind_tail(&mut self, tail: RowTail, rest: Row, origin: &ConstraintOrigin) -> Result<(), TypeError> {
        match tail {
            RowTail::Var(v) => self.bind_row_var(v, rest, origin),
            RowTail::Bound(_) => Ok(()),
        }
    }

    /// Bind a row variable to a row, going through the usual occurs check.
    ///
    /// Row variables are linked to `Record`-wrapped rows; finding any other
    /// link here means an imported signature used one quantifier in both
    /// type and row position.
    fn bind_row_var(&mut self, v: TyVar, row: Row, origin: &ConstraintOrigin) -> Result<(), TypeError> {
        match self.probe(v) {
            TyVarValue::Link(inner) => {
                let inner = self.resolve(inner);
                match inner {
                    Ty::Record(r) => self.unify_row(r, row, origin),
                    Ty::Var(w) => self.bind_row_var(w, row, origin),
                    other => Err(TypeError::RowLink {
                        found: other,
                        origin: origin.clone(),
                    }),
                }
            }
            TyVarValue::Generalized => Ok(()),
            TyVarValue::Unbound { level } => {
                let ty = Ty::Record(row);
                self.occurs(v, level, &ty, &ty, origin)?;
                self.table
                    .unify_var_value(v, TyVarValue::Link(ty))
                    .expect("linking an unbound row var cannot fail");
                Ok(())
            }
        }
    }

    // ── Generalization ──────────────────────────────────────────────────

    /// Generalize a type into a polymorphic scheme.
    ///
    /// Collects, in first-visit order, every unbound variable whose level
    /// is strictly greater than the current level, and freezes each
    /// collected cell as `Generalized`. Variables at or below the current
    /// level escape into an outer scope and stay free.
    pub fn generalize(&mut self, ty: Ty, origin: &ConstraintOrigin) -> Result<Scheme, TypeError> {
        let resolved = self.resolve(ty);
        let mut vars = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_generalizable(&resolved, &mut vars, &mut seen, origin)?;
        for v in &vars {
            self.table
                .unify_var_value(*v, TyVarValue::Generalized)
                .expect("generalizing an unbound var cannot fail");
        }
        Ok(Scheme { vars, ty: resolved })
    }

    fn collect_generalizable(
        &mut self,
        ty: &Ty,
        out: &mut Vec<TyVar>,
        seen: &mut FxHashSet<TyVar>,
        origin: &ConstraintOrigin,
    ) -> Result<(), TypeError> {
        match ty {
            Ty::Var(v) => self.collect_var(*v, out, seen, origin),
            Ty::Bound(_) | Ty::Prim(_) | Ty::Cap => Ok(()),
            Ty::Fun(dom, cod) => {
                self.collect_generalizable(dom, out, seen, origin)?;
                self.collect_generalizable(cod, out, seen, origin)
            }
            Ty::List(elem) => self.collect_generalizable(elem, out, seen, origin),
            Ty::Record(row) | Ty::Table(row) => self.collect_row(row, out, seen, origin),
            Ty::Forall(..) => Err(TypeError::Impredicative {
                ty: ty.clone(),
                origin: origin.clone(),
            }),
        }
    }

    fn collect_var(
        &mut self,
        v: TyVar,
        out: &mut Vec<TyVar>,
        seen: &mut FxHashSet<TyVar>,
        origin: &ConstraintOrigin,
    ) -> Result<(), TypeError> {
        match self.probe(v) {
            TyVarValue::Link(inner) => self.collect_generalizable(&inner, out, seen, origin),
            TyVarValue::Generalized => Ok(()),
            TyVarValue::Unbound { level } => {
                if level > self.current_level {
                    let root = self.table.find(v);
                    if seen.insert(root) {
                        out.push(root);
                    }
                }
                Ok(())
            }
        }
    }

    fn collect_row(
        &mut self,
        row: &Row,
        out: &mut Vec<TyVar>,
        seen: &mut FxHashSet<TyVar>,
        origin: &ConstraintOrigin,
    ) -> Result<(), TypeError> {
        match row {
            Row::Empty | Row::Bound(_) => Ok(()),
            Row::Var(v) => self.collect_row_var(*v, out, seen, origin),
            Row::Fields(fields, tail) => {
                for ty in fields.values() {
                    self.collect_generalizable(ty, out, seen, origin)?;
                }
                match tail {
                    Some(RowTail::Var(v)) => self.collect_row_var(*v, out, seen, origin),
                    _ => Ok(()),
                }
            }
        }
    }

    fn collect_row_var(
        &mut self,
        v: TyVar,
        out: &mut Vec<TyVar>,
        seen: &mut FxHashSet<TyVar>,
        origin: &ConstraintOrigin,
    ) -> Result<(), TypeError> {
        match self.probe(v) {
            TyVarValue::Link(inner) => {
                let inner = self.resolve(inner);
                match inner {
                    Ty::Record(r) => self.collect_row(&r, out, seen, origin),
                    Ty::Var(w) => self.collect_var(w, out, seen, origin),
                    other => Err(TypeError::RowLink {
                        found: other,
                        origin: origin.clone(),
                    }),
                }
            }
            _ => self.collect_var(v, out, seen, origin),
        }
    }

    // ── Instantiation ───────────────────────────────────────────────────

    /// Instantiate a scheme with fresh variables at the current level.
    ///
    /// Returns the opened body together with the fresh type arguments, in
    /// quantifier order, so the caller can record them as a `TyApp`.
    pub fn instantiate(&mut self, scheme: &Scheme) -> (Ty, Vec<Ty>) {
        if scheme.vars.is_empty() {
            return (scheme.ty.clone(), Vec::new());
        }
        let mut subst: FxHashMap<TyVar, TyVar> = FxHashMap::default();
        let mut args = Vec::with_capacity(scheme.vars.len());
        for v in &scheme.vars {
            let root = self.table.find(*v);
            let fresh = self.fresh_tvar();
            subst.insert(root, fresh);
            args.push(Ty::Var(fresh));
        }
        let body = self.substitute(&scheme.ty, &subst);
        (body, args)
    }

    /// Replace quantified variables with their fresh copies, following
    /// links acquired since the scheme was stored.
    fn substitute(&mut self, ty: &Ty, subst: &FxHashMap<TyVar, TyVar>) -> Ty {
        match ty {
            Ty::Var(v) => {
                let root = self.table.find(*v);
                if let Some(fresh) = subst.get(&root) {
                    return Ty::Var(*fresh);
                }
                match self.probe(root) {
                    TyVarValue::Link(inner) => self.substitute(&inner, subst),
                    _ => Ty::Var(root),
                }
            }
            Ty::Bound(_) | Ty::Prim(_) | Ty::Cap => ty.clone(),
            Ty::Fun(dom, cod) => {
                Ty::fun(self.substitute(dom, subst), self.substitute(cod, subst))
            }
            Ty::List(elem) => Ty::list(self.substitute(elem, subst)),
            Ty::Record(row) => Ty::Record(self.substitute_row(row, subst)),
            Ty::Table(row) => Ty::Table(self.substitute_row(row, subst)),
            Ty::Forall(vars, body) => {
                Ty::Forall(vars.clone(), Box::new(self.substitute(body, subst)))
            }
        }
    }

    fn substitute_row(&mut self, row: &Row, subst: &FxHashMap<TyVar, TyVar>) -> Row {
        match row {
            Row::Empty | Row::Bound(_) => row.clone(),
            Row::Var(v) => {
                let root = self.table.find(*v);
                if let Some(fresh) = subst.get(&root) {
                    return Row::Var(*fresh);
                }
                match self.probe(root) {
                    TyVarValue::Link(inner) => match self.substitute(&inner, subst) {
                        Ty::Record(r) => r,
                        Ty::Var(w) => Row::Var(w),
                        _ => Row::Var(root),
                    },
                    _ => Row::Var(root),
                }
            }
            Row::Fields(fields, tail) => {
                let out: BTreeMap<String, Ty> = fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), self.substitute(ty, subst)))
                    .collect();
                match tail {
                    None => Row::from_parts(out, None),
                    Some(RowTail::Bound(db)) => {
                        Row::from_parts(out, Some(RowTail::Bound(db.clone())))
                    }
                    Some(RowTail::Var(v)) => {
                        let root = self.table.find(*v);
                        if let Some(fresh) = subst.get(&root) {
                            return Row::from_parts(out, Some(RowTail::Var(*fresh)));
                        }
                        match self.probe(root) {
                            TyVarValue::Link(inner) => match self.substitute(&inner, subst) {
                                Ty::Record(r) => splice_tail(out, r),
                                Ty::Var(w) => Row::from_parts(out, Some(RowTail::Var(w))),
                                _ => Row::from_parts(out, Some(RowTail::Var(root))),
                            },
                            _ => Row::from_parts(out, Some(RowTail::Var(root))),
                        }
                    }
                }
            }
        }
    }

    /// Open an imported signature supplied in de Bruijn form.
    ///
    /// A `Forall` head gets one fresh variable per quantifier, in binder
    /// order; occurrences are substituted by index. A `Forall` anywhere
    /// else is impredicative and rejected.
    pub fn instantiate_imported(
        &mut self,
        ty: &Ty,
        origin: &ConstraintOrigin,
    ) -> Result<(Ty, Vec<Ty>), TypeError> {
        match ty {
            Ty::Forall(names, body) => {
                let binders: Vec<TyVar> = names.iter().map(|_| self.fresh_tvar()).collect();
                let opened = self.open_imported(body, &binders, origin)?;
                Ok((opened, binders.into_iter().map(Ty::Var).collect()))
            }
            _ => {
                let opened = self.open_imported(ty, &[], origin)?;
                Ok((opened, Vec::new()))
            }
        }
    }

    fn open_imported(
        &mut self,
        ty: &Ty,
        binders: &[TyVar],
        origin: &ConstraintOrigin,
    ) -> Result<Ty, TypeError> {
        match ty {
            Ty::Bound(db) => self.open_db(db, binders, origin).map(Ty::Var),
            Ty::Var(v) => Ok(Ty::Var(*v)),
            Ty::Prim(_) | Ty::Cap => Ok(ty.clone()),
            Ty::Fun(dom, cod) => Ok(Ty::fun(
                self.open_imported(dom, binders, origin)?,
                self.open_imported(cod, binders, origin)?,
            )),
            Ty::List(elem) => Ok(Ty::list(self.open_imported(elem, binders, origin)?)),
            Ty::Record(row) => Ok(Ty::Record(self.open_imported_row(row, binders, origin)?)),
            Ty::Table(row) => Ok(Ty::Table(self.open_imported_row(row, binders, origin)?)),
            Ty::Forall(..) => Err(TypeError::Impredicative {
                ty: ty.clone(),
                origin: origin.clone(),
            }),
        }
    }

    fn open_imported_row(
        &mut self,
        row: &Row,
        binders: &[TyVar],
        origin: &ConstraintOrigin,
    ) -> Result<Row, TypeError> {
        match row {
            Row::Empty => Ok(Row::Empty),
            Row::Var(v) => Ok(Row::Var(*v)),
            Row::Bound(db) => self.open_db(db, binders, origin).map(Row::Var),
            Row::Fields(fields, tail) => {
                let fields = fields
                    .iter()
                    .map(|(name, ty)| {
                        Ok((name.clone(), self.open_imported(ty, binders, origin)?))
                    })
                    .collect::<Result<BTreeMap<String, Ty>, TypeError>>()?;
                let tail = match tail {
                    None => None,
                    Some(RowTail::Var(v)) => Some(RowTail::Var(*v)),
                    Some(RowTail::Bound(db)) => {
                        Some(RowTail::Var(self.open_db(db, binders, origin)?))
                    }
                };
                Ok(Row::from_parts(fields, tail))
            }
        }
    }

    /// Map a de Bruijn occurrence to its binder's fresh variable. Index 0
    /// is the innermost binder, so occurrence `i` under `n` binders refers
    /// to binder `n - 1 - i`.
    fn open_db(
        &mut self,
        db: &NamedDeBruijn,
        binders: &[TyVar],
        origin: &ConstraintOrigin,
    ) -> Result<TyVar, TypeError> {
        let n = binders.len() as u32;
        if db.index < n {
            Ok(binders[(n - 1 - db.index) as usize])
        } else {
            Err(TypeError::EscapedVariable {
                var: db.name.clone(),
                span: origin.span(),
            })
        }
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Splice a resolved tail row into the fields collected so far. Field names
/// within a row are unique, so the merge never collides on a key.
pub(crate) fn splice_tail(mut fields: BTreeMap<String, Ty>, inner: Row) -> Row {
    match inner {
        Row::Empty => Row::from_parts(fields, None),
        Row::Var(v) => Row::from_parts(fields, Some(RowTail::Var(v))),
        Row::Bound(db) => Row::from_parts(fields, Some(RowTail::Bound(db))),
        Row::Fields(extra, tail) => {
            for (name, ty) in extra {
                fields.entry(name).or_insert(ty);
            }
            Row::from_parts(fields, tail)
        }
    }
}

fn row_mismatch(left: Row, right: Row, origin: &ConstraintOrigin) -> TypeError {
    TypeError::Mismatch {
        expected: Ty::Record(left),
        found: Ty::Record(right),
        origin: origin.clone(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
