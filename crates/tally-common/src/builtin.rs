use std::fmt;

use serde::Serialize;

/// A builtin operation tag.
///
/// The IR references builtins by tag only; their type signatures live in the
/// type checker's registry and their implementations in the runtime. Tags are
/// `Copy` and hashable so they can key signature and dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Builtin {
    // Integer arithmetic.
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Negate,
    Abs,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Shift,
    // Decimal arithmetic.
    DecAdd,
    DecSub,
    DecMul,
    DecDiv,
    DecNegate,
    DecAbs,
    Round,
    Truncate,
    Ceiling,
    Floor,
    // Integer comparisons.
    Lt,
    Gt,
    Leq,
    Geq,
    Eq,
    Neq,
    // Logical operators.
    Not,
    And,
    Or,
    // Polymorphic list and control operations.
    Map,
    Fold,
    Filter,
    If,
    Take,
    Drop,
    Length,
    Reverse,
    // Monomorphic list and string operations.
    Distinct,
    Sort,
    Concat,
    IntToStr,
    StrToInt,
    Enumerate,
    EnumerateStep,
    // Contract operations.
    Enforce,
    EnforceGuard,
    AddTime,
    DiffTime,
}

impl Builtin {
    /// The builtin's surface name, as written in contract source.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Mod => "mod",
            Builtin::Negate => "negate",
            Builtin::Abs => "abs",
            Builtin::BitAnd => "&",
            Builtin::BitOr => "|",
            Builtin::BitXor => "xor",
            Builtin::BitNot => "~",
            Builtin::Shift => "shift",
            Builtin::DecAdd => "+.",
            Builtin::DecSub => "-.",
            Builtin::DecMul => "*.",
            Builtin::DecDiv => "/.",
            Builtin::DecNegate => "negate.",
            Builtin::DecAbs => "abs.",
            Builtin::Round => "round",
            Builtin::Truncate => "truncate",
            Builtin::Ceiling => "ceiling",
            Builtin::Floor => "floor",
            Builtin::Lt => "<",
            Builtin::Gt => ">",
            Builtin::Leq => "<=",
            Builtin::Geq => ">=",
            Builtin::Eq => "=",
            Builtin::Neq => "!=",
            Builtin::Not => "not",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Map => "map",
            Builtin::Fold => "fold",
            Builtin::Filter => "filter",
            Builtin::If => "if",
            Builtin::Take => "take",
            Builtin::Drop => "drop",
            Builtin::Length => "length",
            Builtin::Reverse => "reverse",
            Builtin::Distinct => "distinct",
            Builtin::Sort => "sort",
            Builtin::Concat => "concat",
            Builtin::IntToStr => "int-to-str",
            Builtin::StrToInt => "str-to-int",
            Builtin::Enumerate => "enumerate",
            Builtin::EnumerateStep => "enumerate-step",
            Builtin::Enforce => "enforce",
            Builtin::EnforceGuard => "enforce-guard",
            Builtin::AddTime => "add-time",
            Builtin::DiffTime => "diff-time",
        }
    }

    /// All builtin tags, for registry completeness checks.
    pub fn all() -> &'static [Builtin] {
        use Builtin::*;
        &[
            Add, Sub, Mul, Div, Mod, Negate, Abs, BitAnd, BitOr, BitXor, BitNot, Shift, DecAdd,
            DecSub, DecMul, DecDiv, DecNegate, DecAbs, Round, Truncate, Ceiling, Floor, Lt, Gt,
            Leq, Geq, Eq, Neq, Not, And, Or, Map, Fold, Filter, If, Take, Drop, Length, Reverse,
            Distinct, Sort, Concat, IntToStr, StrToInt, Enumerate, EnumerateStep, Enforce,
            EnforceGuard, AddTime, DiffTime,
        ]
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_display() {
        assert_eq!(Builtin::Add.to_string(), "+");
        assert_eq!(Builtin::DecAdd.to_string(), "+.");
        assert_eq!(Builtin::EnforceGuard.to_string(), "enforce-guard");
    }

    #[test]
    fn all_tags_have_distinct_names() {
        let mut seen = std::collections::HashSet::new();
        for b in Builtin::all() {
            assert!(seen.insert(b.name()), "duplicate builtin name {}", b.name());
        }
    }
}
