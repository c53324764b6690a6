//! Shared types for the Tally compiler.
//!
//! This crate holds the types every compiler stage agrees on: byte-offset
//! [`span::Span`]s, the untyped intermediate representation ([`term`]) that
//! lowering hands to the type checker, and the [`builtin::Builtin`] tag enum
//! shared between the checker's signature registry and the runtime's
//! dispatch table.

pub mod builtin;
pub mod span;
pub mod term;

pub use builtin::Builtin;
pub use span::Span;
pub use term::{Literal, Param, Term, TermKind, Var};
