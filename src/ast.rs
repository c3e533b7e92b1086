//! # Expression syntax tree
//!
//! Parsed expressions are a closed enum, [`Expression`], with one variant
//! per operation kind. Every node knows its static result kind
//! ([`ExpressionKind`]) as soon as it is built, so most type errors surface
//! while parsing rather than while evaluating.
//!
//! ## Submodules
//!
//! - **[expressions]** - the [`Expression`] enum, its node structs and their
//!   kind-checked constructors
//! - **[operators]** - binary operators, their precedence tiers and the
//!   per-family operator enums
//! - **[kinds]** - static result kinds and `is` type tests
//!
//! ## Surface syntax
//!
//! ```text
//! /order/total as decimal * 1.2d0 > 100
//! exists /customer/email and /customer/email ends with "@example.com"
//! /status in ("open", "pending") or /opened < now - P2W
//! concat(/first, " ", /last) matches "^[A-Z]"
//! ```
//!
//! Binary operators bind, tightest first: `^` (right-associative), then
//! `* / %`, `+ -`, `> < >= <=`, `== !=`, `and`, `xor`, `nor`, `or`.

pub mod expressions;
pub mod kinds;
pub mod operators;

pub use expressions::{
    Binary, Constant, Expression, Origin, Parametrized, StateSelection, StringMatching, TypeCheck,
};
pub use kinds::{ExpressionKind, KindTest};
pub use operators::{
    ArithmeticOperator, BinaryOperator, LogicalOperator, MatchOperator, OperatorClass,
    ParametrizedOperator, RelationalOperator, TemporalOperator,
};
