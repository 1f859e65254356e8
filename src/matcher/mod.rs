//! Match expressions over documents
//!
//! A match expression is an AND of field predicates. Paths are dotted and
//! descend through nested objects and arrays. No type coercion: missing
//! fields and nulls never match.
//!
//! Besides a yes/no answer, evaluation can report which array element made
//! the document match. Positional projection depends on that.

mod expression;
mod filters;

pub use expression::{FilterOp, MatchDetails, MatchExpression, Predicate};
pub use filters::PredicateFilter;
