//! Projection: deriving an output document from an input document
//!
//! `ProjectionSpec` is the parsed projection object. `ProjectionExec`
//! applies it to a working set member in place. Anything implementing
//! `DocumentTransform` can stand in for `ProjectionExec` inside a
//! projection stage.

mod exec;
mod spec;
mod transform;

pub use exec::ProjectionExec;
pub use spec::{MetaField, ProjectionKind, ProjectionSpec};
pub use transform::{DocumentTransform, FnTransform};
