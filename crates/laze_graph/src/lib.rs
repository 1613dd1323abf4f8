//! laze_graph: The per-definition scope graph.
//!
//! A [`Graph`] is built once for every top-level definition (a method body or
//! a data constructor's argument defaults). It owns an arena of [`Scope`]s,
//! the [`Occurrence`]s registered in them and the [`Link`]s that resolve uses
//! to the definitions they refer to. Graphs never reference each other.

mod graph;
mod occurrence;
mod scope;

pub use graph::{Graph, GraphError, Link};
pub use occurrence::{Occurrence, OccurrenceId, Symbol};
pub use scope::{Scope, ScopeId};
