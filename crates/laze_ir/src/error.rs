//! Fatal pass errors.
//!
//! These abort the analysis of one top-level definition. They signal a
//! broken invariant in the passes or a misuse by the driver; problems in the
//! analyzed program are reported as error nodes instead.

use laze_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error("scope graph invariant violated: {0}")]
    Graph(#[from] GraphError),
    /// A node the demand analyzer needs to consult the graph for carries no
    /// (or the wrong kind of) alias metadata.
    #[error("{node} carries no scope graph metadata")]
    MissingAlias { node: &'static str },
    #[error("the definition has not been processed by the scope graph builder")]
    MissingScopeGraph,
    #[error("the definition was already processed by the {pass} pass")]
    AlreadyAnalyzed { pass: &'static str },
}
