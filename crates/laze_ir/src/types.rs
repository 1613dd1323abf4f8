//! Metadata attached to IR nodes by the analysis passes.

use laze_graph::{Graph, OccurrenceId, ScopeId};
use std::sync::Arc;

/// What the scope graph builder recorded for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasInfo {
    /// The node owns (or reuses) this scope: lambdas, blocks, case
    /// branches and call arguments.
    ChildScope(ScopeId),
    /// The node is this occurrence: names, bindings, definition arguments
    /// and pattern variables.
    Occurrence(OccurrenceId),
}

impl AliasInfo {
    pub fn scope(self) -> Option<ScopeId> {
        match self {
            AliasInfo::ChildScope(scope) => Some(scope),
            AliasInfo::Occurrence(_) => None,
        }
    }

    pub fn occurrence(self) -> Option<OccurrenceId> {
        match self {
            AliasInfo::Occurrence(id) => Some(id),
            AliasInfo::ChildScope(_) => None,
        }
    }
}

/// The finished scope graph of a top-level definition, shared read-only
/// with later stages.
#[derive(Debug, Clone)]
pub struct DefinitionScope {
    pub graph: Arc<Graph>,
}

impl DefinitionScope {
    pub fn new(graph: Graph) -> Self {
        Self { graph: Arc::new(graph) }
    }
}

bitflags::bitflags! {
    /// Passes that already ran over a top-level definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PassFlags: u8 {
        const NONE        = 0;
        const SCOPE_GRAPH = 1 << 0;
        const DEMAND      = 1 << 1;

        const ALL = Self::SCOPE_GRAPH.bits() | Self::DEMAND.bits();
    }
}
