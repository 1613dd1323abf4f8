//! Scopes stored in the graph arena.

use crate::occurrence::{Occurrence, OccurrenceId, Symbol};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::fmt;

/// Handle of a scope inside its graph's arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// Every graph is created with its root scope at index zero.
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope{}", self.0)
    }
}

/// A lexical region. Holds the occurrences registered in it, in insertion
/// order, and at most one definition per symbol.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    occurrences: IndexMap<OccurrenceId, Occurrence>,
    definitions: FxHashMap<Symbol, OccurrenceId>,
}

impl Scope {
    pub(crate) fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    /// The enclosing scope, `None` for the root.
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.values()
    }

    pub fn get_occurrence(&self, id: OccurrenceId) -> Option<&Occurrence> {
        self.occurrences.get(&id)
    }

    pub fn contains(&self, id: OccurrenceId) -> bool {
        self.occurrences.contains_key(&id)
    }

    /// The definition of `symbol` introduced directly in this scope.
    pub fn definition_of(&self, symbol: Symbol) -> Option<&Occurrence> {
        self.definitions
            .get(&symbol)
            .and_then(|id| self.occurrences.get(id))
    }

    pub fn has_definition(&self, symbol: Symbol) -> bool {
        self.definitions.contains_key(&symbol)
    }

    /// All definitions of this scope in the order they were introduced.
    pub fn definitions(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.values().filter(|o| o.is_def())
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub(crate) fn push_child(&mut self, child: ScopeId) {
        self.children.push(child);
    }

    /// Insert an occurrence. The caller has already checked for a clashing
    /// definition.
    pub(crate) fn insert(&mut self, occurrence: Occurrence) {
        if let Occurrence::Def { id, symbol, .. } = occurrence {
            self.definitions.insert(symbol, id);
        }
        self.occurrences.insert(occurrence.id(), occurrence);
    }
}
