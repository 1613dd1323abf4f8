//! The scope graph of one top-level definition.

use crate::occurrence::{Occurrence, OccurrenceId, Symbol};
use crate::scope::{Scope, ScopeId};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// A resolved use: `source` refers to the definition `target`, found
/// `scope_distance` parent hops away from the scope owning `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: OccurrenceId,
    pub target: OccurrenceId,
    pub scope_distance: u32,
}

/// Broken graph invariants. These indicate a defect in the pass that built
/// or queried the graph, never a problem with the analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("occurrence {0} is not known to this graph")]
    UnknownOccurrence(OccurrenceId),
    #[error("occurrence {id} is registered in {count} scopes")]
    OccurrenceInMultipleScopes { id: OccurrenceId, count: usize },
    #[error("occurrence {0} was registered twice")]
    DuplicateOccurrence(OccurrenceId),
    #[error("{scope} already holds a definition for the symbol of occurrence {id}")]
    DuplicateDefinition { scope: ScopeId, id: OccurrenceId },
    #[error("{0} does not belong to this graph")]
    UnknownScope(ScopeId),
    #[error("occurrence {0} is a definition, not a use")]
    NotAUse(OccurrenceId),
    #[error("occurrence {0} is a use, not a definition")]
    NotADefinition(OccurrenceId),
}

/// Arena of scopes plus the links between occurrences.
///
/// Parents always precede their children in the arena, so every walk up the
/// parent chain terminates at the root.
#[derive(Debug, Clone)]
pub struct Graph {
    scopes: Vec<Scope>,
    /// Owning scope of every registered occurrence.
    owners: FxHashMap<OccurrenceId, ScopeId>,
    links: Vec<Link>,
    /// Position in `links` of the link leaving a use.
    link_index: FxHashMap<OccurrenceId, usize>,
    next_id: u32,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None)],
            owners: FxHashMap::default(),
            links: Vec::new(),
            link_index: FxHashMap::default(),
            next_id: 0,
        }
    }

    #[inline]
    pub fn root_scope(&self) -> ScopeId {
        ScopeId::ROOT
    }

    /// Allocate a fresh occurrence id.
    pub fn next_id(&mut self) -> OccurrenceId {
        let id = OccurrenceId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn scope(&self, id: ScopeId) -> Result<&Scope, GraphError> {
        self.scopes.get(id.index()).ok_or(GraphError::UnknownScope(id))
    }

    fn scope_mut(&mut self, id: ScopeId) -> Result<&mut Scope, GraphError> {
        self.scopes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownScope(id))
    }

    /// All scopes with their handles, root first.
    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId(i as u32), s))
    }

    /// Create a new scope nested in `parent`.
    pub fn add_child(&mut self, parent: ScopeId) -> Result<ScopeId, GraphError> {
        let child = ScopeId(self.scopes.len() as u32);
        self.scope_mut(parent)?.push_child(child);
        self.scopes.push(Scope::new(Some(parent)));
        Ok(child)
    }

    pub fn parent(&self, scope: ScopeId) -> Result<Option<ScopeId>, GraphError> {
        Ok(self.scope(scope)?.parent())
    }

    pub fn children(&self, scope: ScopeId) -> Result<&[ScopeId], GraphError> {
        Ok(self.scope(scope)?.children())
    }

    /// Number of parent hops from `scope` to the root.
    pub fn scope_depth(&self, scope: ScopeId) -> Result<u32, GraphError> {
        let mut depth = 0;
        let mut current = self.scope(scope)?.parent();
        while let Some(parent) = current {
            depth += 1;
            current = self.scope(parent)?.parent();
        }
        Ok(depth)
    }

    /// Whether `ancestor` strictly encloses `scope`.
    pub fn is_child_of(&self, scope: ScopeId, ancestor: ScopeId) -> Result<bool, GraphError> {
        let mut current = self.scope(scope)?.parent();
        while let Some(parent) = current {
            if parent == ancestor {
                return Ok(true);
            }
            current = self.scope(parent)?.parent();
        }
        Ok(false)
    }

    /// Register an occurrence in `scope`.
    ///
    /// A definition whose symbol is already defined in `scope` is rejected;
    /// callers are expected to check [`Scope::has_definition`] first and
    /// report the redefinition themselves.
    pub fn add_occurrence(&mut self, scope: ScopeId, occurrence: Occurrence) -> Result<(), GraphError> {
        let id = occurrence.id();
        if id.0 >= self.next_id {
            return Err(GraphError::UnknownOccurrence(id));
        }
        if self.owners.contains_key(&id) {
            return Err(GraphError::DuplicateOccurrence(id));
        }
        let target = self.scope_mut(scope)?;
        if occurrence.is_def() && target.has_definition(occurrence.symbol()) {
            return Err(GraphError::DuplicateDefinition { scope, id });
        }
        target.insert(occurrence);
        self.owners.insert(id, scope);
        Ok(())
    }

    /// The scope an occurrence was registered in.
    pub fn scope_for(&self, id: OccurrenceId) -> Result<ScopeId, GraphError> {
        self.owners
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownOccurrence(id))
    }

    /// Every scope whose occurrence set contains `id`, found by scanning the
    /// whole arena. A well-formed graph returns exactly one.
    pub fn scopes_for(&self, id: OccurrenceId) -> Vec<ScopeId> {
        self.scopes()
            .filter(|(_, scope)| scope.contains(id))
            .map(|(sid, _)| sid)
            .collect()
    }

    pub fn get_occurrence(&self, id: OccurrenceId) -> Option<&Occurrence> {
        let scope = self.owners.get(&id)?;
        self.scopes.get(scope.index())?.get_occurrence(id)
    }

    pub fn occurrence(&self, id: OccurrenceId) -> Result<&Occurrence, GraphError> {
        self.get_occurrence(id)
            .ok_or(GraphError::UnknownOccurrence(id))
    }

    /// Resolve a use to the nearest enclosing definition of its symbol and
    /// record the link. Returns `None` when no scope of this graph defines
    /// the symbol; such names are left to global resolution.
    pub fn resolve_usage(&mut self, id: OccurrenceId) -> Result<Option<Link>, GraphError> {
        let owner = self.scope_for(id)?;
        let symbol = match self.occurrence(id)? {
            Occurrence::Use { symbol, .. } => *symbol,
            Occurrence::Def { .. } => return Err(GraphError::NotAUse(id)),
        };

        let mut distance = 0;
        let mut current = Some(owner);
        while let Some(scope_id) = current {
            let scope = self.scope(scope_id)?;
            if let Some(def) = scope.definition_of(symbol) {
                let link = Link {
                    source: id,
                    target: def.id(),
                    scope_distance: distance,
                };
                self.insert_link(link);
                return Ok(Some(link));
            }
            current = scope.parent();
            distance += 1;
        }
        Ok(None)
    }

    fn insert_link(&mut self, link: Link) {
        match self.link_index.get(&link.source) {
            Some(&pos) => self.links[pos] = link,
            None => {
                self.link_index.insert(link.source, self.links.len());
                self.links.push(link);
            }
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The link leaving a use, if it was resolved.
    pub fn link_for(&self, use_id: OccurrenceId) -> Option<&Link> {
        self.link_index.get(&use_id).map(|&pos| &self.links[pos])
    }

    /// The definition a use resolves to inside this graph.
    pub fn linked_definition(&self, use_id: OccurrenceId) -> Result<Option<&Occurrence>, GraphError> {
        match self.link_for(use_id) {
            Some(link) => self.occurrence(link.target).map(Some),
            None => Ok(None),
        }
    }

    /// All links targeting the definition `def_id`.
    pub fn uses_of(&self, def_id: OccurrenceId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.target == def_id)
    }

    /// Every definition of `symbol` in any scope of this graph.
    pub fn definitions_of(&self, symbol: Symbol) -> Vec<&Occurrence> {
        self.scopes
            .iter()
            .filter_map(|s| s.definition_of(symbol))
            .collect()
    }

    /// Definitions in enclosing scopes that `def_id` hides, nearest first.
    pub fn known_shadowed_definitions(&self, def_id: OccurrenceId) -> Result<Vec<&Occurrence>, GraphError> {
        let symbol = match self.occurrence(def_id)? {
            Occurrence::Def { symbol, .. } => *symbol,
            Occurrence::Use { .. } => return Err(GraphError::NotADefinition(def_id)),
        };
        let mut shadowed = Vec::new();
        let mut current = self.scope(self.scope_for(def_id)?)?.parent();
        while let Some(scope_id) = current {
            let scope = self.scope(scope_id)?;
            if let Some(def) = scope.definition_of(symbol) {
                shadowed.push(def);
            }
            current = scope.parent();
        }
        Ok(shadowed)
    }

    /// Whether `def_id` hides a definition of an enclosing scope.
    pub fn can_shadow(&self, def_id: OccurrenceId) -> Result<bool, GraphError> {
        Ok(!self.known_shadowed_definitions(def_id)?.is_empty())
    }

    pub fn num_scopes(&self) -> usize {
        self.scopes.len()
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn num_occurrences(&self) -> usize {
        self.owners.len()
    }

    /// Check that every registered occurrence lives in exactly one scope and
    /// that every link connects a use to a definition.
    pub fn validate(&self) -> Result<(), GraphError> {
        for &id in self.owners.keys() {
            match self.scopes_for(id).len() {
                1 => {}
                0 => return Err(GraphError::UnknownOccurrence(id)),
                count => return Err(GraphError::OccurrenceInMultipleScopes { id, count }),
            }
        }
        for link in &self.links {
            if !self.occurrence(link.source)?.is_use() {
                return Err(GraphError::NotAUse(link.source));
            }
            if !self.occurrence(link.target)?.is_def() {
                return Err(GraphError::NotADefinition(link.target));
            }
        }
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
