//! Occurrences of symbols in the program.

use laze_core::intern::InternedString;
use std::fmt;

/// A name as written in the program. Not unique: shadowing and unrelated
/// bindings in sibling scopes may share it.
pub type Symbol = InternedString;

/// Identifies one occurrence inside a single [`Graph`](crate::Graph).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct OccurrenceId(pub u32);

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A recorded appearance of a symbol. The role is fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// A binding introduction. `is_lazy` is set for arguments declared to
    /// receive a suspended computation.
    Def {
        id: OccurrenceId,
        symbol: Symbol,
        is_lazy: bool,
    },
    /// A reference to a name.
    Use { id: OccurrenceId, symbol: Symbol },
}

impl Occurrence {
    pub fn def(id: OccurrenceId, symbol: Symbol, is_lazy: bool) -> Self {
        Occurrence::Def { id, symbol, is_lazy }
    }

    pub fn usage(id: OccurrenceId, symbol: Symbol) -> Self {
        Occurrence::Use { id, symbol }
    }

    #[inline]
    pub fn id(&self) -> OccurrenceId {
        match *self {
            Occurrence::Def { id, .. } | Occurrence::Use { id, .. } => id,
        }
    }

    #[inline]
    pub fn symbol(&self) -> Symbol {
        match *self {
            Occurrence::Def { symbol, .. } | Occurrence::Use { symbol, .. } => symbol,
        }
    }

    pub fn is_def(&self) -> bool {
        matches!(self, Occurrence::Def { .. })
    }

    pub fn is_use(&self) -> bool {
        matches!(self, Occurrence::Use { .. })
    }

    /// Whether this is a definition of a suspended argument. Uses are never lazy.
    pub fn is_lazy(&self) -> bool {
        matches!(self, Occurrence::Def { is_lazy: true, .. })
    }
}
