//! Symbol interning.
//!
//! Every name in the IR is interned once by the upstream front end, so
//! scope lookups compare integer handles instead of strings.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// An interned name. Two symbols of the same interner are equal iff their
/// text is equal, which is the "same name" test used by scope resolution.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct InternedString(Spur);

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sym({:?})", self.0)
    }
}

/// The symbol table of a module.
///
/// Clones share one `ThreadedRodeo`, so every worker analyzing a definition
/// of the module resolves names against the same table.
#[derive(Clone, Default)]
pub struct StringInterner {
    rodeo: Arc<ThreadedRodeo>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn intern(&self, name: &str) -> InternedString {
        InternedString(self.rodeo.get_or_intern(name))
    }

    /// The symbol for `name` if some definition or use already mentioned it.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<InternedString> {
        self.rodeo.get(name).map(InternedString)
    }

    #[inline]
    pub fn resolve(&self, symbol: InternedString) -> &str {
        self.rodeo.resolve(&symbol.0)
    }

    /// `Owner.name`, or just `name` for a definition without an owner.
    pub fn qualified(&self, owner: Option<InternedString>, name: InternedString) -> String {
        match owner {
            Some(owner) => format!("{}.{}", self.resolve(owner), self.resolve(name)),
            None => self.resolve(name).to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringInterner({} symbols)", self.len())
    }
}
