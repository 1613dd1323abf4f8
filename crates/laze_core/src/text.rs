//! Source locations carried by IR nodes and diagnostics.
//!
//! The passes never read source text; a span only travels with its node so
//! that a diagnostic can point back at the program.

use std::fmt;

/// A byte offset into the source of a module.
pub type TextPos = u32;

/// A half-open byte range `start..end`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextSpan {
    pub start: TextPos,
    pub end: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, end: TextPos) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> TextPos {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
