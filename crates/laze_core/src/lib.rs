//! laze_core: Core utilities for the laze front end.
//!
//! Provides symbol interning and source spans shared by the IR, the scope
//! graph and the diagnostics.

pub mod intern;
pub mod text;

// Re-export commonly used types
pub use intern::{InternedString, StringInterner};
pub use text::{TextPos, TextSpan};
