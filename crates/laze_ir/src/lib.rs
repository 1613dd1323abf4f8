//! laze_ir: The desugared intermediate representation consumed and produced
//! by the analysis passes.
//!
//! Trees are owned values. Passes take a tree by value and return the
//! rewritten tree; nothing is shared between definitions except the
//! finished, read-only scope graphs.

pub mod error;
pub mod node;
pub mod types;
pub mod visitor;

// Re-export key types
pub use error::PassError;
pub use node::*;
pub use types::*;
