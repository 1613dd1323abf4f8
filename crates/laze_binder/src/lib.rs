//! laze_binder: Scope graph construction and name resolution.
//!
//! The builder walks the IR of one top-level definition, allocates its
//! scopes, registers every binding and reference as an occurrence and links
//! each reference to the nearest enclosing definition of the same name.
//! Redefinitions are reified as error nodes; the walk never stops at them.

mod binder;

pub use binder::ScopeGraphBuilder;
