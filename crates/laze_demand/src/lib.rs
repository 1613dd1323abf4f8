//! laze_demand: Demand analysis.
//!
//! Decides, for every name read and every call argument of a definition
//! whose scope graph is complete, whether a suspended value must be forced
//! before use and whether an argument must be wrapped in a new suspended
//! computation at the call site.

mod analyzer;

pub use analyzer::{analyze_constructor, analyze_definition, analyze_method, DemandAnalyzer};
