//! laze_options: analysis options.
//!
//! Options are read from a JSON document with camelCase keys. Every field is
//! optional; the accessors supply the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling the analysis driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Report a warning when a binding hides an outer definition.
    pub warn_on_shadowing: Option<bool>,
    /// Analyze independent definitions on the rayon pool.
    pub parallel: Option<bool>,
    /// Run the full occurrence-uniqueness check on every finished graph.
    pub validate_graphs: Option<bool>,
}

impl AnalysisOptions {
    pub fn warn_on_shadowing(&self) -> bool {
        self.warn_on_shadowing.unwrap_or(true)
    }

    pub fn parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    pub fn validate_graphs(&self) -> bool {
        self.validate_graphs.unwrap_or(false)
    }

    /// Overlay `other` on top of these options: fields set in `other` win.
    pub fn merge(&self, other: &AnalysisOptions) -> AnalysisOptions {
        AnalysisOptions {
            warn_on_shadowing: other.warn_on_shadowing.or(self.warn_on_shadowing),
            parallel: other.parallel.or(self.parallel),
            validate_graphs: other.validate_graphs.or(self.validate_graphs),
        }
    }
}

/// Parse analysis options from a JSON string.
pub fn parse_options(content: &str) -> Result<AnalysisOptions, serde_json::Error> {
    serde_json::from_str(content)
}

/// Parse analysis options from a file.
pub fn parse_options_file(path: impl AsRef<Path>) -> Result<AnalysisOptions, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let options = parse_options(&content)?;
    Ok(options)
}
