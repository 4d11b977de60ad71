//! Parse options recognized by every backend.

use serde::{Deserialize, Serialize};

/// Configuration passed to [`ParserBackend::parse`].
///
/// [`ParserBackend::parse`]: crate::traits::ParserBackend::parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Seed platform-standard include paths.
    pub use_default_includes: bool,

    /// Descend into `#include`d files and fold their declarations into
    /// the same `Header`.
    pub recursive_includes: bool,

    /// Recursion bound for nested includes. Exceeding it truncates
    /// traversal rather than failing.
    pub max_depth: usize,

    /// Path-prefix allowlist deciding which included files' declarations
    /// are folded in versus skipped as system headers. `None` means no
    /// prefix filtering.
    pub project_prefixes: Option<Vec<String>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            use_default_includes: false,
            recursive_includes: false,
            max_depth: 10,
            project_prefixes: None,
        }
    }
}

impl ParseOptions {
    /// Enable recursive include folding.
    pub fn with_recursive_includes(mut self, recursive: bool) -> Self {
        self.recursive_includes = recursive;
        self
    }

    /// Set the include recursion bound.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Restrict folded includes to paths starting with these prefixes.
    pub fn with_project_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.project_prefixes = Some(prefixes);
        self
    }

    pub fn with_default_includes(mut self, enabled: bool) -> Self {
        self.use_default_includes = enabled;
        self
    }

    /// True if `path` passes the project-prefix allowlist.
    pub fn allows_path(&self, path: &str) -> bool {
        match &self.project_prefixes {
            Some(prefixes) => prefixes.iter().any(|p| path.starts_with(p.as_str())),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ParseOptions::default();
        assert!(!opts.use_default_includes);
        assert!(!opts.recursive_includes);
        assert_eq!(opts.max_depth, 10);
        assert!(opts.project_prefixes.is_none());
    }

    #[test]
    fn test_prefix_allowlist() {
        let opts = ParseOptions::default()
            .with_project_prefixes(vec!["src/".to_string(), "include/".to_string()]);
        assert!(opts.allows_path("include/api.h"));
        assert!(!opts.allows_path("/usr/include/stdio.h"));

        let unfiltered = ParseOptions::default();
        assert!(unfiltered.allows_path("/usr/include/stdio.h"));
    }
}
