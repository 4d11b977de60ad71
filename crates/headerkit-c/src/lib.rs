//! # headerkit-c
//!
//! Tree-sitter based C parser backend for headerkit.
//!
//! ## Features
//!
//! - Parse C header source into the headerkit IR
//! - Extract structs, unions, enums, functions, typedefs, variables,
//!   and `#define` constants
//! - Optional recursive `#include` folding with a depth bound, a
//!   project-prefix allowlist, and cycle protection
//! - Strict error handling: a syntax error fails the parse with the
//!   first offending line
//!
//! ## Quick Start
//!
//! ```rust
//! use headerkit_c::CBackend;
//! use headerkit_ir::{ParseOptions, ParserBackend};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = CBackend::new();
//! let header = backend.parse(
//!     "int add(int a, int b);",
//!     "math.h",
//!     &[],
//!     &[],
//!     &ParseOptions::default(),
//! )?;
//! assert_eq!(header.declarations.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod visitor;

use headerkit_ir::{
    Declaration, Header, ParseError, ParseOptions, ParseResult, ParserBackend, SourceLocation,
};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

pub use visitor::{HeaderVisitor, IncludeDirective};

/// System include roots searched for `<...>` includes when
/// [`ParseOptions::use_default_includes`] is set.
const DEFAULT_INCLUDE_DIRS: &[&str] = &["/usr/local/include", "/usr/include"];

/// C header parser backend built on the tree-sitter C grammar.
///
/// Stateless: one instance can serve any number of concurrent parses.
#[derive(Debug, Default)]
pub struct CBackend;

impl CBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ParserBackend for CBackend {
    fn name(&self) -> &str {
        "tree-sitter-c"
    }

    fn supports_macros(&self) -> bool {
        true
    }

    fn supports_cpp(&self) -> bool {
        false
    }

    fn parse(
        &self,
        source: &str,
        filename: &str,
        include_dirs: &[PathBuf],
        extra_args: &[String],
        options: &ParseOptions,
    ) -> ParseResult<Header> {
        let mut search_dirs: Vec<PathBuf> = include_dirs.to_vec();
        for arg in extra_args {
            if let Some(dir) = arg.strip_prefix("-I") {
                search_dirs.push(PathBuf::from(dir));
            } else {
                debug!("{}: ignoring unrecognized argument '{arg}'", self.name());
            }
        }

        let mut visited = BTreeSet::new();
        visited.insert(filename.to_string());
        let (declarations, included_headers) =
            fold_source(source, filename, &search_dirs, options, 0, &mut visited)?;
        Ok(Header::new(filename, declarations).with_includes(included_headers))
    }
}

/// Parse one source text and, when enabled, fold the declarations of
/// resolvable includes in ahead of the file's own.
fn fold_source(
    source: &str,
    filename: &str,
    search_dirs: &[PathBuf],
    options: &ParseOptions,
    depth: usize,
    visited: &mut BTreeSet<String>,
) -> ParseResult<(Vec<Declaration>, BTreeSet<String>)> {
    let (own_declarations, directives) = parse_single(source, filename)?;

    let mut included_headers: BTreeSet<String> =
        directives.iter().map(|d| d.path.clone()).collect();
    let mut declarations = Vec::new();

    if options.recursive_includes {
        if depth >= options.max_depth {
            warn!(
                "include depth limit ({}) reached at {filename}, not descending further",
                options.max_depth
            );
        } else {
            for directive in &directives {
                let Some(resolved) = resolve_include(directive, filename, search_dirs, options)
                else {
                    debug!("include '{}' not resolved, recording only", directive.path);
                    continue;
                };
                let resolved_str = resolved.to_string_lossy().into_owned();
                if !options.allows_path(&resolved_str) {
                    debug!("include '{resolved_str}' outside project prefixes, skipping");
                    continue;
                }
                if !visited.insert(resolved_str.clone()) {
                    // include cycle or diamond, already folded
                    continue;
                }
                let included_source = match fs::read_to_string(&resolved) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!("cannot read include '{resolved_str}': {err}");
                        continue;
                    }
                };
                let (nested_declarations, nested_includes) = fold_source(
                    &included_source,
                    &resolved_str,
                    search_dirs,
                    options,
                    depth + 1,
                    visited,
                )?;
                declarations.extend(nested_declarations);
                included_headers.extend(nested_includes);
            }
        }
    }

    declarations.extend(own_declarations);
    Ok((declarations, included_headers))
}

/// Locate the file an include directive refers to. Quoted includes are
/// tried relative to the including file first, then the search dirs;
/// system includes go through the search dirs and, when enabled, the
/// platform defaults.
fn resolve_include(
    directive: &IncludeDirective,
    includer: &str,
    search_dirs: &[PathBuf],
    options: &ParseOptions,
) -> Option<PathBuf> {
    if !directive.is_system {
        if let Some(parent) = Path::new(includer).parent() {
            let candidate = parent.join(&directive.path);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    for dir in search_dirs {
        let candidate = dir.join(&directive.path);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    if directive.is_system && options.use_default_includes {
        for dir in DEFAULT_INCLUDE_DIRS {
            let candidate = Path::new(dir).join(&directive.path);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn parse_single(
    source: &str,
    filename: &str,
) -> ParseResult<(Vec<Declaration>, Vec<IncludeDirective>)> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::language())
        .map_err(|e| ParseError::BackendUnavailable(format!("tree-sitter C grammar: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::ParseFailure {
            filename: filename.to_string(),
            message: "parser produced no syntax tree".to_string(),
            location: None,
        })?;

    let root = tree.root_node();
    if root.has_error() {
        let location = first_error(root)
            .map(|node| SourceLocation::new(filename, node.start_position().row as u32 + 1));
        return Err(ParseError::ParseFailure {
            filename: filename.to_string(),
            message: "syntax error".to_string(),
            location,
        });
    }

    let mut header_visitor = HeaderVisitor::new(source.as_bytes(), filename);
    header_visitor.visit_node(root);
    Ok((header_visitor.declarations, header_visitor.includes))
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Header {
        CBackend::new()
            .parse(source, "test.h", &[], &[], &ParseOptions::default())
            .unwrap()
    }

    #[test]
    fn test_backend_capabilities() {
        let backend = CBackend::new();
        assert_eq!(backend.name(), "tree-sitter-c");
        assert!(backend.supports_macros());
        assert!(!backend.supports_cpp());
    }

    #[test]
    fn test_parse_header() {
        let header = parse("struct point { int x; int y; };\nint area(struct point *p);\n");
        assert_eq!(header.path, "test.h");
        assert_eq!(header.declarations.len(), 2);
        assert!(header.find("struct", "point").is_some());
        assert!(header.find("function", "area").is_some());
    }

    #[test]
    fn test_syntax_error_fails_with_location() {
        let result = CBackend::new().parse(
            "int ok(void);\nint broken( {\n",
            "bad.h",
            &[],
            &[],
            &ParseOptions::default(),
        );
        match result {
            Err(ParseError::ParseFailure {
                filename, location, ..
            }) => {
                assert_eq!(filename, "bad.h");
                assert!(location.is_some());
            }
            other => panic!("expected ParseFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_includes_recorded_without_folding() {
        let header = parse("#include <stdint.h>\n#include \"local.h\"\nint f(void);\n");
        assert_eq!(header.declarations.len(), 1);
        assert!(header.included_headers.contains("stdint.h"));
        assert!(header.included_headers.contains("local.h"));
    }

    #[test]
    fn test_recursive_include_folding_orders_included_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("types.h"), "typedef unsigned int u32;\n").unwrap();
        let main_path = dir.path().join("main.h");
        let source = "#include \"types.h\"\nu32 checksum(void);\n";

        let options = ParseOptions::default().with_recursive_includes(true);
        let header = CBackend::new()
            .parse(source, main_path.to_str().unwrap(), &[], &[], &options)
            .unwrap();

        assert_eq!(header.declarations.len(), 2);
        assert_eq!(header.declarations[0].kind_label(), "typedef");
        assert_eq!(header.declarations[1].kind_label(), "function");
        assert!(header.included_headers.contains("types.h"));
    }

    #[test]
    fn test_include_depth_limit_truncates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("c.h"), "int from_c;\n").unwrap();
        fs::write(dir.path().join("b.h"), "#include \"c.h\"\nint from_b;\n").unwrap();
        let main_path = dir.path().join("a.h");
        let source = "#include \"b.h\"\nint from_a;\n";

        let options = ParseOptions::default()
            .with_recursive_includes(true)
            .with_max_depth(1);
        let header = CBackend::new()
            .parse(source, main_path.to_str().unwrap(), &[], &[], &options)
            .unwrap();

        let names: Vec<_> = header
            .declarations
            .iter()
            .filter_map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["from_b", "from_a"]);
    }

    #[test]
    fn test_include_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("a.h");
        fs::write(&a_path, "#include \"b.h\"\nint from_a;\n").unwrap();
        fs::write(dir.path().join("b.h"), "#include \"a.h\"\nint from_b;\n").unwrap();
        let source = fs::read_to_string(&a_path).unwrap();

        let options = ParseOptions::default().with_recursive_includes(true);
        let header = CBackend::new()
            .parse(&source, a_path.to_str().unwrap(), &[], &[], &options)
            .unwrap();

        let names: Vec<_> = header
            .declarations
            .iter()
            .filter_map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["from_b", "from_a"]);
    }

    #[test]
    fn test_project_prefix_filter_skips_folding() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("types.h"), "typedef unsigned int u32;\n").unwrap();
        let main_path = dir.path().join("main.h");
        let source = "#include \"types.h\"\nint f(void);\n";

        let options = ParseOptions::default()
            .with_recursive_includes(true)
            .with_project_prefixes(vec!["/nonexistent/".to_string()]);
        let header = CBackend::new()
            .parse(source, main_path.to_str().unwrap(), &[], &[], &options)
            .unwrap();

        assert_eq!(header.declarations.len(), 1);
        assert!(header.included_headers.contains("types.h"));
    }

    #[test]
    fn test_unreadable_include_is_skipped() {
        let options = ParseOptions::default().with_recursive_includes(true);
        let header = CBackend::new()
            .parse(
                "#include \"missing.h\"\nint f(void);\n",
                "test.h",
                &[],
                &[],
                &options,
            )
            .unwrap();
        assert_eq!(header.declarations.len(), 1);
        assert!(header.included_headers.contains("missing.h"));
    }

    #[test]
    fn test_extra_args_add_include_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vendor.h"), "int vendor_version;\n").unwrap();
        let source = "#include <vendor.h>\nint f(void);\n";

        let options = ParseOptions::default().with_recursive_includes(true);
        let extra = vec![format!("-I{}", dir.path().display())];
        let header = CBackend::new()
            .parse(source, "test.h", &[], &extra, &options)
            .unwrap();

        assert!(header.find("variable", "vendor_version").is_some());
    }
}
