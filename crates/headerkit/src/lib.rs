//! # headerkit
//!
//! A C header parsing toolkit: parser backends produce a normalized
//! declaration IR, writers render it to output formats, and a
//! structural diff engine classifies changes between two parsed headers
//! as breaking or non-breaking.
//!
//! This crate is the user-facing facade. It re-exports the IR and
//! contracts from `headerkit-ir`, the tree-sitter C backend from
//! `headerkit-c`, the cdef/JSON writers from `headerkit-writers`, the
//! diff engine from `headerkit-diff`, and adds name-based registries
//! for selecting backends and writers at runtime.
//!
//! ## Quick Start
//!
//! ```rust
//! use headerkit::{
//!     BackendRegistry, HeaderWriter, ParseOptions, ParserBackend, WriterRegistry,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backends = BackendRegistry::with_builtins();
//! let writers = WriterRegistry::with_builtins();
//!
//! let backend = backends.get("c").expect("built-in backend");
//! let header = backend.parse(
//!     "typedef struct ctx ctx;\nctx *ctx_open(const char *path);\n",
//!     "ctx.h",
//!     &[],
//!     &[],
//!     &ParseOptions::default(),
//! )?;
//!
//! let cdef = writers.get("cdef").expect("built-in writer").write(&header);
//! assert!(cdef.contains("typedef struct ctx ctx;"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Diffing two header versions
//!
//! ```rust
//! use headerkit::{diff_headers, CBackend, ParseOptions, ParserBackend, Severity};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = CBackend::new();
//! let options = ParseOptions::default();
//! let v1 = backend.parse("int f(int a);", "api.h", &[], &[], &options)?;
//! let v2 = backend.parse("int f(long a);", "api.h", &[], &[], &options)?;
//!
//! let report = diff_headers(&v1, &v2);
//! assert_eq!(report.entries[0].severity, Severity::Breaking);
//! # Ok(())
//! # }
//! ```

pub mod registry;

// IR, contracts, configuration, errors
pub use headerkit_ir::{
    format_parameters, ConstantDecl, ConstantValue, Declaration, EnumDecl, EnumValue, Field,
    FunctionDecl, Header, HeaderWriter, Parameter, ParseError, ParseOptions, ParseResult,
    ParserBackend, SourceLocation, StructDecl, TypeExpr, TypedefDecl, VariableDecl,
};

// Parser backend
pub use headerkit_c::CBackend;

// Writers
pub use headerkit_writers::{CdefOptions, CdefWriter, JsonOptions, JsonWriter};

// Diff engine
pub use headerkit_diff::{
    diff_headers, render_markdown, DiffEntry, DiffFormat, DiffOptions, DiffReport, DiffSummary,
    DiffWriter, ReportError, Severity, SCHEMA_VERSION,
};

pub use registry::{BackendRegistry, WriterRegistry};
