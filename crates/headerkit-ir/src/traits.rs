//! The two interface boundaries of the core: parser backends (inbound)
//! and writers (outbound).

use crate::config::ParseOptions;
use crate::errors::ParseResult;
use crate::header::Header;
use std::path::PathBuf;

/// Contract a parsing engine integration must satisfy to produce
/// [`Header`] values.
///
/// Capability flags are advertised, not negotiated: callers must check
/// [`supports_macros`](ParserBackend::supports_macros) before relying on
/// macro-derived constants, and
/// [`supports_cpp`](ParserBackend::supports_cpp) before feeding C++
/// headers.
///
/// # Thread safety
/// Implementations must be `Send + Sync`; a backend holds no state that
/// outlives a single `parse` call.
pub trait ParserBackend: Send + Sync {
    /// Backend identifier, e.g. `"tree-sitter-c"`.
    fn name(&self) -> &str;

    /// Whether `#define`-derived [`ConstantDecl`]s are produced.
    ///
    /// [`ConstantDecl`]: crate::decls::ConstantDecl
    fn supports_macros(&self) -> bool;

    /// Whether C++-only declaration shapes are understood.
    fn supports_cpp(&self) -> bool;

    /// Parse `source` into a [`Header`].
    ///
    /// The header is built once, atomically; a new parse produces a
    /// wholly new header. `include_dirs` and `extra_args` are passed
    /// through to the underlying engine; `options` carries the
    /// recognized configuration fields.
    ///
    /// # Errors
    /// [`ParseError::BackendUnavailable`] when the engine itself could
    /// not be loaded, [`ParseError::ParseFailure`] when the engine
    /// reported fatal diagnostics for this input. Warnings never fail a
    /// parse.
    ///
    /// [`ParseError::BackendUnavailable`]: crate::errors::ParseError::BackendUnavailable
    /// [`ParseError::ParseFailure`]: crate::errors::ParseError::ParseFailure
    fn parse(
        &self,
        source: &str,
        filename: &str,
        include_dirs: &[PathBuf],
        extra_args: &[String],
        options: &ParseOptions,
    ) -> ParseResult<Header>;
}

/// Contract consumers implement to transform a [`Header`] into output
/// text.
///
/// `write` must not fail for any structurally valid header: declarations
/// the target format cannot represent are silently skipped, never raised
/// as errors. This best-effort contract lets a pipeline run many writers
/// over many headers without per-declaration error handling.
///
/// Writer-specific configuration is supplied at construction time as an
/// options struct with named fields, never as extra arguments to
/// `write`.
pub trait HeaderWriter {
    /// Writer identifier, e.g. `"json"`.
    fn name(&self) -> &str;

    /// Short description of the output format.
    fn format_description(&self) -> &str;

    /// Render the header. Infallible by contract.
    fn write(&self, header: &Header) -> String;
}
