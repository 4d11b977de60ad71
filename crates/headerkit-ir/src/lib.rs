//! headerkit IR
//!
//! The backend-agnostic, write-agnostic intermediate representation for
//! C header declarations, plus the two contracts at its boundary.
//!
//! This crate defines:
//!
//! - **Type expressions**: the recursive [`TypeExpr`] tree describing C
//!   type syntax (base types, pointers, arrays, function pointers)
//! - **Declarations**: the closed [`Declaration`] set (struct/union,
//!   enum, function, typedef, variable, constant)
//! - **Header**: the root aggregate a parse produces and writers consume
//! - **ParserBackend trait**: what a parsing engine integration must
//!   implement to populate a `Header`
//! - **HeaderWriter trait**: the best-effort, no-throw output contract
//! - **Error handling**: the `BackendUnavailable` / `ParseFailure` split
//!
//! The core is a pure, synchronous data transformation: a `Header` is
//! immutable once constructed, so any number of writers may consume it
//! concurrently without synchronization.
//!
//! # Example
//!
//! ```rust
//! use headerkit_ir::{Declaration, Field, Header, StructDecl, TypeExpr};
//!
//! let point = StructDecl::new(
//!     "point",
//!     vec![
//!         Field::new("x", TypeExpr::base("int")),
//!         Field::new("y", TypeExpr::base("int")),
//!     ],
//! );
//! let header = Header::new("point.h", vec![Declaration::Struct(point)]);
//! assert!(header.find("struct", "point").is_some());
//! ```

pub mod config;
pub mod decls;
pub mod errors;
pub mod header;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::ParseOptions;
pub use decls::{
    ConstantDecl, ConstantValue, Declaration, EnumDecl, EnumValue, Field, FunctionDecl,
    SourceLocation, StructDecl, TypedefDecl, VariableDecl,
};
pub use errors::{ParseError, ParseResult};
pub use header::Header;
pub use traits::{HeaderWriter, ParserBackend};
pub use types::{format_parameters, Parameter, TypeExpr};
