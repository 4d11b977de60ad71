//! headerkit-diff
//!
//! Structural comparison of two parsed headers, classifying every change
//! as breaking or non-breaking for downstream API/ABI review.
//!
//! The engine is a pure function over two immutable [`Header`] values:
//! no shared state, no I/O, deterministic output ordering suitable for
//! snapshot testing.
//!
//! # Example
//!
//! ```rust
//! use headerkit_diff::diff_headers;
//! use headerkit_ir::{Declaration, FunctionDecl, Header, TypeExpr};
//!
//! let baseline = Header::empty("v1.h");
//! let target = Header::new(
//!     "v2.h",
//!     vec![Declaration::Function(FunctionDecl::new(
//!         "hk_open",
//!         TypeExpr::base("int"),
//!         vec![],
//!     ))],
//! );
//! let report = diff_headers(&baseline, &target);
//! assert_eq!(report.summary.non_breaking, 1);
//! ```
//!
//! [`Header`]: headerkit_ir::Header

pub mod engine;
pub mod report;
pub mod writer;

pub use engine::diff_headers;
pub use report::{DiffEntry, DiffReport, DiffSummary, ReportError, Severity, SCHEMA_VERSION};
pub use writer::{render_markdown, DiffFormat, DiffOptions, DiffWriter};
