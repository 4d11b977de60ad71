//! headerkit-writers
//!
//! Mechanical output writers over the headerkit IR. Writers take a
//! fully parsed [`Header`] and render text; they perform no analysis
//! of their own and never fail at write time.
//!
//! Two formats live here:
//!
//! - [`CdefWriter`]: C declaration text for FFI `cdef` consumption,
//!   skipping whatever the format cannot express.
//! - [`JsonWriter`]: lossless JSON serialization of the IR.
//!
//! [`Header`]: headerkit_ir::Header

pub mod cdef;
pub mod json;

pub use cdef::{CdefOptions, CdefWriter};
pub use json::{JsonOptions, JsonWriter};
