//! The root aggregate exchanged between parser backends and writers.

use crate::decls::Declaration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A parsed header: the unit of exchange between a [`ParserBackend`] and
/// any number of writers.
///
/// `declarations` preserves source appearance order, and transformations
/// must preserve it too: filtering is allowed, reordering is not (except
/// by explicit, documented writer policy using a stable sort). A header
/// is produced once, atomically, by a single parse and never mutated
/// afterwards, which is what makes fan-out to concurrent writers safe
/// without locks.
///
/// [`ParserBackend`]: crate::traits::ParserBackend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Path of the header this was parsed from.
    pub path: String,

    /// All top-level declarations in source order.
    pub declarations: Vec<Declaration>,

    /// Paths of headers referenced by `#include`. Sorted for stable
    /// serialization.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub included_headers: BTreeSet<String>,
}

impl Header {
    pub fn new(path: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            path: path.into(),
            declarations,
            included_headers: BTreeSet::new(),
        }
    }

    pub fn with_includes(mut self, included_headers: BTreeSet<String>) -> Self {
        self.included_headers = included_headers;
        self
    }

    /// An empty header, used by the diff writer when no baseline is
    /// supplied.
    pub fn empty(path: impl Into<String>) -> Self {
        Self::new(path, Vec::new())
    }

    /// Look up a named declaration by kind label and name.
    pub fn find(&self, kind_label: &str, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.kind_label() == kind_label && d.name() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decls::{FunctionDecl, StructDecl};
    use crate::types::TypeExpr;

    #[test]
    fn test_find_by_kind_and_name() {
        let header = Header::new(
            "a.h",
            vec![
                Declaration::Struct(StructDecl::opaque("point")),
                Declaration::Function(FunctionDecl::new(
                    "point",
                    TypeExpr::base("void"),
                    vec![],
                )),
            ],
        );
        assert!(matches!(
            header.find("struct", "point"),
            Some(Declaration::Struct(_))
        ));
        assert!(matches!(
            header.find("function", "point"),
            Some(Declaration::Function(_))
        ));
        assert!(header.find("enum", "point").is_none());
    }

    #[test]
    fn test_includes_serialize_sorted() {
        let header = Header::empty("a.h").with_includes(
            ["z.h".to_string(), "b.h".to_string()].into_iter().collect(),
        );
        let json = serde_json::to_value(&header).unwrap();
        assert_eq!(json["included_headers"][0], "b.h");
        assert_eq!(json["included_headers"][1], "z.h");
    }
}
