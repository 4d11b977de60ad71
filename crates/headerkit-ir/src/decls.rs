//! Top-level C declarations built from type expressions.
//!
//! [`Declaration`] enumerates the closed set of constructs a backend can
//! produce and a writer can consume. Writers match on it exhaustively;
//! an unrepresentable kind is handled by an explicit arm returning
//! nothing, never by a fallthrough.

use crate::types::{Parameter, TypeExpr};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a declaration appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    /// 1-indexed line number.
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A struct or union member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeExpr,

    /// Bit-field width, e.g. `unsigned flags : 3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_width: Option<u32>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            bit_width: None,
        }
    }

    pub fn with_bit_width(mut self, width: u32) -> Self {
        self.bit_width = Some(width);
        self
    }
}

/// A struct or union declaration.
///
/// Empty `fields` is the opaque/forward-declared form: writers must
/// forward-declare rather than emit `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    /// `None` for anonymous structs/unions. Anonymous declarations are
    /// never emitted as referenceable symbols.
    pub name: Option<String>,

    pub fields: Vec<Field>,

    pub is_union: bool,

    /// When set, writers emit the combined `typedef struct {...} Name`
    /// form instead of a bare tag declaration. Structural, not cosmetic.
    pub is_typedef: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl StructDecl {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: Some(name.into()),
            fields,
            is_union: false,
            is_typedef: false,
            location: None,
        }
    }

    pub fn anonymous(fields: Vec<Field>) -> Self {
        Self {
            name: None,
            fields,
            is_union: false,
            is_typedef: false,
            location: None,
        }
    }

    /// A forward declaration with no visible fields.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn union(mut self) -> Self {
        self.is_union = true;
        self
    }

    pub fn typedef(mut self) -> Self {
        self.is_typedef = true;
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// True when this is a forward declaration / opaque type.
    pub fn is_opaque(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single enumerator. `value` is `None` for auto-incremented members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, value: Option<i64>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    /// `None` for anonymous enums.
    pub name: Option<String>,

    pub values: Vec<EnumValue>,

    /// See [`StructDecl::is_typedef`].
    pub is_typedef: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>, values: Vec<EnumValue>) -> Self {
        Self {
            name: Some(name.into()),
            values,
            is_typedef: false,
            location: None,
        }
    }

    pub fn anonymous(values: Vec<EnumValue>) -> Self {
        Self {
            name: None,
            values,
            is_typedef: false,
            location: None,
        }
    }

    pub fn typedef(mut self) -> Self {
        self.is_typedef = true;
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Resolve implicit enumerator values using the C rule (C17 6.7.2.2):
    /// the first unset enumerator is 0, each subsequent unset enumerator
    /// is one greater than the previous resolved value, spanning explicit
    /// and implicit values in declaration order.
    pub fn resolved_values(&self) -> Vec<(&str, i64)> {
        let mut resolved = Vec::with_capacity(self.values.len());
        let mut next = 0i64;
        for v in &self.values {
            let value = v.value.unwrap_or(next);
            next = value.wrapping_add(1);
            resolved.push((v.name.as_str(), value));
        }
        resolved
    }
}

/// A function prototype or definition signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,

    pub return_type: TypeExpr,

    pub parameters: Vec<Parameter>,

    pub is_variadic: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, return_type: TypeExpr, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters,
            is_variadic: false,
            location: None,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// A `typedef` of a non-composite underlying type.
///
/// `typedef struct {...} Name` is represented as a [`StructDecl`] with
/// `is_typedef` set, not as a `TypedefDecl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub name: String,

    pub underlying_type: TypeExpr,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl TypedefDecl {
    pub fn new(name: impl Into<String>, underlying_type: TypeExpr) -> Self {
        Self {
            name: name.into(),
            underlying_type,
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// A global variable declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeExpr,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// The value of a named constant. Integer values are exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(i) => write!(f, "{i}"),
            ConstantValue::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A named constant, typically from `#define`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantDecl {
    pub name: String,

    /// `None` when the macro's value could not be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConstantValue>,

    pub is_macro: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl ConstantDecl {
    pub fn new(name: impl Into<String>, value: Option<ConstantValue>) -> Self {
        Self {
            name: name.into(),
            value,
            is_macro: false,
            location: None,
        }
    }

    pub fn macro_constant(mut self) -> Self {
        self.is_macro = true;
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// A top-level declaration in a header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Struct(StructDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
    Typedef(TypedefDecl),
    Variable(VariableDecl),
    Constant(ConstantDecl),
}

impl Declaration {
    /// The declaration's name, `None` for anonymous structs/unions/enums.
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Struct(d) => d.name.as_deref(),
            Declaration::Enum(d) => d.name.as_deref(),
            Declaration::Function(d) => Some(&d.name),
            Declaration::Typedef(d) => Some(&d.name),
            Declaration::Variable(d) => Some(&d.name),
            Declaration::Constant(d) => Some(&d.name),
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Declaration::Struct(d) => d.location.as_ref(),
            Declaration::Enum(d) => d.location.as_ref(),
            Declaration::Function(d) => d.location.as_ref(),
            Declaration::Typedef(d) => d.location.as_ref(),
            Declaration::Variable(d) => d.location.as_ref(),
            Declaration::Constant(d) => d.location.as_ref(),
        }
    }

    /// A short label for the declaration kind, used in diff keys and
    /// report entries. Unions share the `"struct"` label: toggling
    /// `is_union` is a change to the same declaration, not a new one.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Declaration::Struct(_) => "struct",
            Declaration::Enum(_) => "enum",
            Declaration::Function(_) => "function",
            Declaration::Typedef(_) => "typedef",
            Declaration::Variable(_) => "variable",
            Declaration::Constant(_) => "constant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_auto_increment_resolution() {
        let e = EnumDecl::new(
            "E",
            vec![
                EnumValue::new("A", None),
                EnumValue::new("B", Some(5)),
                EnumValue::new("C", None),
            ],
        );
        assert_eq!(e.resolved_values(), vec![("A", 0), ("B", 5), ("C", 6)]);
    }

    #[test]
    fn test_enum_all_implicit() {
        let e = EnumDecl::new(
            "E",
            vec![
                EnumValue::new("A", None),
                EnumValue::new("B", None),
                EnumValue::new("C", None),
            ],
        );
        assert_eq!(e.resolved_values(), vec![("A", 0), ("B", 1), ("C", 2)]);
    }

    #[test]
    fn test_enum_negative_explicit() {
        let e = EnumDecl::new(
            "E",
            vec![EnumValue::new("A", Some(-3)), EnumValue::new("B", None)],
        );
        assert_eq!(e.resolved_values(), vec![("A", -3), ("B", -2)]);
    }

    #[test]
    fn test_opaque_struct() {
        let s = StructDecl::opaque("handle");
        assert!(s.is_opaque());
        assert!(!s.is_union);
    }

    #[test]
    fn test_declaration_name_and_kind() {
        let anon = Declaration::Struct(StructDecl::anonymous(vec![]));
        assert_eq!(anon.name(), None);
        assert_eq!(anon.kind_label(), "struct");

        let u = Declaration::Struct(StructDecl::new("D", vec![]).union());
        assert_eq!(u.kind_label(), "struct");

        let f = Declaration::Function(FunctionDecl::new(
            "f",
            TypeExpr::base("void"),
            vec![],
        ));
        assert_eq!(f.name(), Some("f"));
        assert_eq!(f.kind_label(), "function");
    }

    #[test]
    fn test_declaration_serde_shape() {
        let d = Declaration::Typedef(TypedefDecl::new(
            "byte",
            TypeExpr::base("unsigned char"),
        ));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "typedef");
        assert_eq!(json["name"], "byte");
        assert_eq!(json["underlying_type"]["name"], "unsigned char");

        let back: Declaration = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_constant_value_untagged_serde() {
        let c = ConstantDecl::new("MAX", Some(ConstantValue::Int(255))).macro_constant();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["value"], 255);

        let s = ConstantDecl::new("NAME", Some(ConstantValue::Str("\"hk\"".into())));
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["value"], "\"hk\"");
    }
}
