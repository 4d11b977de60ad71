//! Recursive type expressions describing C type syntax.
//!
//! A [`TypeExpr`] is an immutable value tree: composition always produces
//! new nodes, and equality is structural. Trees are finite and acyclic:
//! a self-referential struct goes through a named base type
//! (`Pointer(Base("struct node"))`), never through a shared tree node.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A C type expression.
///
/// The variant set is closed: writers and the diff engine match on it
/// exhaustively, so adding a variant is a compile-visible change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    /// A named base type, e.g. `char`, `unsigned long`, `struct point`.
    ///
    /// Multi-token sign/size spellings stay inside `name`; `qualifiers`
    /// holds `const`/`volatile`/`restrict` in declaration order.
    Base {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        qualifiers: Vec<String>,
    },

    /// A pointer. `qualifiers` apply to the pointer itself (a `const`
    /// pointer), not to the pointee.
    Pointer {
        pointee: Box<TypeExpr>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        qualifiers: Vec<String>,
    },

    /// An array. A missing size is a flexible/incomplete array.
    Array {
        element_type: Box<TypeExpr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
    },

    /// A function pointer signature.
    FunctionPointer {
        return_type: Box<TypeExpr>,
        parameters: Vec<Parameter>,
        is_variadic: bool,
    },
}

impl TypeExpr {
    /// Create an unqualified base type.
    pub fn base(name: impl Into<String>) -> Self {
        TypeExpr::Base {
            name: name.into(),
            qualifiers: Vec::new(),
        }
    }

    /// Create a base type with qualifiers, e.g. `const char`.
    pub fn base_qualified(name: impl Into<String>, qualifiers: Vec<String>) -> Self {
        TypeExpr::Base {
            name: name.into(),
            qualifiers,
        }
    }

    /// Wrap an existing type in a pointer, modeling `T *`.
    pub fn pointer(pointee: TypeExpr) -> Self {
        TypeExpr::Pointer {
            pointee: Box::new(pointee),
            qualifiers: Vec::new(),
        }
    }

    /// Wrap an existing type in a qualified pointer, e.g. `T * const`.
    pub fn pointer_qualified(pointee: TypeExpr, qualifiers: Vec<String>) -> Self {
        TypeExpr::Pointer {
            pointee: Box::new(pointee),
            qualifiers,
        }
    }

    /// Wrap an existing type in an array, modeling `T [n]` or `T []`.
    pub fn array(element_type: TypeExpr, size: Option<u64>) -> Self {
        TypeExpr::Array {
            element_type: Box::new(element_type),
            size,
        }
    }

    /// Create a function pointer signature.
    pub fn function_pointer(
        return_type: TypeExpr,
        parameters: Vec<Parameter>,
        is_variadic: bool,
    ) -> Self {
        TypeExpr::FunctionPointer {
            return_type: Box::new(return_type),
            parameters,
            is_variadic,
        }
    }

    /// True for `Pointer(FunctionPointer(..))`, the shape produced for
    /// `typedef void (*cb)(int)`.
    pub fn is_function_pointer_type(&self) -> bool {
        match self {
            TypeExpr::FunctionPointer { .. } => true,
            TypeExpr::Pointer { pointee, .. } => {
                matches!(**pointee, TypeExpr::FunctionPointer { .. })
            }
            _ => false,
        }
    }
}

impl fmt::Display for TypeExpr {
    /// Renders the C spelling: `const char *`, `int [10]`, `void (*)(int)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Base { name, qualifiers } => {
                if qualifiers.is_empty() {
                    write!(f, "{name}")
                } else {
                    write!(f, "{} {name}", qualifiers.join(" "))
                }
            }
            TypeExpr::Pointer { pointee, qualifiers } => {
                if let TypeExpr::FunctionPointer {
                    return_type,
                    parameters,
                    is_variadic,
                } = &**pointee
                {
                    // Pointer-level qualifiers sit inside the parens:
                    // `void (* const)(int)`.
                    let quals = if qualifiers.is_empty() {
                        String::new()
                    } else {
                        format!(" {}", qualifiers.join(" "))
                    };
                    write!(
                        f,
                        "{return_type} (*{quals})({})",
                        format_parameters(parameters, *is_variadic)
                    )
                } else if qualifiers.is_empty() {
                    write!(f, "{pointee} *")
                } else {
                    write!(f, "{pointee} * {}", qualifiers.join(" "))
                }
            }
            TypeExpr::Array { element_type, size } => match size {
                Some(n) => write!(f, "{element_type} [{n}]"),
                None => write!(f, "{element_type} []"),
            },
            TypeExpr::FunctionPointer {
                return_type,
                parameters,
                is_variadic,
            } => write!(
                f,
                "{return_type} (*)({})",
                format_parameters(parameters, *is_variadic)
            ),
        }
    }
}

/// A function or function-pointer parameter.
///
/// The name is documentation only; `None` is valid and must not affect
/// type-level code generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    /// A parameter declared without a name, e.g. `void f(int);`.
    pub fn unnamed(ty: TypeExpr) -> Self {
        Self { name: None, ty }
    }
}

/// Render a parameter list the way C spells it, with `void` for an
/// empty non-variadic list.
pub fn format_parameters(parameters: &[Parameter], is_variadic: bool) -> String {
    if parameters.is_empty() && !is_variadic {
        return "void".to_string();
    }
    let mut parts: Vec<String> = parameters
        .iter()
        .map(|p| match &p.name {
            Some(name) => format!("{} {name}", p.ty),
            None => p.ty.to_string(),
        })
        .collect();
    if is_variadic {
        parts.push("...".to_string());
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = TypeExpr::pointer(TypeExpr::pointer(TypeExpr::base_qualified(
            "char",
            vec!["const".to_string()],
        )));
        let b = TypeExpr::pointer(TypeExpr::pointer(TypeExpr::base_qualified(
            "char",
            vec!["const".to_string()],
        )));
        assert_eq!(a, b);
    }

    #[test]
    fn test_composition_leaves_original_intact() {
        let base = TypeExpr::base("int");
        let ptr = TypeExpr::pointer(base.clone());
        assert_eq!(base, TypeExpr::base("int"));
        assert_ne!(ptr, base);
    }

    #[test]
    fn test_qualifier_placement_is_structural() {
        // const char *  vs  char * const
        let const_pointee = TypeExpr::pointer(TypeExpr::base_qualified(
            "char",
            vec!["const".to_string()],
        ));
        let const_pointer = TypeExpr::pointer_qualified(
            TypeExpr::base("char"),
            vec!["const".to_string()],
        );
        assert_ne!(const_pointee, const_pointer);
    }

    #[test]
    fn test_display_base_and_pointer() {
        let t = TypeExpr::pointer(TypeExpr::base_qualified(
            "char",
            vec!["const".to_string()],
        ));
        assert_eq!(t.to_string(), "const char *");
    }

    #[test]
    fn test_display_array() {
        assert_eq!(
            TypeExpr::array(TypeExpr::base("int"), Some(10)).to_string(),
            "int [10]"
        );
        assert_eq!(
            TypeExpr::array(TypeExpr::base("int"), None).to_string(),
            "int []"
        );
    }

    #[test]
    fn test_display_function_pointer() {
        let fp = TypeExpr::pointer(TypeExpr::function_pointer(
            TypeExpr::base("void"),
            vec![Parameter::unnamed(TypeExpr::base("int"))],
            false,
        ));
        assert_eq!(fp.to_string(), "void (*)(int)");
    }

    #[test]
    fn test_display_qualified_function_pointer() {
        // void (* const)(int)
        let fp = TypeExpr::pointer_qualified(
            TypeExpr::function_pointer(
                TypeExpr::base("void"),
                vec![Parameter::unnamed(TypeExpr::base("int"))],
                false,
            ),
            vec!["const".to_string()],
        );
        assert_eq!(fp.to_string(), "void (* const)(int)");
    }

    #[test]
    fn test_display_empty_params_spell_void() {
        let fp = TypeExpr::function_pointer(TypeExpr::base("int"), vec![], false);
        assert_eq!(fp.to_string(), "int (*)(void)");
    }

    #[test]
    fn test_serde_tagging() {
        let t = TypeExpr::array(TypeExpr::base("int"), Some(4));
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["kind"], "array");
        assert_eq!(json["size"], 4);
        assert_eq!(json["element_type"]["kind"], "base");

        let back: TypeExpr = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }
}
