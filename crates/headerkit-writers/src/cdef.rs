//! C declaration text for FFI `cdef` consumption.
//!
//! Renders IR declarations back to C source suitable for binding
//! generators. The rendering is best-effort: anonymous declarations,
//! non-integer constants, and anything else the format cannot express
//! are omitted, never errors.

use headerkit_ir::{
    ConstantDecl, ConstantValue, Declaration, EnumDecl, Field, FunctionDecl, Header, HeaderWriter,
    Parameter, StructDecl, TypeExpr, TypedefDecl, VariableDecl,
};
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;

/// Bare tag name -> "struct" | "union" | "enum".
///
/// cdef parsers require struct/union/enum tags to carry their kind
/// keyword; backends sometimes drop it when a typedef aliases a tag.
type TagKinds = BTreeMap<String, &'static str>;

/// Construction-time configuration for [`CdefWriter`].
#[derive(Debug, Clone, Default)]
pub struct CdefOptions {
    /// Declarations whose name matches any of these patterns are
    /// omitted from the output.
    pub exclude: Vec<String>,
}

/// Writer producing C declaration text.
pub struct CdefWriter {
    exclude: Vec<Regex>,
}

impl CdefWriter {
    /// Compile the options. Fails only on an invalid exclude pattern;
    /// `write` itself never fails.
    pub fn new(options: CdefOptions) -> Result<Self, regex::Error> {
        let exclude = options
            .exclude
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exclude })
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(name))
    }
}

impl Default for CdefWriter {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
        }
    }
}

impl HeaderWriter for CdefWriter {
    fn name(&self) -> &str {
        "cdef"
    }

    fn format_description(&self) -> &str {
        "C declaration text for FFI cdef consumption"
    }

    fn write(&self, header: &Header) -> String {
        let tags = collect_tag_kinds(header);
        let mut chunks = Vec::new();
        for decl in &header.declarations {
            if let Some(name) = decl.name() {
                if self.is_excluded(name) {
                    debug!("cdef: excluding '{name}' by pattern");
                    continue;
                }
            }
            if let Some(text) = render_declaration(decl, &tags) {
                chunks.push(text);
            }
        }
        let mut out = chunks.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Pre-pass collecting tag names so bare references can be qualified.
fn collect_tag_kinds(header: &Header) -> TagKinds {
    let mut tags = TagKinds::new();
    for decl in &header.declarations {
        match decl {
            Declaration::Struct(s) => {
                if let Some(name) = &s.name {
                    tags.insert(name.clone(), if s.is_union { "union" } else { "struct" });
                }
            }
            Declaration::Enum(e) => {
                if let Some(name) = &e.name {
                    tags.insert(name.clone(), "enum");
                }
            }
            _ => {}
        }
    }
    tags
}

/// Render one declaration, or `None` when the format cannot express it.
///
/// The match is total: a new declaration variant fails to compile here
/// rather than silently falling through.
fn render_declaration(decl: &Declaration, tags: &TagKinds) -> Option<String> {
    match decl {
        Declaration::Struct(s) => render_struct(s, tags),
        Declaration::Enum(e) => render_enum(e),
        Declaration::Function(f) => Some(render_function(f, tags)),
        Declaration::Typedef(t) => Some(render_typedef(t, tags)),
        Declaration::Variable(v) => Some(render_variable(v, tags)),
        Declaration::Constant(c) => render_constant(c),
    }
}

fn qualify_tag_name(name: &str, tags: &TagKinds) -> String {
    if name.starts_with("struct ") || name.starts_with("union ") || name.starts_with("enum ") {
        return name.to_string();
    }
    // Qualify only the final token so "const foo" stays qualified right.
    match tags.get(name) {
        Some(kind) => format!("{kind} {name}"),
        None => name.to_string(),
    }
}

/// Render a type expression as a C type spelling with tag qualification.
fn type_to_cdef(t: &TypeExpr, tags: &TagKinds) -> String {
    match t {
        TypeExpr::Base { name, qualifiers } => {
            let qualified = qualify_tag_name(name, tags);
            if qualifiers.is_empty() {
                qualified
            } else {
                format!("{} {qualified}", qualifiers.join(" "))
            }
        }
        TypeExpr::Pointer { .. } => {
            // Collapse consecutive pointer levels to emit "T **", and
            // spell pointers-to-function-pointers with stacked stars.
            let mut stars = 0usize;
            let mut quals: Vec<&str> = Vec::new();
            let mut inner = t;
            while let TypeExpr::Pointer { pointee, qualifiers } = inner {
                stars += 1;
                quals.extend(qualifiers.iter().map(String::as_str));
                inner = pointee;
            }
            if let TypeExpr::FunctionPointer {
                return_type,
                parameters,
                is_variadic,
            } = inner
            {
                let quals = if quals.is_empty() {
                    String::new()
                } else {
                    format!(" {}", quals.join(" "))
                };
                format!(
                    "{}({}{quals})({})",
                    type_to_cdef(return_type, tags),
                    "*".repeat(stars),
                    params_to_cdef(parameters, *is_variadic, tags)
                )
            } else {
                let base = type_to_cdef(inner, tags);
                if quals.is_empty() {
                    format!("{base} {}", "*".repeat(stars))
                } else {
                    format!("{base} {} {}", "*".repeat(stars), quals.join(" "))
                }
            }
        }
        TypeExpr::Array { element_type, size } => {
            let size_str = size.map(|n| n.to_string()).unwrap_or_default();
            format!("{}[{size_str}]", type_to_cdef(element_type, tags))
        }
        TypeExpr::FunctionPointer {
            return_type,
            parameters,
            is_variadic,
        } => format!(
            "{}(*)({})",
            type_to_cdef(return_type, tags),
            params_to_cdef(parameters, *is_variadic, tags)
        ),
    }
}

/// Render `type name` the way C binds a name into a declarator: array
/// dimensions after the name, function-pointer names inside the stars.
fn declarator_to_cdef(name: &str, ty: &TypeExpr, tags: &TagKinds) -> String {
    match ty {
        TypeExpr::Array { element_type, size } => {
            let size_str = size.map(|n| n.to_string()).unwrap_or_default();
            format!("{} {name}[{size_str}]", type_to_cdef(element_type, tags))
        }
        TypeExpr::FunctionPointer {
            return_type,
            parameters,
            is_variadic,
        } => format!(
            "{} (*{name})({})",
            type_to_cdef(return_type, tags),
            params_to_cdef(parameters, *is_variadic, tags)
        ),
        TypeExpr::Pointer { pointee, qualifiers } => {
            if let TypeExpr::FunctionPointer {
                return_type,
                parameters,
                is_variadic,
            } = &**pointee
            {
                let stars = if qualifiers.is_empty() {
                    "*".to_string()
                } else {
                    format!("* {} ", qualifiers.join(" "))
                };
                format!(
                    "{} ({stars}{name})({})",
                    type_to_cdef(return_type, tags),
                    params_to_cdef(parameters, *is_variadic, tags)
                )
            } else {
                format!("{} {name}", type_to_cdef(ty, tags))
            }
        }
        TypeExpr::Base { .. } => format!("{} {name}", type_to_cdef(ty, tags)),
    }
}

fn params_to_cdef(parameters: &[Parameter], is_variadic: bool, tags: &TagKinds) -> String {
    if parameters.is_empty() && !is_variadic {
        return "void".to_string();
    }
    let mut parts: Vec<String> = parameters
        .iter()
        .map(|p| match &p.name {
            Some(name) => declarator_to_cdef(name, &p.ty, tags),
            None => type_to_cdef(&p.ty, tags),
        })
        .collect();
    if is_variadic {
        parts.push("...".to_string());
    }
    parts.join(", ")
}

fn render_struct(decl: &StructDecl, tags: &TagKinds) -> Option<String> {
    // Anonymous top-level structs have no referenceable symbol.
    let name = decl.name.as_deref()?;
    let kind = if decl.is_union { "union" } else { "struct" };

    if decl.is_opaque() {
        // Forward declaration only, never "{}".
        if decl.is_typedef {
            return Some(format!("typedef {kind} {name} {name};"));
        }
        return Some(format!("{kind} {name};"));
    }

    let mut lines = Vec::new();
    if decl.is_typedef {
        lines.push(format!("typedef {kind} {name} {{"));
    } else {
        lines.push(format!("{kind} {name} {{"));
    }
    for field in &decl.fields {
        lines.push(render_field(field, tags));
    }
    if decl.is_typedef {
        lines.push(format!("}} {name};"));
    } else {
        lines.push("};".to_string());
    }
    Some(lines.join("\n"))
}

fn render_field(field: &Field, tags: &TagKinds) -> String {
    let mut line = format!("    {}", declarator_to_cdef(&field.name, &field.ty, tags));
    if let Some(width) = field.bit_width {
        line.push_str(&format!(" : {width}"));
    }
    line.push(';');
    line
}

fn render_enum(decl: &EnumDecl) -> Option<String> {
    if decl.values.is_empty() {
        return None;
    }
    let mut lines = Vec::new();
    match (&decl.name, decl.is_typedef) {
        (Some(name), true) => lines.push(format!("typedef enum {name} {{")),
        (Some(name), false) => lines.push(format!("enum {name} {{")),
        // Anonymous enums are only useful for their enumerators.
        (None, _) => lines.push("enum {".to_string()),
    }
    for v in &decl.values {
        match v.value {
            Some(value) => lines.push(format!("    {} = {value},", v.name)),
            None => lines.push(format!("    {},", v.name)),
        }
    }
    match (&decl.name, decl.is_typedef) {
        (Some(name), true) => lines.push(format!("}} {name};")),
        _ => lines.push("};".to_string()),
    }
    Some(lines.join("\n"))
}

fn render_function(decl: &FunctionDecl, tags: &TagKinds) -> String {
    format!(
        "{} {}({});",
        type_to_cdef(&decl.return_type, tags),
        decl.name,
        params_to_cdef(&decl.parameters, decl.is_variadic, tags)
    )
}

fn render_typedef(decl: &TypedefDecl, tags: &TagKinds) -> String {
    format!(
        "typedef {};",
        declarator_to_cdef(&decl.name, &decl.underlying_type, tags)
    )
}

fn render_variable(decl: &VariableDecl, tags: &TagKinds) -> String {
    format!("{};", declarator_to_cdef(&decl.name, &decl.ty, tags))
}

fn render_constant(decl: &ConstantDecl) -> Option<String> {
    // Only exact integer constants are expressible; string and
    // unresolved macros are skipped.
    match &decl.value {
        Some(ConstantValue::Int(value)) => Some(format!("#define {} {value}", decl.name)),
        Some(ConstantValue::Str(_)) | None => {
            debug!("cdef: skipping non-integer constant '{}'", decl.name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headerkit_ir::{EnumValue, TypeExpr};

    fn write_one(decl: Declaration) -> String {
        CdefWriter::default().write(&Header::new("t.h", vec![decl]))
    }

    #[test]
    fn test_function_prototype() {
        let out = write_one(Declaration::Function(FunctionDecl::new(
            "add",
            TypeExpr::base("int"),
            vec![
                Parameter::new("a", TypeExpr::base("int")),
                Parameter::new("b", TypeExpr::base("int")),
            ],
        )));
        assert_eq!(out, "int add(int a, int b);\n");
    }

    #[test]
    fn test_function_no_params_spells_void() {
        let out = write_one(Declaration::Function(FunctionDecl::new(
            "init",
            TypeExpr::base("void"),
            vec![],
        )));
        assert_eq!(out, "void init(void);\n");
    }

    #[test]
    fn test_variadic_function() {
        let out = write_one(Declaration::Function(
            FunctionDecl::new(
                "logf",
                TypeExpr::base("int"),
                vec![Parameter::new(
                    "fmt",
                    TypeExpr::pointer(TypeExpr::base_qualified(
                        "char",
                        vec!["const".to_string()],
                    )),
                )],
            )
            .variadic(),
        ));
        assert_eq!(out, "int logf(const char * fmt, ...);\n");
    }

    #[test]
    fn test_struct_with_fields() {
        let out = write_one(Declaration::Struct(StructDecl::new(
            "point",
            vec![
                Field::new("x", TypeExpr::base("int")),
                Field::new("y", TypeExpr::base("int")),
            ],
        )));
        assert_eq!(out, "struct point {\n    int x;\n    int y;\n};\n");
    }

    #[test]
    fn test_opaque_struct_renders_forward_declaration() {
        let out = write_one(Declaration::Struct(StructDecl::opaque("handle")));
        assert_eq!(out, "struct handle;\n");
        assert!(!out.contains("{}"));
    }

    #[test]
    fn test_opaque_typedef_struct() {
        let out = write_one(Declaration::Struct(StructDecl::opaque("hk_ctx").typedef()));
        assert_eq!(out, "typedef struct hk_ctx hk_ctx;\n");
    }

    #[test]
    fn test_typedef_struct_combined_form() {
        let out = write_one(Declaration::Struct(
            StructDecl::new("color", vec![Field::new("r", TypeExpr::base("int"))]).typedef(),
        ));
        assert_eq!(out, "typedef struct color {\n    int r;\n} color;\n");
    }

    #[test]
    fn test_anonymous_struct_omitted() {
        let out = write_one(Declaration::Struct(StructDecl::anonymous(vec![
            Field::new("x", TypeExpr::base("int")),
        ])));
        assert_eq!(out, "");
    }

    #[test]
    fn test_bit_field() {
        let out = write_one(Declaration::Struct(StructDecl::new(
            "flags",
            vec![Field::new("ready", TypeExpr::base("unsigned")).with_bit_width(1)],
        )));
        assert!(out.contains("unsigned ready : 1;"));
    }

    #[test]
    fn test_enum_with_mixed_values() {
        let out = write_one(Declaration::Enum(EnumDecl::new(
            "level",
            vec![
                EnumValue::new("LOW", None),
                EnumValue::new("HIGH", Some(10)),
            ],
        )));
        assert_eq!(out, "enum level {\n    LOW,\n    HIGH = 10,\n};\n");
    }

    #[test]
    fn test_function_pointer_typedef() {
        let out = write_one(Declaration::Typedef(TypedefDecl::new(
            "callback",
            TypeExpr::pointer(TypeExpr::function_pointer(
                TypeExpr::base("void"),
                vec![Parameter::unnamed(TypeExpr::base("int"))],
                false,
            )),
        )));
        assert_eq!(out, "typedef void (*callback)(int);\n");
    }

    #[test]
    fn test_const_function_pointer_keeps_qualifier() {
        let out = write_one(Declaration::Variable(VariableDecl::new(
            "cb",
            TypeExpr::pointer_qualified(
                TypeExpr::function_pointer(
                    TypeExpr::base("void"),
                    vec![Parameter::unnamed(TypeExpr::base("int"))],
                    false,
                ),
                vec!["const".to_string()],
            ),
        )));
        assert_eq!(out, "void (* const cb)(int);\n");
    }

    #[test]
    fn test_array_typedef() {
        let out = write_one(Declaration::Typedef(TypedefDecl::new(
            "vec3",
            TypeExpr::array(TypeExpr::base("float"), Some(3)),
        )));
        assert_eq!(out, "typedef float vec3[3];\n");
    }

    #[test]
    fn test_tag_qualification() {
        let header = Header::new(
            "t.h",
            vec![
                Declaration::Struct(StructDecl::opaque("node")),
                Declaration::Function(FunctionDecl::new(
                    "next",
                    TypeExpr::pointer(TypeExpr::base("node")),
                    vec![Parameter::new("n", TypeExpr::pointer(TypeExpr::base("node")))],
                )),
            ],
        );
        let out = CdefWriter::default().write(&header);
        assert!(out.contains("struct node * next(struct node * n);"));
    }

    #[test]
    fn test_integer_constant_only() {
        let header = Header::new(
            "t.h",
            vec![
                Declaration::Constant(
                    ConstantDecl::new("MAX", Some(ConstantValue::Int(64))).macro_constant(),
                ),
                Declaration::Constant(
                    ConstantDecl::new("NAME", Some(ConstantValue::Str("\"hk\"".into())))
                        .macro_constant(),
                ),
                Declaration::Constant(ConstantDecl::new("UNKNOWN", None).macro_constant()),
            ],
        );
        let out = CdefWriter::default().write(&header);
        assert_eq!(out, "#define MAX 64\n");
    }

    #[test]
    fn test_variable_with_array_type() {
        let out = write_one(Declaration::Variable(VariableDecl::new(
            "table",
            TypeExpr::array(TypeExpr::base("int"), Some(16)),
        )));
        assert_eq!(out, "int table[16];\n");
    }

    #[test]
    fn test_exclude_patterns() {
        let writer = CdefWriter::new(CdefOptions {
            exclude: vec!["^_".to_string()],
        })
        .unwrap();
        let header = Header::new(
            "t.h",
            vec![
                Declaration::Function(FunctionDecl::new(
                    "_internal",
                    TypeExpr::base("void"),
                    vec![],
                )),
                Declaration::Function(FunctionDecl::new("public_fn", TypeExpr::base("void"), vec![])),
            ],
        );
        let out = writer.write(&header);
        assert!(!out.contains("_internal"));
        assert!(out.contains("public_fn"));
    }

    #[test]
    fn test_double_pointer_collapse() {
        let out = write_one(Declaration::Function(FunctionDecl::new(
            "alloc",
            TypeExpr::base("int"),
            vec![Parameter::new(
                "out",
                TypeExpr::pointer(TypeExpr::pointer(TypeExpr::base("char"))),
            )],
        )));
        assert_eq!(out, "int alloc(char ** out);\n");
    }
}
