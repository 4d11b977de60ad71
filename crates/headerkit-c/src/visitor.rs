//! Syntax tree visitor building IR declarations from C header source.
//!
//! Declarator trees are unwound top-down: each pointer, array, or
//! function declarator layer wraps the type accumulated so far, which
//! yields `int *a[3]` as array-of-pointer and `void (*cb)(int)` as
//! pointer-to-function without special cases.

use headerkit_ir::{
    ConstantDecl, ConstantValue, Declaration, EnumDecl, EnumValue, Field, FunctionDecl, Parameter,
    SourceLocation, StructDecl, TypeExpr, TypedefDecl, VariableDecl,
};
use log::{debug, warn};
use std::collections::HashMap;
use tree_sitter::Node;

/// An `#include` directive found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    pub path: String,
    /// `#include <...>` rather than `#include "..."`.
    pub is_system: bool,
    /// 1-indexed line number.
    pub line: u32,
}

pub struct HeaderVisitor<'a> {
    source: &'a [u8],
    filename: &'a str,
    pub declarations: Vec<Declaration>,
    pub includes: Vec<IncludeDirective>,
}

impl<'a> HeaderVisitor<'a> {
    pub fn new(source: &'a [u8], filename: &'a str) -> Self {
        Self {
            source,
            filename,
            declarations: Vec::new(),
            includes: Vec::new(),
        }
    }

    fn node_text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    fn location(&self, node: Node) -> SourceLocation {
        SourceLocation::new(self.filename, node.start_position().row as u32 + 1)
    }

    pub fn visit_node(&mut self, node: Node) {
        // tree-sitter marks unparseable sections as ERROR; descend to
        // extract whatever recovered inside
        if node.is_error() {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                self.visit_node(child);
            }
            return;
        }

        match node.kind() {
            "function_definition" => self.visit_function_definition(node),
            "declaration" => self.visit_declaration(node),
            "type_definition" => self.visit_type_definition(node),
            "struct_specifier" | "union_specifier" | "enum_specifier" => {
                self.visit_bare_specifier(node)
            }
            "preproc_def" => self.visit_macro(node),
            // Function-like macros carry no constant value
            "preproc_function_def" => {}
            "preproc_include" => self.visit_include(node),
            _ => {
                // Containers: translation_unit, conditional preprocessor
                // blocks, linkage specifications, header guards
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.visit_node(child);
                }
            }
        }
    }

    /// A prototype, variable, forward declaration, or in-line aggregate
    /// definition with declarators.
    fn visit_declaration(&mut self, node: Node) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let location = self.location(node);

        let mut declarators = Vec::new();
        {
            let mut cursor = node.walk();
            declarators.extend(node.children_by_field_name("declarator", &mut cursor));
        }

        let is_aggregate = matches!(
            type_node.kind(),
            "struct_specifier" | "union_specifier" | "enum_specifier"
        );
        if is_aggregate {
            let has_body = type_node.child_by_field_name("body").is_some();
            let named = type_node.child_by_field_name("name").is_some();
            if has_body || (named && declarators.is_empty()) {
                let decl = self.aggregate_declaration(type_node, None, false);
                self.declarations.push(decl);
            }
            if !named {
                // An anonymous aggregate has no referenceable type
                // spelling for its declarators
                return;
            }
        }

        let base = self.base_type(type_node, node);
        for declarator in declarators {
            let (name, ty) = self.unwind_declarator(declarator, base.clone());
            let Some(name) = name else { continue };
            match ty {
                TypeExpr::FunctionPointer {
                    return_type,
                    parameters,
                    is_variadic,
                } => {
                    let mut func =
                        FunctionDecl::new(name, *return_type, parameters).at(location.clone());
                    if is_variadic {
                        func = func.variadic();
                    }
                    self.declarations.push(Declaration::Function(func));
                }
                other => {
                    self.declarations.push(Declaration::Variable(
                        VariableDecl::new(name, other).at(location.clone()),
                    ));
                }
            }
        }
    }

    fn visit_function_definition(&mut self, node: Node) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let Some(declarator) = node.child_by_field_name("declarator") else {
            return;
        };
        let base = self.base_type(type_node, node);
        let (name, ty) = self.unwind_declarator(declarator, base);
        let (
            Some(name),
            TypeExpr::FunctionPointer {
                return_type,
                parameters,
                is_variadic,
            },
        ) = (name, ty)
        else {
            return;
        };
        let mut func = FunctionDecl::new(name, *return_type, parameters).at(self.location(node));
        if is_variadic {
            func = func.variadic();
        }
        self.declarations.push(Declaration::Function(func));
        // The body is intentionally not visited
    }

    fn visit_type_definition(&mut self, node: Node) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let location = self.location(node);

        let mut declarators = Vec::new();
        {
            let mut cursor = node.walk();
            declarators.extend(node.children_by_field_name("declarator", &mut cursor));
        }

        if matches!(
            type_node.kind(),
            "struct_specifier" | "union_specifier" | "enum_specifier"
        ) {
            self.visit_aggregate_typedef(type_node, &declarators, &location);
            return;
        }

        let base = self.base_type(type_node, node);
        for declarator in declarators {
            let (name, ty) = self.unwind_declarator(declarator, base.clone());
            if let Some(name) = name {
                self.declarations.push(Declaration::Typedef(
                    TypedefDecl::new(name, ty).at(location.clone()),
                ));
            }
        }
    }

    /// `typedef struct {...} Name`, `typedef struct tag tag`, and the
    /// pointer-alias forms.
    fn visit_aggregate_typedef(
        &mut self,
        type_node: Node,
        declarators: &[Node],
        location: &SourceLocation,
    ) {
        let has_body = type_node.child_by_field_name("body").is_some();
        let tag = type_node
            .child_by_field_name("name")
            .map(|n| self.node_text(n));
        let keyword = specifier_keyword(type_node);
        let tag_base = tag
            .as_ref()
            .map(|t| TypeExpr::base(format!("{keyword} {t}")));

        let mut aggregate_emitted = false;
        for declarator in declarators {
            match declarator.kind() {
                "type_identifier" | "identifier" => {
                    let alias = self.node_text(*declarator);
                    if has_body && !aggregate_emitted {
                        let decl = self.aggregate_declaration(type_node, Some(alias), true);
                        self.declarations.push(decl);
                        aggregate_emitted = true;
                    } else if !has_body && tag.as_deref() == Some(alias.as_str()) {
                        // the opaque handle idiom: typedef struct ctx ctx;
                        let decl = self.aggregate_declaration(type_node, Some(alias), true);
                        self.declarations.push(decl);
                    } else if let Some(base) = &tag_base {
                        self.declarations.push(Declaration::Typedef(
                            TypedefDecl::new(alias, base.clone()).at(location.clone()),
                        ));
                    } else {
                        debug!("typedef alias '{alias}' of an unnamed {keyword} dropped");
                    }
                }
                _ => {
                    // pointer/array alias needs a named tag to reference
                    if let Some(base) = &tag_base {
                        let (name, ty) = self.unwind_declarator(*declarator, base.clone());
                        if let Some(name) = name {
                            self.declarations.push(Declaration::Typedef(
                                TypedefDecl::new(name, ty).at(location.clone()),
                            ));
                        }
                    } else {
                        debug!("derived typedef of an unnamed {keyword} dropped");
                    }
                }
            }
        }
    }

    /// A struct/union/enum specifier standing alone at the top level,
    /// including forward declarations.
    fn visit_bare_specifier(&mut self, node: Node) {
        let has_body = node.child_by_field_name("body").is_some();
        let named = node.child_by_field_name("name").is_some();
        if node.kind() == "enum_specifier" && !has_body {
            return;
        }
        if !has_body && !named {
            return;
        }
        let decl = self.aggregate_declaration(node, None, false);
        self.declarations.push(decl);
    }

    fn aggregate_declaration(
        &self,
        node: Node,
        name_override: Option<String>,
        is_typedef: bool,
    ) -> Declaration {
        let location = self.location(node);
        let name = name_override
            .or_else(|| node.child_by_field_name("name").map(|n| self.node_text(n)));
        if node.kind() == "enum_specifier" {
            let values = self.enum_values(node);
            let mut decl = match name {
                Some(n) => EnumDecl::new(n, values),
                None => EnumDecl::anonymous(values),
            };
            if is_typedef {
                decl = decl.typedef();
            }
            return Declaration::Enum(decl.at(location));
        }
        let fields = self.struct_fields(node);
        let mut decl = match name {
            Some(n) => StructDecl::new(n, fields),
            None => StructDecl::anonymous(fields),
        };
        if node.kind() == "union_specifier" {
            decl = decl.union();
        }
        if is_typedef {
            decl = decl.typedef();
        }
        Declaration::Struct(decl.at(location))
    }

    fn struct_fields(&self, spec: Node) -> Vec<Field> {
        let mut fields = Vec::new();
        let Some(body) = spec.child_by_field_name("body") else {
            return fields;
        };
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() != "field_declaration" {
                continue;
            }
            let Some(type_node) = child.child_by_field_name("type") else {
                continue;
            };
            if matches!(
                type_node.kind(),
                "struct_specifier" | "union_specifier" | "enum_specifier"
            ) && type_node.child_by_field_name("name").is_none()
            {
                debug!(
                    "{}:{}: anonymous nested aggregate member dropped",
                    self.filename,
                    child.start_position().row + 1
                );
                continue;
            }
            let base = self.base_type(type_node, child);
            let bit_width = self.bitfield_width(child);
            let mut decl_cursor = child.walk();
            for declarator in child.children_by_field_name("declarator", &mut decl_cursor) {
                let (name, ty) = self.unwind_declarator(declarator, base.clone());
                if let Some(name) = name {
                    let mut field = Field::new(name, ty);
                    if let Some(width) = bit_width {
                        field = field.with_bit_width(width);
                    }
                    fields.push(field);
                }
            }
        }
        fields
    }

    fn bitfield_width(&self, field_decl: Node) -> Option<u32> {
        let mut cursor = field_decl.walk();
        let clause = field_decl
            .children(&mut cursor)
            .find(|c| c.kind() == "bitfield_clause")?;
        let mut inner = clause.walk();
        let width = clause
            .named_children(&mut inner)
            .find_map(|n| self.node_text(n).trim().parse::<u32>().ok());
        width
    }

    fn enum_values(&self, spec: Node) -> Vec<EnumValue> {
        let mut values = Vec::new();
        let Some(body) = spec.child_by_field_name("body") else {
            return values;
        };
        // Earlier enumerators are visible to later value expressions, so
        // `B = A | 1` resolves against the running environment.
        let mut env: HashMap<String, i64> = HashMap::new();
        let mut previous: Option<i64> = None;
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() != "enumerator" {
                continue;
            }
            let Some(name) = child.child_by_field_name("name") else {
                continue;
            };
            let name = self.node_text(name);
            let value = child.child_by_field_name("value").and_then(|v| {
                let raw = self.node_text(v);
                let value = eval_const_expr(&raw, &env);
                if value.is_none() {
                    warn!(
                        "{}:{}: enumerator '{name}' value '{raw}' not evaluated",
                        self.filename,
                        child.start_position().row + 1
                    );
                }
                value
            });
            let resolved = value.unwrap_or_else(|| previous.map_or(0, |p| p.wrapping_add(1)));
            env.insert(name.clone(), resolved);
            previous = Some(resolved);
            values.push(EnumValue::new(name, value));
        }
        values
    }

    fn visit_macro(&mut self, node: Node) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let value = node
            .child_by_field_name("value")
            .map(|v| self.node_text(v).trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(|raw| match eval_const_expr(&raw, &HashMap::new()) {
                Some(i) => ConstantValue::Int(i),
                None => ConstantValue::Str(raw),
            });
        self.declarations.push(Declaration::Constant(
            ConstantDecl::new(self.node_text(name), value)
                .macro_constant()
                .at(self.location(node)),
        ));
    }

    fn visit_include(&mut self, node: Node) {
        let Some(path_node) = node.child_by_field_name("path") else {
            return;
        };
        let raw = self.node_text(path_node);
        let (path, is_system) = match path_node.kind() {
            "system_lib_string" => (
                raw.trim_start_matches('<').trim_end_matches('>').to_string(),
                true,
            ),
            _ => (raw.trim_matches('"').to_string(), false),
        };
        if !path.is_empty() {
            self.includes.push(IncludeDirective {
                path,
                is_system,
                line: node.start_position().row as u32 + 1,
            });
        }
    }

    /// Base type from the specifier node plus `const`/`volatile`/
    /// `restrict` qualifiers attached to the declaration itself.
    fn base_type(&self, type_node: Node, declaration: Node) -> TypeExpr {
        TypeExpr::base_qualified(
            self.base_type_name(type_node),
            self.declaration_qualifiers(declaration),
        )
    }

    fn base_type_name(&self, node: Node) -> String {
        match node.kind() {
            "struct_specifier" | "union_specifier" | "enum_specifier" => {
                let keyword = specifier_keyword(node);
                match node.child_by_field_name("name") {
                    Some(name) => format!("{keyword} {}", self.node_text(name)),
                    None => keyword.to_string(),
                }
            }
            _ => {
                // sized_type_specifier text may span several tokens
                let text = self.node_text(node);
                text.split_whitespace().collect::<Vec<_>>().join(" ")
            }
        }
    }

    fn declaration_qualifiers(&self, node: Node) -> Vec<String> {
        let mut qualifiers = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                let text = self.node_text(child);
                if matches!(text.as_str(), "const" | "volatile" | "restrict") {
                    qualifiers.push(text);
                }
            }
        }
        qualifiers
    }

    /// Unwind a declarator tree, wrapping `base` one layer per node, and
    /// return the declared name if one exists.
    fn unwind_declarator(&self, node: Node, base: TypeExpr) -> (Option<String>, TypeExpr) {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" => {
                (Some(self.node_text(node)), base)
            }
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let mut qualifiers = Vec::new();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "type_qualifier" {
                        let text = self.node_text(child);
                        if matches!(text.as_str(), "const" | "volatile" | "restrict") {
                            qualifiers.push(text);
                        }
                    }
                }
                let wrapped = TypeExpr::pointer_qualified(base, qualifiers);
                match node.child_by_field_name("declarator") {
                    Some(inner) => self.unwind_declarator(inner, wrapped),
                    None => (None, wrapped),
                }
            }
            "array_declarator" | "abstract_array_declarator" => {
                let size = node
                    .child_by_field_name("size")
                    .and_then(|n| self.node_text(n).trim().parse::<u64>().ok());
                let wrapped = TypeExpr::array(base, size);
                match node.child_by_field_name("declarator") {
                    Some(inner) => self.unwind_declarator(inner, wrapped),
                    None => (None, wrapped),
                }
            }
            "function_declarator" | "abstract_function_declarator" => {
                let (parameters, is_variadic) = match node.child_by_field_name("parameters") {
                    Some(list) => self.parameter_list(list),
                    None => (Vec::new(), false),
                };
                let wrapped = TypeExpr::function_pointer(base, parameters, is_variadic);
                match node.child_by_field_name("declarator") {
                    Some(inner) => self.unwind_declarator(inner, wrapped),
                    None => (None, wrapped),
                }
            }
            "parenthesized_declarator" => {
                let mut cursor = node.walk();
                let inner = node
                    .named_children(&mut cursor)
                    .find(|c| c.kind() != "comment");
                match inner {
                    Some(inner) => self.unwind_declarator(inner, base),
                    None => (None, base),
                }
            }
            "init_declarator" => match node.child_by_field_name("declarator") {
                Some(inner) => self.unwind_declarator(inner, base),
                None => (None, base),
            },
            _ => (None, base),
        }
    }

    fn parameter_list(&self, node: Node) -> (Vec<Parameter>, bool) {
        let mut parameters = Vec::new();
        let mut is_variadic = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" => {
                    let Some(type_node) = child.child_by_field_name("type") else {
                        continue;
                    };
                    let base = self.base_type(type_node, child);
                    let param = match child.child_by_field_name("declarator") {
                        Some(declarator) => {
                            let (name, ty) = self.unwind_declarator(declarator, base);
                            match name {
                                Some(n) => Parameter::new(n, ty),
                                None => Parameter::unnamed(ty),
                            }
                        }
                        None => Parameter::unnamed(base),
                    };
                    parameters.push(param);
                }
                "variadic_parameter" => is_variadic = true,
                _ => {}
            }
        }
        // `f(void)` takes no arguments
        if parameters.len() == 1
            && parameters[0].name.is_none()
            && parameters[0].ty == TypeExpr::base("void")
        {
            parameters.clear();
        }
        (parameters, is_variadic)
    }
}

fn specifier_keyword(node: Node) -> &'static str {
    match node.kind() {
        "union_specifier" => "union",
        "enum_specifier" => "enum",
        _ => "struct",
    }
}

/// Parse a C integer literal: decimal, hex, octal, binary, an optional
/// leading minus, integer suffixes, and one level of parentheses.
pub(crate) fn parse_int_literal(raw: &str) -> Option<i64> {
    let mut text = raw.trim();
    while text.len() >= 2 && text.starts_with('(') && text.ends_with(')') {
        text = text[1..text.len() - 1].trim();
    }
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let text = text.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    if text.is_empty() {
        return None;
    }
    let value = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if text.len() > 1 && text.starts_with('0') && text.bytes().all(|b| b.is_ascii_digit()) {
        i64::from_str_radix(&text[1..], 8).ok()?
    } else {
        text.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// Evaluate a C integer constant expression: literals, parentheses,
/// unary `-`/`+`/`~`, arithmetic, shifts, and bitwise operators, with
/// identifiers looked up in `env`. Returns `None` for anything outside
/// that subset (casts, `sizeof`, unknown names).
pub(crate) fn eval_const_expr(raw: &str, env: &HashMap<String, i64>) -> Option<i64> {
    let tokens = tokenize(raw)?;
    let mut parser = ExprParser {
        tokens,
        pos: 0,
        env,
    };
    let value = parser.bit_or()?;
    if parser.pos == parser.tokens.len() {
        Some(value)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(i64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

fn tokenize(raw: &str) -> Option<Vec<Tok>> {
    let bytes = raw.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                i += 1;
            }
            tokens.push(Tok::Num(parse_int_literal(&raw[start..i])?));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Tok::Ident(raw[start..i].to_string()));
        } else {
            match c {
                '(' => tokens.push(Tok::LParen),
                ')' => tokens.push(Tok::RParen),
                '<' | '>' => {
                    if bytes.get(i + 1) != Some(&(c as u8)) {
                        return None;
                    }
                    tokens.push(Tok::Op(if c == '<' { "<<" } else { ">>" }));
                    i += 1;
                }
                '|' => tokens.push(Tok::Op("|")),
                '^' => tokens.push(Tok::Op("^")),
                '&' => tokens.push(Tok::Op("&")),
                '+' => tokens.push(Tok::Op("+")),
                '-' => tokens.push(Tok::Op("-")),
                '*' => tokens.push(Tok::Op("*")),
                '/' => tokens.push(Tok::Op("/")),
                '%' => tokens.push(Tok::Op("%")),
                '~' => tokens.push(Tok::Op("~")),
                _ => return None,
            }
            i += 1;
        }
    }
    Some(tokens)
}

/// Recursive descent over the C precedence ladder, lowest first.
struct ExprParser<'e> {
    tokens: Vec<Tok>,
    pos: usize,
    env: &'e HashMap<String, i64>,
}

impl ExprParser<'_> {
    fn eat_op(&mut self, op: &'static str) -> bool {
        if self.tokens.get(self.pos) == Some(&Tok::Op(op)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bit_or(&mut self) -> Option<i64> {
        let mut left = self.bit_xor()?;
        while self.eat_op("|") {
            left |= self.bit_xor()?;
        }
        Some(left)
    }

    fn bit_xor(&mut self) -> Option<i64> {
        let mut left = self.bit_and()?;
        while self.eat_op("^") {
            left ^= self.bit_and()?;
        }
        Some(left)
    }

    fn bit_and(&mut self) -> Option<i64> {
        let mut left = self.shift()?;
        while self.eat_op("&") {
            left &= self.shift()?;
        }
        Some(left)
    }

    fn shift(&mut self) -> Option<i64> {
        let mut left = self.additive()?;
        loop {
            if self.eat_op("<<") {
                let by = u32::try_from(self.additive()?).ok()?;
                left = left.checked_shl(by)?;
            } else if self.eat_op(">>") {
                let by = u32::try_from(self.additive()?).ok()?;
                left = left.checked_shr(by)?;
            } else {
                return Some(left);
            }
        }
    }

    fn additive(&mut self) -> Option<i64> {
        let mut left = self.multiplicative()?;
        loop {
            if self.eat_op("+") {
                left = left.wrapping_add(self.multiplicative()?);
            } else if self.eat_op("-") {
                left = left.wrapping_sub(self.multiplicative()?);
            } else {
                return Some(left);
            }
        }
    }

    fn multiplicative(&mut self) -> Option<i64> {
        let mut left = self.unary()?;
        loop {
            if self.eat_op("*") {
                left = left.wrapping_mul(self.unary()?);
            } else if self.eat_op("/") {
                left = left.checked_div(self.unary()?)?;
            } else if self.eat_op("%") {
                left = left.checked_rem(self.unary()?)?;
            } else {
                return Some(left);
            }
        }
    }

    fn unary(&mut self) -> Option<i64> {
        if self.eat_op("-") {
            return Some(self.unary()?.wrapping_neg());
        }
        if self.eat_op("+") {
            return self.unary();
        }
        if self.eat_op("~") {
            return Some(!self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<i64> {
        match self.tokens.get(self.pos)? {
            Tok::Num(n) => {
                let n = *n;
                self.pos += 1;
                Some(n)
            }
            Tok::Ident(name) => {
                let value = *self.env.get(name)?;
                self.pos += 1;
                Some(value)
            }
            Tok::LParen => {
                self.pos += 1;
                let value = self.bit_or()?;
                if self.tokens.get(self.pos) != Some(&Tok::RParen) {
                    return None;
                }
                self.pos += 1;
                Some(value)
            }
            _ => None,
        }
    }
}
