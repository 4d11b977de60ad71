//! Structural comparison of two headers.
//!
//! Declarations are matched by (kind, name); anonymous declarations are
//! not diffable by identity and are skipped. Output ordering is
//! deterministic regardless of input declaration order: added entries,
//! then removed, then changed, each group sorted by name.

use crate::report::{DiffEntry, DiffReport, Severity};
use headerkit_ir::{
    ConstantDecl, ConstantValue, Declaration, EnumDecl, Field, FunctionDecl, Header, StructDecl,
    TypedefDecl, VariableDecl,
};
use std::collections::BTreeMap;

/// Compare two headers and produce a classified change report.
///
/// Comparing two declarations of different kinds under the same name
/// yields a removed + added pair, never a "changed" entry: the key
/// includes the kind, so a function shadowed by a struct falls out of
/// the key intersection naturally.
pub fn diff_headers(baseline: &Header, target: &Header) -> DiffReport {
    let baseline_map = index_by_key(baseline);
    let target_map = index_by_key(target);

    let mut added = Vec::new();
    for (key, _) in &target_map {
        if !baseline_map.contains_key(key) {
            let (kind, name) = key;
            added.push(DiffEntry::new(
                format!("{kind}_added"),
                Severity::NonBreaking,
                name.clone(),
                format!("{kind} '{name}' added"),
            ));
        }
    }

    let mut removed = Vec::new();
    for (key, _) in &baseline_map {
        if !target_map.contains_key(key) {
            let (kind, name) = key;
            removed.push(DiffEntry::new(
                format!("{kind}_removed"),
                Severity::Breaking,
                name.clone(),
                format!("{kind} '{name}' removed"),
            ));
        }
    }

    let mut changed = Vec::new();
    for (key, b_decl) in &baseline_map {
        if let Some(t_decl) = target_map.get(key) {
            diff_declaration(&key.1, b_decl, t_decl, &mut changed);
        }
    }

    // Group sort key is (name, kind) so permuting input declaration
    // order can never permute the report.
    sort_group(&mut added);
    sort_group(&mut removed);
    sort_group(&mut changed);

    let mut entries = added;
    entries.append(&mut removed);
    entries.append(&mut changed);

    DiffReport::new(baseline.path.clone(), target.path.clone(), entries)
}

/// Name-indexed lookup: (kind label, name) -> declaration, skipping
/// anonymous declarations.
fn index_by_key(header: &Header) -> BTreeMap<(String, String), &Declaration> {
    let mut map = BTreeMap::new();
    for decl in &header.declarations {
        if let Some(name) = decl.name() {
            map.insert((decl.kind_label().to_string(), name.to_string()), decl);
        }
    }
    map
}

fn sort_group(entries: &mut [DiffEntry]) {
    entries.sort_by(|a, b| (&a.name, &a.kind).cmp(&(&b.name, &b.kind)));
}

fn diff_declaration(
    name: &str,
    baseline: &Declaration,
    target: &Declaration,
    entries: &mut Vec<DiffEntry>,
) {
    match (baseline, target) {
        (Declaration::Function(b), Declaration::Function(t)) => {
            diff_function(name, b, t, entries)
        }
        (Declaration::Struct(b), Declaration::Struct(t)) => diff_struct(name, b, t, entries),
        (Declaration::Enum(b), Declaration::Enum(t)) => diff_enum(name, b, t, entries),
        (Declaration::Typedef(b), Declaration::Typedef(t)) => diff_typedef(name, b, t, entries),
        (Declaration::Variable(b), Declaration::Variable(t)) => {
            diff_variable(name, b, t, entries)
        }
        (Declaration::Constant(b), Declaration::Constant(t)) => {
            diff_constant(name, b, t, entries)
        }
        // Keys include the kind, so mismatched pairs cannot reach here.
        _ => {}
    }
}

fn diff_function(name: &str, b: &FunctionDecl, t: &FunctionDecl, entries: &mut Vec<DiffEntry>) {
    // All signature differences for one function coalesce into a single
    // breaking entry; renames stay separate as informational entries.
    let mut changes = Vec::new();

    if b.return_type != t.return_type {
        changes.push(format!(
            "return type changed from '{}' to '{}'",
            b.return_type, t.return_type
        ));
    }

    if b.parameters.len() != t.parameters.len() {
        changes.push(format!(
            "parameter count changed from {} to {}",
            b.parameters.len(),
            t.parameters.len()
        ));
    } else {
        for (i, (bp, tp)) in b.parameters.iter().zip(&t.parameters).enumerate() {
            if bp.ty != tp.ty {
                changes.push(format!(
                    "parameter {i} type changed from '{}' to '{}'",
                    bp.ty, tp.ty
                ));
            }
            if bp.name != tp.name {
                entries.push(DiffEntry::new(
                    "function_parameter_renamed",
                    Severity::NonBreaking,
                    name,
                    format!(
                        "parameter {i} renamed from '{}' to '{}'",
                        bp.name.as_deref().unwrap_or("(unnamed)"),
                        tp.name.as_deref().unwrap_or("(unnamed)")
                    ),
                ));
            }
        }
    }

    if b.is_variadic != t.is_variadic {
        changes.push(format!(
            "variadic changed from {} to {}",
            b.is_variadic, t.is_variadic
        ));
    }

    if !changes.is_empty() {
        entries.push(DiffEntry::new(
            "function_signature_changed",
            Severity::Breaking,
            name,
            changes.join("; "),
        ));
    }
}

fn diff_struct(name: &str, b: &StructDecl, t: &StructDecl, entries: &mut Vec<DiffEntry>) {
    if b.is_union != t.is_union {
        entries.push(DiffEntry::new(
            "struct_kind_changed",
            Severity::Breaking,
            name,
            format!(
                "kind changed from {} to {}",
                if b.is_union { "union" } else { "struct" },
                if t.is_union { "union" } else { "struct" }
            ),
        ));
    }

    let b_index = field_index(&b.fields);
    let t_index = field_index(&t.fields);

    // In-place renames: same position, same type, both names unique to
    // their side. Reported informationally, not as remove + add.
    let mut renamed_from = Vec::new();
    let mut renamed_to = Vec::new();
    for (pos, bf) in b.fields.iter().enumerate() {
        if t_index.contains_key(bf.name.as_str()) {
            continue;
        }
        if let Some(tf) = t.fields.get(pos) {
            if !b_index.contains_key(tf.name.as_str())
                && bf.ty == tf.ty
                && bf.bit_width == tf.bit_width
            {
                entries.push(DiffEntry::new(
                    "struct_field_renamed",
                    Severity::NonBreaking,
                    name,
                    format!(
                        "field '{}' renamed to '{}' at position {pos}",
                        bf.name, tf.name
                    ),
                ));
                renamed_from.push(bf.name.as_str());
                renamed_to.push(tf.name.as_str());
            }
        }
    }

    for bf in &b.fields {
        if !t_index.contains_key(bf.name.as_str()) && !renamed_from.contains(&bf.name.as_str()) {
            entries.push(DiffEntry::new(
                "struct_field_removed",
                Severity::Breaking,
                name,
                format!("field '{}' removed", bf.name),
            ));
        }
    }

    for (pos, tf) in t.fields.iter().enumerate() {
        if b_index.contains_key(tf.name.as_str()) || renamed_to.contains(&tf.name.as_str()) {
            continue;
        }
        // Appending after every surviving field keeps the binary layout
        // of existing fields; inserting before one shifts offsets.
        let appended = t.fields[pos + 1..]
            .iter()
            .all(|later| !b_index.contains_key(later.name.as_str()));
        entries.push(DiffEntry::new(
            "struct_field_added",
            if appended {
                Severity::NonBreaking
            } else {
                Severity::Breaking
            },
            name,
            format!("field '{}' added", tf.name),
        ));
    }

    for bf in &b.fields {
        if let Some(&(_, tf)) = t_index.get(bf.name.as_str()) {
            if bf.ty != tf.ty {
                entries.push(DiffEntry::new(
                    "struct_field_type_changed",
                    Severity::Breaking,
                    name,
                    format!(
                        "field '{}' type changed from '{}' to '{}'",
                        bf.name, bf.ty, tf.ty
                    ),
                ));
            }
            if bf.bit_width != tf.bit_width {
                entries.push(DiffEntry::new(
                    "struct_field_bitwidth_changed",
                    Severity::Breaking,
                    name,
                    format!(
                        "field '{}' bit width changed from {} to {}",
                        bf.name,
                        width_str(bf.bit_width),
                        width_str(tf.bit_width)
                    ),
                ));
            }
        }
    }

    // Relative order of surviving fields. A pure positional shift from
    // an insertion does not register here; an actual reorder does, once
    // per struct.
    let b_order: Vec<&str> = b
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .filter(|n| t_index.contains_key(n))
        .collect();
    let t_order: Vec<&str> = t
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .filter(|n| b_index.contains_key(n))
        .collect();
    if b_order != t_order {
        entries.push(DiffEntry::new(
            "struct_field_reordered",
            Severity::Breaking,
            name,
            format!(
                "field order changed from [{}] to [{}]",
                b_order.join(", "),
                t_order.join(", ")
            ),
        ));
    }
}

fn field_index(fields: &[Field]) -> BTreeMap<&str, (usize, &Field)> {
    let mut map = BTreeMap::new();
    for (i, f) in fields.iter().enumerate() {
        map.entry(f.name.as_str()).or_insert((i, f));
    }
    map
}

fn width_str(width: Option<u32>) -> String {
    match width {
        Some(w) => w.to_string(),
        None => "(none)".to_string(),
    }
}

fn diff_enum(name: &str, b: &EnumDecl, t: &EnumDecl, entries: &mut Vec<DiffEntry>) {
    // Implicit values are resolved before comparing, so an enumerator
    // inserted before existing ones surfaces as value changes on every
    // shifted enumerator.
    let b_resolved: BTreeMap<&str, i64> = b.resolved_values().into_iter().collect();
    let t_resolved: BTreeMap<&str, i64> = t.resolved_values().into_iter().collect();

    for (vname, bv) in &b_resolved {
        match t_resolved.get(vname) {
            None => entries.push(DiffEntry::new(
                "enum_value_removed",
                Severity::Breaking,
                name,
                format!("enumerator '{vname}' removed"),
            )),
            Some(tv) if tv != bv => entries.push(DiffEntry::new(
                "enum_value_changed",
                Severity::Breaking,
                name,
                format!("enumerator '{vname}' changed from {bv} to {tv}"),
            )),
            Some(_) => {}
        }
    }

    for (vname, tv) in &t_resolved {
        if !b_resolved.contains_key(vname) {
            entries.push(DiffEntry::new(
                "enum_value_added",
                Severity::NonBreaking,
                name,
                format!("enumerator '{vname}' added with value {tv}"),
            ));
        }
    }
}

fn diff_typedef(name: &str, b: &TypedefDecl, t: &TypedefDecl, entries: &mut Vec<DiffEntry>) {
    if b.underlying_type != t.underlying_type {
        entries.push(DiffEntry::new(
            "typedef_changed",
            Severity::Breaking,
            name,
            format!(
                "underlying type changed from '{}' to '{}'",
                b.underlying_type, t.underlying_type
            ),
        ));
    }
}

fn diff_variable(name: &str, b: &VariableDecl, t: &VariableDecl, entries: &mut Vec<DiffEntry>) {
    if b.ty != t.ty {
        entries.push(DiffEntry::new(
            "variable_type_changed",
            Severity::Breaking,
            name,
            format!("type changed from '{}' to '{}'", b.ty, t.ty),
        ));
    }
}

fn diff_constant(name: &str, b: &ConstantDecl, t: &ConstantDecl, entries: &mut Vec<DiffEntry>) {
    if b.value == t.value {
        return;
    }
    match (&b.value, &t.value) {
        // Both resolved to exact integers: callers can have relied on
        // the value structurally.
        (Some(ConstantValue::Int(bv)), Some(ConstantValue::Int(tv))) => {
            entries.push(DiffEntry::new(
                "constant_value_changed",
                Severity::Breaking,
                name,
                format!("value changed from {bv} to {tv}"),
            ));
        }
        // Neither side is an integer: an opaque value nobody could have
        // structurally relied on.
        (b_val, t_val)
            if !matches!(b_val, Some(ConstantValue::Int(_)))
                && !matches!(t_val, Some(ConstantValue::Int(_))) =>
        {
            entries.push(DiffEntry::new(
                "constant_text_changed",
                Severity::NonBreaking,
                name,
                format!(
                    "text changed from {} to {}",
                    raw_value(b_val),
                    raw_value(t_val)
                ),
            ));
        }
        (b_val, t_val) => {
            entries.push(DiffEntry::new(
                "constant_value_changed",
                Severity::Breaking,
                name,
                format!(
                    "value changed from {} to {}",
                    raw_value(b_val),
                    raw_value(t_val)
                ),
            ));
        }
    }
}

fn raw_value(value: &Option<ConstantValue>) -> String {
    match value {
        Some(v) => format!("'{v}'"),
        None => "(unresolved)".to_string(),
    }
}
