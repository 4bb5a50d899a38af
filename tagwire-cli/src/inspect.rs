use std::fmt::Write;

use tagwire_core::{Complex, Value};

/// Render a decoded value as an indented tree, one node per line.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    node(&mut out, None, value, 0);
    out
}

fn node(out: &mut String, key: Option<&str>, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = match key {
        Some(key) => format!("{indent}{key}: "),
        None => indent,
    };

    let children: Vec<(Option<String>, &Value)> = match value {
        Value::List(items) | Value::Tuple(items) => items.iter().map(|v| (None, v)).collect(),
        Value::Set(set) => set.iter().map(|v| (None, v)).collect(),
        Value::Map(map) => map.iter().map(|(k, v)| (Some(k.clone()), v)).collect(),
        _ => Vec::new(),
    };

    let _ = writeln!(out, "{label}{}", summary(value));
    for (child_key, child) in &children {
        node(out, child_key.as_deref(), child, depth + 1);
    }
}

fn summary(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{f:?}"),
        Value::Str(s) => format!("{s:?}"),
        Value::List(items) => format!("list[{}]", items.len()),
        Value::Map(map) => format!("map[{}]", map.len()),
        Value::Tuple(items) => format!("tuple[{}]", items.len()),
        Value::Set(set) => format!("set[{}]", set.len()),
        Value::Complex(Complex { re, im }) => format!("complex({re:?}, {im:?})"),
        Value::Date(d) => format!("date {d}"),
        Value::Time(t) => format!("time {t}"),
        Value::DateTime(dt) => format!("datetime {dt}"),
        Value::DateTimeTz(dt) => format!("datetime {dt}"),
        Value::Array(a) => format!("ndarray {} shape {:?}", a.dtype().descr(), a.shape()),
        Value::Scalar(s) => format!("scalar {}", s.dtype().descr()),
        other => other.type_description(),
    }
}
