use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Arrays longer than this print as a summary instead of inline.
const INLINE_ARRAY_LIMIT: usize = 8;
/// Row tables show at most this many rows from each end.
const ROW_PREVIEW: usize = 10;

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result, map);
            } else {
                print_object("", map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(map) => print_object("", map),
        Value::Array(arr) => print_array_table(arr),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalars as a Field/Value table, then nested sections and row arrays.
fn print_object(title: &str, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections: Vec<(&String, &Value)> = Vec::new();
    let mut scalars = 0;

    for (key, val) in map {
        match val {
            Value::Object(_) if !is_small_object(val) => sections.push((key, val)),
            Value::Array(arr) if arr.iter().any(Value::is_object) => sections.push((key, val)),
            _ => {
                builder.push_record([key.as_str(), &format_value(val)]);
                scalars += 1;
            }
        }
    }

    if !title.is_empty() {
        println!("\n[{}]", title);
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }

    for (key, val) in sections {
        let name = if title.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", title, key)
        };
        match val {
            Value::Object(inner) => print_object(&name, inner),
            Value::Array(arr) => {
                println!("\n[{}] {} rows", name, arr.len());
                print_array_table(arr);
            }
            _ => {}
        }
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        // wide arrays such as a candidate's spread stay out of the columns
        let headers: Vec<String> = first
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Array(a) if a.len() > INLINE_ARRAY_LIMIT))
            .map(|(k, _)| k.clone())
            .collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        let elided = arr.len() > 2 * ROW_PREVIEW;
        for (i, item) in arr.iter().enumerate() {
            if elided && i >= ROW_PREVIEW && i < arr.len() - ROW_PREVIEW {
                if i == ROW_PREVIEW {
                    builder.push_record(headers.iter().map(|_| "...".to_string()));
                }
                continue;
            }
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Objects like critical values print inline.
fn is_small_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.len() <= 4 && map.values().all(|v| !v.is_object() && !v.is_array()),
        _ => false,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) if arr.len() > INLINE_ARRAY_LIMIT => summarize(arr),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn summarize(arr: &[Value]) -> String {
    let nums: Vec<f64> = arr.iter().filter_map(Value::as_f64).collect();
    if nums.is_empty() {
        return format!("[{} values]", arr.len());
    }
    let min = nums.iter().copied().fold(f64::INFINITY, f64::min);
    let max = nums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    format!("[{} values, min {:.4}, max {:.4}]", arr.len(), min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_long_numeric_array_is_summarized() {
        let v = json!([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.5]);
        assert_eq!(format_value(&v), "[9 values, min 1.0000, max 9.5000]");
    }

    #[test]
    fn test_short_array_inline() {
        assert_eq!(format_value(&json!([1, 2])), "1, 2");
    }

    #[test]
    fn test_small_object_detection() {
        assert!(is_small_object(&json!({"one_pct": -3.9, "five_pct": -3.3, "ten_pct": -3.0})));
        assert!(!is_small_object(&json!({"rows": [1]})));
    }
}
