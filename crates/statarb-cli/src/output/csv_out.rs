use serde_json::Value;
use std::io;

use super::primary_rows;

/// Write output as CSV to stdout.
///
/// Per-period results (backtest rows, signal records) are written one line
/// per period; anything else as field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        Value::Object(map) => {
            if let Some(rows) = primary_rows(result) {
                write_array_csv(&mut wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        // skip nested arrays (a candidate's spread) to keep one line per item
        let headers: Vec<&str> = first
            .iter()
            .filter(|(_, v)| !v.is_array())
            .map(|(k, _)| k.as_str())
            .collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
