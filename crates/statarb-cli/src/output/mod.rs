pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The per-period array of a result: backtest rows, then signal records.
///
/// Pipeline output nests these under `backtest`/`signals`.
pub fn primary_rows(result: &Value) -> Option<&Vec<Value>> {
    let map = result.as_object()?;
    for key in ["rows", "records"] {
        if let Some(Value::Array(arr)) = map.get(key) {
            return Some(arr);
        }
    }
    for section in ["backtest", "signals"] {
        if let Some(nested) = map.get(section) {
            if let Some(arr) = primary_rows(nested) {
                return Some(arr);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_rows_prefers_backtest_rows() {
        let v = json!({
            "pair": {"symbol1": "A"},
            "signals": {"records": [{"position": 0}]},
            "backtest": {"rows": [{"net_return": 0.0}, {"net_return": 0.1}]}
        });
        assert_eq!(primary_rows(&v).map(|r| r.len()), Some(2));
    }

    #[test]
    fn test_primary_rows_missing() {
        assert!(primary_rows(&json!({"max_drawdown": -0.1})).is_none());
        assert!(primary_rows(&json!([1, 2])).is_none());
    }
}
