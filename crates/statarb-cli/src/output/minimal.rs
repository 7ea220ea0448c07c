use serde_json::{Map, Value};

/// Headline fields, most informative first.
const PRIORITY_KEYS: [&str; 5] = [
    "sharpe_ratio",
    "total_return",
    "max_drawdown",
    "cointegration_pvalue",
    "hedge_ratio",
];

/// Print just the key answer value from the output.
///
/// Looks for a headline field in the result, then one level down
/// (pipeline output keeps its ratios under `metrics`), then falls back
/// to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = find_headline(map) {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn find_headline(map: &Map<String, Value>) -> Option<&Value> {
    headline_in(map).or_else(|| map.values().filter_map(Value::as_object).find_map(headline_in))
}

fn headline_in(map: &Map<String, Value>) -> Option<&Value> {
    PRIORITY_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headline_found_one_level_down() {
        let v = json!({"pair": {"symbol1": "A"}, "metrics": {"sharpe_ratio": 1.25}});
        let map = v.as_object().unwrap();
        assert_eq!(find_headline(map), Some(&json!(1.25)));
    }

    #[test]
    fn test_signal_table_headline_is_hedge_ratio() {
        let v = json!({
            "hedge_ratio": 1.8,
            "lookback_window": 60,
            "records": [{"position": 0}],
            "pair": {"symbol1": "AAA", "symbol2": "BBB"}
        });
        assert_eq!(find_headline(v.as_object().unwrap()), Some(&json!(1.8)));
    }

    #[test]
    fn test_null_headline_skipped() {
        let v = json!({"sharpe_ratio": null, "total_return": 0.1});
        assert_eq!(find_headline(v.as_object().unwrap()), Some(&json!(0.1)));
    }
}
