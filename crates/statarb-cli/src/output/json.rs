use colored::Colorize;
use serde_json::Value;

/// Pretty-print the result envelope to stdout.
///
/// Envelope warnings (fallback pair, missing mean reversion, no entries) are
/// repeated on stderr so they are seen when stdout is piped into a file.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
    for w in envelope_warnings(value) {
        eprintln!("{}: {}", "warning".yellow().bold(), w);
    }
}

fn envelope_warnings(value: &Value) -> Vec<&str> {
    value
        .get("warnings")
        .and_then(Value::as_array)
        .map(|ws| ws.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_warnings() {
        let v = json!({
            "result": {"pair": {"symbol1": "AAA"}},
            "warnings": ["AAA-BBB accepted by the 'lenient' fallback level (p = 0.1200)"]
        });
        assert_eq!(
            envelope_warnings(&v),
            vec!["AAA-BBB accepted by the 'lenient' fallback level (p = 0.1200)"]
        );
    }

    #[test]
    fn test_no_warnings_outside_envelope() {
        assert!(envelope_warnings(&json!([1.0, 2.0])).is_empty());
        assert!(envelope_warnings(&json!({"warnings": []})).is_empty());
    }
}
