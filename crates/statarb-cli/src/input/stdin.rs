use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read a piped JSON payload (a price table, an equity curve) from stdin.
///
/// None when stdin is a terminal or the pipe is empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_payload(&buffer)
}

fn parse_payload<T: DeserializeOwned>(buffer: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let payload = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse JSON on stdin: {}", e))?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use statarb_core::PriceTable;

    #[test]
    fn test_blank_pipe_is_no_input() {
        let parsed: Option<Vec<f64>> = parse_payload("  \n").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_price_table_payload() {
        let table: Option<PriceTable> = parse_payload(
            r#"{"index": ["2024-01-02", "2024-01-03"],
                "series": [{"symbol": "AAA", "prices": [10.0, 11.0]}]}"#,
        )
        .unwrap();
        let table = table.unwrap();
        assert_eq!(table.symbols(), ["AAA".to_string()]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_invalid_table_is_an_error() {
        // prices must be positive
        let parsed: Result<Option<PriceTable>, _> = parse_payload(
            r#"{"index": ["2024-01-02"], "series": [{"symbol": "AAA", "prices": [-1.0]}]}"#,
        );
        assert!(parsed.is_err());
    }
}
