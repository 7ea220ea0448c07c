use chrono::NaiveDate;
use statarb_core::PriceTable;
use tracing::{debug, info};

use super::{file, stdin};

/// Load the price table from a .csv or .json file, or JSON piped on stdin.
pub fn load_prices(path: Option<&str>) -> Result<PriceTable, Box<dyn std::error::Error>> {
    let table = if let Some(path) = path {
        let (canonical, contents) = file::read_to_string(path)?;
        if file::has_extension(&canonical, &["csv"]) {
            parse_csv(&contents)
                .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
        }
    } else if let Some(table) = stdin::read_stdin()? {
        table
    } else {
        return Err("--prices <file.csv|file.json> or JSON on stdin required".into());
    };

    info!(
        symbols = table.symbols().len(),
        periods = table.len(),
        "Loaded price table"
    );
    Ok(table)
}

/// Parse `date,SYM1,SYM2,...` CSV. Blank or unparsable cells are missing and
/// drop their row.
pub fn parse_csv(contents: &str) -> Result<PriceTable, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err("CSV needs a date column and at least one symbol column".into());
    }
    let symbols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut index = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); symbols.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| format!("row {}: bad date '{}': {}", line + 2, raw_date, e))?;
        index.push(date);
        for (i, column) in columns.iter_mut().enumerate() {
            let cell = record.get(i + 1).unwrap_or_default();
            column.push(cell.parse::<f64>().ok());
        }
    }

    let rows = index.len();
    let table = PriceTable::from_observations(index, symbols.into_iter().zip(columns).collect())?;
    debug!(rows, kept = table.len(), "Dropped rows with missing prices");
    Ok(table)
}
