//! Rate-series acquisition and normalization.
//!
//! The projection engine only ever sees a `RateSeries`; everything here is
//! caller-side policy for building one, whether from user text, an
//! uploaded tabular file, or the bundled historical market table.

use std::io::Read;

/// S&P 500 annual price returns, 1995 through 2024, oldest first.
/// Stands in for a live market-data fetch; the engine itself never
/// touches the network.
const SP500_ANNUAL_RETURNS: [f64; 30] = [
    0.341, 0.203, 0.310, 0.267, 0.195, -0.101, -0.130, -0.234, 0.264, 0.090, 0.030, 0.136, 0.035,
    -0.385, 0.235, 0.128, 0.000, 0.134, 0.296, 0.114, -0.007, 0.095, 0.194, -0.062, 0.289, 0.162,
    0.269, -0.195, 0.242, 0.232,
];

/// Supplies historical annual return fractions, or signals absence with
/// `None`. Fallback behavior belongs to the caller.
pub trait MarketDataProvider {
    fn annual_returns(&self, years: u32) -> Option<Vec<f64>>;
}

/// Provider backed by the bundled S&P 500 table. Returns the trailing
/// `years` entries, or everything it has when asked for more.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoricalReturns;

impl MarketDataProvider for HistoricalReturns {
    fn annual_returns(&self, years: u32) -> Option<Vec<f64>> {
        if years == 0 {
            return None;
        }
        let available = SP500_ANNUAL_RETURNS.len();
        let start = available.saturating_sub(years as usize);
        Some(SP500_ANNUAL_RETURNS[start..].to_vec())
    }
}

/// Parse a comma-separated list of decimal rates, e.g. "0.05, 0.06, 0.07".
/// Blank entries between commas are skipped; a list with no values or any
/// non-numeric entry is rejected.
pub fn parse_rate_list(input: &str) -> Result<Vec<f64>, String> {
    let mut rates = Vec::new();
    for raw in input.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        let rate = token
            .parse::<f64>()
            .map_err(|_| format!("Invalid rate value '{token}': expected a decimal like 0.05"))?;
        rates.push(rate);
    }
    if rates.is_empty() {
        return Err("Rate list must contain at least one value".to_string());
    }
    Ok(rates)
}

/// Parse rates from an uploaded tabular file. The file must carry a
/// header row with a `rate` column (case-insensitive); entries in that
/// column which fail to parse as numbers are skipped.
pub fn parse_rates_csv<R: Read>(reader: R) -> Result<Vec<f64>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| format!("Failed to read CSV header: {e}"))?;
    let rate_column = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("rate"))
        .ok_or_else(|| "CSV must contain a 'rate' column".to_string())?;

    let mut rates = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| format!("Failed to read CSV record: {e}"))?;
        if let Some(rate) = record
            .get(rate_column)
            .and_then(|field| field.trim().parse::<f64>().ok())
        {
            rates.push(rate);
        }
    }

    if rates.is_empty() {
        return Err("CSV 'rate' column contained no numeric values".to_string());
    }
    Ok(rates)
}

/// Resize a rate list to exactly `years` entries: pad by repeating the
/// last element, or truncate from the end. An empty input stays empty;
/// padding policy is the caller's, never the engine's.
pub fn normalize_rates(rates: &[f64], years: u32) -> Vec<f64> {
    let years = years as usize;
    if rates.is_empty() || years == 0 {
        return Vec::new();
    }
    let mut normalized = rates.to_vec();
    if normalized.len() < years {
        let last = *normalized.last().expect("non-empty checked above");
        normalized.resize(years, last);
    } else {
        normalized.truncate(years);
    }
    normalized
}
