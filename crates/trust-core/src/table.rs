//! Tabular input from the host's data-access layer
//!
//! The host hands over a rectangular table of rows by columns. One column
//! holds the monitored metric; it is located by fuzzy name matching and its
//! cells are parsed into the evaluation population.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// A single cell as delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Parse into a finite number
    ///
    /// Formatted text has `%`, `$`, `,` and whitespace stripped first.
    /// Anything unparseable, empty, or non-finite yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        let parsed = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| !matches!(c, '%' | '$' | ',') && !c.is_whitespace())
                    .collect();
                cleaned.parse::<f64>().ok()?
            }
            Cell::Empty => return None,
        };
        parsed.is_finite().then_some(parsed)
    }

    /// Resolved content used for row fingerprints
    pub fn resolved(&self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// Rows by columns, oldest row first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Single-column table, handy for feeding a plain value series
    pub fn from_values(column: impl Into<String>, values: &[f64]) -> Self {
        Self {
            columns: vec![column.into()],
            rows: values.iter().map(|v| vec![Cell::Number(*v)]).collect(),
        }
    }
}

/// Table with a date column ahead of `column`, one day per value
///
/// Dates keep repeated values from reading as duplicate rows.
#[cfg(test)]
pub(crate) fn daily_table(column: &str, values: &[f64]) -> DataTable {
    let rows = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.checked_add_days(chrono::Days::new(i as u64)))
                .map(|d| d.to_string())
                .unwrap_or_default();
            vec![Cell::Text(day), Cell::Number(*v)]
        })
        .collect();
    DataTable::new(vec!["Date".to_string(), column.to_string()], rows)
}

/// Lowercase and keep only alphanumerics
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Locate the metric column
///
/// Candidates are tried in priority order; the first column whose
/// normalised name contains the normalised candidate wins.
pub fn find_metric_column(columns: &[String], candidates: &[String]) -> Option<usize> {
    let normalized: Vec<String> = columns.iter().map(|c| normalize(c)).collect();

    candidates.iter().find_map(|candidate| {
        let needle = normalize(candidate);
        if needle.is_empty() {
            return None;
        }
        normalized.iter().position(|column| column.contains(&needle))
    })
}

/// Numeric population of the metric column, in row order
#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumn {
    pub name: String,
    pub index: usize,
    pub values: Vec<f64>,
}

/// Find the metric column and parse its cells
///
/// # Errors
/// * `EngineError::MetricNotFound` if no candidate matched
/// * `EngineError::NoNumericData` if no cell parsed to a number
pub fn extract_metric(table: &DataTable, candidates: &[String]) -> Result<MetricColumn, EngineError> {
    let index = find_metric_column(&table.columns, candidates).ok_or_else(|| {
        EngineError::MetricNotFound {
            candidates: candidates.to_vec(),
        }
    })?;
    let name = table.columns[index].clone();

    let values: Vec<f64> = table
        .rows
        .iter()
        .filter_map(|row| row.get(index).and_then(Cell::as_number))
        .collect();

    if values.is_empty() {
        return Err(EngineError::NoNumericData { column: name });
    }

    Ok(MetricColumn {
        name,
        index,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_parse_formatted_text() {
        assert_eq!(Cell::from("24.5%").as_number(), Some(24.5));
        assert_eq!(Cell::from("$1,234.50").as_number(), Some(1234.5));
        assert_eq!(Cell::from(" -3 ").as_number(), Some(-3.0));
        assert_eq!(Cell::from("n/a").as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
        assert_eq!(Cell::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn test_column_match_is_case_and_punctuation_insensitive() {
        let cols = columns(&["Region", "SUM(Gross_Margin %)", "Sales"]);
        let candidates = vec!["gross margin".to_string()];
        assert_eq!(find_metric_column(&cols, &candidates), Some(1));
    }

    #[test]
    fn test_column_match_respects_priority() {
        let cols = columns(&["Profit", "Profit Ratio"]);
        let candidates = vec!["profit ratio".to_string(), "profit".to_string()];
        assert_eq!(find_metric_column(&cols, &candidates), Some(1));
    }

    #[test]
    fn test_metric_not_found() {
        let table = DataTable::from_values("Sales", &[1.0, 2.0]);
        let err = extract_metric(&table, &["margin".to_string()]).unwrap_err();
        assert!(matches!(err, EngineError::MetricNotFound { .. }));
    }

    #[test]
    fn test_no_numeric_data() {
        let table = DataTable::new(
            columns(&["Margin"]),
            vec![vec![Cell::Empty], vec![Cell::from("pending")]],
        );
        let err = extract_metric(&table, &["margin".to_string()]).unwrap_err();
        assert_eq!(
            err,
            EngineError::NoNumericData {
                column: "Margin".to_string()
            }
        );
    }

    #[test]
    fn test_unparseable_cells_are_excluded() {
        let table = DataTable::new(
            columns(&["Date", "Margin"]),
            vec![
                vec![Cell::from("2024-01-01"), Cell::from("21%")],
                vec![Cell::from("2024-01-02"), Cell::Empty],
                vec![Cell::from("2024-01-03"), Cell::Number(22.0)],
                vec![Cell::from("2024-01-04")],
            ],
        );
        let metric = extract_metric(&table, &["margin".to_string()]).unwrap();
        assert_eq!(metric.name, "Margin");
        assert_eq!(metric.values, vec![21.0, 22.0]);
    }

    #[test]
    fn test_table_deserializes_mixed_cells() {
        let json = r#"{"columns":["Day","Margin"],"rows":[["mon",21.5],["tue","22%"],["wed",null]]}"#;
        let table: DataTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.rows[0][1], Cell::Number(21.5));
        assert_eq!(table.rows[1][1], Cell::Text("22%".to_string()));
        assert_eq!(table.rows[2][1], Cell::Empty);
    }
}
