//! Exact row duplication analysis
//!
//! Each row is reduced to a SHA-256 fingerprint of its resolved cell
//! contents. A row whose fingerprint was already seen counts as a duplicate.

use crate::models::DuplicateInfo;
use crate::table::Cell;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Separator between resolved cells inside a row fingerprint
const CELL_SEPARATOR: &str = "|";

/// Content fingerprint of a single row
pub fn row_fingerprint(row: &[Cell]) -> String {
    let joined = row
        .iter()
        .map(Cell::resolved)
        .collect::<Vec<_>>()
        .join(CELL_SEPARATOR);
    hex::encode(Sha256::digest(joined.as_bytes()))
}

/// Count exact duplicate rows
///
/// Fewer than two rows yields a zeroed result.
pub fn analyze_duplicates(rows: &[Vec<Cell>]) -> DuplicateInfo {
    if rows.len() < 2 {
        return DuplicateInfo::default();
    }

    let mut seen = HashSet::with_capacity(rows.len());
    let mut duplicate_count = 0;

    for row in rows {
        if !seen.insert(row_fingerprint(row)) {
            duplicate_count += 1;
        }
    }

    let total_rows = rows.len();
    DuplicateInfo {
        has_duplicates: duplicate_count > 0,
        duplicate_count,
        duplicate_ratio: duplicate_count as f64 / total_rows as f64,
        total_rows,
        unique_rows: total_rows - duplicate_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: &str, value: f64) -> Vec<Cell> {
        vec![Cell::from(day), Cell::Number(value)]
    }

    #[test]
    fn test_ten_rows_two_duplicates_of_first() {
        let mut rows: Vec<Vec<Cell>> = (0..10)
            .map(|i| row(&format!("day-{}", i), 20.0 + i as f64))
            .collect();
        // Rows 3 and 7 (1-based) repeat row 1
        rows[2] = rows[0].clone();
        rows[6] = rows[0].clone();

        let info = analyze_duplicates(&rows);
        assert!(info.has_duplicates);
        assert_eq!(info.duplicate_count, 2);
        assert!((info.duplicate_ratio - 0.2).abs() < 1e-12);
        assert_eq!(info.unique_rows, 8);
        assert_eq!(info.total_rows, 10);
    }

    #[test]
    fn test_fewer_than_two_rows() {
        assert_eq!(analyze_duplicates(&[]), DuplicateInfo::default());
        assert_eq!(analyze_duplicates(&[row("a", 1.0)]), DuplicateInfo::default());
    }

    #[test]
    fn test_same_value_different_row_is_not_duplicate() {
        let rows = vec![row("mon", 21.0), row("tue", 21.0)];
        let info = analyze_duplicates(&rows);
        assert!(!info.has_duplicates);
        assert_eq!(info.unique_rows, 2);
    }

    #[test]
    fn test_empty_cells_participate_in_fingerprint() {
        let a = vec![Cell::Empty, Cell::Number(1.0)];
        let b = vec![Cell::Number(1.0), Cell::Empty];
        assert_ne!(row_fingerprint(&a), row_fingerprint(&b));
        assert_eq!(row_fingerprint(&a), row_fingerprint(&a.clone()));
    }
}
