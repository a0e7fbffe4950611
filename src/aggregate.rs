//! Aggregation engine: dense country×time matrices
//!
//! Groups normalized records by (time bucket, country), sums the requested
//! measure, and reshapes the result into a dense matrix with explicit zeros.
//! Columns are ordered by total descending; quarter rows are ordered
//! chronologically via the quarter-label sort key.

use crate::normalize::{parse_canonical_quarter, NormalizedRecord};
use crate::types::{ClassColumn, Measure, TimeKey};
use std::collections::{BTreeMap, BTreeSet};

/// Dense table indexed by time-bucket label (rows) and country (columns)
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: Vec<String>,
    cols: Vec<String>,
    /// Row-major, rows.len() * cols.len()
    data: Vec<f64>,
}

impl Matrix {
    fn zeros(rows: Vec<String>, cols: Vec<String>) -> Self {
        let data = vec![0.0; rows.len() * cols.len()];
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn cols(&self) -> &[String] {
        &self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols.len() + col]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        let idx = row * self.cols.len() + col;
        self.data[idx] = value;
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    /// Sum of one row across all countries
    pub fn row_total(&self, row: usize) -> f64 {
        (0..self.cols.len()).map(|c| self.get(row, c)).sum()
    }

    /// Sum of one country column across all time buckets
    pub fn col_total(&self, col: usize) -> f64 {
        (0..self.rows.len()).map(|r| self.get(r, col)).sum()
    }

    /// Largest single cell, ignoring non-finite values
    pub fn max_value(&self) -> f64 {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    /// Percentage-share matrix: each row divided by its row total ×100.
    ///
    /// Rows with a zero total become all-zero rather than NaN so the
    /// renderer never sees undefined cells.
    pub fn percent_share(&self) -> Matrix {
        let mut out = Matrix::zeros(self.rows.clone(), self.cols.clone());
        for r in 0..self.rows.len() {
            let total = self.row_total(r);
            if total <= 0.0 {
                continue;
            }
            for c in 0..self.cols.len() {
                out.set(r, c, self.get(r, c) / total * 100.0);
            }
        }
        out
    }

    /// Matrix restricted to the given column indices, preserving their order
    pub fn select_columns(&self, keep: &[usize]) -> Matrix {
        let cols = keep.iter().map(|&c| self.cols[c].clone()).collect();
        let mut out = Matrix::zeros(self.rows.clone(), cols);
        for r in 0..self.rows.len() {
            for (new_c, &c) in keep.iter().enumerate() {
                out.set(r, new_c, self.get(r, c));
            }
        }
        out
    }
}

/// Declarative description of one matrix construction
#[derive(Debug, Clone)]
pub struct MatrixSpec {
    pub time_key: TimeKey,
    pub measure: Measure,
    /// Keep only records whose classification column matches this value
    pub classify: Option<(ClassColumn, String)>,
    pub exclude_reexport: bool,
}

impl MatrixSpec {
    fn keeps(&self, record: &NormalizedRecord) -> bool {
        if self.exclude_reexport && record.is_reexport {
            return false;
        }
        match &self.classify {
            // Records with a missing tuple never match a classification filter
            Some((column, value)) => record.class_value(*column) == Some(value.as_str()),
            None => true,
        }
    }

    fn bucket<'a>(&self, record: &'a NormalizedRecord) -> &'a str {
        match self.time_key {
            TimeKey::Quarter => &record.quarter,
            TimeKey::Period => &record.period,
        }
    }

    fn measure_of(&self, record: &NormalizedRecord) -> f64 {
        match self.measure {
            Measure::Quantity => record.quantity,
            Measure::Value => record.value,
        }
    }
}

/// Group, sum, and reshape records into a dense matrix.
///
/// Columns are sorted by total measure descending with a stable lexical
/// tie-break. Quarter rows are sorted chronologically; period rows keep the
/// lexical group order, matching the reference pipeline.
pub fn build_matrix(records: &[NormalizedRecord], spec: &MatrixSpec) -> Matrix {
    let mut cells: BTreeMap<(String, String), f64> = BTreeMap::new();
    for record in records.iter().filter(|r| spec.keeps(r)) {
        let key = (spec.bucket(record).to_string(), record.country.clone());
        *cells.entry(key).or_insert(0.0) += spec.measure_of(record);
    }

    let mut row_labels: Vec<String> = cells
        .keys()
        .map(|(bucket, _)| bucket.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let col_labels: Vec<String> = cells
        .keys()
        .map(|(_, country)| country.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if matches!(spec.time_key, TimeKey::Quarter) {
        row_labels.sort_by_key(|label| quarter_sort_key(label));
    }

    let mut matrix = Matrix::zeros(row_labels, col_labels);
    for ((bucket, country), value) in &cells {
        let r = matrix.rows.iter().position(|l| l == bucket);
        let c = matrix.cols.iter().position(|l| l == country);
        if let (Some(r), Some(c)) = (r, c) {
            matrix.set(r, c, *value);
        }
    }

    // Column order: total descending, stable sort keeps lexical tie-break
    let mut order: Vec<usize> = (0..matrix.cols.len()).collect();
    let totals: Vec<f64> = order.iter().map(|&c| matrix.col_total(c)).collect();
    order.sort_by(|&a, &b| {
        totals[b]
            .partial_cmp(&totals[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    matrix.select_columns(&order)
}

/// Chronological sort key for quarter-row labels.
///
/// Recognizes canonical `YYYY Qn` labels and running-window labels of the
/// form `YYYY Mon[/Mon[/Mon]]`; for the latter the quarter is derived from
/// the first month. Canonical labels tie-break before running-window labels
/// of the same (year, quarter). Unparseable labels sort first.
pub fn quarter_sort_key(label: &str) -> (i32, u32, u8) {
    if let Some((year, q)) = parse_canonical_quarter(label) {
        return (year, q, 0);
    }
    if let Some((year, q)) = parse_running_window(label) {
        return (year, q, 1);
    }
    (0, 0, 0)
}

/// Parse a running-window label, e.g. `2024 Jan/Feb/Mar` or `2024 Oct`
fn parse_running_window(label: &str) -> Option<(i32, u32)> {
    let (year, months) = label.split_once(' ')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let parts: Vec<&str> = months.split('/').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    if !parts
        .iter()
        .all(|p| p.len() == 3 && p.chars().all(|ch| ch.is_ascii_alphabetic()))
    {
        return None;
    }

    let first = month_number(parts[0])?;
    Some((year.parse().ok()?, (first - 1) / 3 + 1))
}

fn month_number(abbr: &str) -> Option<u32> {
    let n = match abbr.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

/// Distinct classification values present in the records, sorted.
///
/// Records with a missing tuple contribute nothing, so unmapped subcodes
/// are silently excluded from per-category breakdowns.
pub fn distinct_class_values<'a, I>(records: I, column: ClassColumn) -> Vec<String>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    records
        .into_iter()
        .filter_map(|r| r.class_value(column))
        .map(|v| v.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(
        quarter: &str,
        country: &str,
        group: Option<&str>,
        quantity: f64,
        value: f64,
        is_reexport: bool,
    ) -> NormalizedRecord {
        NormalizedRecord {
            quarter: quarter.to_string(),
            period: crate::normalize::period_label(quarter)
                .unwrap_or_else(|| quarter.to_string()),
            country: country.to_string(),
            subcode: "8806.22.00.00".to_string(),
            group: group.map(|g| g.to_string()),
            class_kind: group.map(|_| "Class I".to_string()),
            weight_band: group.map(|_| "250g–7kg".to_string()),
            quantity,
            value,
            flow: None,
            is_reexport,
        }
    }

    fn quantity_spec() -> MatrixSpec {
        MatrixSpec {
            time_key: TimeKey::Quarter,
            measure: Measure::Quantity,
            classify: None,
            exclude_reexport: false,
        }
    }

    #[test]
    fn test_zero_fill_and_row_conservation() {
        let records = vec![
            record("2024 Q1", "France", Some("Group 1"), 5.0, 50.0, false),
            record("2024 Q1", "Japan", Some("Group 1"), 3.0, 30.0, false),
            record("2024 Q2", "France", Some("Group 1"), 2.0, 20.0, false),
        ];
        let matrix = build_matrix(&records, &quantity_spec());

        assert_eq!(matrix.rows(), ["2024 Q1", "2024 Q2"]);
        // Missing (Q2, Japan) cell is an explicit zero
        let japan = matrix.cols().iter().position(|c| c == "Japan").unwrap();
        assert_eq!(matrix.get(1, japan), 0.0);

        // Row totals equal the measure total per bucket
        assert_relative_eq!(matrix.row_total(0), 8.0);
        assert_relative_eq!(matrix.row_total(1), 2.0);
    }

    #[test]
    fn test_column_order_descending_with_lexical_tiebreak() {
        let records = vec![
            record("2024 Q1", "Chile", None, 2.0, 0.0, false),
            record("2024 Q1", "Brazil", None, 2.0, 0.0, false),
            record("2024 Q1", "Austria", None, 9.0, 0.0, false),
        ];
        let matrix = build_matrix(&records, &quantity_spec());
        // Austria leads on total; Brazil and Chile tie and keep lexical order
        assert_eq!(matrix.cols(), ["Austria", "Brazil", "Chile"]);
    }

    #[test]
    fn test_classification_filter_excludes_missing_tuple() {
        let records = vec![
            record("2024 Q1", "France", Some("Group 1"), 5.0, 50.0, false),
            record("2024 Q1", "France", None, 7.0, 70.0, false),
        ];
        let mut spec = quantity_spec();
        spec.classify = Some((ClassColumn::Group, "Group 1".to_string()));
        let matrix = build_matrix(&records, &spec);
        assert_relative_eq!(matrix.row_total(0), 5.0);

        // Unfiltered totals retain the unmapped record
        let total = build_matrix(&records, &quantity_spec());
        assert_relative_eq!(total.row_total(0), 12.0);
    }

    #[test]
    fn test_exclude_reexport_filter() {
        let records = vec![
            record("2024 Q1", "France", None, 5.0, 0.0, false),
            record("2024 Q1", "France", None, 3.0, 0.0, true),
        ];
        let mut spec = quantity_spec();
        spec.exclude_reexport = true;
        let matrix = build_matrix(&records, &spec);
        assert_relative_eq!(matrix.row_total(0), 5.0);
    }

    #[test]
    fn test_percent_share_rows_sum_to_100() {
        let records = vec![
            record("2024 Q1", "France", None, 30.0, 0.0, false),
            record("2024 Q1", "Japan", None, 70.0, 0.0, false),
            record("2024 Q2", "France", None, 1.0, 0.0, false),
        ];
        let matrix = build_matrix(&records, &quantity_spec());
        let pct = matrix.percent_share();
        for r in 0..pct.rows().len() {
            assert_relative_eq!(pct.row_total(r), 100.0, epsilon = 1e-9);
        }
        assert_relative_eq!(pct.get(0, 0), 70.0, epsilon = 1e-9);
    }

    #[test]
    fn test_percent_share_zero_row_is_all_zero() {
        let records = vec![record("2024 Q1", "France", None, 0.0, 0.0, false)];
        let matrix = build_matrix(&records, &quantity_spec());
        let pct = matrix.percent_share();
        assert_eq!(pct.get(0, 0), 0.0);
        assert!(pct.max_value().is_finite());
    }

    #[test]
    fn test_quarter_sort_key_formats() {
        assert_eq!(quarter_sort_key("2024 Q3"), (2024, 3, 0));
        assert_eq!(quarter_sort_key("2024 Jan/Feb/Mar"), (2024, 1, 1));
        assert_eq!(quarter_sort_key("2024 Oct"), (2024, 4, 1));
        assert_eq!(quarter_sort_key("2024 Apr/May"), (2024, 2, 1));
        // Unparseable labels sort first
        assert_eq!(quarter_sort_key("not a quarter"), (0, 0, 0));
        assert_eq!(quarter_sort_key("2024 Janx"), (0, 0, 0));
        assert_eq!(quarter_sort_key("2024 Jan/Feb/Mar/Apr"), (0, 0, 0));
    }

    #[test]
    fn test_quarter_chronological_order() {
        let mut labels = vec![
            "2024 Q3".to_string(),
            "2023 Q1".to_string(),
            "2024 Jan/Feb/Mar".to_string(),
        ];
        labels.sort_by_key(|l| quarter_sort_key(l));
        assert_eq!(labels, ["2023 Q1", "2024 Jan/Feb/Mar", "2024 Q3"]);

        // Canonical label of the same (year, quarter) tie-breaks first
        let mut tie = vec!["2024 Jan/Feb/Mar".to_string(), "2024 Q1".to_string()];
        tie.sort_by_key(|l| quarter_sort_key(l));
        assert_eq!(tie, ["2024 Q1", "2024 Jan/Feb/Mar"]);
    }

    #[test]
    fn test_distinct_class_values() {
        let records = vec![
            record("2024 Q1", "France", Some("Group 1"), 1.0, 0.0, false),
            record("2024 Q1", "Japan", Some("Group 3"), 1.0, 0.0, false),
            record("2024 Q2", "Japan", Some("Group 1"), 1.0, 0.0, false),
            record("2024 Q2", "Chile", None, 1.0, 0.0, false),
        ];
        let values = distinct_class_values(records.iter(), ClassColumn::Group);
        assert_eq!(values, ["Group 1", "Group 3"]);
    }

    #[test]
    fn test_period_rows_keep_group_order() {
        let records = vec![
            record("2024 Q3", "France", None, 1.0, 0.0, false),
            record("2024 Q1", "France", None, 1.0, 0.0, false),
            record("2023 Q4", "France", None, 1.0, 0.0, false),
        ];
        let spec = MatrixSpec {
            time_key: TimeKey::Period,
            ..quantity_spec()
        };
        let matrix = build_matrix(&records, &spec);
        // Lexical group order, which is chronological for canonical labels
        assert_eq!(matrix.rows(), ["2023 H2", "2024 H1", "2024 H2"]);
    }
}
