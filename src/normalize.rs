//! Raw-record validation and normalization
//!
//! Turns raw monthly customs lines into the canonical schema: quarter and
//! half-year buckets, canonical country names, and the classification tuple.
//! Validation failures are fatal for the whole batch; lookup misses degrade
//! gracefully per record.

use crate::classify::{ClassificationTable, CountryNames};
use crate::error::{Result, TradeflowError};
use crate::types::{ClassColumn, FlowDirection, Quantity, Value};
use serde::{Deserialize, Serialize};

/// One raw customs-flow line as produced by the external data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Six-digit YYYYMM time code
    pub time_code: String,
    pub country: String,
    pub subcode: String,
    #[serde(default)]
    pub quantity: Quantity,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub flow: Option<FlowDirection>,
    #[serde(default)]
    pub is_reexport: bool,
}

/// Raw record plus derived fields, the unit of all aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub quarter: String,
    pub period: String,
    pub country: String,
    pub subcode: String,
    pub group: Option<String>,
    pub class_kind: Option<String>,
    pub weight_band: Option<String>,
    pub quantity: Quantity,
    pub value: Value,
    pub flow: Option<FlowDirection>,
    pub is_reexport: bool,
}

impl NormalizedRecord {
    /// Value of a classification column; `None` for unmapped tuples
    pub fn class_value(&self, column: ClassColumn) -> Option<&str> {
        match column {
            ClassColumn::Subcode => Some(&self.subcode),
            ClassColumn::Group => self.group.as_deref(),
            ClassColumn::ClassKind => self.class_kind.as_deref(),
        }
    }
}

/// Quarter label for a year and month, e.g. `2024 Q3`
pub fn quarter_label(year: i32, month: u32) -> String {
    format!("{} Q{}", year, (month - 1) / 3 + 1)
}

/// Half-year period containing a canonical quarter label.
///
/// H1 covers Q1 and Q2, H2 covers Q3 and Q4. Returns `None` for labels
/// that are not canonical `YYYY Qn`.
pub fn period_label(quarter: &str) -> Option<String> {
    let (year, q) = parse_canonical_quarter(quarter)?;
    let half = if q <= 2 { 1 } else { 2 };
    Some(format!("{} H{}", year, half))
}

/// Parse a canonical `YYYY Qn` label into (year, quarter number)
pub(crate) fn parse_canonical_quarter(label: &str) -> Option<(i32, u32)> {
    let (year, quarter) = label.split_once(' ')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n = quarter.strip_prefix('Q')?;
    if n.len() != 1 {
        return None;
    }
    let n: u32 = n.parse().ok()?;
    if !(1..=4).contains(&n) {
        return None;
    }
    Some((year.parse().ok()?, n))
}

/// Whole-batch validation: empty input or any malformed time code is fatal
pub fn validate(records: &[RawRecord]) -> Result<()> {
    if records.is_empty() {
        return Err(TradeflowError::Validation(
            "input table is empty".to_string(),
        ));
    }

    for record in records {
        let code = record.time_code.as_str();
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TradeflowError::Validation(format!(
                "malformed time code '{}', expected YYYYMM",
                code
            )));
        }
        let month: u32 = code[4..6].parse().map_err(|_| {
            TradeflowError::Validation(format!("malformed time code '{}'", code))
        })?;
        if !(1..=12).contains(&month) {
            return Err(TradeflowError::Validation(format!(
                "time code '{}' has month outside 1-12",
                code
            )));
        }
    }

    Ok(())
}

/// Normalize a validated batch of raw records
pub fn normalize(
    records: &[RawRecord],
    table: &ClassificationTable,
    countries: &CountryNames,
) -> Result<Vec<NormalizedRecord>> {
    validate(records)?;

    records
        .iter()
        .map(|record| {
            let code = record.time_code.as_str();
            let year: i32 = code[..4].parse().map_err(|_| {
                TradeflowError::Validation(format!("malformed time code '{}'", code))
            })?;
            let month: u32 = code[4..6].parse().map_err(|_| {
                TradeflowError::Validation(format!("malformed time code '{}'", code))
            })?;

            let quarter = quarter_label(year, month);
            let period = period_label(&quarter).ok_or_else(|| {
                TradeflowError::Data(format!("unparseable quarter label '{}'", quarter))
            })?;

            let classification = table.lookup(&record.subcode);

            Ok(NormalizedRecord {
                quarter,
                period,
                country: countries.translate(&record.country).to_string(),
                subcode: record.subcode.clone(),
                group: classification.map(|c| c.group.clone()),
                class_kind: classification.map(|c| c.class_kind.clone()),
                weight_band: classification.map(|c| c.weight_band.clone()),
                quantity: record.quantity,
                value: record.value,
                flow: record.flow,
                is_reexport: record.is_reexport,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(time_code: &str, country: &str, subcode: &str) -> RawRecord {
        RawRecord {
            time_code: time_code.to_string(),
            country: country.to_string(),
            subcode: subcode.to_string(),
            quantity: 1.0,
            value: 10.0,
            flow: None,
            is_reexport: false,
        }
    }

    #[test]
    fn test_quarter_label_all_months() {
        let expected = [1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4];
        for (month, q) in (1u32..=12).zip(expected) {
            assert_eq!(quarter_label(2024, month), format!("2024 Q{}", q));
        }
    }

    #[test]
    fn test_period_label() {
        assert_eq!(period_label("2024 Q1").unwrap(), "2024 H1");
        assert_eq!(period_label("2024 Q2").unwrap(), "2024 H1");
        assert_eq!(period_label("2024 Q3").unwrap(), "2024 H2");
        assert_eq!(period_label("2024 Q4").unwrap(), "2024 H2");
        assert!(period_label("2024 Jan/Feb").is_none());
        assert!(period_label("garbage").is_none());
    }

    #[test]
    fn test_validate_empty_table() {
        assert!(validate(&[]).is_err());
    }

    #[test]
    fn test_validate_malformed_time_code() {
        assert!(validate(&[raw("2024-1", "X", "S")]).is_err());
        assert!(validate(&[raw("20241", "X", "S")]).is_err());
        assert!(validate(&[raw("202413", "X", "S")]).is_err());
        assert!(validate(&[raw("202400", "X", "S")]).is_err());
        assert!(validate(&[raw("202401", "X", "S")]).is_ok());
    }

    #[test]
    fn test_validate_is_whole_batch() {
        // One bad row fails the batch, not just the row
        let records = vec![raw("202401", "X", "S"), raw("2024xx", "Y", "S")];
        assert!(validate(&records).is_err());
    }

    #[test]
    fn test_normalize_derives_buckets_and_tuple() {
        let table = ClassificationTable::default();
        let countries = CountryNames::default();
        let records = vec![raw("202408", "米国", "8806.22.00.00")];

        let normalized = normalize(&records, &table, &countries).unwrap();
        let rec = &normalized[0];
        assert_eq!(rec.quarter, "2024 Q3");
        assert_eq!(rec.period, "2024 H2");
        assert_eq!(rec.country, "United States");
        assert_eq!(rec.group.as_deref(), Some("Group 1"));
        assert_eq!(rec.class_kind.as_deref(), Some("Class I"));
        assert_eq!(rec.weight_band.as_deref(), Some("250g–7kg"));
        assert!(!rec.is_reexport);
    }

    #[test]
    fn test_normalize_lookup_miss_keeps_record() {
        let table = ClassificationTable::default();
        let countries = CountryNames::default();
        let records = vec![raw("202401", "Narnia", "0000.00.00.00")];

        let normalized = normalize(&records, &table, &countries).unwrap();
        let rec = &normalized[0];
        // Untranslated country keeps its raw label; unmapped subcode
        // yields the all-missing tuple
        assert_eq!(rec.country, "Narnia");
        assert!(rec.group.is_none());
        assert!(rec.class_kind.is_none());
        assert!(rec.weight_band.is_none());
    }

    #[test]
    fn test_class_value() {
        let table = ClassificationTable::default();
        let countries = CountryNames::default();
        let normalized =
            normalize(&[raw("202401", "X", "8806.10.00.00")], &table, &countries).unwrap();
        let rec = &normalized[0];
        assert_eq!(rec.class_value(ClassColumn::Subcode), Some("8806.10.00.00"));
        assert_eq!(rec.class_value(ClassColumn::Group), Some("Group 5"));
        assert_eq!(rec.class_value(ClassColumn::ClassKind), Some("Class III"));
    }

    proptest! {
        #[test]
        fn prop_quarter_period_consistency(year in 1990i32..2100, month in 1u32..=12) {
            let quarter = quarter_label(year, month);
            let expected_q = (month - 1) / 3 + 1;
            prop_assert_eq!(&quarter, &format!("{} Q{}", year, expected_q));

            let period = period_label(&quarter).unwrap();
            let expected_half = if month <= 6 { "H1" } else { "H2" };
            prop_assert_eq!(period, format!("{} {}", year, expected_half));
        }
    }
}
