//! CSV collaborators: raw-record input and normalized-table output
//!
//! Thin I/O shell around the engine. The raw reader also strips the numeric
//! area-code prefix some statistical sources attach to country labels
//! ("103_大韓民国" → "大韓民国").

use crate::error::Result;
use crate::normalize::{NormalizedRecord, RawRecord};
use serde::Serialize;
use std::path::Path;

/// Strip a leading `NNN_` area-code prefix from a country label
pub fn strip_area_code(label: &str) -> &str {
    match label.split_once('_') {
        Some((code, rest))
            if !code.is_empty() && !rest.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => label,
    }
}

/// Read the raw monthly records table
pub fn read_raw_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let mut record: RawRecord = result?;
        record.country = strip_area_code(&record.country).to_string();
        records.push(record);
    }
    Ok(records)
}

/// Fixed column set of the normalized output table
#[derive(Serialize)]
struct NormalizedRow<'a> {
    quarter: &'a str,
    period: &'a str,
    country: &'a str,
    subcode: &'a str,
    group: Option<&'a str>,
    class: Option<&'a str>,
    weight_band: Option<&'a str>,
    quantity: f64,
    value: f64,
    is_reexport: bool,
}

impl<'a> From<&'a NormalizedRecord> for NormalizedRow<'a> {
    fn from(record: &'a NormalizedRecord) -> Self {
        Self {
            quarter: &record.quarter,
            period: &record.period,
            country: &record.country,
            subcode: &record.subcode,
            group: record.group.as_deref(),
            class: record.class_kind.as_deref(),
            weight_band: record.weight_band.as_deref(),
            quantity: record.quantity,
            value: record.value,
            is_reexport: record.is_reexport,
        }
    }
}

/// Write the normalized table with its fixed column set
pub fn write_normalized_csv(path: &Path, records: &[NormalizedRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(NormalizedRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}
