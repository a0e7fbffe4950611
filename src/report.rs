//! Report fan-out: one aggregation primitive multiplied into the full
//! artifact set
//!
//! For each classification column, each subset, and each distinct
//! classification value, an absolute chart and a percentage-share chart are
//! produced per measure; run-wide totals and the half-year period charts are
//! emitted once per subset. A failed classification column is reported and
//! skipped without aborting the rest of the run.

use crate::aggregate::{build_matrix, distinct_class_values, Matrix, MatrixSpec};
use crate::chart::{render_stacked, ChartStyle, ColorMap, ValueFormat};
use crate::error::{Result, TradeflowError};
use crate::normalize::NormalizedRecord;
use crate::types::{ClassColumn, FlowDirection, Measure, Subset, TimeKey};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::PathBuf;

/// Filesystem-safe slug for a classification value.
///
/// Whitespace, path separators, and colons become underscores; dots and
/// forbidden filesystem characters are stripped. A degenerate result falls
/// back to `Unknown`.
pub fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        match ch {
            ' ' | '/' | '\\' | ':' => out.push('_'),
            '.' | '<' | '>' | '"' | '|' | '?' | '*' => {}
            _ => out.push(ch),
        }
    }
    if out.is_empty() {
        "Unknown".to_string()
    } else {
        out
    }
}

/// One rendered chart, as recorded in the run manifest
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub file: String,
    pub chart: String,
    pub column: Option<String>,
    pub subset: String,
    pub value: Option<String>,
}

/// Per-flow report configuration
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub out_dir: PathBuf,
    pub prefix: String,
    pub columns: Vec<String>,
    pub flow: FlowDirection,
}

/// Shared run-wide state, computed once after normalization and read-only
/// thereafter
#[derive(Debug, Clone)]
pub struct RunContext {
    pub colors: ColorMap,
}

impl RunContext {
    pub fn new(records: &[NormalizedRecord]) -> Self {
        Self {
            colors: ColorMap::from_records(records),
        }
    }
}

fn artifact_name(
    prefix: &str,
    chart: &str,
    column: Option<ClassColumn>,
    subset: Subset,
    value: Option<&str>,
) -> String {
    let mut name = format!("{}_{}", prefix, chart);
    if let Some(col) = column {
        name.push('_');
        name.push_str(col.name());
    }
    name.push('_');
    name.push_str(subset.label());
    if let Some(v) = value {
        name.push('_');
        name.push_str(&slug(v));
    }
    name.push_str(".svg");
    name
}

/// Drives the full chart fan-out for one flow direction
pub struct ReportRunner<'a> {
    records: &'a [NormalizedRecord],
    config: &'a ReportConfig,
    ctx: &'a RunContext,
    artifacts: Vec<Artifact>,
}

impl<'a> ReportRunner<'a> {
    pub fn new(
        records: &'a [NormalizedRecord],
        config: &'a ReportConfig,
        ctx: &'a RunContext,
    ) -> Self {
        Self {
            records,
            config,
            ctx,
            artifacts: Vec::new(),
        }
    }

    /// Produce every chart artifact and the manifest, returning the
    /// artifact list
    pub fn run(mut self) -> Result<Vec<Artifact>> {
        std::fs::create_dir_all(&self.config.out_dir)?;

        for subset in [Subset::All, Subset::ExcludeReexport] {
            self.quarter_totals(subset)?;
            self.period_totals(subset)?;
        }

        let config = self.config;
        for name in &config.columns {
            match ClassColumn::from_name(name) {
                Some(column) => self.category_reports(column)?,
                None => {
                    // Schema failures are isolated per column
                    let err = TradeflowError::ColumnNotFound(name.clone());
                    log::error!("skipping classification column: {}", err);
                }
            }
        }

        self.write_manifest()?;
        Ok(self.artifacts)
    }

    fn emit(
        &mut self,
        matrix: &Matrix,
        chart: &'static str,
        column: Option<ClassColumn>,
        subset: Subset,
        value: Option<&str>,
        style: ChartStyle,
    ) -> Result<()> {
        let file = artifact_name(&self.config.prefix, chart, column, subset, value);
        let path = self.config.out_dir.join(&file);
        render_stacked(matrix, &style, &self.ctx.colors, &path)?;
        log::info!("wrote {}", path.display());

        self.artifacts.push(Artifact {
            file,
            chart: chart.to_string(),
            column: column.map(|c| c.name().to_string()),
            subset: subset.label().to_string(),
            value: value.map(|v| v.to_string()),
        });
        Ok(())
    }

    fn matrix(
        &self,
        time_key: TimeKey,
        measure: Measure,
        classify: Option<(ClassColumn, String)>,
        subset: Subset,
    ) -> Matrix {
        build_matrix(
            self.records,
            &MatrixSpec {
                time_key,
                measure,
                classify,
                exclude_reexport: subset.exclude_reexport(),
            },
        )
    }

    /// Charts 01–04: quarterly totals for both measures
    fn quarter_totals(&mut self, subset: Subset) -> Result<()> {
        let flow = self.config.flow.label();

        let counts = self.matrix(TimeKey::Quarter, Measure::Quantity, None, subset);
        self.emit(
            &counts,
            "01_Counts",
            None,
            subset,
            None,
            ChartStyle {
                title: format!("Total {}s by Country – {}", flow, subset.label()),
                y_label: "Units Shipped".to_string(),
                format: ValueFormat::Count,
                label_threshold: 10.0,
            },
        )?;
        self.emit(
            &counts.percent_share(),
            "02_Percent",
            None,
            subset,
            None,
            ChartStyle {
                title: format!("Total {} Share by Country – {}", flow, subset.label()),
                y_label: "Percentage of Quarter Total (%)".to_string(),
                format: ValueFormat::Percent,
                label_threshold: 1.5,
            },
        )?;

        let value = self.matrix(TimeKey::Quarter, Measure::Value, None, subset);
        self.emit(
            &value,
            "03_Value",
            None,
            subset,
            None,
            ChartStyle {
                title: format!("Total {} Value by Country – {}", flow, subset.label()),
                y_label: "Value (thousands)".to_string(),
                format: ValueFormat::Count,
                label_threshold: 1000.0,
            },
        )?;
        self.emit(
            &value.percent_share(),
            "04_ValuePct",
            None,
            subset,
            None,
            ChartStyle {
                title: format!("{} Value Share by Country – {}", flow, subset.label()),
                y_label: "Percentage of Quarter Value (%)".to_string(),
                format: ValueFormat::Percent,
                label_threshold: 2.0,
            },
        )?;

        Ok(())
    }

    /// Charts 05–06: half-year period totals, both measures. No
    /// per-category fan-out at this granularity.
    fn period_totals(&mut self, subset: Subset) -> Result<()> {
        let flow = self.config.flow.label();

        let units = self.matrix(TimeKey::Period, Measure::Quantity, None, subset);
        self.emit(
            &units,
            "05_Units",
            None,
            subset,
            None,
            ChartStyle {
                title: format!("Total {} Units by Period – {}", flow, subset.label()),
                y_label: "Units Shipped".to_string(),
                format: ValueFormat::Count,
                label_threshold: 10.0,
            },
        )?;
        self.emit(
            &units.percent_share(),
            "06_UnitsPct",
            None,
            subset,
            None,
            ChartStyle {
                title: format!("Unit Share by Period – {}", subset.label()),
                y_label: "Percentage Share (%)".to_string(),
                format: ValueFormat::Percent,
                label_threshold: 2.0,
            },
        )?;

        let value = self.matrix(TimeKey::Period, Measure::Value, None, subset);
        self.emit(
            &value,
            "05_Value",
            None,
            subset,
            None,
            ChartStyle {
                title: format!("Total {} Value by Period – {}", flow, subset.label()),
                y_label: "Value (thousands)".to_string(),
                format: ValueFormat::Count,
                label_threshold: 500.0,
            },
        )?;
        self.emit(
            &value.percent_share(),
            "06_ValuePct",
            None,
            subset,
            None,
            ChartStyle {
                title: format!("Value Share by Period – {}", subset.label()),
                y_label: "Percentage Share (%)".to_string(),
                format: ValueFormat::Percent,
                label_threshold: 2.0,
            },
        )?;

        Ok(())
    }

    /// Per-category fan-out for one classification column: charts 01–04
    /// restricted to each distinct value of the column
    fn category_reports(&mut self, column: ClassColumn) -> Result<()> {
        let flow = self.config.flow.label();

        for subset in [Subset::All, Subset::ExcludeReexport] {
            let in_subset = self
                .records
                .iter()
                .filter(|r| !(subset.exclude_reexport() && r.is_reexport));
            let values = distinct_class_values(in_subset, column);

            for value in values {
                let annotation = if column == ClassColumn::Subcode {
                    self.weight_band_of(&value)
                        .map(|band| format!(" ({})", band))
                        .unwrap_or_default()
                } else {
                    String::new()
                };

                let classify = Some((column, value.clone()));
                let counts =
                    self.matrix(TimeKey::Quarter, Measure::Quantity, classify.clone(), subset);
                self.emit(
                    &counts,
                    "01_Counts",
                    Some(column),
                    subset,
                    Some(&value),
                    ChartStyle {
                        title: format!(
                            "{}s by Country for {} – {}{}",
                            flow,
                            value,
                            subset.label(),
                            annotation
                        ),
                        y_label: "Units Shipped".to_string(),
                        format: ValueFormat::Count,
                        label_threshold: 10.0,
                    },
                )?;
                self.emit(
                    &counts.percent_share(),
                    "02_Percent",
                    Some(column),
                    subset,
                    Some(&value),
                    ChartStyle {
                        title: format!(
                            "{} Share by Country for {} – {}{}",
                            flow,
                            value,
                            subset.label(),
                            annotation
                        ),
                        y_label: "Percentage of Quarter Total (%)".to_string(),
                        format: ValueFormat::Percent,
                        label_threshold: 1.5,
                    },
                )?;

                let money = self.matrix(TimeKey::Quarter, Measure::Value, classify, subset);
                self.emit(
                    &money,
                    "03_Value",
                    Some(column),
                    subset,
                    Some(&value),
                    ChartStyle {
                        title: format!(
                            "{} Value by Country for {} – {}{}",
                            flow,
                            value,
                            subset.label(),
                            annotation
                        ),
                        y_label: "Value (thousands)".to_string(),
                        format: ValueFormat::Count,
                        label_threshold: 1000.0,
                    },
                )?;
                self.emit(
                    &money.percent_share(),
                    "04_ValuePct",
                    Some(column),
                    subset,
                    Some(&value),
                    ChartStyle {
                        title: format!(
                            "Value Share for {} – {}{}",
                            value,
                            subset.label(),
                            annotation
                        ),
                        y_label: "Percentage of Quarter Value (%)".to_string(),
                        format: ValueFormat::Percent,
                        label_threshold: 2.0,
                    },
                )?;
            }
        }

        Ok(())
    }

    /// Weight band annotated into subcode chart titles, only when the
    /// subcode maps to exactly one band
    fn weight_band_of(&self, subcode: &str) -> Option<String> {
        let bands: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| r.subcode == subcode)
            .filter_map(|r| r.weight_band.as_deref())
            .collect();
        if bands.len() == 1 {
            bands.into_iter().next().map(|b| b.to_string())
        } else {
            None
        }
    }

    fn write_manifest(&self) -> Result<()> {
        #[derive(Serialize)]
        struct Manifest<'a> {
            generated_at: String,
            prefix: &'a str,
            flow: String,
            artifacts: &'a [Artifact],
        }

        let manifest = Manifest {
            generated_at: chrono::Utc::now().to_rfc3339(),
            prefix: &self.config.prefix,
            flow: self.config.flow.to_string(),
            artifacts: &self.artifacts,
        };
        let path = self
            .config
            .out_dir
            .join(format!("{}_manifest.json", self.config.prefix));
        serde_json::to_writer_pretty(File::create(&path)?, &manifest)?;
        Ok(())
    }
}

/// Top-level options for a whole run across flow directions
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub out_dir: PathBuf,
    pub prefix: String,
    pub columns: Vec<String>,
    pub flows: Vec<FlowDirection>,
}

/// Outcome of a run; per-flow failures are captured, not propagated
#[derive(Debug, Default)]
pub struct RunSummary {
    pub artifact_count: usize,
    pub completed: Vec<FlowDirection>,
    pub failed: Vec<(FlowDirection, String)>,
}

/// Run the report fan-out for each requested flow direction.
///
/// The color map is built once from the full dataset so countries keep
/// their colors across both directions. Flow runs are independent: a
/// failure in one is logged and recorded without blocking the other.
pub fn run_flows(records: &[NormalizedRecord], options: &ReportOptions) -> RunSummary {
    let ctx = RunContext::new(records);
    let mut summary = RunSummary::default();

    for &flow in &options.flows {
        let subset: Vec<NormalizedRecord> = records
            .iter()
            .filter(|r| r.flow.map_or(true, |f| f == flow))
            .cloned()
            .collect();
        if subset.is_empty() {
            log::warn!("no {} records in input, skipping direction", flow);
            continue;
        }

        let config = ReportConfig {
            out_dir: options.out_dir.clone(),
            prefix: format!("{}_{}", options.prefix, flow.label()),
            columns: options.columns.clone(),
            flow,
        };
        match ReportRunner::new(&subset, &config, &ctx).run() {
            Ok(artifacts) => {
                summary.artifact_count += artifacts.len();
                summary.completed.push(flow);
            }
            Err(e) => {
                log::error!("{} report run failed: {}", flow, e);
                summary.failed.push((flow, e.to_string()));
            }
        }
    }

    summary
}
