//! Stacked-bar chart rendering
//!
//! Renders an aggregation matrix as a proportionally-labeled stacked bar
//! chart. Colors are assigned from a fixed 20-swatch palette keyed by each
//! country's rank in the run-wide alphabetical country list, so a country
//! keeps the same color across every artifact of a run.

use crate::aggregate::Matrix;
use crate::error::{Result, TradeflowError};
use crate::normalize::NormalizedRecord;
use plotters::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Fixed palette, cycled by country rank (tab20)
pub const PALETTE: [RGBColor; 20] = [
    RGBColor(31, 119, 180),
    RGBColor(174, 199, 232),
    RGBColor(255, 127, 14),
    RGBColor(255, 187, 120),
    RGBColor(44, 160, 44),
    RGBColor(152, 223, 138),
    RGBColor(214, 39, 40),
    RGBColor(255, 152, 150),
    RGBColor(148, 103, 189),
    RGBColor(197, 176, 213),
    RGBColor(140, 86, 75),
    RGBColor(196, 156, 148),
    RGBColor(227, 119, 194),
    RGBColor(247, 182, 210),
    RGBColor(127, 127, 127),
    RGBColor(199, 199, 199),
    RGBColor(188, 189, 34),
    RGBColor(219, 219, 141),
    RGBColor(23, 190, 207),
    RGBColor(158, 218, 229),
];

const FALLBACK_COLOR: RGBColor = RGBColor(204, 204, 204);

const CHART_WIDTH: u32 = 1200;
const CHART_HEIGHT: u32 = 600;
const LEGEND_WIDTH: i32 = 220;

/// Run-wide stable country → color assignment
#[derive(Debug, Clone)]
pub struct ColorMap {
    ranks: HashMap<String, usize>,
}

impl ColorMap {
    /// Build from an alphabetically-sorted, deduplicated country list
    pub fn from_countries<I, S>(countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = countries.into_iter().map(Into::into).collect();
        let ranks = sorted
            .into_iter()
            .enumerate()
            .map(|(rank, country)| (country, rank))
            .collect();
        Self { ranks }
    }

    /// Build from the full normalized dataset, once per run
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        Self::from_countries(records.iter().map(|r| r.country.clone()))
    }

    /// Palette index for a country, `None` if it was absent at build time
    pub fn color_index(&self, country: &str) -> Option<usize> {
        self.ranks.get(country).map(|rank| rank % PALETTE.len())
    }

    pub fn color(&self, country: &str) -> RGBColor {
        self.color_index(country)
            .map(|i| PALETTE[i])
            .unwrap_or(FALLBACK_COLOR)
    }
}

/// Numeric formatting for segment labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Whole numbers, e.g. `42`
    Count,
    /// One decimal with percent sign, e.g. `3.5%`
    Percent,
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Count => format!("{:.0}", value),
            ValueFormat::Percent => format!("{:.1}%", value),
        }
    }
}

/// Presentation metadata for one chart
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub title: String,
    pub y_label: String,
    pub format: ValueFormat,
    pub label_threshold: f64,
}

/// Indices of columns that stay visible under the threshold policy.
///
/// A column is visible iff its total exceeds the threshold, unless every
/// column is at or below the threshold, in which case all nonzero columns
/// stay visible. Zero-total columns are always dropped.
pub fn visible_columns(matrix: &Matrix, threshold: f64) -> Vec<usize> {
    let totals: Vec<f64> = (0..matrix.cols().len())
        .map(|c| matrix.col_total(c))
        .collect();
    let all_below = totals.iter().all(|t| *t <= threshold);

    (0..matrix.cols().len())
        .filter(|&c| (totals[c] > threshold || all_below) && totals[c] > 0.0)
        .collect()
}

fn render_err<E: std::fmt::Display>(e: E) -> TradeflowError {
    TradeflowError::Render(e.to_string())
}

/// Render a matrix as a stacked-bar SVG artifact at `path`
pub fn render_stacked(
    matrix: &Matrix,
    style: &ChartStyle,
    colors: &ColorMap,
    path: &Path,
) -> Result<()> {
    let keep = visible_columns(matrix, style.label_threshold);
    let m = matrix.select_columns(&keep);

    let root = SVGBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let n_rows = m.rows().len();
    let y_max = (0..n_rows)
        .map(|r| m.row_total(r))
        .filter(|t| t.is_finite())
        .fold(0.0, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };
    let x_max = n_rows.max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption(style.title.as_str(), ("sans-serif", 24))
        .margin(10)
        .margin_right(LEGEND_WIDTH)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .y_desc(style.y_label.as_str())
        .x_desc("Quarter/Period")
        .draw()
        .map_err(render_err)?;

    let show_all = m.max_value() <= style.label_threshold;
    let label_font = TextStyle::from(("sans-serif", 12).into_font()).color(&BLACK);
    let tick_font = TextStyle::from(("sans-serif", 13).into_font());

    for r in 0..n_rows {
        let mut cumulative = 0.0;
        for c in 0..m.cols().len() {
            let value = m.get(r, c);
            if !value.is_finite() || value <= 0.0 {
                continue;
            }

            let color = colors.color(&m.cols()[c]);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(r as f64 + 0.1, cumulative), (r as f64 + 0.9, cumulative + value)],
                    color.filled(),
                )))
                .map_err(render_err)?;

            if show_all || value > style.label_threshold {
                let text = style.format.format(value);
                let (px, py) = chart.backend_coord(&(r as f64 + 0.5, cumulative + value / 2.0));
                let dx = (text.len() as i32 * 7) / 2;
                root.draw_text(&text, &label_font, (px - dx, py - 6))
                    .map_err(render_err)?;
            }

            cumulative += value;
        }

        // Tick label under the bar, drawn into the x-label area
        let label = &m.rows()[r];
        let (px, py) = chart.backend_coord(&(r as f64 + 0.5, 0.0));
        let dx = (label.len() as i32 * 7) / 2;
        root.draw_text(label, &tick_font, (px - dx, py + 8))
            .map_err(render_err)?;
    }

    if !m.cols().is_empty() {
        draw_legend(&root, &m, colors)?;
    }

    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_legend(
    root: &DrawingArea<SVGBackend, plotters::coord::Shift>,
    matrix: &Matrix,
    colors: &ColorMap,
) -> Result<()> {
    let x = CHART_WIDTH as i32 - LEGEND_WIDTH + 20;
    let title_font = TextStyle::from(("sans-serif", 16).into_font());
    let entry_font = TextStyle::from(("sans-serif", 13).into_font());

    root.draw_text("Country", &title_font, (x, 40)).map_err(render_err)?;

    for (i, country) in matrix.cols().iter().enumerate() {
        let y = 65 + i as i32 * 22;
        root.draw(&Rectangle::new(
            [(x, y), (x + 14, y + 14)],
            colors.color(country).filled(),
        ))
        .map_err(render_err)?;
        root.draw_text(country, &entry_font, (x + 20, y + 1))
            .map_err(render_err)?;
    }

    Ok(())
}
