//! # tradeflow
//!
//! Aggregation and visualization engine for monthly trade-flow records.
//!
//! Raw customs lines (time code, country, subcode, quantity, value) are
//! normalized into a canonical schema, aggregated into dense country×time
//! matrices, and rendered as stacked-bar chart artifacts with deterministic
//! colors, label visibility, and filenames.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tradeflow::prelude::*;
//!
//! # fn main() -> tradeflow::error::Result<()> {
//! let raw = tradeflow::source::read_raw_csv("records.csv".as_ref())?;
//! let records = normalize(
//!     &raw,
//!     &ClassificationTable::default(),
//!     &CountryNames::default(),
//! )?;
//!
//! let options = ReportOptions {
//!     out_dir: "plots".into(),
//!     prefix: "JP".into(),
//!     columns: vec!["subcode".into(), "group".into(), "class".into()],
//!     flows: vec![FlowDirection::Export],
//! };
//! let summary = run_flows(&records, &options);
//! println!("{} artifacts", summary.artifact_count);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod chart;
pub mod classify;
pub mod error;
pub mod normalize;
pub mod report;
pub mod source;
pub mod types;

pub mod prelude {
    //! Commonly used types and functions
    pub use crate::aggregate::{build_matrix, Matrix, MatrixSpec};
    pub use crate::chart::{render_stacked, ChartStyle, ColorMap, ValueFormat};
    pub use crate::classify::{Classification, ClassificationTable, CountryNames};
    pub use crate::error::{Result, TradeflowError};
    pub use crate::normalize::{normalize, NormalizedRecord, RawRecord};
    pub use crate::report::{run_flows, ReportOptions, RunSummary};
    pub use crate::types::*;
}
