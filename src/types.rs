//! Core types shared across the engine

use crate::error::TradeflowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quantity measure (units shipped)
pub type Quantity = f64;

/// Monetary measure (declared customs value, thousands)
pub type Value = f64;

/// Flow direction of a customs record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Export,
    Import,
}

impl FlowDirection {
    /// Title-cased label used in chart titles and filename prefixes
    pub fn label(&self) -> &'static str {
        match self {
            FlowDirection::Export => "Export",
            FlowDirection::Import => "Import",
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FlowDirection {
    type Err = TradeflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "export" => Ok(FlowDirection::Export),
            "import" => Ok(FlowDirection::Import),
            other => Err(TradeflowError::Validation(format!(
                "unknown flow direction '{}', expected 'export' or 'import'",
                other
            ))),
        }
    }
}

/// Measure summed during aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Quantity,
    Value,
}

/// Time granularity of matrix rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKey {
    /// Quarterly buckets, "YYYY Qn"
    Quarter,
    /// Half-year buckets, "YYYY H1"/"YYYY H2"
    Period,
}

/// Record subset selected before aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    All,
    ExcludeReexport,
}

impl Subset {
    pub fn exclude_reexport(&self) -> bool {
        matches!(self, Subset::ExcludeReexport)
    }

    /// Label used in filenames and chart titles
    pub fn label(&self) -> &'static str {
        match self {
            Subset::All => "All",
            Subset::ExcludeReexport => "Exclude_re-export",
        }
    }
}

/// Classification column used for per-category fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassColumn {
    /// Raw customs subcode
    Subcode,
    /// Group classification derived from the subcode
    Group,
    /// Class-kind classification derived from the subcode
    ClassKind,
}

impl ClassColumn {
    /// Resolve a user-facing column name; unknown names are schema errors
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "subcode" => Some(ClassColumn::Subcode),
            "group" => Some(ClassColumn::Group),
            "class" => Some(ClassColumn::ClassKind),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClassColumn::Subcode => "subcode",
            ClassColumn::Group => "group",
            ClassColumn::ClassKind => "class",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_direction_parse() {
        assert_eq!("export".parse::<FlowDirection>().unwrap(), FlowDirection::Export);
        assert_eq!("Import".parse::<FlowDirection>().unwrap(), FlowDirection::Import);
        assert!("transit".parse::<FlowDirection>().is_err());
    }

    #[test]
    fn test_class_column_names() {
        for name in ["subcode", "group", "class"] {
            let col = ClassColumn::from_name(name).unwrap();
            assert_eq!(col.name(), name);
        }
        assert!(ClassColumn::from_name("weight_band").is_none());
    }

    #[test]
    fn test_subset_labels() {
        assert_eq!(Subset::All.label(), "All");
        assert_eq!(Subset::ExcludeReexport.label(), "Exclude_re-export");
        assert!(Subset::ExcludeReexport.exclude_reexport());
        assert!(!Subset::All.exclude_reexport());
    }
}
