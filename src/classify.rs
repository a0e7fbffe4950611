//! Static classification and country-name lookup tables
//!
//! Both tables are built once at startup and passed around as read-only
//! context. Lookup misses are not errors: unmapped subcodes yield `None`
//! and untranslated country labels fall back to the raw label.

use std::collections::HashMap;

/// Classification tuple derived from a customs subcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub group: String,
    pub class_kind: String,
    pub weight_band: String,
}

impl Classification {
    pub fn new(group: &str, class_kind: &str, weight_band: &str) -> Self {
        Self {
            group: group.to_string(),
            class_kind: class_kind.to_string(),
            weight_band: weight_band.to_string(),
        }
    }
}

/// Immutable subcode → classification map
#[derive(Debug, Clone)]
pub struct ClassificationTable {
    map: HashMap<String, Classification>,
}

impl ClassificationTable {
    /// Build a table from arbitrary entries
    pub fn new(entries: impl IntoIterator<Item = (String, Classification)>) -> Self {
        Self {
            map: entries.into_iter().collect(),
        }
    }

    /// Total lookup: unmapped subcodes return `None`, never an error
    pub fn lookup(&self, subcode: &str) -> Option<&Classification> {
        self.map.get(subcode)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ClassificationTable {
    /// Standard HS 8806 (unmanned aircraft) subcode table
    fn default() -> Self {
        let entries = [
            ("8806.10.00.00", ("Group 5", "Class III", "Passenger UAV")),
            ("8806.21.00.00", ("Group 1", "Class I", "≤250g")),
            ("8806.22.00.00", ("Group 1", "Class I", "250g–7kg")),
            ("8806.23.00.00", ("Group 2", "Class I", "7kg–25kg")),
            ("8806.24.00.00", ("Group 3", "Class II", "25kg–150kg")),
            ("8806.29.00.00", ("Group 4/5", "Class III", ">150kg")),
            ("8806.91.00.00", ("Group 1", "Class I", "≤250g")),
            ("8806.92.00.00", ("Group 1", "Class I", "250g–7kg")),
            ("8806.93.00.00", ("Group 2", "Class I", "7kg–25kg")),
            ("8806.94.00.00", ("Group 3", "Class II", "25kg–150kg")),
            ("8806.99.00.00", ("Group 4/5", "Class III", ">150kg")),
        ];

        Self::new(entries.into_iter().map(|(code, (g, c, w))| {
            (code.to_string(), Classification::new(g, c, w))
        }))
    }
}

/// Immutable raw-label → canonical English country-name map
#[derive(Debug, Clone)]
pub struct CountryNames {
    map: HashMap<String, String>,
}

impl CountryNames {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            map: entries.into_iter().collect(),
        }
    }

    /// Translate with identity fallback: unknown labels pass through unchanged
    pub fn translate<'a>(&'a self, raw: &'a str) -> &'a str {
        self.map.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

impl Default for CountryNames {
    /// Japanese customs labels → English country names
    fn default() -> Self {
        let entries = [
            ("大韓民国", "South Korea"),
            ("ベトナム", "Vietnam"),
            ("マレーシア", "Malaysia"),
            ("インド", "India"),
            ("インドネシア", "Indonesia"),
            ("タイ", "Thailand"),
            ("米国", "United States"),
            ("アメリカ合衆国", "United States"),
            ("イギリス", "United Kingdom"),
            ("英国", "United Kingdom"),
            ("フランス", "France"),
            ("ドイツ", "Germany"),
            ("台湾", "Taiwan"),
            ("フィリピン", "Philippines"),
            ("シンガポール", "Singapore"),
            ("オランダ", "The Netherlands"),
            ("スペイン", "Spain"),
            ("エジプト", "Egypt"),
            ("オーストラリア", "Australia"),
            ("モンゴル", "Mongolia"),
            ("香港", "Hong Kong"),
            ("ウクライナ", "Ukraine"),
            ("ブラジル", "Brazil"),
            ("スイス", "Switzerland"),
            ("イタリア", "Italy"),
            ("カナダ", "Canada"),
            ("コロンビア", "Colombia"),
            ("チリ", "Chile"),
            ("アルゼンチン", "Argentina"),
            ("南アフリカ共和国", "South Africa"),
            ("ザンビア", "Zambia"),
            ("サウジアラビア", "Saudi Arabia"),
        ];

        Self::new(
            entries
                .into_iter()
                .map(|(raw, en)| (raw.to_string(), en.to_string())),
        )
    }
}
