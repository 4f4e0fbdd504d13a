use geo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Open-ended OSM key/value tags, kept ordered for deterministic output
pub type Tags = BTreeMap<String, String>;

/// OSM element kinds returned by Overpass
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element as returned by the Overpass interpreter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: Option<Tags>,
}

/// A parsed row. Every row has the same columns whatever tags its element carried.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub element_type: ElementType,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tags: Tags,
    /// Point(lon, lat), present only when both coordinates are
    pub geometry: Option<Point<f64>>,
}

/// Output of the element parser, one row per input element in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row that survived cleaning: geometry and `drinking_water` are always set
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRow {
    pub element_type: ElementType,
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
    pub drinking_water: String,
    pub geometry: Point<f64>,
}

/// Cleaned dataset handed to the artifact writer. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedDataset {
    rows: Vec<CleanedRow>,
}

impl CleanedDataset {
    pub const COLUMNS: [&'static str; 7] = [
        "type",
        "id",
        "lat",
        "lon",
        "tags",
        "drinking_water",
        "geometry",
    ];

    pub fn new(rows: Vec<CleanedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CleanedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Counters reported by the cleaner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub input_rows: usize,
    pub dropped_without_geometry: usize,
    pub defaulted_drinking_water: usize,
    pub out_of_range_coordinates: usize,
}

/// Locations of a written artifact pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub full: std::path::PathBuf,
    pub minified: std::path::PathBuf,
    /// Whether the minified path was published to the automation channel
    pub registered: bool,
}
