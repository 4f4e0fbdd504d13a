use crate::models::*;
use tracing::{info, warn};

/// Tag promoted to its own column
pub const DRINKING_WATER_TAG: &str = "drinking_water";

/// Dataset cleaner: drops unmappable rows and promotes `drinking_water`
#[derive(Debug, Clone)]
pub struct Cleaner {
    drinking_water_default: String,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new("unknown")
    }
}

impl Cleaner {
    /// Create a cleaner that fills missing `drinking_water` values with `default`
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            drinking_water_default: default.into(),
        }
    }

    /// Build a cleaned dataset from a parsed one, preserving row order
    pub fn clean(&self, dataset: &Dataset) -> (CleanedDataset, CleaningStats) {
        let mut stats = CleaningStats {
            input_rows: dataset.len(),
            ..CleaningStats::default()
        };

        let mut rows = Vec::with_capacity(dataset.len());
        for row in &dataset.rows {
            let (geometry, lat, lon) = match (row.geometry, row.lat, row.lon) {
                (Some(geometry), Some(lat), Some(lon)) => (geometry, lat, lon),
                _ => {
                    stats.dropped_without_geometry += 1;
                    continue;
                }
            };

            if lat.abs() > 90.0 || lon.abs() > 180.0 {
                warn!(
                    "{} {} has out-of-range coordinates ({}, {})",
                    row.element_type, row.id, lat, lon
                );
                stats.out_of_range_coordinates += 1;
            }

            let drinking_water = match row.tags.get(DRINKING_WATER_TAG) {
                Some(value) => value.clone(),
                None => {
                    stats.defaulted_drinking_water += 1;
                    self.drinking_water_default.clone()
                }
            };

            rows.push(CleanedRow {
                element_type: row.element_type,
                id: row.id,
                lat,
                lon,
                tags: row.tags.clone(),
                drinking_water,
                geometry,
            });
        }

        info!(
            "Cleaning complete. Kept: {}, dropped without coordinates: {}, defaulted drinking_water: {}",
            rows.len(),
            stats.dropped_without_geometry,
            stats.defaulted_drinking_water
        );

        (CleanedDataset::new(rows), stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_elements;
    use serde_json::json;

    fn sample() -> Dataset {
        parse_elements(&json!([
            {"type": "node", "id": 1, "lat": 52.5, "lon": 13.4, "tags": {"amenity": "fountain"}},
            {"type": "relation", "id": 2, "tags": {"drinking_water": "yes"}},
            {"type": "node", "id": 3, "lat": 52.6, "lon": 13.5, "tags": {"drinking_water": "no"}},
            {"type": "node", "id": 4, "lat": 52.7, "lon": 13.6}
        ]))
        .unwrap()
    }

    #[test]
    fn fountain_gets_unknown_drinking_water() {
        let (cleaned, _) = Cleaner::default().clean(&sample());
        let row = &cleaned.rows()[0];

        assert_eq!(row.id, 1);
        assert_eq!(row.geometry, geo::Point::new(13.4, 52.5));
        assert_eq!(row.drinking_water, "unknown");
    }

    #[test]
    fn rows_without_geometry_are_dropped_in_order() {
        let (cleaned, stats) = Cleaner::default().clean(&sample());

        let ids: Vec<i64> = cleaned.rows().iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(stats.input_rows, 4);
        assert_eq!(stats.dropped_without_geometry, 1);
        assert_eq!(stats.defaulted_drinking_water, 2);
    }

    #[test]
    fn existing_tag_value_is_promoted() {
        let (cleaned, _) = Cleaner::default().clean(&sample());
        assert_eq!(cleaned.rows()[1].drinking_water, "no");
    }

    #[test]
    fn default_value_is_configurable() {
        let (cleaned, _) = Cleaner::new("not_tagged").clean(&sample());
        assert_eq!(cleaned.rows()[2].drinking_water, "not_tagged");
    }

    #[test]
    fn no_marker_values_leak() {
        let (cleaned, _) = Cleaner::default().clean(&sample());

        for row in cleaned.rows() {
            assert_ne!(row.drinking_water, "has_no_lat_lon");
            assert!(row.tags.values().all(|value| value != "has_no_lat_lon"));
        }
    }

    #[test]
    fn out_of_range_rows_are_flagged_not_dropped() {
        let dataset = parse_elements(&json!([
            {"type": "node", "id": 1, "lat": 95.0, "lon": 13.4}
        ]))
        .unwrap();

        let (cleaned, stats) = Cleaner::default().clean(&dataset);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(stats.out_of_range_coordinates, 1);
    }

    #[test]
    fn cleaning_is_deterministic() {
        let dataset = sample();
        let cleaner = Cleaner::default();
        assert_eq!(cleaner.clean(&dataset), cleaner.clean(&dataset));
    }
}
