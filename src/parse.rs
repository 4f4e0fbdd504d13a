use crate::{models::*, HarvesterError, Result};
use geo::Point;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Parse an Overpass payload into a dataset.
///
/// Accepts either a full response document with an `elements` list or a bare
/// element list. Anything else is malformed.
pub fn parse_payload(payload: &Value) -> Result<Dataset> {
    match payload {
        Value::Object(document) => match document.get("elements") {
            Some(elements) => parse_elements(elements),
            None => Err(HarvesterError::MalformedInput(
                "response document has no `elements` list".to_string(),
            )),
        },
        Value::Array(_) => parse_elements(payload),
        other => Err(HarvesterError::MalformedInput(format!(
            "expected an element list, got {}",
            json_kind(other)
        ))),
    }
}

/// Parse a JSON list of element records, one row per element
pub fn parse_elements(elements: &Value) -> Result<Dataset> {
    let elements = elements.as_array().ok_or_else(|| {
        HarvesterError::MalformedInput(format!(
            "expected an element list, got {}",
            json_kind(elements)
        ))
    })?;

    let rows = elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            if !element.is_object() {
                return Err(HarvesterError::MalformedInput(format!(
                    "element {} is {}, not a record",
                    index,
                    json_kind(element)
                )));
            }

            let raw = RawElement::deserialize(element).map_err(|e| {
                HarvesterError::MalformedInput(format!("element {}: {}", index, e))
            })?;

            Ok(to_row(raw))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Parsed {} Overpass elements", rows.len());
    Ok(Dataset { rows })
}

/// Convert one decoded element into a row
pub fn to_row(element: RawElement) -> Row {
    let geometry = match (element.lon, element.lat) {
        (Some(lon), Some(lat)) => Some(Point::new(lon, lat)),
        _ => {
            debug!(
                "{} {} has no coordinates",
                element.element_type, element.id
            );
            None
        }
    };

    Row {
        element_type: element.element_type,
        id: element.id,
        lat: element.lat,
        lon: element.lon,
        tags: element.tags.unwrap_or_default(),
        geometry,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fountain_node_becomes_lon_lat_point() {
        let dataset = parse_elements(&json!([
            {"type": "node", "id": 1, "lat": 52.5, "lon": 13.4, "tags": {"amenity": "fountain"}}
        ]))
        .unwrap();

        assert_eq!(dataset.len(), 1);
        let row = &dataset.rows[0];
        assert_eq!(row.element_type, ElementType::Node);
        assert_eq!(row.id, 1);
        assert_eq!(row.geometry, Some(Point::new(13.4, 52.5)));
        assert_eq!(row.geometry.unwrap().x(), 13.4);
        assert_eq!(row.tags.get("amenity").map(String::as_str), Some("fountain"));
    }

    #[test]
    fn missing_coordinates_keep_the_row() {
        let dataset = parse_elements(&json!([
            {"type": "relation", "id": 7, "tags": {"name": "Park"}},
            {"type": "node", "id": 8, "lat": 52.0},
            {"type": "node", "id": 9, "lat": null, "lon": 13.0}
        ]))
        .unwrap();

        assert_eq!(dataset.len(), 3);
        for row in &dataset.rows {
            assert!(row.geometry.is_none());
        }
        assert_eq!(dataset.rows[1].lat, Some(52.0));
        assert_eq!(dataset.rows[1].lon, None);
    }

    #[test]
    fn absent_or_null_tags_become_empty() {
        let dataset = parse_elements(&json!([
            {"type": "node", "id": 1, "lat": 1.0, "lon": 2.0},
            {"type": "node", "id": 2, "lat": 1.0, "lon": 2.0, "tags": null}
        ]))
        .unwrap();

        assert!(dataset.rows.iter().all(|row| row.tags.is_empty()));
    }

    #[test]
    fn geometry_present_iff_both_coordinates_present() {
        let dataset = parse_elements(&json!([
            {"type": "node", "id": 1, "lat": 1.0, "lon": 2.0},
            {"type": "node", "id": 2, "lat": 1.0},
            {"type": "node", "id": 3, "lon": 2.0},
            {"type": "way", "id": 4}
        ]))
        .unwrap();

        for row in &dataset.rows {
            assert_eq!(
                row.geometry.is_some(),
                row.lat.is_some() && row.lon.is_some()
            );
        }
    }

    #[test]
    fn response_document_is_unwrapped() {
        let dataset = parse_payload(&json!({
            "version": 0.6,
            "generator": "Overpass API",
            "elements": [{"type": "way", "id": 3}]
        }))
        .unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows[0].element_type, ElementType::Way);
    }

    #[test]
    fn empty_list_is_empty_dataset() {
        assert!(parse_elements(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn structural_problems_are_malformed_input() {
        let cases = [
            json!({"elements": "nope"}),
            json!({"remark": "runtime error"}),
            json!("elements"),
            json!([1, 2]),
            json!([{"id": 1, "lat": 1.0, "lon": 1.0}]),
            json!([{"type": "node", "lat": 1.0, "lon": 1.0}]),
            json!([{"type": "area", "id": 1}]),
            json!([{"type": "node", "id": 1, "tags": {"level": 3}}]),
        ];

        for payload in cases {
            let result = parse_payload(&payload);
            assert!(
                matches!(result, Err(HarvesterError::MalformedInput(_))),
                "payload {} was accepted",
                payload
            );
        }
    }
}
