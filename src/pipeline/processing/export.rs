//! Flattening of a validated (or filtered/enriched) snapshot into tabular rows.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::constants::{ELE_SOURCE_TAG, ELE_TAG, NAME_TAG, RAILWAY_TAG, REF_TAG, TOURISM_TAG};
use crate::domain::{Category, Element};

/// One exported row; field order is the column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub elevation: String,
    pub elevation_source: String,
    pub tourism: String,
    pub railway: String,
    pub osm_link: String,
}

impl ExportRow {
    pub fn from_element(category: &str, element: &Element) -> Self {
        let tag = |key: &str| element.tag(key).unwrap_or_default().to_string();
        let coordinates = element.coordinates();
        Self {
            category: category.to_string(),
            kind: element.kind().to_string(),
            id: element.id,
            name: element
                .tag(NAME_TAG)
                .or_else(|| element.tag(REF_TAG))
                .unwrap_or_default()
                .to_string(),
            lat: coordinates.map(|c| c.lat),
            lon: coordinates.map(|c| c.lon),
            elevation: tag(ELE_TAG),
            elevation_source: tag(ELE_SOURCE_TAG),
            tourism: tag(TOURISM_TAG),
            railway: tag(RAILWAY_TAG),
            osm_link: element.osm_url(),
        }
    }
}

/// Rows for every category in the snapshot, in snapshot category order.
///
/// A category value may be a plain element list or an object carrying
/// `valid_elements`; anything else is skipped, as are elements that fail to decode.
pub fn rows_from_snapshot(snapshot: &Value) -> Vec<ExportRow> {
    let Some(categories) = snapshot.as_object() else {
        warn!("Snapshot is not an object, nothing to export");
        return Vec::new();
    };

    let mut rows = Vec::new();
    for category in Category::ALL.map(|c| c.as_str()) {
        let Some(value) = categories.get(category) else {
            continue;
        };
        let Some(elements) = category_elements(value) else {
            warn!("Skipping category '{}': no element list", category);
            continue;
        };
        for raw in elements {
            match serde_json::from_value::<Element>(raw.clone()) {
                Ok(element) => rows.push(ExportRow::from_element(category, &element)),
                Err(e) => warn!("Skipping undecodable element in '{}': {}", category, e),
            }
        }
    }
    rows
}

fn category_elements(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(elements) => Some(elements),
        Value::Object(fields) => fields.get("valid_elements").and_then(Value::as_array),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;
    use serde_json::json;

    #[test]
    fn test_row_falls_back_to_ref_and_links_to_osm() {
        let element = Element::area(42, Some(Coordinates::new(45.1, 24.9)))
            .with_tag("ref", "H12")
            .with_tag("tourism", "chalet")
            .with_elevation(980.0);

        let row = ExportRow::from_element("other_accommodations", &element);

        assert_eq!(row.kind, "way");
        assert_eq!(row.name, "H12");
        assert_eq!(row.lat, Some(45.1));
        assert_eq!(row.elevation, "980.0");
        assert_eq!(row.elevation_source, "SRTM");
        assert_eq!(row.railway, "");
        assert_eq!(row.osm_link, "https://www.openstreetmap.org/way/42");
    }

    #[test]
    fn test_accepts_lists_and_valid_elements_objects() {
        let snapshot = json!({
            "train_stations": {
                "valid_count": 1,
                "invalid_count": 0,
                "valid_elements": [
                    {"type": "node", "id": 1, "lat": 45.0, "lon": 25.0, "tags": {"name": "Brașov"}}
                ]
            },
            "alpine_huts": [
                {"type": "node", "id": 2, "lat": 45.4, "lon": 25.5, "tags": {}}
            ],
            "other_accommodations": "not a list",
            "extra": {"valid_count": 3}
        });

        let mut rows = rows_from_snapshot(&snapshot);
        rows.sort_by_key(|row| row.id);

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].category.as_str(), rows[0].name.as_str()), ("train_stations", "Brașov"));
        assert_eq!(rows[1].category, "alpine_huts");
    }

    #[test]
    fn test_rows_follow_category_order() {
        let snapshot = json!({
            "other_accommodations": [{"type": "node", "id": 3, "lat": 46.0, "lon": 24.0, "tags": {}}],
            "alpine_huts": [{"type": "node", "id": 2, "lat": 45.4, "lon": 25.5, "tags": {}}],
            "train_stations": [{"type": "node", "id": 1, "lat": 45.0, "lon": 25.0, "tags": {}}]
        });

        let categories: Vec<String> = rows_from_snapshot(&snapshot)
            .into_iter()
            .map(|row| row.category)
            .collect();

        assert_eq!(categories, vec!["train_stations", "alpine_huts", "other_accommodations"]);
    }

    #[test]
    fn test_undecodable_elements_are_skipped() {
        let snapshot = json!({"alpine_huts": [{"id": "x"}, {"type": "node", "id": 3}]});
        let rows = rows_from_snapshot(&snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].lat, None);
    }
}
