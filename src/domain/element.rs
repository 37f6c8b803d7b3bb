use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{ELE_SOURCE_SRTM, ELE_SOURCE_TAG, ELE_TAG};

/// A latitude/longitude pair in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Upstream entity kind. A Point is an OSM node, an Area is an OSM way whose
/// representative coordinate is a computed centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    #[serde(rename = "node")]
    Point,
    #[serde(rename = "way")]
    Area,
}

impl ElementKind {
    /// The OSM element type name used in URLs and API paths
    pub fn as_osm_str(&self) -> &'static str {
        match self {
            ElementKind::Point => "node",
            ElementKind::Area => "way",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_osm_str())
    }
}

/// Where an element's coordinate lives
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point { location: Option<Coordinates> },
    Area { center: Option<Coordinates> },
}

/// One OSM record under processing.
///
/// `fetched_elevation` is private: the only way to set it is
/// [`Element::with_elevation`], which writes the `ele` tag in the same step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ElementWire", into = "ElementWire")]
pub struct Element {
    pub id: i64,
    pub geometry: Geometry,
    pub tags: BTreeMap<String, String>,
    fetched_elevation: Option<f64>,
}

impl Element {
    pub fn point(id: i64, location: Option<Coordinates>) -> Self {
        Self {
            id,
            geometry: Geometry::Point { location },
            tags: BTreeMap::new(),
            fetched_elevation: None,
        }
    }

    pub fn area(id: i64, center: Option<Coordinates>) -> Self {
        Self {
            id,
            geometry: Geometry::Area { center },
            tags: BTreeMap::new(),
            fetched_elevation: None,
        }
    }

    /// Builder-style tag insertion, mostly used when assembling fixtures
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> ElementKind {
        match self.geometry {
            Geometry::Point { .. } => ElementKind::Point,
            Geometry::Area { .. } => ElementKind::Area,
        }
    }

    /// Representative coordinate: the node location or the way centre
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self.geometry {
            Geometry::Point { location } => location,
            Geometry::Area { center } => center,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn fetched_elevation(&self) -> Option<f64> {
        self.fetched_elevation
    }

    /// Returns a copy carrying `ele`, `ele:source` and the raw fetched value
    pub fn with_elevation(&self, elevation: f64) -> Self {
        let mut enriched = self.clone();
        enriched
            .tags
            .insert(ELE_TAG.to_string(), format_elevation(elevation));
        enriched
            .tags
            .insert(ELE_SOURCE_TAG.to_string(), ELE_SOURCE_SRTM.to_string());
        enriched.fetched_elevation = Some(elevation);
        enriched
    }

    /// Permalink to the element's page on openstreetmap.org
    pub fn osm_url(&self) -> String {
        format!(
            "{}/{}/{}",
            crate::constants::OSM_WEB_URL,
            self.kind().as_osm_str(),
            self.id
        )
    }
}

/// `ele` tag value: the elevation rounded to one decimal place
pub fn format_elevation(elevation: f64) -> String {
    format!("{:.1}", elevation)
}

/// On-disk and Overpass shape: nodes carry `lat`/`lon`, ways carry `center`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ElementWire {
    #[serde(rename = "type")]
    kind: ElementKind,
    id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    center: Option<Coordinates>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elevation_fetched: Option<f64>,
}

impl From<ElementWire> for Element {
    fn from(wire: ElementWire) -> Self {
        let geometry = match wire.kind {
            ElementKind::Point => Geometry::Point {
                location: wire.lat.zip(wire.lon).map(|(lat, lon)| Coordinates { lat, lon }),
            },
            ElementKind::Area => Geometry::Area { center: wire.center },
        };
        let mut tags = wire.tags;
        // A snapshot edited by hand may carry the raw value without the tag
        if let Some(elevation) = wire.elevation_fetched {
            tags.entry(ELE_TAG.to_string())
                .or_insert_with(|| format_elevation(elevation));
        }
        Element {
            id: wire.id,
            geometry,
            tags,
            fetched_elevation: wire.elevation_fetched,
        }
    }
}

impl From<Element> for ElementWire {
    fn from(element: Element) -> Self {
        let kind = element.kind();
        let (lat, lon, center) = match element.geometry {
            Geometry::Point { location } => (
                location.map(|c| c.lat),
                location.map(|c| c.lon),
                None,
            ),
            Geometry::Area { center } => (None, None, center),
        };
        ElementWire {
            kind,
            id: element.id,
            lat,
            lon,
            center,
            tags: element.tags,
            elevation_fetched: element.fetched_elevation,
        }
    }
}
