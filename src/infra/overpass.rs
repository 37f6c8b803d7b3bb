//! Overpass API query adapter.
//!
//! Builds Overpass QL from a region and a tag predicate, POSTs it as the `data`
//! form field, and decodes the response through transport DTOs into elements.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use super::http_client::HttpClient;
use crate::app::ports::{QueryService, Region, TagPredicate};
use crate::domain::{Coordinates, Element, ElementKind};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct OverpassResponseDto {
    #[serde(default)]
    elements: Vec<OverpassElementDto>,
}

#[derive(Debug, Deserialize)]
struct OverpassElementDto {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenterDto>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenterDto {
    lat: f64,
    lon: f64,
}

impl OverpassElementDto {
    /// Nodes keep their own location, ways their computed centre. Relations are not handled.
    fn into_element(self) -> Option<Element> {
        let mut element = match self.element_type.as_str() {
            "node" => Element::point(
                self.id,
                self.lat.zip(self.lon).map(|(lat, lon)| Coordinates::new(lat, lon)),
            ),
            "way" => Element::area(
                self.id,
                self.center.map(|center| Coordinates::new(center.lat, center.lon)),
            ),
            other => {
                debug!("Ignoring Overpass element {} of type {}", self.id, other);
                return None;
            }
        };
        element.tags = self.tags;
        Some(element)
    }
}

pub fn parse_elements(body: &[u8]) -> Result<Vec<Element>> {
    let decoded: OverpassResponseDto = serde_json::from_slice(body)?;
    Ok(decoded
        .elements
        .into_iter()
        .filter_map(OverpassElementDto::into_element)
        .collect())
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Overpass QL selecting every `kind[key=value]` inside the named admin area
pub fn build_query(region: &Region, predicate: &TagPredicate, timeout_seconds: u32) -> String {
    let mut selectors = Vec::with_capacity(predicate.kinds.len() * predicate.values.len());
    for kind in &predicate.kinds {
        for value in &predicate.values {
            selectors.push(format!(
                "  {}[\"{}\"=\"{}\"](area.searchArea);",
                kind.as_osm_str(),
                quote(&predicate.key),
                quote(value)
            ));
        }
    }

    format!(
        "[out:json][timeout:{}];\narea[\"name\"=\"{}\"][\"admin_level\"=\"{}\"]->.searchArea;\n(\n{}\n);\nout center;",
        timeout_seconds.max(1),
        quote(&region.name),
        region.admin_level,
        selectors.join("\n")
    )
}

pub struct OverpassQueryService {
    http: HttpClient,
    url: String,
    query_timeout_seconds: u32,
}

impl OverpassQueryService {
    pub fn new(http: HttpClient, url: impl Into<String>, query_timeout_seconds: u32) -> Self {
        Self {
            http,
            url: url.into(),
            query_timeout_seconds,
        }
    }

    async fn run_query(&self, query: String) -> Result<Vec<Element>> {
        let request = self.http.inner().post(&self.url).form(&[("data", query)]);
        let response = self.http.send(request).await?;
        let body = response.bytes().await?;
        parse_elements(&body)
    }
}

#[async_trait]
impl QueryService for OverpassQueryService {
    #[instrument(skip_all, fields(area = %region.name, key = %predicate.key))]
    async fn lookup_by_tag_predicate(&self, region: &Region, predicate: &TagPredicate) -> Vec<Element> {
        let query = build_query(region, predicate, self.query_timeout_seconds);
        debug!("Overpass query:\n{}", query);

        match self.run_query(query).await {
            Ok(elements) => {
                let kinds: Vec<&str> = predicate.kinds.iter().map(ElementKind::as_osm_str).collect();
                info!(
                    "Found {} elements for {}={} ({})",
                    elements.len(),
                    predicate.key,
                    predicate.values.join("|"),
                    kinds.join(", ")
                );
                elements
            }
            Err(e) => {
                warn!("Error querying Overpass API: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::http_client::RetryPolicy;
    use std::time::Duration;

    fn romania() -> Region {
        Region {
            name: "România".to_string(),
            admin_level: 2,
        }
    }

    #[test]
    fn test_station_query_selects_nodes_only() {
        let query = build_query(&romania(), &TagPredicate::train_stations(), 300);

        assert!(query.starts_with("[out:json][timeout:300];"));
        assert!(query.contains("area[\"name\"=\"România\"][\"admin_level\"=\"2\"]->.searchArea;"));
        assert!(query.contains("node[\"railway\"=\"station\"](area.searchArea);"));
        assert!(query.contains("node[\"railway\"=\"halt\"](area.searchArea);"));
        assert!(!query.contains("way["));
        assert!(query.ends_with("out center;"));
    }

    #[test]
    fn test_accommodation_query_covers_nodes_and_ways() {
        let query = build_query(&romania(), &TagPredicate::accommodations(), 60);
        assert_eq!(query.matches("(area.searchArea);").count(), 12);
        assert!(query.contains("way[\"tourism\"=\"alpine_hut\"](area.searchArea);"));
    }

    #[test]
    fn test_region_name_is_escaped() {
        let region = Region {
            name: "Say \"hi\"".to_string(),
            admin_level: 4,
        };
        let query = build_query(&region, &TagPredicate::train_stations(), 10);
        assert!(query.contains("area[\"name\"=\"Say \\\"hi\\\"\"][\"admin_level\"=\"4\"]"));
    }

    #[test]
    fn test_parse_elements_maps_nodes_and_way_centres() {
        let body = br#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 45.64, "lon": 25.59, "tags": {"railway": "station", "name": "Brasov"}},
                {"type": "way", "id": 2, "center": {"lat": 45.4, "lon": 25.5}, "nodes": [1, 2], "tags": {"tourism": "alpine_hut"}},
                {"type": "relation", "id": 3, "tags": {"tourism": "hotel"}},
                {"type": "way", "id": 4, "tags": {"tourism": "hotel"}}
            ]
        }"#;

        let elements = parse_elements(body).unwrap();

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].coordinates(), Some(Coordinates::new(45.64, 25.59)));
        assert_eq!(elements[0].tag("name"), Some("Brasov"));
        assert_eq!(elements[1].kind(), ElementKind::Area);
        assert_eq!(elements[1].coordinates(), Some(Coordinates::new(45.4, 25.5)));
        assert_eq!(elements[2].coordinates(), None);
    }

    #[test]
    fn test_parse_elements_rejects_non_json() {
        assert!(parse_elements(b"<html>busy</html>").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty_list() {
        let http = HttpClient::new(Duration::from_millis(500), RetryPolicy::none()).unwrap();
        let service = OverpassQueryService::new(http, "http://127.0.0.1:9/api/interpreter", 10);

        let elements = service
            .lookup_by_tag_predicate(&romania(), &TagPredicate::train_stations())
            .await;

        assert!(elements.is_empty());
    }
}
