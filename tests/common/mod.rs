#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use osm_elevation::app::ports::{
    ChangeGroupHandle, ElevationProvider, ProviderKind, QueryService, Region, StoreRecord, StoreShape,
    StoreWriteClient, TagPredicate,
};
use osm_elevation::config::Config;
use osm_elevation::domain::{Coordinates, Credentials, Element, ElementKind};
use osm_elevation::error::{Result, ScraperError};
use osm_elevation::pipeline::{Adapters, StoreConnector};

/// Returns fixed station and accommodation lists
pub struct FixtureQueryService {
    pub stations: Vec<Element>,
    pub accommodations: Vec<Element>,
}

#[async_trait]
impl QueryService for FixtureQueryService {
    async fn lookup_by_tag_predicate(&self, _region: &Region, predicate: &TagPredicate) -> Vec<Element> {
        if predicate.key == "railway" {
            self.stations.clone()
        } else {
            self.accommodations.clone()
        }
    }
}

/// Answers from a coordinate table; unknown points have no value
pub struct TableProvider {
    table: Vec<(Coordinates, f64)>,
    pub calls: AtomicUsize,
}

impl TableProvider {
    pub fn new(table: Vec<(Coordinates, f64)>) -> Self {
        Self {
            table,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ElevationProvider for TableProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenTopoData
    }

    async fn lookup(&self, coordinates: Coordinates) -> Result<Option<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .table
            .iter()
            .find(|(c, _)| *c == coordinates)
            .map(|(_, elevation)| *elevation))
    }
}

/// In-memory OSM: records every call and keeps updated tags
#[derive(Default)]
pub struct RecordingStore {
    pub calls: Mutex<Vec<String>>,
    pub updated: Mutex<Vec<StoreRecord>>,
}

impl RecordingStore {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreWriteClient for RecordingStore {
    async fn fetch_by_id(&self, kind: ElementKind, id: i64) -> Result<StoreRecord> {
        self.calls.lock().unwrap().push(format!("fetch {kind} {id}"));
        let shape = match kind {
            ElementKind::Point => StoreShape::Node { lat: 45.0, lon: 25.0 },
            ElementKind::Area => StoreShape::Way { node_refs: vec![1, 2, 3, 1] },
        };
        Ok(StoreRecord {
            kind,
            id,
            version: 1,
            tags: BTreeMap::new(),
            shape,
        })
    }

    async fn open_change_group(&self, _comment: &str) -> Result<ChangeGroupHandle> {
        let mut calls = self.calls.lock().unwrap();
        calls.push("open".to_string());
        Ok(ChangeGroupHandle { id: calls.len() as u64 })
    }

    async fn update(&self, record: &StoreRecord, _change_group: &ChangeGroupHandle) -> Result<()> {
        self.calls.lock().unwrap().push(format!("update {} {}", record.kind, record.id));
        self.updated.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn close_change_group(&self, _change_group: &ChangeGroupHandle) -> Result<()> {
        self.calls.lock().unwrap().push("close".to_string());
        Ok(())
    }
}

/// Connector handing out `store` and counting how often it was asked
pub fn connector_for(store: Arc<RecordingStore>, connects: Arc<AtomicUsize>) -> StoreConnector {
    Arc::new(move |_credentials: &Credentials| {
        connects.fetch_add(1, Ordering::SeqCst);
        Ok(store.clone() as Arc<dyn StoreWriteClient>)
    })
}

pub fn refusing_connector() -> StoreConnector {
    Arc::new(|_credentials: &Credentials| Err(ScraperError::api("no network in tests")))
}

pub const STATION_AT: Coordinates = Coordinates { lat: 45.5, lon: 25.45 };
pub const HUT_AT: Coordinates = Coordinates { lat: 45.4, lon: 25.5 };
pub const HOTEL_AT: Coordinates = Coordinates { lat: 46.0, lon: 24.0 };

/// Station 1 (850.3 m), alpine hut way 10 (2505.4 m) and hotel 11 (3000 m) need
/// elevations; station 2 already has one and way 12 has no centre.
pub fn fixture_query() -> FixtureQueryService {
    FixtureQueryService {
        stations: vec![
            Element::point(1, Some(STATION_AT))
                .with_tag("railway", "station")
                .with_tag("name", "Sinaia"),
            Element::point(2, Some(Coordinates::new(44.4, 26.1)))
                .with_tag("railway", "station")
                .with_tag("ele", "80"),
        ],
        accommodations: vec![
            Element::area(10, Some(HUT_AT))
                .with_tag("tourism", "alpine_hut")
                .with_tag("name", "Cabana Omu"),
            Element::point(11, Some(HOTEL_AT)).with_tag("tourism", "hotel"),
            Element::area(12, None).with_tag("tourism", "hostel"),
        ],
    }
}

pub fn fixture_provider() -> Arc<TableProvider> {
    Arc::new(TableProvider::new(vec![
        (STATION_AT, 850.3),
        (HUT_AT, 2505.4),
        (HOTEL_AT, 3000.0),
    ]))
}

pub fn adapters(provider: Arc<TableProvider>, store_connector: StoreConnector) -> Adapters {
    Adapters {
        query: Arc::new(fixture_query()),
        provider,
        store_connector,
    }
}

/// Defaults with no delays and output under `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.elevation.rate_limit_ms = 0;
    config.overpass.query_pause_ms = 0;
    config.output.directory = dir.to_path_buf();
    config
}
