use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{ACCOMMODATION_TYPES, RAILWAY_TAG, RAILWAY_TYPES, TOURISM_TAG};
use crate::domain::{Coordinates, Element, ElementKind};
use crate::error::Result;

/// Named administrative area the queries are scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub admin_level: u8,
}

/// Selects elements whose `key` tag equals one of `values`, for the given kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPredicate {
    pub key: String,
    pub values: Vec<String>,
    pub kinds: Vec<ElementKind>,
}

impl TagPredicate {
    /// `railway=station|halt` nodes
    pub fn train_stations() -> Self {
        Self {
            key: RAILWAY_TAG.to_string(),
            values: RAILWAY_TYPES.iter().map(|v| v.to_string()).collect(),
            kinds: vec![ElementKind::Point],
        }
    }

    /// Hotels, guest houses, alpine huts, chalets, hostels and motels, as nodes and ways
    pub fn accommodations() -> Self {
        Self {
            key: TOURISM_TAG.to_string(),
            values: ACCOMMODATION_TYPES.iter().map(|v| v.to_string()).collect(),
            kinds: vec![ElementKind::Point, ElementKind::Area],
        }
    }
}

/// Source of raw elements (Overpass in production)
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Never fails: transport problems are logged and yield an empty list
    async fn lookup_by_tag_predicate(&self, region: &Region, predicate: &TagPredicate)
        -> Vec<Element>;
}

/// Closed set of elevation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "opentopo")]
    OpenTopoData,
    #[serde(rename = "open-elevation")]
    OpenElevation,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenTopoData => f.write_str("opentopo"),
            ProviderKind::OpenElevation => f.write_str("open-elevation"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "opentopo" => Ok(ProviderKind::OpenTopoData),
            "open-elevation" => Ok(ProviderKind::OpenElevation),
            other => Err(format!("unknown elevation provider: {other}")),
        }
    }
}

/// One-coordinate elevation lookup
#[async_trait]
pub trait ElevationProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// `Ok(None)` when the backend answered but had no value for the point
    async fn lookup(&self, coordinates: Coordinates) -> Result<Option<f64>>;
}

/// Geometry of an upstream record that has to be sent back unchanged on update
#[derive(Debug, Clone, PartialEq)]
pub enum StoreShape {
    Node { lat: f64, lon: f64 },
    Way { node_refs: Vec<i64> },
}

/// Current upstream representation of an element
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    pub kind: ElementKind,
    pub id: i64,
    pub version: u64,
    pub tags: BTreeMap<String, String>,
    pub shape: StoreShape,
}

/// An open atomic change group (an OSM changeset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeGroupHandle {
    pub id: u64,
}

/// Write access to the source-of-truth store. Every call may fail.
#[async_trait]
pub trait StoreWriteClient: Send + Sync {
    async fn fetch_by_id(&self, kind: ElementKind, id: i64) -> Result<StoreRecord>;

    async fn open_change_group(&self, comment: &str) -> Result<ChangeGroupHandle>;

    async fn update(&self, record: &StoreRecord, change_group: &ChangeGroupHandle) -> Result<()>;

    async fn close_change_group(&self, change_group: &ChangeGroupHandle) -> Result<()>;
}
