//! OSM API 0.6 client for tag updates.
//!
//! Elements are read as JSON and written back as XML inside a changeset.

use async_trait::async_trait;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::http_client::{HttpClient, RetryPolicy};
use crate::app::ports::{ChangeGroupHandle, StoreRecord, StoreShape, StoreWriteClient};
use crate::config::UploadConfig;
use crate::domain::{Credentials, ElementKind};
use crate::error::{Result, ScraperError};

const XML_CONTENT_TYPE: &str = "text/xml";

#[derive(Debug, Deserialize)]
struct OsmElementsDto {
    #[serde(default)]
    elements: Vec<OsmElementDto>,
}

#[derive(Debug, Deserialize)]
struct OsmElementDto {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    version: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    nodes: Vec<i64>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl OsmElementDto {
    fn into_record(self) -> Result<StoreRecord> {
        let (kind, shape) = match self.element_type.as_str() {
            "node" => {
                let (lat, lon) = self
                    .lat
                    .zip(self.lon)
                    .ok_or_else(|| ScraperError::api(format!("node {} has no location", self.id)))?;
                (ElementKind::Point, StoreShape::Node { lat, lon })
            }
            "way" => (ElementKind::Area, StoreShape::Way { node_refs: self.nodes }),
            other => {
                return Err(ScraperError::api(format!("unsupported element type {}", other)));
            }
        };
        Ok(StoreRecord {
            kind,
            id: self.id,
            version: self.version,
            tags: self.tags,
            shape,
        })
    }
}

/// Decode `GET /{kind}/{id}.json` and check it is the element asked for
pub fn parse_element(body: &[u8], kind: ElementKind, id: i64) -> Result<StoreRecord> {
    let decoded: OsmElementsDto = serde_json::from_slice(body)?;
    let record = decoded
        .elements
        .into_iter()
        .next()
        .ok_or_else(|| ScraperError::api(format!("{} {} not found in response", kind, id)))?
        .into_record()?;
    if record.kind != kind || record.id != id {
        return Err(ScraperError::api(format!(
            "asked for {} {}, got {} {}",
            kind, id, record.kind, record.id
        )));
    }
    Ok(record)
}

fn write_tags(writer: &mut Writer<Cursor<Vec<u8>>>, tags: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in tags {
        let mut tag = BytesStart::new("tag");
        tag.push_attribute(("k", key.as_str()));
        tag.push_attribute(("v", value.as_str()));
        writer.write_event(Event::Empty(tag))?;
    }
    Ok(())
}

fn osm_document(
    generator: &str,
    body: impl FnOnce(&mut Writer<Cursor<Vec<u8>>>) -> Result<()>,
) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut osm = BytesStart::new("osm");
    osm.push_attribute(("version", "0.6"));
    osm.push_attribute(("generator", generator));
    writer.write_event(Event::Start(osm))?;
    body(&mut writer)?;
    writer.write_event(Event::End(BytesEnd::new("osm")))?;

    Ok(writer.into_inner().into_inner())
}

/// `<osm><changeset><tag k="created_by"/><tag k="comment"/></changeset></osm>`
pub fn changeset_xml(comment: &str, created_by: &str) -> Result<Vec<u8>> {
    osm_document(created_by, |writer| {
        writer.write_event(Event::Start(BytesStart::new("changeset")))?;
        let tags = BTreeMap::from([
            ("comment".to_string(), comment.to_string()),
            ("created_by".to_string(), created_by.to_string()),
        ]);
        write_tags(writer, &tags)?;
        writer.write_event(Event::End(BytesEnd::new("changeset")))?;
        Ok(())
    })
}

/// Full element payload for `PUT /{kind}/{id}`; geometry is sent back unchanged
pub fn element_xml(record: &StoreRecord, changeset_id: u64, generator: &str) -> Result<Vec<u8>> {
    osm_document(generator, |writer| {
        let name = record.kind.as_osm_str();
        let mut element = BytesStart::new(name);
        element.push_attribute(("id", record.id.to_string().as_str()));
        element.push_attribute(("version", record.version.to_string().as_str()));
        element.push_attribute(("changeset", changeset_id.to_string().as_str()));
        if let StoreShape::Node { lat, lon } = &record.shape {
            element.push_attribute(("lat", lat.to_string().as_str()));
            element.push_attribute(("lon", lon.to_string().as_str()));
        }
        writer.write_event(Event::Start(element))?;

        if let StoreShape::Way { node_refs } = &record.shape {
            for node_ref in node_refs {
                let mut nd = BytesStart::new("nd");
                nd.push_attribute(("ref", node_ref.to_string().as_str()));
                writer.write_event(Event::Empty(nd))?;
            }
        }
        write_tags(writer, &record.tags)?;

        writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    })
}

pub struct OsmApiClient {
    http: HttpClient,
    api_url: String,
    credentials: Credentials,
    created_by: String,
}

impl OsmApiClient {
    pub fn new(
        http: HttpClient,
        api_url: impl Into<String>,
        credentials: Credentials,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            credentials,
            created_by: created_by.into(),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
            Credentials::Bearer { token } => request.bearer_auth(token),
        }
    }

    /// Writes are not idempotent, so they get a single attempt
    async fn put_xml(&self, url: String, body: Vec<u8>) -> Result<String> {
        let request = self
            .authorize(self.http.inner().put(&url))
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(body);
        let response = self.http.send_once(request).await?;
        Ok(response.text().await?)
    }
}

/// Build the live store client for validated credentials
pub fn connect(config: &UploadConfig, credentials: &Credentials) -> Result<Arc<dyn StoreWriteClient>> {
    let http = HttpClient::new(
        Duration::from_secs(config.timeout_seconds),
        RetryPolicy::with_max_retries(config.max_retries),
    )?;
    Ok(Arc::new(OsmApiClient::new(
        http,
        &config.api_url,
        credentials.clone(),
        &config.created_by,
    )))
}

#[async_trait]
impl StoreWriteClient for OsmApiClient {
    #[instrument(skip(self))]
    async fn fetch_by_id(&self, kind: ElementKind, id: i64) -> Result<StoreRecord> {
        let url = format!("{}/{}/{}.json", self.api_url, kind.as_osm_str(), id);
        let response = self.http.send(self.http.inner().get(&url)).await?;
        let body = response.bytes().await?;
        parse_element(&body, kind, id)
    }

    #[instrument(skip(self))]
    async fn open_change_group(&self, comment: &str) -> Result<ChangeGroupHandle> {
        let body = changeset_xml(comment, &self.created_by)?;
        let url = format!("{}/changeset/create", self.api_url);
        let text = self.put_xml(url, body).await?;
        let id = text
            .trim()
            .parse()
            .map_err(|_| ScraperError::api(format!("unexpected changeset id '{}'", text.trim())))?;
        info!("📝 Opened changeset {}", id);
        Ok(ChangeGroupHandle { id })
    }

    #[instrument(skip(self, record), fields(kind = %record.kind, id = record.id))]
    async fn update(&self, record: &StoreRecord, change_group: &ChangeGroupHandle) -> Result<()> {
        let body = element_xml(record, change_group.id, &self.created_by)?;
        let url = format!("{}/{}/{}", self.api_url, record.kind.as_osm_str(), record.id);
        let new_version = self.put_xml(url, body).await?;
        debug!("{} {} now at version {}", record.kind, record.id, new_version.trim());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn close_change_group(&self, change_group: &ChangeGroupHandle) -> Result<()> {
        let url = format!("{}/changeset/{}/close", self.api_url, change_group.id);
        self.put_xml(url, Vec::new()).await?;
        debug!("Closed changeset {}", change_group.id);
        Ok(())
    }
}
