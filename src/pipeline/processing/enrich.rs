use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::app::ports::ElevationProvider;
use crate::constants::PROGRESS_INTERVAL;
use crate::domain::{Category, CategoryMap, Coordinates, Element};
use crate::observability::metrics;

/// Attaches elevations to elements through a pluggable provider.
///
/// Every lookup is followed by a fixed delay, whether it succeeded or not, to
/// stay within the public elevation APIs' rate limits.
pub struct ElevationEnricher {
    provider: Arc<dyn ElevationProvider>,
    rate_limit: Duration,
}

impl ElevationEnricher {
    pub fn new(provider: Arc<dyn ElevationProvider>, rate_limit: Duration) -> Self {
        Self {
            provider,
            rate_limit,
        }
    }

    pub fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    /// Node location for points, computed centre for areas
    pub fn resolve_coordinate(element: &Element) -> Option<Coordinates> {
        element.coordinates()
    }

    /// Look up one element.
    ///
    /// Returns `None` only when the element has no coordinate; no lookup is made
    /// in that case. A failed lookup returns the element unchanged.
    pub async fn enrich_one(&self, element: &Element) -> Option<Element> {
        let coordinates = Self::resolve_coordinate(element)?;
        let provider = self.provider.kind().to_string();

        let enriched = match self.provider.lookup(coordinates).await {
            Ok(Some(elevation)) if elevation.is_finite() => {
                debug!(
                    "{} {} at {} -> {}m",
                    element.kind(),
                    element.id,
                    coordinates,
                    elevation
                );
                metrics::enrich::lookup_succeeded(&provider);
                element.with_elevation(elevation)
            }
            Ok(_) => {
                warn!(
                    "No elevation returned for {} {} at {}",
                    element.kind(),
                    element.id,
                    coordinates
                );
                metrics::enrich::lookup_failed(&provider);
                element.clone()
            }
            Err(e) => {
                warn!("Error fetching elevation for {}: {}", coordinates, e);
                metrics::enrich::lookup_failed(&provider);
                element.clone()
            }
        };

        if !self.rate_limit.is_zero() {
            tokio::time::sleep(self.rate_limit).await;
        }

        Some(enriched)
    }

    /// Enrich in input order.
    ///
    /// `max_count` caps the number of attempted lookups; elements without a
    /// coordinate produce no output and do not count towards it.
    pub async fn enrich_many(&self, elements: &[Element], max_count: Option<usize>) -> Vec<Element> {
        let mut enriched = Vec::with_capacity(max_count.unwrap_or(elements.len()).min(elements.len()));

        for element in elements {
            if max_count.is_some_and(|max| enriched.len() >= max) {
                break;
            }
            if let Some(result) = self.enrich_one(element).await {
                enriched.push(result);
                if enriched.len() % PROGRESS_INTERVAL == 0 {
                    info!("Processed {} elements...", enriched.len());
                }
            }
        }

        enriched
    }

    /// Enrich every category, alpine huts first. `max_count` applies per category.
    pub async fn enrich_all(
        &self,
        filtered: &CategoryMap<Vec<Element>>,
        max_count: Option<usize>,
    ) -> CategoryMap<Vec<Element>> {
        let mut enriched = CategoryMap::<Vec<Element>>::default();

        for category in Category::PRIORITY_ORDER {
            let elements = filtered.get(category);
            if elements.is_empty() {
                continue;
            }
            if category == Category::AlpineHuts {
                info!("⛰️ [PRIORITY] Enriching {}...", category.label().to_lowercase());
            } else {
                info!("🌐 Enriching {}...", category.label().to_lowercase());
            }
            *enriched.get_mut(category) = self.enrich_many(elements, max_count).await;
        }

        enriched
    }
}

/// Number of elements in the map that carry a fetched elevation
pub fn count_with_elevation(elements: &CategoryMap<Vec<Element>>) -> usize {
    elements
        .iter()
        .flat_map(|(_, list)| list.iter())
        .filter(|element| element.fetched_elevation().is_some())
        .count()
}
