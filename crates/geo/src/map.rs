use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::debug;
use wayfinder_core::{Coordinate, MapView, PlaceName, PlannerError};
use wayfinder_observability::AppMetrics;

use crate::Geocoder;

/// New York City. The view is not centered on the trip itself.
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(40.7128, -74.0060);
pub const DEFAULT_ZOOM: u8 = 5;
pub const MAX_GEOCODE_CONCURRENCY: usize = 8;

#[derive(Clone)]
pub struct MapBuilder {
    geocoder: Arc<dyn Geocoder>,
    metrics: Arc<AppMetrics>,
    center: Coordinate,
    zoom: u8,
    concurrency: usize,
}

impl MapBuilder {
    pub fn new(geocoder: Arc<dyn Geocoder>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            geocoder,
            metrics,
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            concurrency: 1,
        }
    }

    /// Number of lookups allowed in flight at once, clamped to
    /// `1..=MAX_GEOCODE_CONCURRENCY`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_GEOCODE_CONCURRENCY);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Single lookup outside a plan; not counted in the map metrics.
    pub async fn geocode(&self, name: &PlaceName) -> Option<Coordinate> {
        self.geocoder.geocode(name).await
    }

    /// `None` when there is nothing to plot. Otherwise one marker per name
    /// that resolves, in input order; unresolved names are dropped.
    pub async fn build_map(&self, names: &[PlaceName]) -> Option<MapView> {
        if names.is_empty() {
            return None;
        }

        let lookups = names
            .iter()
            .map(|name| self.geocoder.geocode(name))
            .collect::<Vec<_>>();
        let resolved = stream::iter(lookups)
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut map = MapView::new(self.center, self.zoom);
        for (name, coordinate) in names.iter().zip(resolved) {
            match coordinate {
                Some(coordinate) => {
                    self.metrics.inc_geocode_hit();
                    map.add_marker(coordinate, name.clone());
                }
                None => {
                    self.metrics.inc_geocode_miss();
                    let miss = PlannerError::GeocodeMiss { name: name.clone() };
                    debug!(code = miss.code(), error = %miss, "dropping unresolved place");
                }
            }
        }

        Some(map)
    }
}
