mod map;
mod nominatim;

use async_trait::async_trait;
use wayfinder_core::{Coordinate, PlaceName};

pub use map::{MapBuilder, DEFAULT_CENTER, DEFAULT_ZOOM, MAX_GEOCODE_CONCURRENCY};
pub use nominatim::{NominatimGeocoder, DEFAULT_NOMINATIM_URL, DEFAULT_USER_AGENT};

/// Resolves a free-text place name to a coordinate.
///
/// Misses are `None`, never errors: callers drop unresolved names.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, name: &PlaceName) -> Option<Coordinate>;
}
