use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use wayfinder_core::{Coordinate, PlaceName};

use crate::Geocoder;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "wayfinder_travel_app";

/// OpenStreetMap Nominatim search client. One request per lookup.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    search_url: Url,
    user_agent: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: &str, user_agent: impl Into<String>) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .with_context(|| format!("invalid geocoder base url {}", base_url))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let search_url = base
            .join("search")
            .context("failed to build geocoder search url")?;

        Ok(Self {
            client,
            search_url,
            user_agent: user_agent.into(),
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    /// Transport and status failures are errors here; an empty or malformed
    /// result is `Ok(None)`.
    pub async fn lookup(&self, name: &PlaceName) -> Result<Option<Coordinate>> {
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[("q", name.as_str()), ("format", "jsonv2"), ("limit", "1")])
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .context("geocoder request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("geocoder non-success status {}", status.as_u16());
        }

        let body: Value = response.json().await.context("geocoder parse failed")?;
        Ok(parse_search_response(&body))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, name: &PlaceName) -> Option<Coordinate> {
        match self.lookup(name).await {
            Ok(Some(coordinate)) => Some(coordinate),
            Ok(None) => {
                debug!(place = %name, "geocoder returned no match");
                None
            }
            Err(error) => {
                warn!(place = %name, error = %error, "geocoder lookup failed");
                None
            }
        }
    }
}

fn parse_search_response(body: &Value) -> Option<Coordinate> {
    let first = body.as_array()?.first()?;
    let lat = coordinate_component(first.get("lat")?)?;
    let lon = coordinate_component(first.get("lon")?)?;
    Some(Coordinate::new(lat, lon)).filter(Coordinate::is_valid)
}

// Nominatim encodes coordinates as decimal strings.
fn coordinate_component(value: &Value) -> Option<f64> {
    match value {
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}
