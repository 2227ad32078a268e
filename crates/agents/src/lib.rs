pub mod config;
pub mod generator;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use tracing::{info, instrument, warn};
use wayfinder_core::{
    Coordinate, ItineraryText, PlaceName, PlanOutcome, PlannerError, TripForm, TripRequest,
};
use wayfinder_geo::{Geocoder, MapBuilder, NominatimGeocoder};
use wayfinder_nlp::EntityExtractor;
use wayfinder_observability::AppMetrics;

pub use config::PlannerConfig;
pub use generator::{GeminiGenerator, ItineraryGenerator};

use crate::config::CONNECT_TIMEOUT_SECONDS;

/// Runs one submission through generation, extraction and mapping.
#[derive(Clone)]
pub struct TripPlanner {
    generator: Arc<dyn ItineraryGenerator>,
    extractor: EntityExtractor,
    map_builder: MapBuilder,
    metrics: Arc<AppMetrics>,
}

impl TripPlanner {
    pub fn new(
        generator: Arc<dyn ItineraryGenerator>,
        extractor: EntityExtractor,
        map_builder: MapBuilder,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            generator,
            extractor,
            map_builder,
            metrics,
        }
    }

    /// Wires the Gemini generator, the gazetteer extractor and the Nominatim
    /// geocoder from `config`. The gazetteer is loaded here, once.
    pub fn from_config(config: &PlannerConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let generator = GeminiGenerator::new(
            http_client(config.http_timeout)?,
            &config.gemini_url,
            config.gemini_model.clone(),
            config.gemini_api_key.clone(),
        );

        let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimGeocoder::new(
            http_client(config.geocode_timeout())?,
            &config.geocoder_url,
            config.geocoder_user_agent.clone(),
        )?);
        let map_builder = MapBuilder::new(geocoder, metrics.clone())
            .with_concurrency(config.geocode_concurrency);

        let extractor = EntityExtractor::load_default(config.gazetteer_path.as_deref());
        info!(
            model = %config.gemini_model,
            ner_model = extractor.model_name(),
            geocode_concurrency = map_builder.concurrency(),
            generation_configured = config.gemini_api_key.is_some(),
            "trip planner ready"
        );

        Ok(Self::new(
            Arc::new(generator),
            extractor,
            map_builder,
            metrics,
        ))
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    /// Validates a raw form and, when it is complete, runs the pipeline.
    /// Incomplete or invalid forms never reach the generator.
    pub async fn submit(
        &self,
        form: &TripForm,
        today: NaiveDate,
    ) -> Result<PlanOutcome, PlannerError> {
        let request = form.validate(today).inspect_err(|error| {
            self.metrics.inc_rejected_input();
            info!(error = %error, "submission rejected");
        })?;
        self.plan(request).await
    }

    #[instrument(skip(self, request), fields(destination = %request.destination))]
    pub async fn plan(&self, request: TripRequest) -> Result<PlanOutcome, PlannerError> {
        let started = Instant::now();
        self.metrics.inc_submission();

        let itinerary = match self.generator.generate(&request).await {
            Ok(itinerary) => itinerary,
            Err(error) => {
                self.metrics.inc_generation_failure();
                self.metrics.observe_latency(started.elapsed());
                warn!(error = %error, "itinerary generation failed");
                return Err(error);
            }
        };

        let places = self.extract_places(&itinerary);
        let map = self.map_builder.build_map(&places).await;

        let outcome = PlanOutcome {
            request,
            itinerary,
            places,
            map,
        };
        let map_status = outcome.map_status();
        if map_status.is_error() {
            self.metrics.inc_empty_map();
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            places = outcome.places.len(),
            markers = outcome.map.as_ref().map(|map| map.markers.len()).unwrap_or(0),
            map_status = ?map_status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "plan generated"
        );

        Ok(outcome)
    }

    pub fn extract_places(&self, itinerary: &ItineraryText) -> Vec<PlaceName> {
        let places = self.extractor.extract(itinerary);
        self.metrics.add_places_extracted(places.len());
        places
    }

    pub async fn geocode(&self, place: &PlaceName) -> Option<Coordinate> {
        self.map_builder.geocode(place).await
    }
}

fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use wayfinder_core::MapStatus;
    use wayfinder_nlp::{EntityLabel, GazetteerRecognizer};

    use super::*;

    struct ScriptedGenerator {
        reply: Result<String, PlannerError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ItineraryGenerator for ScriptedGenerator {
        async fn generate(&self, _request: &TripRequest) -> Result<ItineraryText, PlannerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map(ItineraryText::new)
        }
    }

    struct TableGeocoder(HashMap<&'static str, Coordinate>);

    #[async_trait]
    impl Geocoder for TableGeocoder {
        async fn geocode(&self, name: &PlaceName) -> Option<Coordinate> {
            self.0.get(name.as_str()).copied()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    fn planner(reply: Result<&str, PlannerError>) -> (TripPlanner, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        });
        let recognizer = GazetteerRecognizer::from_entries(
            "test",
            [
                ("Paris", EntityLabel::Gpe),
                ("Lyon", EntityLabel::Gpe),
                ("Louvre", EntityLabel::Fac),
            ],
        )
        .unwrap();
        let metrics = AppMetrics::shared();
        let geocoder = Arc::new(TableGeocoder(HashMap::from([(
            "Paris",
            Coordinate::new(48.8566, 2.3522),
        )])));

        let planner = TripPlanner::new(
            generator.clone(),
            EntityExtractor::new(Arc::new(recognizer)),
            MapBuilder::new(geocoder, metrics.clone()),
            metrics,
        );
        (planner, generator)
    }

    #[tokio::test]
    async fn complete_submission_calls_generator_once_and_keeps_text() {
        let text = "Day 1: Paris and the Louvre.\nDay 2: train to Lyon.";
        let (planner, generator) = planner(Ok(text));

        let outcome = planner
            .submit(&TripForm::defaults(today()), today())
            .await
            .unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.itinerary.as_str(), text);
        let places = outcome
            .places
            .iter()
            .map(PlaceName::as_str)
            .collect::<Vec<_>>();
        assert_eq!(places, vec!["Paris", "Lyon"]);
        assert_eq!(outcome.map.as_ref().unwrap().markers.len(), 1);
        assert_eq!(outcome.map_status(), MapStatus::Ready);
    }

    #[tokio::test]
    async fn missing_fields_skip_generation() {
        let (planner, generator) = planner(Ok("Paris"));
        let mut form = TripForm::defaults(today());
        form.destination = None;

        let error = planner.submit(&form, today()).await.unwrap_err();
        assert_eq!(
            error,
            PlannerError::MissingInput {
                fields: vec!["destination"]
            }
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(planner.metrics().snapshot().rejected_input_total, 1);
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let (planner, _) = planner(Err(PlannerError::service("gemini", "quota exceeded")));

        let error = planner
            .submit(&TripForm::defaults(today()), today())
            .await
            .unwrap_err();
        assert!(matches!(error, PlannerError::Service { .. }));
        assert_eq!(planner.metrics().snapshot().generation_failures_total, 1);
    }

    #[tokio::test]
    async fn text_without_places_has_no_map() {
        let (planner, _) = planner(Ok("Sleep in, then visit a quiet beach."));

        let outcome = planner
            .submit(&TripForm::defaults(today()), today())
            .await
            .unwrap();
        assert!(outcome.places.is_empty());
        assert_eq!(outcome.map, None);
        assert_eq!(outcome.map_status(), MapStatus::NoPlaces);
        assert_eq!(planner.metrics().snapshot().empty_maps_total, 1);
    }

    #[tokio::test]
    async fn unresolved_places_are_classified_as_empty_map() {
        let (planner, _) = planner(Ok("Base yourself in Lyon."));

        let outcome = planner
            .submit(&TripForm::defaults(today()), today())
            .await
            .unwrap();
        assert_eq!(outcome.map_status(), MapStatus::NothingResolved);
        assert!(outcome.map.unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_geocode_resolves_without_touching_map_metrics() {
        let (planner, generator) = planner(Ok("unused"));

        assert_eq!(
            planner.geocode(&PlaceName::new("Paris")).await,
            Some(Coordinate::new(48.8566, 2.3522))
        );
        assert_eq!(planner.geocode(&PlaceName::new("Lyon")).await, None);

        let snapshot = planner.metrics().snapshot();
        assert_eq!(snapshot.geocode_hits_total, 0);
        assert_eq!(snapshot.geocode_misses_total, 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
