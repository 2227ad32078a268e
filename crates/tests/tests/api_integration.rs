use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wayfinder_agents::{ItineraryGenerator, TripPlanner};
use wayfinder_api::{build_router, ApiSettings, ApiState};
use wayfinder_core::{Coordinate, ItineraryText, PlaceName, PlannerError, TripRequest};
use wayfinder_geo::{Geocoder, MapBuilder};
use wayfinder_nlp::{EntityExtractor, EntityLabel, GazetteerRecognizer};
use wayfinder_observability::AppMetrics;
use wayfinder_storage::MemoryStore;

const MAP_ERROR: &str =
    "Unable to generate map. Check if the location names are correct and try again.";

struct StubGenerator {
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl ItineraryGenerator for StubGenerator {
    async fn generate(&self, request: &TripRequest) -> Result<ItineraryText, PlannerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PlannerError::service("gemini", "upstream unavailable"));
        }
        Ok(ItineraryText::new(format!(
            "Day 1: wander around {}.\nDay 2: rest.",
            request.destination
        )))
    }
}

struct TableGeocoder(HashMap<&'static str, Coordinate>);

#[async_trait]
impl Geocoder for TableGeocoder {
    async fn geocode(&self, name: &PlaceName) -> Option<Coordinate> {
        self.0.get(name.as_str()).copied()
    }
}

struct Harness {
    app: Router,
    generator: Arc<StubGenerator>,
}

impl Harness {
    fn new(fail: bool) -> Self {
        let metrics = AppMetrics::shared();
        let generator = Arc::new(StubGenerator {
            fail,
            calls: AtomicUsize::new(0),
        });
        let recognizer = GazetteerRecognizer::from_entries(
            "test-gazetteer",
            [
                ("Paris", EntityLabel::Gpe),
                ("Oslo", EntityLabel::Gpe),
                ("Atlantis", EntityLabel::Gpe),
            ],
        )
        .expect("gazetteer should build");
        let geocoder = Arc::new(TableGeocoder(HashMap::from([
            ("Paris", Coordinate::new(48.8566, 2.3522)),
            ("Oslo", Coordinate::new(59.9139, 10.7522)),
        ])));

        let planner = TripPlanner::new(
            generator.clone(),
            EntityExtractor::new(Arc::new(recognizer)),
            MapBuilder::new(geocoder, metrics.clone()),
            metrics,
        );
        let state = ApiState::new(planner, MemoryStore::new(), ApiSettings::default())
            .expect("state should build");

        Self {
            app: build_router(state),
            generator,
        }
    }

    fn generator_calls(&self) -> usize {
        self.generator.calls.load(Ordering::SeqCst)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(
        &self,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/plan")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(encode_form(fields))).unwrap())
            .await
    }

    async fn post_json(&self, body: Value, cookie: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/plan")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let (status, headers, body) = self
            .send(builder.body(Body::from(body.to_string())).unwrap())
            .await;
        (status, headers, serde_json::from_str(&body).unwrap())
    }
}

fn trip_fields(destination: &str) -> Vec<(&'static str, &str)> {
    vec![
        ("source", "New York"),
        ("destination", destination),
        ("start_date", "2099-06-01"),
        ("budget", "1500"),
        ("currency", "EUR"),
        ("duration_days", "5"),
        ("language", "English"),
        ("interests", "historical sites, nature"),
        ("past_destinations", "Rome"),
        ("dietary_restrictions", "None"),
        ("activity_level", "Moderate"),
        ("specific_interests", "art museums"),
        ("accommodation", "Hotel"),
        ("travel_style", "Cultural"),
        ("must_visit_landmarks", ""),
    ]
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                (byte as char).to_string()
            }
            b' ' => "+".to_string(),
            other => format!("%{other:02X}"),
        })
        .collect()
}

fn session_cookie(headers: &HeaderMap) -> String {
    headers
        .get(header::SET_COOKIE)
        .expect("session cookie should be set")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn health_reports_metrics() {
    let harness = Harness::new(false);

    let (status, _, body) = harness.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["metrics"]["submissions_total"], 0);
}

#[tokio::test]
async fn index_shows_prefilled_form_without_results() {
    let harness = Harness::new(false);

    let (status, headers, body) = harness.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));

    assert!(body.contains("value=\"New York\""));
    assert!(body.contains("value=\"Los Angeles\""));
    assert!(body.contains("Generate Travel Plan"));
    assert!(!body.contains("AI-Generated Travel Plan"));
    assert_eq!(harness.generator_calls(), 0);
}

#[tokio::test]
async fn form_submission_renders_plan_and_map() {
    let harness = Harness::new(false);

    let (status, headers, body) = harness.post_form(&trip_fields("Paris"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(session_cookie(&headers).starts_with("wayfinder_session="));

    assert_eq!(harness.generator_calls(), 1);
    assert!(body.contains("AI-Generated Travel Plan"));
    assert!(body.contains("Day 1: wander around Paris."));
    assert!(body.contains("Visualize your journey:"));
    assert!(body.contains("48.8566"));
    assert!(!body.contains(MAP_ERROR));
    assert!(body.contains("<option value=\"EUR\" selected>"));
}

#[tokio::test]
async fn missing_fields_skip_generation_and_keep_previous_plan() {
    let harness = Harness::new(false);

    let (_, headers, _) = harness.post_form(&trip_fields("Paris"), None).await;
    let cookie = session_cookie(&headers);

    let incomplete = trip_fields("")
        .into_iter()
        .filter(|(key, _)| *key != "budget")
        .collect::<Vec<_>>();
    let (status, _, body) = harness.post_form(&incomplete, Some(&cookie)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(harness.generator_calls(), 1);
    assert!(body.contains("Please fill in all required fields: Destination, Budget."));
    assert!(body.contains("Day 1: wander around Paris."));
}

#[tokio::test]
async fn second_plan_replaces_the_first() {
    let harness = Harness::new(false);

    let (_, headers, _) = harness.post_form(&trip_fields("Paris"), None).await;
    let cookie = session_cookie(&headers);
    let (status, _, _) = harness.post_form(&trip_fields("Oslo"), Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, page) = harness.get("/", Some(&cookie)).await;
    assert!(page.contains("Day 1: wander around Oslo."));
    assert!(!page.contains("wander around Paris"));
    assert!(page.contains("59.9139"));

    let (_, _, session) = harness.get("/v1/session", Some(&cookie)).await;
    let session: Value = serde_json::from_str(&session).unwrap();
    assert_eq!(session["submissions"], 2);
    assert_eq!(session["view"]["state"], "plan_shown");
    assert_eq!(session["view"]["request"]["destination"], "Oslo");
    assert_eq!(session["view"]["places"], json!(["Oslo"]));
}

#[tokio::test]
async fn sessions_do_not_share_plans() {
    let harness = Harness::new(false);

    harness.post_form(&trip_fields("Paris"), None).await;

    let (_, _, page) = harness.get("/", None).await;
    assert!(!page.contains("AI-Generated Travel Plan"));

    let (_, _, session) = harness.get("/v1/session", None).await;
    let session: Value = serde_json::from_str(&session).unwrap();
    assert_eq!(session["view"]["state"], "idle");
    assert_eq!(session["session_id"], Value::Null);
}

#[tokio::test]
async fn unmapped_plans_show_the_map_error() {
    let harness = Harness::new(false);

    for destination in ["Atlantis", "the seaside"] {
        let (status, _, body) = harness.post_form(&trip_fields(destination), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(&format!("Day 1: wander around {destination}.")));
        assert!(body.contains(MAP_ERROR));
        assert!(!body.contains("Visualize your journey:"));
    }
}

#[tokio::test]
async fn json_route_reports_map_status() {
    let harness = Harness::new(false);

    let (status, headers, body) = harness
        .post_json(
            json!({
                "source": "New York",
                "destination": "Paris",
                "start_date": "2099-06-01",
                "budget": 1500,
                "duration_days": 5
            }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["map_status"], "ready");
    assert_eq!(body["outcome"]["request"]["currency"], "USD");
    assert_eq!(body["outcome"]["map"]["markers"][0]["label"], "Paris");
    assert!(body.get("map_error").is_none());

    let (status, _, body) = harness
        .post_json(
            json!({
                "source": "New York",
                "destination": "Atlantis",
                "start_date": "2099-06-01",
                "budget": "1500",
                "duration_days": "5"
            }),
            Some(&session_cookie(&headers)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["map_status"], "nothing_resolved");
    assert_eq!(body["map_error"], MAP_ERROR);
}

#[tokio::test]
async fn json_route_rejects_incomplete_input() {
    let harness = Harness::new(false);

    let (status, _, body) = harness
        .post_json(json!({ "source": "New York", "destination": " " }), None)
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "missing_input");
    assert_eq!(
        body["fields"],
        json!(["destination", "start_date", "budget", "duration_days"])
    );
    assert_eq!(harness.generator_calls(), 0);
}

#[tokio::test]
async fn json_route_reports_undecodable_bodies_as_invalid_input() {
    let harness = Harness::new(false);

    let (status, _, body) = harness
        .post_json(
            json!({
                "source": "New York",
                "destination": "Paris",
                "start_date": "2099-06-01",
                "budget": true,
                "duration_days": 5
            }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().unwrap().starts_with("invalid body:"));
    assert_eq!(harness.generator_calls(), 0);
}

#[tokio::test]
async fn service_errors_surface_and_keep_the_view() {
    let harness = Harness::new(true);

    let (status, headers, body) = harness
        .post_json(
            json!({
                "source": "New York",
                "destination": "Paris",
                "start_date": "2099-06-01",
                "budget": 1500,
                "duration_days": 5
            }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "service_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("upstream unavailable"));
    assert_eq!(harness.generator_calls(), 1);

    let cookie = session_cookie(&headers);
    let (status, _, page) = harness.post_form(&trip_fields("Paris"), Some(&cookie)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(page.contains("class=\"notice service\""));
    assert!(!page.contains("AI-Generated Travel Plan"));
}
