use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    submissions_total: AtomicU64,
    rejected_input_total: AtomicU64,
    generation_failures_total: AtomicU64,
    places_extracted_total: AtomicU64,
    geocode_hits_total: AtomicU64,
    geocode_misses_total: AtomicU64,
    empty_maps_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub submissions_total: u64,
    pub rejected_input_total: u64,
    pub generation_failures_total: u64,
    pub places_extracted_total: u64,
    pub geocode_hits_total: u64,
    pub geocode_misses_total: u64,
    pub empty_maps_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_submission(&self) {
        self.submissions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected_input(&self) {
        self.rejected_input_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generation_failure(&self) {
        self.generation_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_places_extracted(&self, places: usize) {
        self.places_extracted_total
            .fetch_add(places as u64, Ordering::Relaxed);
    }

    pub fn inc_geocode_hit(&self) {
        self.geocode_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_geocode_miss(&self) {
        self.geocode_misses_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_empty_map(&self) {
        self.empty_maps_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let submissions = self.submissions_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            submissions_total: submissions,
            rejected_input_total: self.rejected_input_total.load(Ordering::Relaxed),
            generation_failures_total: self.generation_failures_total.load(Ordering::Relaxed),
            places_extracted_total: self.places_extracted_total.load(Ordering::Relaxed),
            geocode_hits_total: self.geocode_hits_total.load(Ordering::Relaxed),
            geocode_misses_total: self.geocode_misses_total.load(Ordering::Relaxed),
            empty_maps_total: self.empty_maps_total.load(Ordering::Relaxed),
            avg_latency_millis: if submissions == 0 {
                0.0
            } else {
                latency as f64 / submissions as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,wayfinder_api=info,wayfinder_agents=info,wayfinder_geo=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
