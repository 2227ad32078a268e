mod gazetteer;
mod seed;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;
use wayfinder_core::{ItineraryText, PlaceName};

pub use gazetteer::GazetteerRecognizer;

/// Named-entity categories, following the OntoNotes label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    /// Countries, cities, states.
    Gpe,
    /// Non-GPE locations: mountain ranges, bodies of water.
    Loc,
    /// Buildings, airports, bridges, landmarks.
    Fac,
    Norp,
    Org,
    Person,
}

impl EntityLabel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "GPE" => Some(Self::Gpe),
            "LOC" => Some(Self::Loc),
            "FAC" => Some(Self::Fac),
            "NORP" => Some(Self::Norp),
            "ORG" => Some(Self::Org),
            "PERSON" => Some(Self::Person),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognizedEntity {
    pub text: String,
    pub label: EntityLabel,
    /// Byte offsets into the recognized text.
    pub start: usize,
    pub end: usize,
}

pub trait EntityRecognizer: Send + Sync {
    fn model_name(&self) -> &'static str;

    /// Entities in order of appearance, non-overlapping.
    fn recognize(&self, text: &str) -> Vec<RecognizedEntity>;
}

/// Pulls geopolitical entities out of generated itinerary text.
#[derive(Clone)]
pub struct EntityExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl EntityExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Loads the gazetteer at `path`, or the built-in one when no path is
    /// given or the file cannot be used.
    pub fn load_default(path: Option<&Path>) -> Self {
        let recognizer = match path {
            Some(path) if path.exists() => {
                GazetteerRecognizer::from_jsonl(path, "gazetteer-jsonl").unwrap_or_else(|error| {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "gazetteer load failed, using seed model"
                    );
                    GazetteerRecognizer::seed()
                })
            }
            Some(path) => {
                warn!(path = %path.display(), "gazetteer not found, using seed model");
                GazetteerRecognizer::seed()
            }
            None => GazetteerRecognizer::seed(),
        };

        Self::new(Arc::new(recognizer))
    }

    pub fn model_name(&self) -> &'static str {
        self.recognizer.model_name()
    }

    pub fn extract(&self, text: &ItineraryText) -> Vec<PlaceName> {
        self.recognizer
            .recognize(text.as_str())
            .into_iter()
            .filter(|entity| entity.label == EntityLabel::Gpe)
            .map(|entity| PlaceName::new(entity.text))
            .collect()
    }
}
