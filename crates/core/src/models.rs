use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Aud,
}

impl Currency {
    pub const ALL: [Self; 5] = [Self::Usd, Self::Eur, Self::Gbp, Self::Jpy, Self::Aud];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            "GBP" => Some(Self::Gbp),
            "JPY" => Some(Self::Jpy),
            "AUD" => Some(Self::Aud),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Aud => "AUD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Spanish,
    French,
    German,
    Japanese,
}

impl Language {
    pub const ALL: [Self; 5] = [
        Self::English,
        Self::Spanish,
        Self::French,
        Self::German,
        Self::Japanese,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "english" | "en" => Some(Self::English),
            "spanish" | "es" => Some(Self::Spanish),
            "french" | "fr" => Some(Self::French),
            "german" | "de" => Some(Self::German),
            "japanese" | "ja" => Some(Self::Japanese),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::German => "German",
            Self::Japanese => "Japanese",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
}

impl ActivityLevel {
    pub const ALL: [Self; 3] = [Self::Low, Self::Moderate, Self::High];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" | "medium" => Some(Self::Moderate),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccommodationPreference {
    Hotel,
    Hostel,
    Apartment,
    NoPreference,
}

impl AccommodationPreference {
    pub const ALL: [Self; 4] = [
        Self::Hotel,
        Self::Hostel,
        Self::Apartment,
        Self::NoPreference,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "hotel" => Some(Self::Hotel),
            "hostel" => Some(Self::Hostel),
            "apartment" => Some(Self::Apartment),
            "no preference" | "any" => Some(Self::NoPreference),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hotel => "Hotel",
            Self::Hostel => "Hostel",
            Self::Apartment => "Apartment",
            Self::NoPreference => "No Preference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelStyle {
    Relaxed,
    FastPaced,
    Adventurous,
    Cultural,
    FamilyFriendly,
}

impl TravelStyle {
    pub const ALL: [Self; 5] = [
        Self::Relaxed,
        Self::FastPaced,
        Self::Adventurous,
        Self::Cultural,
        Self::FamilyFriendly,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "relaxed" => Some(Self::Relaxed),
            "fast paced" => Some(Self::FastPaced),
            "adventurous" => Some(Self::Adventurous),
            "cultural" => Some(Self::Cultural),
            "family friendly" => Some(Self::FamilyFriendly),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Relaxed => "Relaxed",
            Self::FastPaced => "Fast-Paced",
            Self::Adventurous => "Adventurous",
            Self::Cultural => "Cultural",
            Self::FamilyFriendly => "Family-Friendly",
        }
    }
}

/// A validated form submission. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub source: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub budget: f64,
    pub currency: Currency,
    pub duration_days: u8,
    pub language: Language,
    pub interests: String,
    pub past_destinations: String,
    pub dietary_restrictions: String,
    pub activity_level: ActivityLevel,
    pub specific_interests: String,
    pub accommodation: AccommodationPreference,
    pub travel_style: TravelStyle,
    pub must_visit_landmarks: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItineraryText(String);

impl ItineraryText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItineraryText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceName(String);

impl PlaceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the WGS84 lat/lon bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub label: PlaceName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl MapView {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            markers: Vec::new(),
        }
    }

    pub fn add_marker(&mut self, coordinate: Coordinate, label: PlaceName) {
        self.markers.push(Marker { coordinate, label });
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStatus {
    Ready,
    /// No place names were extracted, so no map was built.
    NoPlaces,
    /// Place names were extracted but none of them geocoded.
    NothingResolved,
}

impl MapStatus {
    pub fn is_error(self) -> bool {
        !matches!(self, Self::Ready)
    }
}

/// Everything one submission produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub request: TripRequest,
    pub itinerary: ItineraryText,
    pub places: Vec<PlaceName>,
    pub map: Option<MapView>,
}

impl PlanOutcome {
    pub fn map_status(&self) -> MapStatus {
        match &self.map {
            None => MapStatus::NoPlaces,
            Some(map) if map.is_empty() => MapStatus::NothingResolved,
            Some(_) => MapStatus::Ready,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionView {
    #[default]
    Idle,
    PlanShown(PlanOutcome),
}

impl SessionView {
    pub fn outcome(&self) -> Option<&PlanOutcome> {
        match self {
            Self::Idle => None,
            Self::PlanShown(outcome) => Some(outcome),
        }
    }
}
