use std::fmt;

use chrono::NaiveDate;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::models::{
    AccommodationPreference, ActivityLevel, Currency, Language, TravelStyle, TripRequest,
};

pub const MIN_BUDGET: f64 = 100.0;
pub const BUDGET_STEP: u32 = 100;
pub const MIN_DURATION_DAYS: u8 = 1;
pub const MAX_DURATION_DAYS: u8 = 90;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw submission as it arrives from the HTML form or the JSON API.
///
/// Every field is optional text; blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripForm {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub budget: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub duration_days: Option<String>,
    pub currency: Option<String>,
    pub language: Option<String>,
    pub interests: Option<String>,
    pub past_destinations: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub activity_level: Option<String>,
    pub specific_interests: Option<String>,
    pub accommodation: Option<String>,
    pub travel_style: Option<String>,
    pub must_visit_landmarks: Option<String>,
}

impl TripForm {
    /// The values a fresh form is pre-filled with.
    pub fn defaults(today: NaiveDate) -> Self {
        Self {
            source: Some("New York".to_string()),
            destination: Some("Los Angeles".to_string()),
            start_date: Some(today.format(DATE_FORMAT).to_string()),
            budget: Some("1000".to_string()),
            duration_days: Some("7".to_string()),
            currency: Some(Currency::Usd.as_code().to_string()),
            language: Some(Language::English.label().to_string()),
            interests: Some("historical sites, nature".to_string()),
            past_destinations: Some("Paris, Tokyo".to_string()),
            dietary_restrictions: Some("None".to_string()),
            activity_level: Some(ActivityLevel::Low.label().to_string()),
            specific_interests: Some("art museums, hiking trails".to_string()),
            accommodation: Some(AccommodationPreference::Hotel.label().to_string()),
            travel_style: Some(TravelStyle::Relaxed.label().to_string()),
            must_visit_landmarks: Some("e.g., Eiffel Tower, Grand Canyon".to_string()),
        }
    }

    pub fn from_request(request: &TripRequest) -> Self {
        Self {
            source: Some(request.source.clone()),
            destination: Some(request.destination.clone()),
            start_date: Some(request.start_date.format(DATE_FORMAT).to_string()),
            budget: Some(format_budget(request.budget)),
            duration_days: Some(request.duration_days.to_string()),
            currency: Some(request.currency.as_code().to_string()),
            language: Some(request.language.label().to_string()),
            interests: Some(request.interests.clone()),
            past_destinations: Some(request.past_destinations.clone()),
            dietary_restrictions: Some(request.dietary_restrictions.clone()),
            activity_level: Some(request.activity_level.label().to_string()),
            specific_interests: Some(request.specific_interests.clone()),
            accommodation: Some(request.accommodation.label().to_string()),
            travel_style: Some(request.travel_style.label().to_string()),
            must_visit_landmarks: Some(request.must_visit_landmarks.clone()),
        }
    }

    /// Required fields that are absent or blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("source", &self.source),
            ("destination", &self.destination),
            ("start_date", &self.start_date),
            ("budget", &self.budget),
            ("duration_days", &self.duration_days),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self, today: NaiveDate) -> Result<TripRequest, PlannerError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(PlannerError::MissingInput { fields: missing });
        }

        let source = required(&self.source)?;
        let destination = required(&self.destination)?;

        let start_date = NaiveDate::parse_from_str(required(&self.start_date)?, DATE_FORMAT)
            .map_err(|_| PlannerError::invalid("start_date", "expected YYYY-MM-DD"))?;
        if start_date < today {
            return Err(PlannerError::invalid(
                "start_date",
                format!("must not precede {}", today.format(DATE_FORMAT)),
            ));
        }

        let budget = required(&self.budget)?
            .parse::<f64>()
            .map_err(|_| PlannerError::invalid("budget", "expected a number"))?;
        if !budget.is_finite() || budget < MIN_BUDGET {
            return Err(PlannerError::invalid(
                "budget",
                format!("must be at least {}", MIN_BUDGET),
            ));
        }

        let duration_days = required(&self.duration_days)?
            .parse::<u8>()
            .ok()
            .filter(|days| (MIN_DURATION_DAYS..=MAX_DURATION_DAYS).contains(days))
            .ok_or_else(|| {
                PlannerError::invalid(
                    "duration_days",
                    format!(
                        "expected a whole number of days between {} and {}",
                        MIN_DURATION_DAYS, MAX_DURATION_DAYS
                    ),
                )
            })?;

        Ok(TripRequest {
            source: source.to_string(),
            destination: destination.to_string(),
            start_date,
            budget,
            currency: choice(&self.currency, "currency", Currency::parse, Currency::Usd)?,
            duration_days,
            language: choice(&self.language, "language", Language::parse, Language::English)?,
            interests: text(&self.interests),
            past_destinations: text(&self.past_destinations),
            dietary_restrictions: text(&self.dietary_restrictions),
            activity_level: choice(
                &self.activity_level,
                "activity_level",
                ActivityLevel::parse,
                ActivityLevel::Low,
            )?,
            specific_interests: text(&self.specific_interests),
            accommodation: choice(
                &self.accommodation,
                "accommodation",
                AccommodationPreference::parse,
                AccommodationPreference::Hotel,
            )?,
            travel_style: choice(
                &self.travel_style,
                "travel_style",
                TravelStyle::parse,
                TravelStyle::Relaxed,
            )?,
            must_visit_landmarks: text(&self.must_visit_landmarks),
        })
    }
}

/// Whole budgets render without a trailing `.0`.
pub fn format_budget(budget: f64) -> String {
    if budget.fract() == 0.0 && budget.abs() < 1e15 {
        format!("{}", budget as i64)
    } else {
        format!("{:.2}", budget)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn required(value: &Option<String>) -> Result<&str, PlannerError> {
    present(value).ok_or(PlannerError::MissingInput { fields: Vec::new() })
}

fn text(value: &Option<String>) -> String {
    present(value).unwrap_or_default().to_string()
}

fn choice<T>(
    value: &Option<String>,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
    default: T,
) -> Result<T, PlannerError> {
    match present(value) {
        None => Ok(default),
        Some(raw) => parse(raw)
            .ok_or_else(|| PlannerError::invalid(field, format!("unknown value {raw:?}"))),
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextOrNumber;

    impl<'de> Visitor<'de> for TextOrNumber {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(TextOrNumber)
        }
    }

    deserializer.deserialize_any(TextOrNumber)
}
