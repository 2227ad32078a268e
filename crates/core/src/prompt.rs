use crate::form::{format_budget, DATE_FORMAT};
use crate::models::TripRequest;

const UNSPECIFIED: &str = "none specified";

/// Interpolates every field of the request into the fixed itinerary prompt.
pub fn build_itinerary_prompt(request: &TripRequest) -> String {
    format!(
        "Create a detailed travel itinerary from {source} to {destination}, starting on {date}, \
         lasting for {days} days, with a budget of {currency} {budget}. \
         Include interests like {interests}, past travel experiences like {past}, \
         and any dietary restrictions: {dietary}. \
         Must-visit landmarks include {landmarks}. \
         Specific interests: {specific}. \
         Preferred activity level: {activity}. \
         Accommodation preference: {accommodation}. \
         Travel style: {style}. \
         Write the itinerary in {language}.",
        source = request.source,
        destination = request.destination,
        date = request.start_date.format(DATE_FORMAT),
        days = request.duration_days,
        currency = request.currency.as_code(),
        budget = format_budget(request.budget),
        interests = or_unspecified(&request.interests),
        past = or_unspecified(&request.past_destinations),
        dietary = or_unspecified(&request.dietary_restrictions),
        landmarks = or_unspecified(&request.must_visit_landmarks),
        specific = or_unspecified(&request.specific_interests),
        activity = request.activity_level.label(),
        accommodation = request.accommodation.label(),
        style = request.travel_style.label(),
        language = request.language.label(),
    )
}

fn or_unspecified(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNSPECIFIED
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::form::TripForm;
    use crate::models::{Currency, Language, TravelStyle};

    fn request() -> TripRequest {
        let today = NaiveDate::from_ymd_opt(2026, 7, 14).unwrap();
        TripForm::defaults(today).validate(today).unwrap()
    }

    #[test]
    fn prompt_mentions_every_field() {
        let mut request = request();
        request.currency = Currency::Eur;
        request.language = Language::French;
        request.travel_style = TravelStyle::Adventurous;
        request.dietary_restrictions = "vegetarian".to_string();

        let prompt = build_itinerary_prompt(&request);
        for needle in [
            "from New York to Los Angeles",
            "starting on 2026-07-14",
            "lasting for 7 days",
            "budget of EUR 1000",
            "historical sites, nature",
            "Paris, Tokyo",
            "vegetarian",
            "Eiffel Tower, Grand Canyon",
            "art museums, hiking trails",
            "activity level: Low",
            "Accommodation preference: Hotel",
            "Travel style: Adventurous",
            "in French",
        ] {
            assert!(prompt.contains(needle), "prompt missing {needle:?}: {prompt}");
        }
    }

    #[test]
    fn blank_preferences_render_as_unspecified() {
        let mut request = request();
        request.interests = "  ".to_string();
        let prompt = build_itinerary_prompt(&request);
        assert!(prompt.contains("interests like none specified"));
    }
}
