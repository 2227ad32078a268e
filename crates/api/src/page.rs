use anyhow::{Context, Result};
use chrono::NaiveDate;
use handlebars::Handlebars;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde::Serialize;
use wayfinder_core::form::{
    format_budget, BUDGET_STEP, DATE_FORMAT, MAX_DURATION_DAYS, MIN_BUDGET, MIN_DURATION_DAYS,
};
use wayfinder_core::{
    AccommodationPreference, ActivityLevel, Currency, Language, MapView, PlanOutcome,
    PlannerError, SessionView, TravelStyle, TripForm,
};

const INDEX_TEMPLATE_NAME: &str = "index";
const INDEX_TEMPLATE: &str = include_str!("../templates/index.hbs");

/// Renders the single planner page from the session state.
pub struct PageRenderer {
    registry: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string(INDEX_TEMPLATE_NAME, INDEX_TEMPLATE)
            .context("failed to register page template")?;
        Ok(Self { registry })
    }

    pub fn render(&self, page: &Page<'_>) -> Result<String> {
        let context = PageContext::build(page)?;
        self.registry
            .render(INDEX_TEMPLATE_NAME, &context)
            .context("failed to render page")
    }
}

pub struct Page<'a> {
    pub today: NaiveDate,
    pub form: &'a TripForm,
    pub view: &'a SessionView,
    pub notice: Option<Notice>,
}

/// A message shown above the results when a submission did not produce a new plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: &'static str,
    pub message: String,
}

impl Notice {
    pub fn from_error(error: &PlannerError) -> Self {
        match error {
            PlannerError::MissingInput { fields } => Self {
                kind: "missing",
                message: format!(
                    "Please fill in all required fields: {}.",
                    fields
                        .iter()
                        .map(|field| field_label(field))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            },
            PlannerError::InvalidInput { field, reason } => Self {
                kind: "invalid",
                message: format!("{}: {reason}.", field_label(field)),
            },
            other => Self {
                kind: "service",
                message: format!("The travel plan could not be generated. {other}"),
            },
        }
    }
}

pub fn field_label(field: &str) -> &'static str {
    match field {
        "source" => "Source",
        "destination" => "Destination",
        "start_date" => "Travel Start Date",
        "budget" => "Budget",
        "currency" => "Currency",
        "duration_days" => "Duration (days)",
        "language" => "Language",
        "interests" => "Interests",
        "past_destinations" => "Past Travel Destinations",
        "dietary_restrictions" => "Dietary Restrictions",
        "activity_level" => "Activity Level",
        "specific_interests" => "Specific Interests",
        "accommodation" => "Accommodation Preference",
        "travel_style" => "Travel Style",
        "must_visit_landmarks" => "Must-Visit Landmarks",
        _ => "Field",
    }
}

#[derive(Serialize)]
struct PageContext<'a> {
    form: FormValues<'a>,
    limits: Limits,
    selects: Vec<SelectField>,
    texts: Vec<TextField<'a>>,
    notice: Option<&'a Notice>,
    plan: Option<PlanSection>,
}

#[derive(Serialize)]
struct FormValues<'a> {
    source: &'a str,
    destination: &'a str,
    start_date: &'a str,
    budget: &'a str,
    duration_days: &'a str,
}

#[derive(Serialize)]
struct Limits {
    min_date: String,
    min_budget: String,
    budget_step: u32,
    min_duration: u8,
    max_duration: u8,
}

#[derive(Serialize)]
struct SelectField {
    name: &'static str,
    label: &'static str,
    options: Vec<SelectOption>,
}

#[derive(Serialize)]
struct SelectOption {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct TextField<'a> {
    name: &'static str,
    label: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct PlanSection {
    /// Markdown rendered with raw HTML escaped.
    itinerary_html: String,
    /// Map data for the inline script, present only when at least one place resolved.
    map_json: Option<String>,
    map_error: Option<String>,
}

impl<'a> PageContext<'a> {
    fn build(page: &'a Page<'a>) -> Result<Self> {
        let form = page.form;

        Ok(Self {
            form: FormValues {
                source: value(&form.source),
                destination: value(&form.destination),
                start_date: value(&form.start_date),
                budget: value(&form.budget),
                duration_days: value(&form.duration_days),
            },
            limits: Limits {
                min_date: page.today.format(DATE_FORMAT).to_string(),
                min_budget: format_budget(MIN_BUDGET),
                budget_step: BUDGET_STEP,
                min_duration: MIN_DURATION_DAYS,
                max_duration: MAX_DURATION_DAYS,
            },
            selects: select_fields(form),
            texts: vec![
                text_field("interests", &form.interests),
                text_field("past_destinations", &form.past_destinations),
                text_field("dietary_restrictions", &form.dietary_restrictions),
                text_field("specific_interests", &form.specific_interests),
                text_field("must_visit_landmarks", &form.must_visit_landmarks),
            ],
            notice: page.notice.as_ref(),
            plan: page.view.outcome().map(plan_section).transpose()?,
        })
    }
}

fn plan_section(outcome: &PlanOutcome) -> Result<PlanSection> {
    let map_json = match &outcome.map {
        Some(map) if !outcome.map_status().is_error() => Some(script_json(map)?),
        _ => None,
    };
    let map_error = map_json
        .is_none()
        .then(|| PlannerError::EmptyMap.to_string());

    Ok(PlanSection {
        itinerary_html: render_markdown(outcome.itinerary.as_str()),
        map_json,
        map_error,
    })
}

/// The model answers in markdown. Raw HTML in it is shown as text and
/// links keep only web or mail targets.
fn render_markdown(text: &str) -> String {
    let events = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: safe_url(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: safe_url(dest_url),
                title,
                id,
            }),
            other => other,
        });

    let mut rendered = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut rendered, events);
    rendered
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lowered = url.trim_start().to_ascii_lowercase();
    if ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// JSON safe to embed inside a `<script>` element.
fn script_json(map: &MapView) -> Result<String> {
    let raw = serde_json::to_string(map).context("failed to encode map view")?;
    Ok(raw
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

fn select_fields(form: &TripForm) -> Vec<SelectField> {
    vec![
        select(
            "currency",
            &form.currency,
            &Currency::ALL,
            Currency::parse,
            Currency::as_code,
        ),
        select(
            "language",
            &form.language,
            &Language::ALL,
            Language::parse,
            Language::label,
        ),
        select(
            "activity_level",
            &form.activity_level,
            &ActivityLevel::ALL,
            ActivityLevel::parse,
            ActivityLevel::label,
        ),
        select(
            "accommodation",
            &form.accommodation,
            &AccommodationPreference::ALL,
            AccommodationPreference::parse,
            AccommodationPreference::label,
        ),
        select(
            "travel_style",
            &form.travel_style,
            &TravelStyle::ALL,
            TravelStyle::parse,
            TravelStyle::label,
        ),
    ]
}

fn select<T: Copy + PartialEq>(
    name: &'static str,
    current: &Option<String>,
    all: &[T],
    parse: fn(&str) -> Option<T>,
    label: fn(T) -> &'static str,
) -> SelectField {
    let chosen = current.as_deref().and_then(parse).or(all.first().copied());

    SelectField {
        name,
        label: field_label(name),
        options: all
            .iter()
            .map(|option| SelectOption {
                value: label(*option),
                label: label(*option),
                selected: Some(*option) == chosen,
            })
            .collect(),
    }
}

fn text_field<'a>(name: &'static str, current: &'a Option<String>) -> TextField<'a> {
    TextField {
        name,
        label: field_label(name),
        value: value(current),
    }
}

fn value(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or_default()
}
