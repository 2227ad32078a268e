use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use wayfinder_agents::{PlannerConfig, TripPlanner};
use wayfinder_core::{ItineraryText, PlaceName, TripForm};
use wayfinder_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "wayfinder")]
#[command(about = "AI travel planner: itinerary, places and map markers")]
struct Cli {
    #[arg(long, env = "WAYFINDER_GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[arg(long, env = "WAYFINDER_GEMINI_MODEL", global = true)]
    model: Option<String>,

    #[arg(long, env = "WAYFINDER_GEOCODER_URL", global = true)]
    geocoder_url: Option<String>,

    /// JSONL gazetteer used for place recognition.
    #[arg(long, env = "WAYFINDER_GAZETTEER", global = true)]
    gazetteer: Option<PathBuf>,

    /// Parallel geocoding lookups (1 keeps the public Nominatim policy).
    #[arg(long, env = "WAYFINDER_GEOCODE_CONCURRENCY", global = true)]
    geocode_concurrency: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a plan and print the outcome as JSON.
    Plan(PlanArgs),
    /// List the place names found in TEXT, or in stdin when TEXT is omitted.
    Extract { text: Option<String> },
    /// Resolve one place name to coordinates.
    Geocode { name: String },
}

/// Unset flags keep the web form's defaults.
#[derive(Debug, Args)]
struct PlanArgs {
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    destination: Option<String>,
    /// YYYY-MM-DD, defaults to today.
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    budget: Option<String>,
    #[arg(long)]
    currency: Option<String>,
    #[arg(long)]
    duration_days: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    interests: Option<String>,
    #[arg(long)]
    past_destinations: Option<String>,
    #[arg(long)]
    dietary_restrictions: Option<String>,
    #[arg(long)]
    activity_level: Option<String>,
    #[arg(long)]
    specific_interests: Option<String>,
    #[arg(long)]
    accommodation: Option<String>,
    #[arg(long)]
    travel_style: Option<String>,
    #[arg(long)]
    must_visit_landmarks: Option<String>,
}

impl PlanArgs {
    fn apply_to(self, form: &mut TripForm) {
        let overrides = [
            (&mut form.source, self.source),
            (&mut form.destination, self.destination),
            (&mut form.start_date, self.start_date),
            (&mut form.budget, self.budget),
            (&mut form.currency, self.currency),
            (&mut form.duration_days, self.duration_days),
            (&mut form.language, self.language),
            (&mut form.interests, self.interests),
            (&mut form.past_destinations, self.past_destinations),
            (&mut form.dietary_restrictions, self.dietary_restrictions),
            (&mut form.activity_level, self.activity_level),
            (&mut form.specific_interests, self.specific_interests),
            (&mut form.accommodation, self.accommodation),
            (&mut form.travel_style, self.travel_style),
            (&mut form.must_visit_landmarks, self.must_visit_landmarks),
        ];
        for (field, value) in overrides {
            if value.is_some() {
                *field = value;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfinder_cli");
    let cli = Cli::parse();

    let mut config = PlannerConfig::from_env();
    if let Some(api_key) = cli.api_key.filter(|key| !key.trim().is_empty()) {
        config.gemini_api_key = Some(api_key);
    }
    if let Some(model) = cli.model {
        config.gemini_model = model;
    }
    if let Some(url) = cli.geocoder_url {
        config.geocoder_url = url;
    }
    if let Some(path) = cli.gazetteer {
        config.gazetteer_path = Some(path);
    }
    if let Some(concurrency) = cli.geocode_concurrency {
        config.geocode_concurrency = concurrency;
    }
    let planner = TripPlanner::from_config(&config, AppMetrics::shared())?;

    match cli.command {
        Command::Plan(args) => {
            let today = Local::now().date_naive();
            let mut form = TripForm::defaults(today);
            args.apply_to(&mut form);

            let outcome = planner.submit(&form, today).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Extract { text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buffer = String::new();
                    io::stdin()
                        .read_to_string(&mut buffer)
                        .context("failed to read itinerary text from stdin")?;
                    buffer
                }
            };
            let places = planner.extract_places(&ItineraryText::new(text));
            println!("{}", serde_json::to_string_pretty(&places)?);
        }
        Command::Geocode { name } => {
            let coordinate = planner.geocode(&PlaceName::new(name)).await;
            println!("{}", serde_json::to_string_pretty(&coordinate)?);
        }
    }

    Ok(())
}
