pub mod error;
pub mod form;
pub mod models;
pub mod prompt;

pub use error::PlannerError;
pub use form::TripForm;
pub use models::*;
pub use prompt::build_itinerary_prompt;
