use thiserror::Error;

use crate::models::PlaceName;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("missing required fields: {}", fields.join(", "))]
    MissingInput { fields: Vec<&'static str> },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("{service} request failed: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    #[error("no coordinates found for {name}")]
    GeocodeMiss { name: PlaceName },

    #[error("Unable to generate map. Check if the location names are correct and try again.")]
    EmptyMap,
}

impl PlannerError {
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            service,
            message: message.into(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "missing_input",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Service { .. } => "service_error",
            Self::GeocodeMiss { .. } => "geocode_miss",
            Self::EmptyMap => "empty_map",
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingInput { .. } | Self::InvalidInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_lists_fields() {
        let error = PlannerError::MissingInput {
            fields: vec!["source", "budget"],
        };
        assert_eq!(error.to_string(), "missing required fields: source, budget");
        assert!(error.is_input_error());
    }

    #[test]
    fn empty_map_message_is_user_facing() {
        assert!(PlannerError::EmptyMap
            .to_string()
            .starts_with("Unable to generate map"));
    }

    #[test]
    fn geocode_miss_names_the_place() {
        let miss = PlannerError::GeocodeMiss {
            name: PlaceName::new("Nowhereland123"),
        };
        assert_eq!(miss.code(), "geocode_miss");
        assert_eq!(miss.to_string(), "no coordinates found for Nowhereland123");
        assert!(!miss.is_input_error());
    }
}
