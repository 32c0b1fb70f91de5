use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::coerce::lenient;
use super::error::ItineraryError;

/// Placeholder label for a city or country the user has not picked yet
pub const UNDEFINED_LABEL: &str = "Undefined";

/// Planning progress of an itinerary. Any value may follow any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItineraryState {
    #[default]
    Planning,
    Planned,
    Done,
}

impl ItineraryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItineraryState::Planning => "Planning",
            ItineraryState::Planned => "Planned",
            ItineraryState::Done => "Done",
        }
    }
}

impl fmt::Display for ItineraryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItineraryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planning" => Ok(ItineraryState::Planning),
            "planned" => Ok(ItineraryState::Planned),
            "done" => Ok(ItineraryState::Done),
            _ => Err(format!("unknown state \"{}\" (expected Planning, Planned or Done)", s)),
        }
    }
}

/// A single stop within a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceEntry {
    #[serde(deserialize_with = "lenient::text")]
    pub place: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub tips: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub checked: bool,
}

impl PlaceEntry {
    pub fn new(place: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            place: place.into(),
            description: description.into(),
            tips: None,
            checked: false,
        }
    }
}

/// One position in an itinerary's day sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    #[serde(deserialize_with = "lenient::text")]
    pub day: String,
    #[serde(default)]
    pub description: Vec<PlaceEntry>,
}

impl Day {
    pub fn new(day: impl Into<String>, description: Vec<PlaceEntry>) -> Self {
        Self {
            day: day.into(),
            description,
        }
    }

    /// Parse an append-day payload. Both the label and the place list must be present.
    pub fn from_json(payload: Value) -> Result<Self, ItineraryError> {
        let object = payload
            .as_object()
            .ok_or_else(|| ItineraryError::invalid_payload("Day payload must be a JSON object"))?;

        let has_label = match object.get("day") {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !has_label || !object.contains_key("description") {
            return Err(ItineraryError::invalid_payload("Day and description are required."));
        }

        serde_json::from_value(payload).map_err(|e| ItineraryError::invalid_payload(e.to_string()))
    }
}

/// Root trip-planning document, owned by exactly one principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: Uuid,
    pub owner: String,
    pub destination: String,
    pub country: String,
    pub city: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub state: ItineraryState,
    pub stars: Option<f64>,
    pub itinerary: Vec<Day>,
}

impl Itinerary {
    pub fn day_count(&self) -> usize {
        self.itinerary.len()
    }
}

/// Fields accepted when creating an itinerary. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItinerary {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_state")]
    pub state: Option<ItineraryState>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub stars: Option<f64>,
    #[serde(default)]
    pub itinerary: Vec<Day>,
}

impl NewItinerary {
    pub fn from_json(payload: Value) -> Result<Self, ItineraryError> {
        if !payload.is_object() {
            return Err(ItineraryError::invalid_payload("Itinerary payload must be a JSON object"));
        }
        serde_json::from_value(payload).map_err(|e| ItineraryError::invalid_payload(e.to_string()))
    }

    /// Materialize the stored form, filling in defaulted fields.
    pub fn into_itinerary(self, id: Uuid, owner: impl Into<String>) -> Itinerary {
        Itinerary {
            id,
            owner: owner.into(),
            destination: self.destination.unwrap_or_default(),
            country: self.country.unwrap_or_else(|| UNDEFINED_LABEL.to_string()),
            city: self.city.unwrap_or_else(|| UNDEFINED_LABEL.to_string()),
            start_date: self.start_date,
            end_date: self.end_date,
            state: self.state.unwrap_or_default(),
            stars: self.stars,
            itinerary: self.itinerary,
        }
    }
}

fn optional_state<'de, D>(deserializer: D) -> Result<Option<ItineraryState>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(D::Error::custom),
    }
}
