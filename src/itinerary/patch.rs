//! Translation of flat, dotted-path field maps into targeted set instructions.
//!
//! A client edits one checkbox by sending
//! `{"itinerary.0.description.2.checked": "true"}`. The translator parses each
//! key into a [`FieldPath`], casts the value to the field's type and checks
//! every day/place index against the document's current [`DocumentShape`]
//! before any store applies anything.
//!
//! Day and place positions are the only addressing scheme. They are ephemeral:
//! after a day is removed every later index shifts down by one.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use super::coerce;
use super::error::ItineraryError;
use super::model::{Day, Itinerary, ItineraryState};

/// Top-level fields writable through a patch. `id` and `owner` are not among them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopField {
    Destination,
    Country,
    City,
    StartDate,
    EndDate,
    State,
    Stars,
    Itinerary,
}

impl TopField {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "destination" => TopField::Destination,
            "country" => TopField::Country,
            "city" => TopField::City,
            "startDate" => TopField::StartDate,
            "endDate" => TopField::EndDate,
            "state" => TopField::State,
            "stars" => TopField::Stars,
            "itinerary" => TopField::Itinerary,
            _ => return None,
        })
    }

    pub fn key(&self) -> &'static str {
        match self {
            TopField::Destination => "destination",
            TopField::Country => "country",
            TopField::City => "city",
            TopField::StartDate => "startDate",
            TopField::EndDate => "endDate",
            TopField::State => "state",
            TopField::Stars => "stars",
            TopField::Itinerary => "itinerary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceField {
    Place,
    Description,
    Tips,
    Checked,
}

impl PlaceField {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "place" => PlaceField::Place,
            "description" => PlaceField::Description,
            "tips" => PlaceField::Tips,
            "checked" => PlaceField::Checked,
            _ => return None,
        })
    }

    pub fn key(&self) -> &'static str {
        match self {
            PlaceField::Place => "place",
            PlaceField::Description => "description",
            PlaceField::Tips => "tips",
            PlaceField::Checked => "checked",
        }
    }
}

/// The scalar (or whole day list) a single patch key addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    Top(TopField),
    DayLabel { day: usize },
    Place { day: usize, place: usize, field: PlaceField },
}

impl FieldPath {
    pub fn parse(key: &str) -> Result<Self, ItineraryError> {
        let segments: Vec<&str> = key.split('.').collect();

        match segments.as_slice() {
            [name] => match TopField::parse(name) {
                Some(field) => Ok(FieldPath::Top(field)),
                None if matches!(*name, "id" | "_id" | "owner") => {
                    Err(ItineraryError::validation(key, format!("'{}' cannot be changed", name)))
                }
                None => Err(ItineraryError::validation(key, format!("unknown field '{}'", name))),
            },
            ["itinerary", day, "day"] => Ok(FieldPath::DayLabel {
                day: parse_index(key, day)?,
            }),
            ["itinerary", day, "description", place, field] => {
                let day = parse_index(key, day)?;
                let place = parse_index(key, place)?;
                let field = PlaceField::parse(field)
                    .ok_or_else(|| ItineraryError::validation(key, format!("unknown place field '{}'", field)))?;
                Ok(FieldPath::Place { day, place, field })
            }
            ["itinerary", ..] => Err(ItineraryError::validation(
                key,
                "expected itinerary.<day>.day or itinerary.<day>.description.<place>.<field>",
            )),
            [name, ..] if TopField::parse(name).is_some() => {
                Err(ItineraryError::validation(key, format!("'{}' has no nested fields", name)))
            }
            _ => Err(ItineraryError::validation(key, "unknown field path")),
        }
    }

    /// Segments of the addressed location inside the stored JSON document.
    pub fn json_path(&self) -> Vec<String> {
        match self {
            FieldPath::Top(field) => vec![field.key().to_string()],
            FieldPath::DayLabel { day } => vec!["itinerary".into(), day.to_string(), "day".into()],
            FieldPath::Place { day, place, field } => vec![
                "itinerary".into(),
                day.to_string(),
                "description".into(),
                place.to_string(),
                field.key().to_string(),
            ],
        }
    }

    fn is_nested(&self) -> bool {
        !matches!(self, FieldPath::Top(_))
    }

    fn coerce(&self, key: &str, value: &Value) -> Result<PatchValue, ItineraryError> {
        let invalid = |message: String| ItineraryError::validation(key, message);

        match self {
            FieldPath::Top(TopField::Destination | TopField::Country | TopField::City)
            | FieldPath::DayLabel { .. }
            | FieldPath::Place { field: PlaceField::Place | PlaceField::Description, .. } => {
                coerce::to_text(value).map(PatchValue::Text).map_err(invalid)
            }
            FieldPath::Place { field: PlaceField::Tips, .. } => {
                coerce::to_optional_text(value).map(PatchValue::OptionalText).map_err(invalid)
            }
            FieldPath::Place { field: PlaceField::Checked, .. } => {
                coerce::to_bool(value).map(PatchValue::Bool).map_err(invalid)
            }
            FieldPath::Top(TopField::StartDate | TopField::EndDate) => {
                coerce::to_optional_date(value).map(PatchValue::Date).map_err(invalid)
            }
            FieldPath::Top(TopField::Stars) => {
                coerce::to_optional_number(value).map(PatchValue::Number).map_err(invalid)
            }
            FieldPath::Top(TopField::State) => value
                .as_str()
                .ok_or_else(|| "expected Planning, Planned or Done".to_string())
                .and_then(str::parse)
                .map(PatchValue::State)
                .map_err(invalid),
            FieldPath::Top(TopField::Itinerary) => serde_json::from_value::<Vec<Day>>(value.clone())
                .map(PatchValue::Days)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.json_path().join("."))
    }
}

/// Parse a path segment as a zero-based position; `key` names the field in errors
pub fn parse_index(key: &str, segment: &str) -> Result<usize, ItineraryError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ItineraryError::validation(
            key,
            format!("'{}' is not a non-negative integer index", segment),
        ));
    }
    segment
        .parse()
        .map_err(|_| ItineraryError::validation(key, format!("index '{}' is too large", segment)))
}

/// A value already cast to the type of the field it targets
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatchValue {
    Text(String),
    OptionalText(Option<String>),
    Bool(bool),
    Date(Option<NaiveDate>),
    Number(Option<f64>),
    State(ItineraryState),
    Days(Vec<Day>),
}

/// One store-level "set this location to this value" instruction
#[derive(Debug, Clone, PartialEq)]
pub struct SetInstruction {
    pub path: FieldPath,
    pub value: PatchValue,
}

impl SetInstruction {
    pub fn json_path(&self) -> Vec<String> {
        self.path.json_path()
    }

    pub fn json_value(&self) -> Result<Value, ItineraryError> {
        serde_json::to_value(&self.value).map_err(|e| ItineraryError::invalid_payload(e.to_string()))
    }
}

/// Lengths of the day list and of each day's place list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentShape {
    pub place_counts: Vec<usize>,
}

impl DocumentShape {
    pub fn of(itinerary: &Itinerary) -> Self {
        Self {
            place_counts: itinerary.itinerary.iter().map(|d| d.description.len()).collect(),
        }
    }

    pub fn day_count(&self) -> usize {
        self.place_counts.len()
    }
}

/// A translated sparse patch. Applying it twice is the same as applying it once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItineraryPatch {
    instructions: Vec<SetInstruction>,
}

impl ItineraryPatch {
    pub fn translate(fields: &Map<String, Value>) -> Result<Self, ItineraryError> {
        let mut instructions = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let path = FieldPath::parse(key)?;
            let value = path.coerce(key, value)?;
            instructions.push(SetInstruction { path, value });
        }

        let replaces_days = instructions
            .iter()
            .any(|i| i.path == FieldPath::Top(TopField::Itinerary));
        if replaces_days && instructions.iter().any(|i| i.path.is_nested()) {
            return Err(ItineraryError::validation(
                "itinerary",
                "cannot replace the day list and edit individual days in the same patch",
            ));
        }

        Ok(Self { instructions })
    }

    pub fn from_json(payload: &Value) -> Result<Self, ItineraryError> {
        let fields = payload
            .as_object()
            .ok_or_else(|| ItineraryError::invalid_payload("Patch payload must be a JSON object"))?;
        Self::translate(fields)
    }

    pub fn instructions(&self) -> &[SetInstruction] {
        &self.instructions
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Check every addressed day/place position against the document's current shape.
    pub fn validate(&self, shape: &DocumentShape) -> Result<(), ItineraryError> {
        for instruction in &self.instructions {
            match instruction.path {
                FieldPath::Top(_) => {}
                FieldPath::DayLabel { day } => {
                    check_day(shape, day)?;
                }
                FieldPath::Place { day, place, .. } => {
                    let places = check_day(shape, day)?;
                    if place >= places {
                        return Err(ItineraryError::invalid_index(
                            format!("itinerary.{}.description", day),
                            place,
                            places,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply to an in-memory document. Nothing is written unless every index is valid.
    pub fn apply(&self, itinerary: &mut Itinerary) -> Result<(), ItineraryError> {
        self.validate(&DocumentShape::of(itinerary))?;

        for SetInstruction { path, value } in &self.instructions {
            match (*path, value.clone()) {
                (FieldPath::Top(TopField::Destination), PatchValue::Text(v)) => itinerary.destination = v,
                (FieldPath::Top(TopField::Country), PatchValue::Text(v)) => itinerary.country = v,
                (FieldPath::Top(TopField::City), PatchValue::Text(v)) => itinerary.city = v,
                (FieldPath::Top(TopField::StartDate), PatchValue::Date(v)) => itinerary.start_date = v,
                (FieldPath::Top(TopField::EndDate), PatchValue::Date(v)) => itinerary.end_date = v,
                (FieldPath::Top(TopField::State), PatchValue::State(v)) => itinerary.state = v,
                (FieldPath::Top(TopField::Stars), PatchValue::Number(v)) => itinerary.stars = v,
                (FieldPath::Top(TopField::Itinerary), PatchValue::Days(v)) => itinerary.itinerary = v,
                (FieldPath::DayLabel { day }, PatchValue::Text(v)) => itinerary.itinerary[day].day = v,
                (FieldPath::Place { day, place, field }, value) => {
                    let entry = &mut itinerary.itinerary[day].description[place];
                    match (field, value) {
                        (PlaceField::Place, PatchValue::Text(v)) => entry.place = v,
                        (PlaceField::Description, PatchValue::Text(v)) => entry.description = v,
                        (PlaceField::Tips, PatchValue::OptionalText(v)) => entry.tips = v,
                        (PlaceField::Checked, PatchValue::Bool(v)) => entry.checked = v,
                        (field, value) => return Err(mismatch(path, field.key(), &value)),
                    }
                }
                (path, value) => return Err(mismatch(&path, "field", &value)),
            }
        }
        Ok(())
    }
}

fn check_day(shape: &DocumentShape, day: usize) -> Result<usize, ItineraryError> {
    shape
        .place_counts
        .get(day)
        .copied()
        .ok_or_else(|| ItineraryError::invalid_index("itinerary", day, shape.day_count()))
}

// Only reachable if coerce() and apply() disagree about a field's type.
fn mismatch(path: &FieldPath, field: &str, value: &PatchValue) -> ItineraryError {
    ItineraryError::validation(path.to_string(), format!("value {:?} does not fit {}", value, field))
}
