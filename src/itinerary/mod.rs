pub mod coerce;
pub mod error;
pub mod model;
pub mod patch;

pub use error::ItineraryError;
pub use model::{Day, Itinerary, ItineraryState, NewItinerary, PlaceEntry, UNDEFINED_LABEL};
pub use patch::{DocumentShape, FieldPath, ItineraryPatch, PatchValue, PlaceField, SetInstruction, TopField};

use uuid::Uuid;

/// Parse an itinerary id taken from a request path.
///
/// A malformed id can never resolve, so it reports the same `NotFound` as an
/// id that was deleted or never existed.
pub fn parse_id(raw: &str) -> Result<Uuid, ItineraryError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ItineraryError::not_found(raw))
}
