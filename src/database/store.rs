use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::itinerary::{Day, Itinerary, ItineraryError, ItineraryPatch, NewItinerary};

/// Persistence contract for itinerary documents.
///
/// Every method is one durable read or write. Nothing is batched across
/// calls and there is no concurrency control: two writers touching the same
/// field race and the last one wins.
#[async_trait]
pub trait ItineraryStore: Send + Sync {
    /// Persist a new document for `owner`, assigning its id.
    async fn create(&self, owner: &str, fields: NewItinerary) -> Result<Itinerary, ItineraryError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Itinerary, ItineraryError>;

    /// Owner of a document, without loading the rest of it.
    async fn get_owner(&self, id: Uuid) -> Result<String, ItineraryError>;

    /// All documents for `owner` in creation order. Empty when there are none.
    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Itinerary>, ItineraryError>;

    /// Set every addressed field, or none of them when an index is out of range.
    async fn apply_patch(&self, id: Uuid, patch: &ItineraryPatch) -> Result<Itinerary, ItineraryError>;

    async fn append_day(&self, id: Uuid, day: Day) -> Result<Itinerary, ItineraryError>;

    async fn remove_day_at(&self, id: Uuid, index: usize) -> Result<Itinerary, ItineraryError>;

    /// Returns whether a document was removed. Deleting a missing id is not an error.
    async fn delete(&self, id: Uuid) -> Result<bool, ItineraryError>;

    /// Remove every document for `owner`, returning how many went away.
    async fn delete_by_owner(&self, owner: &str) -> Result<u64, ItineraryError>;

    async fn health_check(&self) -> Result<(), ItineraryError>;

    /// Translate a flat field map (plain or dotted-path keys) and apply it.
    async fn apply_field_map(&self, id: Uuid, fields: &Map<String, Value>) -> Result<Itinerary, ItineraryError> {
        let patch = ItineraryPatch::translate(fields)?;
        self.apply_patch(id, &patch).await
    }
}
