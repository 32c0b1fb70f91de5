use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::generator::{DayGenerator, GenerationRequest};
use super::guard::OwnershipGuard;
use crate::auth::Principal;
use crate::database::ItineraryStore;
use crate::itinerary::{Day, Itinerary, ItineraryError, ItineraryPatch, NewItinerary};

/// The itinerary operations exposed to callers.
///
/// Each operation runs the ownership guard, translates the patch where there
/// is one, then makes a single store call.
#[derive(Clone)]
pub struct ItineraryService {
    store: Arc<dyn ItineraryStore>,
    guard: OwnershipGuard,
}

impl ItineraryService {
    pub fn new(store: Arc<dyn ItineraryStore>, guard: OwnershipGuard) -> Self {
        Self { store, guard }
    }

    pub fn guard(&self) -> &OwnershipGuard {
        &self.guard
    }

    pub async fn health_check(&self) -> Result<(), ItineraryError> {
        self.store.health_check().await
    }

    /// The caller becomes the owner. A payload naming somebody else as owner is rejected.
    pub async fn create(&self, principal: &Principal, mut fields: NewItinerary) -> Result<Itinerary, ItineraryError> {
        if let Some(owner) = fields.owner.take() {
            self.guard.authorize_owner(principal, &owner)?;
        }

        let itinerary = self.store.create(principal.as_str(), fields).await?;
        info!("Created itinerary {} for {}", itinerary.id, principal);
        Ok(itinerary)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Itinerary, ItineraryError> {
        let itinerary = self.store.get_by_id(id).await?;
        self.guard.authorize_document(principal, &itinerary)?;
        Ok(itinerary)
    }

    pub async fn list_by_owner(&self, principal: &Principal, owner: &str) -> Result<Vec<Itinerary>, ItineraryError> {
        self.guard.authorize_owner(principal, owner)?;
        self.store.get_by_owner(owner).await
    }

    /// Apply a sparse field map (plain or dotted-path keys) as one all-or-nothing set.
    pub async fn patch(
        &self,
        principal: &Principal,
        id: Uuid,
        fields: &Map<String, Value>,
    ) -> Result<Itinerary, ItineraryError> {
        self.guard.authorize_mutation(self.store.as_ref(), principal, id).await?;
        self.apply_fields(id, fields).await
    }

    /// [`patch`](Self::patch) for a raw request body. The body must be a JSON
    /// object, checked only after the caller is cleared to mutate `id`.
    pub async fn patch_body(&self, principal: &Principal, id: Uuid, body: &Value) -> Result<Itinerary, ItineraryError> {
        self.guard.authorize_mutation(self.store.as_ref(), principal, id).await?;
        let fields = body
            .as_object()
            .ok_or_else(|| ItineraryError::invalid_payload("Patch body must be a JSON object"))?;

        self.apply_fields(id, fields).await
    }

    pub async fn append_day(&self, principal: &Principal, id: Uuid, day: Day) -> Result<Itinerary, ItineraryError> {
        self.guard.authorize_mutation(self.store.as_ref(), principal, id).await?;
        self.push_day(id, day).await
    }

    /// [`append_day`](Self::append_day) for a raw request body, parsed once the
    /// caller is cleared to mutate `id`.
    pub async fn append_day_body(&self, principal: &Principal, id: Uuid, body: Value) -> Result<Itinerary, ItineraryError> {
        self.guard.authorize_mutation(self.store.as_ref(), principal, id).await?;
        let day = Day::from_json(body)?;

        self.push_day(id, day).await
    }

    pub async fn remove_day(&self, principal: &Principal, id: Uuid, index: usize) -> Result<Itinerary, ItineraryError> {
        self.guard.authorize_mutation(self.store.as_ref(), principal, id).await?;

        let itinerary = self.store.remove_day_at(id, index).await?;
        debug!("Removed day {} from itinerary {}", index, id);
        Ok(itinerary)
    }

    /// Deleting an id that no longer resolves succeeds without doing anything.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ItineraryError> {
        match self.guard.authorize_mutation(self.store.as_ref(), principal, id).await {
            Ok(()) => {}
            Err(ItineraryError::NotFound(_)) => return Ok(()),
            Err(other) => return Err(other),
        }

        if self.store.delete(id).await? {
            info!("Deleted itinerary {}", id);
        }
        Ok(())
    }

    /// Remove every itinerary of `owner`, used when an account is closed.
    pub async fn delete_by_owner(&self, principal: &Principal, owner: &str) -> Result<u64, ItineraryError> {
        self.guard.authorize_owner(principal, owner)?;

        let deleted = self.store.delete_by_owner(owner).await?;
        info!("Deleted {} itinerary(ies) of {}", deleted, owner);
        Ok(deleted)
    }

    /// Ask `generator` for days and append them one by one.
    ///
    /// Every day is its own durable append, so a failure part way through
    /// leaves the days appended so far in place.
    pub async fn append_generated_days(
        &self,
        principal: &Principal,
        id: Uuid,
        generator: &dyn DayGenerator,
        request: &GenerationRequest,
    ) -> Result<Itinerary, ItineraryError> {
        self.guard.authorize_mutation(self.store.as_ref(), principal, id).await?;

        let days = generator
            .generate(request)
            .await
            .map_err(|e| ItineraryError::Upstream(e.to_string()))?;

        let mut itinerary = None;
        for day in days {
            itinerary = Some(self.append_day(principal, id, day).await?);
        }

        match itinerary {
            Some(itinerary) => Ok(itinerary),
            None => self.get(principal, id).await,
        }
    }

    async fn apply_fields(&self, id: Uuid, fields: &Map<String, Value>) -> Result<Itinerary, ItineraryError> {
        let patch = ItineraryPatch::translate(fields)?;

        let itinerary = self.store.apply_patch(id, &patch).await?;
        debug!("Patched itinerary {} ({} field(s))", id, patch.instructions().len());
        Ok(itinerary)
    }

    async fn push_day(&self, id: Uuid, day: Day) -> Result<Itinerary, ItineraryError> {
        let itinerary = self.store.append_day(id, day).await?;
        debug!("Appended day {} to itinerary {}", itinerary.day_count(), id);
        Ok(itinerary)
    }
}
