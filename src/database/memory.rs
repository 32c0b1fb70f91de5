use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::store::ItineraryStore;
use crate::itinerary::{Day, Itinerary, ItineraryError, ItineraryPatch, NewItinerary};

struct StoredItinerary {
    seq: u64,
    itinerary: Itinerary,
}

#[derive(Default)]
struct Documents {
    next_seq: u64,
    by_id: HashMap<Uuid, StoredItinerary>,
}

/// Process-local store with the same contract as the PostgreSQL store.
/// Each write holds the lock for its whole read-check-write, so a failed
/// patch never leaves a partial update behind.
#[derive(Clone, Default)]
pub struct MemoryItineraryStore {
    documents: Arc<RwLock<Documents>>,
}

impl MemoryItineraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, mutate: F) -> Result<Itinerary, ItineraryError>
    where
        F: FnOnce(&mut Itinerary) -> Result<(), ItineraryError> + Send,
    {
        let mut documents = self.documents.write().await;
        let stored = documents
            .by_id
            .get_mut(&id)
            .ok_or_else(|| ItineraryError::not_found(id))?;

        let mut updated = stored.itinerary.clone();
        mutate(&mut updated)?;
        stored.itinerary = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl ItineraryStore for MemoryItineraryStore {
    async fn create(&self, owner: &str, fields: NewItinerary) -> Result<Itinerary, ItineraryError> {
        let itinerary = fields.into_itinerary(Uuid::new_v4(), owner);

        let mut documents = self.documents.write().await;
        let seq = documents.next_seq;
        documents.next_seq += 1;
        documents.by_id.insert(
            itinerary.id,
            StoredItinerary {
                seq,
                itinerary: itinerary.clone(),
            },
        );

        debug!("Stored itinerary {} in memory", itinerary.id);
        Ok(itinerary)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Itinerary, ItineraryError> {
        let documents = self.documents.read().await;
        documents
            .by_id
            .get(&id)
            .map(|stored| stored.itinerary.clone())
            .ok_or_else(|| ItineraryError::not_found(id))
    }

    async fn get_owner(&self, id: Uuid) -> Result<String, ItineraryError> {
        let documents = self.documents.read().await;
        documents
            .by_id
            .get(&id)
            .map(|stored| stored.itinerary.owner.clone())
            .ok_or_else(|| ItineraryError::not_found(id))
    }

    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Itinerary>, ItineraryError> {
        let documents = self.documents.read().await;
        let mut owned: Vec<&StoredItinerary> = documents
            .by_id
            .values()
            .filter(|stored| stored.itinerary.owner == owner)
            .collect();
        owned.sort_by_key(|stored| stored.seq);
        Ok(owned.into_iter().map(|stored| stored.itinerary.clone()).collect())
    }

    async fn apply_patch(&self, id: Uuid, patch: &ItineraryPatch) -> Result<Itinerary, ItineraryError> {
        self.update(id, |itinerary| patch.apply(itinerary)).await
    }

    async fn append_day(&self, id: Uuid, day: Day) -> Result<Itinerary, ItineraryError> {
        self.update(id, move |itinerary| {
            itinerary.itinerary.push(day);
            Ok(())
        })
        .await
    }

    async fn remove_day_at(&self, id: Uuid, index: usize) -> Result<Itinerary, ItineraryError> {
        self.update(id, |itinerary| {
            let len = itinerary.itinerary.len();
            if index >= len {
                return Err(ItineraryError::invalid_index("itinerary", index, len));
            }
            itinerary.itinerary.remove(index);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ItineraryError> {
        let mut documents = self.documents.write().await;
        Ok(documents.by_id.remove(&id).is_some())
    }

    async fn delete_by_owner(&self, owner: &str) -> Result<u64, ItineraryError> {
        let mut documents = self.documents.write().await;
        let before = documents.by_id.len();
        documents.by_id.retain(|_, stored| stored.itinerary.owner != owner);
        Ok((before - documents.by_id.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), ItineraryError> {
        Ok(())
    }
}
