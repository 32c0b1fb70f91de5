use jsonwebtoken::Algorithm;
use std::sync::Arc;

use crate::auth::{generate_jwt, Claims, JwtCredentialResolver, JwtKeys, Principal};
use crate::database::{ItineraryStore, MemoryItineraryStore};
use crate::itinerary::{Day, Itinerary, NewItinerary, PlaceEntry};
use crate::services::{ItineraryService, OwnershipGuard};

pub const TEST_JWT_SECRET: &str = "unit-test-secret";

/// Service wired over a fresh in-memory store, plus token minting for the same keys
pub struct TestContext {
    pub service: ItineraryService,
    pub store: MemoryItineraryStore,
    keys: JwtKeys,
}

impl TestContext {
    pub fn new() -> Self {
        let keys = JwtKeys::new(TEST_JWT_SECRET, Algorithm::HS256).expect("test keys");
        let store = MemoryItineraryStore::new();
        let guard = OwnershipGuard::new(Arc::new(JwtCredentialResolver::new(keys.clone())));
        let service = ItineraryService::new(Arc::new(store.clone()), guard);

        Self { service, store, keys }
    }

    pub fn principal(&self, id: &str) -> Principal {
        Principal::new(id)
    }

    pub fn token_for(&self, sub: &str) -> String {
        generate_jwt(&Claims::new(sub, 1), &self.keys).expect("sign test token")
    }

    /// Insert an itinerary for `owner` with `days` days of one unchecked place each,
    /// bypassing the guard.
    pub async fn seed(&self, owner: &str, days: usize) -> Itinerary {
        let fields = NewItinerary {
            destination: Some("Lisbon".to_string()),
            country: Some("Portugal".to_string()),
            city: Some("Lisbon".to_string()),
            itinerary: (0..days).map(|n| sample_day(&format!("Day {}", n + 1), n)).collect(),
            ..NewItinerary::default()
        };

        self.store.create(owner, fields).await.expect("seed itinerary")
    }
}

/// A day with a single unchecked place named after `ordinal`
pub fn sample_day(label: &str, ordinal: usize) -> Day {
    Day::new(
        label,
        vec![PlaceEntry::new(
            format!("Place {}", ordinal + 1),
            format!("Stop number {}", ordinal + 1),
        )],
    )
}
