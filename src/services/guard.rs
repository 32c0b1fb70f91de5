use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::auth::{CredentialResolver, Principal};
use crate::database::ItineraryStore;
use crate::itinerary::{Itinerary, ItineraryError};

/// Authorization layer in front of every itinerary read and write.
///
/// A missing or invalid credential fails before any store access. A valid
/// principal that does not own the target gets `Unauthorized`; a target that
/// does not exist gets `NotFound`. The guard never mutates anything.
#[derive(Clone)]
pub struct OwnershipGuard {
    resolver: Arc<dyn CredentialResolver>,
}

impl OwnershipGuard {
    pub fn new(resolver: Arc<dyn CredentialResolver>) -> Self {
        Self { resolver }
    }

    pub fn authenticate(&self, credential: Option<&str>) -> Result<Principal, ItineraryError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ItineraryError::Unauthenticated("Token not provided".to_string()))?;

        self.resolver.resolve(credential)
    }

    /// Owner-scoped operations (listing, bulk delete) compare against the requested owner id.
    pub fn authorize_owner(&self, principal: &Principal, owner: &str) -> Result<(), ItineraryError> {
        if principal.as_str() == owner {
            Ok(())
        } else {
            warn!("Principal {} denied access to itineraries of {}", principal, owner);
            Err(ItineraryError::Unauthorized(format!(
                "itineraries of '{}' belong to another user",
                owner
            )))
        }
    }

    pub fn authorize_document(&self, principal: &Principal, itinerary: &Itinerary) -> Result<(), ItineraryError> {
        self.authorize_target(principal, itinerary.id, &itinerary.owner)
    }

    /// Read only the current owner of `id` and check it, ahead of a mutation.
    pub async fn authorize_mutation(
        &self,
        store: &dyn ItineraryStore,
        principal: &Principal,
        id: Uuid,
    ) -> Result<(), ItineraryError> {
        let owner = store.get_owner(id).await?;
        self.authorize_target(principal, id, &owner)
    }

    fn authorize_target(&self, principal: &Principal, id: Uuid, owner: &str) -> Result<(), ItineraryError> {
        if principal.as_str() == owner {
            return Ok(());
        }
        warn!("Principal {} denied access to itinerary {}", principal, id);
        Err(ItineraryError::Unauthorized(format!("itinerary {} belongs to another user", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryItineraryStore;
    use crate::itinerary::NewItinerary;

    struct FixedResolver;

    impl CredentialResolver for FixedResolver {
        fn resolve(&self, credential: &str) -> Result<Principal, ItineraryError> {
            credential
                .strip_prefix("user:")
                .map(Principal::new)
                .ok_or_else(|| ItineraryError::Unauthenticated("Token not valid".to_string()))
        }
    }

    fn guard() -> OwnershipGuard {
        OwnershipGuard::new(Arc::new(FixedResolver))
    }

    #[test]
    fn missing_or_blank_credential_is_unauthenticated() {
        assert!(matches!(guard().authenticate(None), Err(ItineraryError::Unauthenticated(_))));
        assert!(matches!(guard().authenticate(Some("  ")), Err(ItineraryError::Unauthenticated(_))));
        assert!(matches!(guard().authenticate(Some("bogus")), Err(ItineraryError::Unauthenticated(_))));
        assert_eq!(guard().authenticate(Some("user:u1")).unwrap(), Principal::new("u1"));
    }

    #[test]
    fn owner_comparison_is_exact() {
        let guard = guard();
        assert!(guard.authorize_owner(&Principal::new("u1"), "u1").is_ok());
        assert!(matches!(
            guard.authorize_owner(&Principal::new("u1"), "U1"),
            Err(ItineraryError::Unauthorized(_))
        ));
        assert!(matches!(
            guard.authorize_owner(&Principal::new("u1"), "u1 "),
            Err(ItineraryError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn mutation_check_distinguishes_missing_from_foreign() {
        let store = MemoryItineraryStore::new();
        let itinerary = store.create("u1", NewItinerary::default()).await.unwrap();
        let guard = guard();

        assert!(guard
            .authorize_mutation(&store, &Principal::new("u1"), itinerary.id)
            .await
            .is_ok());
        assert!(matches!(
            guard.authorize_mutation(&store, &Principal::new("u2"), itinerary.id).await,
            Err(ItineraryError::Unauthorized(_))
        ));
        assert!(matches!(
            guard.authorize_mutation(&store, &Principal::new("u1"), Uuid::new_v4()).await,
            Err(ItineraryError::NotFound(_))
        ));
    }
}
