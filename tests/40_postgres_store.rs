//! JSONB store behaviour against a live database.
//!
//! Runs only when DATABASE_URL is set; otherwise each test returns early.

use anyhow::Result;
use chrono::NaiveDate;
use globetrek_api::config::DatabaseConfig;
use globetrek_api::database::{DatabaseManager, ItineraryStore, PgItineraryStore};
use globetrek_api::itinerary::{
    Day, ItineraryError, ItineraryPatch, ItineraryState, NewItinerary, PlaceEntry,
};
use serde_json::json;
use uuid::Uuid;

async fn connect() -> Result<Option<PgItineraryStore>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL store test");
        return Ok(None);
    };

    let manager = DatabaseManager::connect(&DatabaseConfig {
        url: Some(url),
        max_connections: 2,
        connection_timeout: 10,
        run_migrations: true,
    })
    .await?;
    manager.migrate().await?;
    Ok(Some(PgItineraryStore::new(manager.pool())))
}

fn owner() -> String {
    format!("pg-{}", Uuid::new_v4().simple())
}

fn two_days() -> NewItinerary {
    NewItinerary {
        destination: Some("Seville".to_string()),
        itinerary: vec![
            Day::new(
                "Day 1",
                vec![
                    PlaceEntry::new("Alcazar", "Palace gardens"),
                    PlaceEntry::new("Cathedral", "Giralda tower"),
                ],
            ),
            Day::new("Day 2", vec![PlaceEntry::new("Triana", "Tapas")]),
        ],
        ..NewItinerary::default()
    }
}

fn patch(value: serde_json::Value) -> Result<ItineraryPatch> {
    Ok(ItineraryPatch::from_json(&value)?)
}

#[tokio::test]
async fn multi_key_patch_sets_only_addressed_fields() -> Result<()> {
    let Some(store) = connect().await? else { return Ok(()) };
    let created = store.create(&owner(), two_days()).await?;

    let updated = store
        .apply_patch(
            created.id,
            &patch(json!({
                "itinerary.0.description.1.checked": "true",
                "itinerary.1.description.0.tips": "Go after sunset",
                "stars": "4.5",
                "startDate": "2026-05-01",
                "state": "Planned",
            }))?,
        )
        .await?;

    let mut expected = created.clone();
    expected.itinerary[0].description[1].checked = true;
    expected.itinerary[1].description[0].tips = Some("Go after sunset".to_string());
    expected.stars = Some(4.5);
    expected.start_date = NaiveDate::from_ymd_opt(2026, 5, 1);
    expected.state = ItineraryState::Planned;

    assert_eq!(updated, expected);
    assert_eq!(store.get_by_id(created.id).await?, expected);
    Ok(())
}

#[tokio::test]
async fn failed_patch_leaves_document_untouched() -> Result<()> {
    let Some(store) = connect().await? else { return Ok(()) };
    let created = store.create(&owner(), two_days()).await?;

    for body in [
        json!({ "city": "Cordoba", "itinerary.2.day": "Day 3" }),
        json!({ "city": "Cordoba", "itinerary.1.description.1.checked": true }),
    ] {
        let err = store.apply_patch(created.id, &patch(body)?).await.unwrap_err();
        assert!(matches!(err, ItineraryError::InvalidIndex { .. }));
    }

    assert_eq!(store.get_by_id(created.id).await?, created);

    let err = store
        .apply_patch(Uuid::new_v4(), &patch(json!({ "city": "Cordoba" }))?)
        .await
        .unwrap_err();
    assert!(matches!(err, ItineraryError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn append_and_remove_day_check_bounds() -> Result<()> {
    let Some(store) = connect().await? else { return Ok(()) };
    let created = store.create(&owner(), two_days()).await?;

    let grown = store
        .append_day(created.id, Day::new("Day 3", vec![PlaceEntry::new("Italica", "Ruins")]))
        .await?;
    assert_eq!(grown.day_count(), 3);
    assert_eq!(grown.itinerary[2].day, "Day 3");

    let restored = store.remove_day_at(created.id, 2).await?;
    assert_eq!(restored, created);

    let err = store.remove_day_at(created.id, 2).await.unwrap_err();
    assert!(matches!(err, ItineraryError::InvalidIndex { index: 2, len: 2, .. }));

    let err = store.remove_day_at(created.id, usize::MAX).await.unwrap_err();
    assert!(matches!(err, ItineraryError::InvalidIndex { len: 2, .. }));

    let err = store.remove_day_at(Uuid::new_v4(), 0).await.unwrap_err();
    assert!(matches!(err, ItineraryError::NotFound(_)));
    let err = store.append_day(Uuid::new_v4(), Day::new("Day 1", vec![])).await.unwrap_err();
    assert!(matches!(err, ItineraryError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn delete_is_idempotent_and_bulk_delete_counts() -> Result<()> {
    let Some(store) = connect().await? else { return Ok(()) };
    let owner = owner();
    let first = store.create(&owner, two_days()).await?;
    store.create(&owner, two_days()).await?;
    store.create(&owner, two_days()).await?;

    assert_eq!(store.get_owner(first.id).await?, owner);
    assert!(store.delete(first.id).await?);
    assert!(!store.delete(first.id).await?);

    assert_eq!(store.delete_by_owner(&owner).await?, 2);
    assert!(store.get_by_owner(&owner).await?.is_empty());
    Ok(())
}
