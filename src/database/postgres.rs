use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use tracing::{debug, error};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::store::ItineraryStore;
use crate::itinerary::{Day, DocumentShape, Itinerary, ItineraryError, ItineraryPatch, NewItinerary};

/// Each itinerary is one JSONB document; `owner` is mirrored into its own
/// indexed column for owner lookups and guard checks.
#[derive(FromRow)]
struct DocumentRow {
    document: Json<Itinerary>,
}

impl From<DocumentRow> for Itinerary {
    fn from(row: DocumentRow) -> Self {
        row.document.0
    }
}

/// Place counts per day, in day order, read under a row lock.
const SELECT_SHAPE: &str = r#"
    SELECT ARRAY(
        SELECT CASE jsonb_typeof(d.day -> 'description')
                   WHEN 'array' THEN jsonb_array_length(d.day -> 'description')
                   ELSE 0
               END
        FROM jsonb_array_elements(COALESCE(document -> 'itinerary', '[]'::jsonb))
             WITH ORDINALITY AS d(day, n)
        ORDER BY d.n
    ) AS place_counts
    FROM itineraries
    WHERE id = $1
    FOR UPDATE
"#;

const APPEND_DAY: &str = r#"
    UPDATE itineraries
    SET document = jsonb_set(
            document,
            '{itinerary}',
            COALESCE(document -> 'itinerary', '[]'::jsonb) || jsonb_build_array($2::jsonb)
        ),
        updated_at = now()
    WHERE id = $1
    RETURNING document
"#;

const REMOVE_DAY: &str = r#"
    UPDATE itineraries
    SET document = jsonb_set(document, '{itinerary}', (document -> 'itinerary') - $2::int),
        updated_at = now()
    WHERE id = $1
      AND jsonb_array_length(COALESCE(document -> 'itinerary', '[]'::jsonb)) > $2::int
    RETURNING document
"#;

/// PostgreSQL-backed store. Field edits run as `jsonb_set` calls inside the
/// database; only the document's shape is read to validate indices.
#[derive(Clone)]
pub struct PgItineraryStore {
    pool: PgPool,
}

impl PgItineraryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build `jsonb_set(jsonb_set(document, $2, $3), $4, $5)...` for `count` instructions.
    fn patch_sql(count: usize) -> String {
        let mut expr = String::from("document");
        for n in 0..count {
            expr = format!(
                "jsonb_set({}, ${}::text[], ${}::jsonb, true)",
                expr,
                2 + 2 * n,
                3 + 2 * n
            );
        }
        format!(
            "UPDATE itineraries SET document = {}, updated_at = now() WHERE id = $1 RETURNING document",
            expr
        )
    }

    async fn day_count(&self, id: Uuid) -> Result<Option<usize>, ItineraryError> {
        let len: Option<i32> = sqlx::query_scalar(
            "SELECT jsonb_array_length(COALESCE(document -> 'itinerary', '[]'::jsonb)) FROM itineraries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(len.map(|n| n.max(0) as usize))
    }
}

fn db_error(err: sqlx::Error) -> ItineraryError {
    error!("Itinerary store query failed: {}", err);
    ItineraryError::Database(DatabaseError::Sqlx(err))
}

#[async_trait]
impl ItineraryStore for PgItineraryStore {
    async fn create(&self, owner: &str, fields: NewItinerary) -> Result<Itinerary, ItineraryError> {
        let itinerary = fields.into_itinerary(Uuid::new_v4(), owner);

        let row: DocumentRow = sqlx::query_as(
            "INSERT INTO itineraries (id, owner, document) VALUES ($1, $2, $3) RETURNING document",
        )
        .bind(itinerary.id)
        .bind(&itinerary.owner)
        .bind(Json(&itinerary))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        debug!("Inserted itinerary {} for owner {}", itinerary.id, owner);
        Ok(row.into())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Itinerary, ItineraryError> {
        let row: Option<DocumentRow> = sqlx::query_as("SELECT document FROM itineraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Itinerary::from).ok_or_else(|| ItineraryError::not_found(id))
    }

    async fn get_owner(&self, id: Uuid) -> Result<String, ItineraryError> {
        let owner: Option<String> = sqlx::query_scalar("SELECT owner FROM itineraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        owner.ok_or_else(|| ItineraryError::not_found(id))
    }

    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Itinerary>, ItineraryError> {
        let rows: Vec<DocumentRow> =
            sqlx::query_as("SELECT document FROM itineraries WHERE owner = $1 ORDER BY created_at, id")
                .bind(owner)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(rows.into_iter().map(Itinerary::from).collect())
    }

    async fn apply_patch(&self, id: Uuid, patch: &ItineraryPatch) -> Result<Itinerary, ItineraryError> {
        if patch.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let place_counts: Option<Vec<i32>> = sqlx::query_scalar(SELECT_SHAPE)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        let place_counts = place_counts.ok_or_else(|| ItineraryError::not_found(id))?;

        let shape = DocumentShape {
            place_counts: place_counts.into_iter().map(|n| n.max(0) as usize).collect(),
        };
        // Dropping the transaction on error rolls it back.
        patch.validate(&shape)?;

        let sql = Self::patch_sql(patch.instructions().len());
        let mut query = sqlx::query_as::<_, DocumentRow>(&sql).bind(id);
        for instruction in patch.instructions() {
            query = query
                .bind(instruction.json_path())
                .bind(Json(instruction.json_value()?));
        }

        let row = query.fetch_one(&mut *tx).await.map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;

        debug!("Patched {} field(s) of itinerary {}", patch.instructions().len(), id);
        Ok(row.into())
    }

    async fn append_day(&self, id: Uuid, day: Day) -> Result<Itinerary, ItineraryError> {
        let row: Option<DocumentRow> = sqlx::query_as(APPEND_DAY)
            .bind(id)
            .bind(Json(&day))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Itinerary::from).ok_or_else(|| ItineraryError::not_found(id))
    }

    async fn remove_day_at(&self, id: Uuid, index: usize) -> Result<Itinerary, ItineraryError> {
        let position = match i32::try_from(index) {
            Ok(position) => position,
            Err(_) => {
                let len = self.day_count(id).await?.ok_or_else(|| ItineraryError::not_found(id))?;
                return Err(ItineraryError::invalid_index("itinerary", index, len));
            }
        };

        let row: Option<DocumentRow> = sqlx::query_as(REMOVE_DAY)
            .bind(id)
            .bind(position)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => Ok(row.into()),
            None => match self.day_count(id).await? {
                Some(len) => Err(ItineraryError::invalid_index("itinerary", index, len)),
                None => Err(ItineraryError::not_found(id)),
            },
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ItineraryError> {
        let result = sqlx::query("DELETE FROM itineraries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_owner(&self, owner: &str) -> Result<u64, ItineraryError> {
        let result = sqlx::query("DELETE FROM itineraries WHERE owner = $1")
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), ItineraryError> {
        DatabaseManager::health_check(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_sql_nests_one_jsonb_set_per_instruction() {
        let sql = PgItineraryStore::patch_sql(2);
        assert!(sql.contains(
            "jsonb_set(jsonb_set(document, $2::text[], $3::jsonb, true), $4::text[], $5::jsonb, true)"
        ));
        assert!(sql.ends_with("WHERE id = $1 RETURNING document"));
    }
}
