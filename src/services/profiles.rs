use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::{ChildProfile, ChildRecord};

pub struct ProfileService;

impl ProfileService {
    pub async fn list_for_family(
        pool: &PgPool,
        family_id: Uuid,
    ) -> anyhow::Result<Vec<ChildRecord>> {
        let records = sqlx::query_as::<_, ChildRecord>(
            "SELECT * FROM children WHERE family_id = $1 ORDER BY created_at",
        )
        .bind(family_id)
        .fetch_all(pool)
        .await?;
        Ok(records)
    }

    /// Scoped by family so one family can never read another's profiles.
    pub async fn get(
        pool: &PgPool,
        id: Uuid,
        family_id: Uuid,
    ) -> anyhow::Result<Option<ChildRecord>> {
        let record = sqlx::query_as::<_, ChildRecord>(
            "SELECT * FROM children WHERE id = $1 AND family_id = $2",
        )
        .bind(id)
        .bind(family_id)
        .fetch_optional(pool)
        .await?;
        Ok(record)
    }

    pub async fn create(
        pool: &PgPool,
        family_id: Uuid,
        created_by: Uuid,
        profile: &ChildProfile,
    ) -> anyhow::Result<ChildRecord> {
        let document = serde_json::to_value(profile)?;
        let record = sqlx::query_as::<_, ChildRecord>(
            "INSERT INTO children (family_id, created_by, first_name, gender, age_bracket, profile)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(family_id)
        .bind(created_by)
        .bind(profile.first_name.trim())
        .bind(profile.gender.as_str())
        .bind(profile.age_bracket.as_str())
        .bind(document)
        .fetch_one(pool)
        .await?;
        Ok(record)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        family_id: Uuid,
        profile: &ChildProfile,
    ) -> anyhow::Result<ChildRecord> {
        let document = serde_json::to_value(profile)?;
        let record = sqlx::query_as::<_, ChildRecord>(
            "UPDATE children
             SET first_name = $1,
                 gender = $2,
                 age_bracket = $3,
                 profile = $4,
                 updated_at = NOW()
             WHERE id = $5 AND family_id = $6
             RETURNING *",
        )
        .bind(profile.first_name.trim())
        .bind(profile.gender.as_str())
        .bind(profile.age_bracket.as_str())
        .bind(document)
        .bind(id)
        .bind(family_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Profil introuvable"))?;
        Ok(record)
    }

    pub async fn delete(pool: &PgPool, id: Uuid, family_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM children WHERE id = $1 AND family_id = $2")
            .bind(id)
            .bind(family_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
