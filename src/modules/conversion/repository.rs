use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::ConversionJob;

pub struct NewConversionJob {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub source_filename: String,
    pub source_path: String,
    pub source_size_bytes: i64,
    pub result_filename: String,
    pub result_path: String,
    pub result_size_bytes: i64,
    pub result_format: String,
    pub duration_seconds: Option<f64>,
    pub resolution: Option<String>,
    pub bitrate: Option<i64>,
}

pub struct ConversionRepository;

impl ConversionRepository {
    pub async fn insert(pool: &PgPool, new: NewConversionJob) -> Result<ConversionJob> {
        let job = sqlx::query_as::<_, ConversionJob>(
            r#"
            INSERT INTO conversion_jobs (
                id, owner_id,
                source_filename, source_path, source_size_bytes,
                result_filename, result_path, result_size_bytes, result_format,
                duration_seconds, resolution, bitrate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING
                id, owner_id,
                source_filename, source_path, source_size_bytes,
                result_filename, result_path, result_size_bytes, result_format,
                duration_seconds, resolution, bitrate, created_at
            "#,
        )
        .bind(new.id)
        .bind(new.owner_id)
        .bind(&new.source_filename)
        .bind(&new.source_path)
        .bind(new.source_size_bytes)
        .bind(&new.result_filename)
        .bind(&new.result_path)
        .bind(new.result_size_bytes)
        .bind(&new.result_format)
        .bind(new.duration_seconds)
        .bind(&new.resolution)
        .bind(new.bitrate)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<ConversionJob>> {
        let jobs = sqlx::query_as::<_, ConversionJob>(
            r#"
            SELECT
                id, owner_id,
                source_filename, source_path, source_size_bytes,
                result_filename, result_path, result_size_bytes, result_format,
                duration_seconds, resolution, bitrate, created_at
            FROM conversion_jobs
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ConversionJob>> {
        let job = sqlx::query_as::<_, ConversionJob>(
            r#"
            SELECT
                id, owner_id,
                source_filename, source_path, source_size_bytes,
                result_filename, result_path, result_size_bytes, result_format,
                duration_seconds, resolution, bitrate, created_at
            FROM conversion_jobs
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(job)
    }
}
