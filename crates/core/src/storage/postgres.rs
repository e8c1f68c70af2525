use crate::domain::assessment::{Answer, RiskAssessment};
use crate::domain::profile::RiskBucket;
use crate::domain::recommendation::Recommendation;
use crate::storage::{lock, PersistenceStore};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed store. A partial unique index on `(user_id) WHERE active`
/// backs up the single-active invariant at the schema level.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PersistenceStore for PgStore {
    async fn save_assessment(&self, assessment: &RiskAssessment) -> anyhow::Result<Uuid> {
        let responses = serde_json::to_value(&assessment.responses)
            .context("failed to serialize assessment responses")?;

        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        // Serialize concurrent submissions for this user, then deactivate
        // before inserting so no reader sees two active rows.
        lock::acquire_user_xact_lock(&mut tx, assessment.user_id).await?;

        sqlx::query("UPDATE risk_assessments SET active = FALSE WHERE user_id = $1 AND active")
            .bind(assessment.user_id)
            .execute(&mut *tx)
            .await
            .context("deactivate previous assessments failed")?;

        sqlx::query(
            "INSERT INTO risk_assessments (id, user_id, score, profile, responses, created_at, active) \
             VALUES ($1, $2, $3, $4, $5, $6, TRUE)",
        )
        .bind(assessment.id)
        .bind(assessment.user_id)
        .bind(assessment.score)
        .bind(assessment.profile.as_str())
        .bind(responses)
        .bind(assessment.created_at)
        .execute(&mut *tx)
        .await
        .context("insert risk_assessments failed")?;

        tx.commit().await.context("commit transaction failed")?;
        Ok(assessment.id)
    }

    async fn get_active_assessment(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<RiskAssessment>> {
        let row = sqlx::query_as::<
            _,
            (
                Uuid,
                Uuid,
                f64,
                String,
                serde_json::Value,
                DateTime<Utc>,
                bool,
            ),
        >(
            "SELECT id, user_id, score, profile, responses, created_at, active \
             FROM risk_assessments \
             WHERE user_id = $1 AND active \
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("select active assessment failed")?;

        let Some((id, user_id, score, profile, responses, created_at, active)) = row else {
            return Ok(None);
        };

        let profile = RiskBucket::parse(&profile)
            .map_err(|e| anyhow::anyhow!("invalid profile in DB for assessment {id}: {e}"))?;
        let responses: Vec<Answer> = serde_json::from_value(responses)
            .with_context(|| format!("invalid responses JSON in DB for assessment {id}"))?;

        Ok(Some(RiskAssessment {
            id,
            user_id,
            score,
            profile,
            responses,
            created_at,
            active,
        }))
    }

    async fn deactivate_all(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let res =
            sqlx::query("UPDATE risk_assessments SET active = FALSE WHERE user_id = $1 AND active")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .context("deactivate assessments failed")?;
        Ok(res.rows_affected())
    }

    async fn save_recommendation(
        &self,
        user_id: Uuid,
        recommendation: &Recommendation,
    ) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        let payload = serde_json::to_value(recommendation)
            .context("failed to serialize recommendation")?;

        sqlx::query(
            "INSERT INTO recommendations (id, user_id, profile, payload, generated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(user_id)
        .bind(recommendation.profile.as_str())
        .bind(payload)
        .bind(recommendation.generated_at)
        .execute(&self.pool)
        .await
        .context("insert recommendations failed")?;

        Ok(id)
    }

    async fn latest_recommendation(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Recommendation>> {
        let row = sqlx::query_as::<_, (serde_json::Value,)>(
            "SELECT payload \
             FROM recommendations \
             WHERE user_id = $1 \
             ORDER BY generated_at DESC \
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("select latest recommendation failed")?;

        let Some((payload,)) = row else {
            return Ok(None);
        };

        let recommendation = serde_json::from_value(payload)
            .context("invalid recommendation payload in DB")?;
        Ok(Some(recommendation))
    }
}
