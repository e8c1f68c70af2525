pub mod lock;
pub mod memory;
pub mod postgres;

use crate::domain::assessment::RiskAssessment;
use crate::domain::recommendation::Recommendation;
use anyhow::Context;
use uuid::Uuid;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Persistence boundary for assessments and recommendation audit records.
///
/// `save_assessment` persists the given assessment as the user's single
/// active one: previously active rows are deactivated first, in the same
/// atomic step, so readers never observe two active assessments.
#[async_trait::async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn save_assessment(&self, assessment: &RiskAssessment) -> anyhow::Result<Uuid>;

    async fn get_active_assessment(&self, user_id: Uuid)
        -> anyhow::Result<Option<RiskAssessment>>;

    /// Deactivate every active assessment for the user; returns how many
    /// rows changed.
    async fn deactivate_all(&self, user_id: Uuid) -> anyhow::Result<u64>;

    async fn save_recommendation(
        &self,
        user_id: Uuid,
        recommendation: &Recommendation,
    ) -> anyhow::Result<Uuid>;

    async fn latest_recommendation(&self, user_id: Uuid)
        -> anyhow::Result<Option<Recommendation>>;
}
