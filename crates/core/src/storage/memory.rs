use crate::domain::assessment::RiskAssessment;
use crate::domain::recommendation::Recommendation;
use crate::storage::PersistenceStore;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store for tests and offline CLI runs. The write lock makes each
/// save atomic, which is all the single-active invariant needs in-process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    assessments: HashMap<Uuid, Vec<RiskAssessment>>,
    recommendations: HashMap<Uuid, Vec<Recommendation>>,
}

impl InMemoryStore {
    pub async fn active_count(&self, user_id: Uuid) -> usize {
        self.inner
            .read()
            .await
            .assessments
            .get(&user_id)
            .map(|list| list.iter().filter(|a| a.active).count())
            .unwrap_or(0)
    }

    pub async fn assessment_count(&self, user_id: Uuid) -> usize {
        self.inner
            .read()
            .await
            .assessments
            .get(&user_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl PersistenceStore for InMemoryStore {
    async fn save_assessment(&self, assessment: &RiskAssessment) -> anyhow::Result<Uuid> {
        let mut state = self.inner.write().await;
        let list = state.assessments.entry(assessment.user_id).or_default();
        for existing in list.iter_mut() {
            existing.active = false;
        }
        list.push(assessment.clone());
        Ok(assessment.id)
    }

    async fn get_active_assessment(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<RiskAssessment>> {
        Ok(self
            .inner
            .read()
            .await
            .assessments
            .get(&user_id)
            .and_then(|list| list.iter().find(|a| a.active).cloned()))
    }

    async fn deactivate_all(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let mut state = self.inner.write().await;
        let mut count = 0;
        if let Some(list) = state.assessments.get_mut(&user_id) {
            for existing in list.iter_mut().filter(|a| a.active) {
                existing.active = false;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn save_recommendation(
        &self,
        user_id: Uuid,
        recommendation: &Recommendation,
    ) -> anyhow::Result<Uuid> {
        let mut state = self.inner.write().await;
        state
            .recommendations
            .entry(user_id)
            .or_default()
            .push(recommendation.clone());
        Ok(Uuid::new_v4())
    }

    async fn latest_recommendation(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Recommendation>> {
        Ok(self
            .inner
            .read()
            .await
            .recommendations
            .get(&user_id)
            .and_then(|list| {
                list.iter()
                    .max_by_key(|r| r.generated_at)
                    .cloned()
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::Answer;
    use crate::domain::profile::RiskBucket;

    fn assessment_for(user_id: Uuid) -> RiskAssessment {
        RiskAssessment {
            id: Uuid::new_v4(),
            user_id,
            score: 50.0,
            profile: RiskBucket::Moderate,
            responses: vec![Answer::new("q1", "Neutral")],
            created_at: chrono::Utc::now(),
            active: true,
        }
    }

    #[tokio::test]
    async fn save_deactivates_previous_actives() {
        let store = InMemoryStore::default();
        let user_id = Uuid::new_v4();

        let first = assessment_for(user_id);
        let second = assessment_for(user_id);
        store.save_assessment(&first).await.unwrap();
        store.save_assessment(&second).await.unwrap();

        assert_eq!(store.active_count(user_id).await, 1);
        assert_eq!(store.assessment_count(user_id).await, 2);
        let active = store.get_active_assessment(user_id).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
    }

    #[tokio::test]
    async fn deactivate_all_reports_count() {
        let store = InMemoryStore::default();
        let user_id = Uuid::new_v4();
        store
            .save_assessment(&assessment_for(user_id))
            .await
            .unwrap();

        assert_eq!(store.deactivate_all(user_id).await.unwrap(), 1);
        assert_eq!(store.deactivate_all(user_id).await.unwrap(), 0);
        assert!(store
            .get_active_assessment(user_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn users_do_not_interfere() {
        let store = InMemoryStore::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.save_assessment(&assessment_for(alice)).await.unwrap();
        store.save_assessment(&assessment_for(bob)).await.unwrap();

        assert_eq!(store.active_count(alice).await, 1);
        assert_eq!(store.active_count(bob).await, 1);
    }
}
