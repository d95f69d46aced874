use crate::{db_types::Plan, traits::IntentStoreError};

/// The catalogue of plans that can be purchased.
#[allow(async_fn_in_trait)]
pub trait PlanDirectory {
    async fn fetch_plan(&self, plan_id: &str) -> Result<Option<Plan>, IntentStoreError>;

    async fn fetch_active_plans(&self) -> Result<Vec<Plan>, IntentStoreError>;

    /// Creates the plan, or replaces every field of the plan with the same id.
    async fn upsert_plan(&self, plan: Plan) -> Result<Plan, IntentStoreError>;
}
