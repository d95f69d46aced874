//! The plan catalogue file.
//!
//! If `PPG_PLANS_FILE` is set, the server upserts the plans it lists before it starts taking requests. Plans that are
//! in the database but not in the file are left alone. Retire a plan by listing it with `"active": false`.
//!
//! ```json
//! [
//!   { "id": "free", "name": "Starter", "price": 0, "period_days": 30 },
//!   { "id": "pro", "name": "Professional", "price": 15000, "period_days": 30 },
//!   { "id": "pro-usd", "name": "Professional (USD)", "price": 19.99, "currency": "USD", "period_days": 30 },
//!   { "id": "legacy", "name": "Legacy", "price": 9000, "period_days": 30, "active": false }
//! ]
//! ```
//!
//! Prices are in major currency units. Plans without a `currency` are priced in `PPG_CURRENCY`.
use std::path::Path;

use log::*;
use ppg_common::Amount;
use ppg_engine::{db_types::Plan, IntentApi, PlanDirectory};
use serde::Deserialize;

use crate::errors::ServerError;

#[derive(Debug, Clone, Deserialize)]
struct CataloguePlan {
    id: String,
    name: String,
    price: f64,
    #[serde(default)]
    currency: Option<String>,
    period_days: i64,
    #[serde(default = "active_by_default")]
    active: bool,
}

fn active_by_default() -> bool {
    true
}

impl CataloguePlan {
    fn into_plan(self, default_currency: &str) -> Result<Plan, String> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err("A plan has an empty id".to_string());
        }
        if self.price < 0.0 {
            return Err(format!("Plan {id} has a negative price"));
        }
        if self.period_days <= 0 {
            return Err(format!("Plan {id} must last at least one day"));
        }
        let price = Amount::try_from(self.price).map_err(|e| format!("Plan {id} has an invalid price. {e}"))?;
        let currency = self
            .currency
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_currency.to_string());
        let plan = Plan::new(id, self.name, price, self.period_days).with_currency(currency);
        Ok(if self.active { plan } else { plan.inactive() })
    }
}

pub fn parse_plan_catalogue(json: &str, default_currency: &str) -> Result<Vec<Plan>, ServerError> {
    let entries = serde_json::from_str::<Vec<CataloguePlan>>(json)
        .map_err(|e| ServerError::ConfigurationError(format!("The plan catalogue is not valid. {e}")))?;
    entries
        .into_iter()
        .map(|p| p.into_plan(default_currency).map_err(ServerError::ConfigurationError))
        .collect()
}

/// Loads the catalogue at `path` and upserts every plan in it. Returns the number of plans written.
pub async fn load_plan_catalogue<B: PlanDirectory>(
    path: &Path,
    default_currency: &str,
    api: &IntentApi<B>,
) -> Result<usize, ServerError> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        ServerError::ConfigurationError(format!("Could not read the plan catalogue at {}. {e}", path.display()))
    })?;
    let plans = parse_plan_catalogue(&json, default_currency)?;
    let count = plans.len();
    for plan in plans {
        let plan = api.upsert_plan(plan).await?;
        let Plan { id, name, price, currency, period_days, .. } = plan;
        debug!("🪛️ Plan '{id}' ({name}, {price} {currency} for {period_days} days)");
    }
    info!("🪛️ {count} plans loaded from {}", path.display());
    Ok(count)
}
