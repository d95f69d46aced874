use sqlx::SqliteConnection;

use crate::db_types::Plan;

const PLAN_COLUMNS: &str = "id, name, price, currency, period_days, active";

pub async fn fetch_plan(plan_id: &str, conn: &mut SqliteConnection) -> Result<Option<Plan>, sqlx::Error> {
    let plan = sqlx::query_as(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1"))
        .bind(plan_id)
        .fetch_optional(conn)
        .await?;
    Ok(plan)
}

pub async fn fetch_active_plans(conn: &mut SqliteConnection) -> Result<Vec<Plan>, sqlx::Error> {
    let plans = sqlx::query_as(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE active = 1 ORDER BY price, id"))
        .fetch_all(conn)
        .await?;
    Ok(plans)
}

pub async fn upsert_plan(plan: Plan, conn: &mut SqliteConnection) -> Result<Plan, sqlx::Error> {
    let plan = sqlx::query_as(&format!(
        r#"
        INSERT INTO plans (id, name, price, currency, period_days, active) VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            price = excluded.price,
            currency = excluded.currency,
            period_days = excluded.period_days,
            active = excluded.active,
            updated_at = CURRENT_TIMESTAMP
        RETURNING {PLAN_COLUMNS};
        "#
    ))
    .bind(plan.id)
    .bind(plan.name)
    .bind(plan.price)
    .bind(plan.currency)
    .bind(plan.period_days)
    .bind(plan.active)
    .fetch_one(conn)
    .await?;
    Ok(plan)
}
