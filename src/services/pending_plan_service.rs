use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::pending_plan_dto::PendingPlanQuery;
use crate::error::{Error, Result};
use crate::models::pending_plan::{PendingPlan, PendingPlanStatus, PENDING_PLAN_COLUMNS};
use crate::services::webhook_service::{search_term, selector};
use crate::utils::pagination::{paginate, Page};

#[derive(Clone)]
pub struct PendingPlanService {
    pool: PgPool,
    fetch_limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingPlanFilter {
    pub status: Option<PendingPlanStatus>,
    pub email: Option<String>,
}

impl PendingPlanFilter {
    pub fn from_query(query: &PendingPlanQuery) -> Result<Self> {
        let status = selector(query.status.as_deref())
            .map(|s| s.parse::<PendingPlanStatus>().map_err(Error::BadRequest))
            .transpose()?;
        Ok(Self {
            status,
            email: search_term(query.email.as_deref()),
        })
    }

    pub fn matches(&self, plan: &PendingPlan) -> bool {
        if let Some(status) = self.status {
            if !plan.status.eq_ignore_ascii_case(status.as_str()) {
                return false;
            }
        }
        match &self.email {
            Some(needle) => plan.email.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }
}

impl PendingPlanService {
    pub fn new(pool: PgPool, fetch_limit: i64) -> Self {
        Self {
            pool,
            fetch_limit: fetch_limit.max(1),
        }
    }

    pub async fn list(&self, query: &PendingPlanQuery) -> Result<Page<PendingPlan>> {
        let filter = PendingPlanFilter::from_query(query)?;
        let sql = format!(
            "SELECT {} FROM pending_plans ORDER BY created_at DESC LIMIT $1",
            PENDING_PLAN_COLUMNS
        );
        let rows = sqlx::query_as::<_, PendingPlan>(&sql)
            .bind(self.fetch_limit)
            .fetch_all(&self.pool)
            .await?;

        let matched: Vec<PendingPlan> = rows.into_iter().filter(|p| filter.matches(p)).collect();
        Ok(paginate(matched, query.page, query.per_page))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<PendingPlan> {
        let sql = format!("SELECT {} FROM pending_plans WHERE id = $1", PENDING_PLAN_COLUMNS);
        let plan = sqlx::query_as::<_, PendingPlan>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(plan)
    }

    /// Only plans still `pending` can be re-pointed to another e-mail. The
    /// status check lives in the UPDATE so a concurrent activation or expiry
    /// cannot slip in between.
    pub async fn update_email(&self, id: Uuid, email: &str) -> Result<PendingPlan> {
        let sql = format!(
            "UPDATE pending_plans SET email = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending' RETURNING {}",
            PENDING_PLAN_COLUMNS
        );
        let updated = sqlx::query_as::<_, PendingPlan>(&sql)
            .bind(id)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(plan) => Ok(plan),
            None => {
                let current = self.get_by_id(id).await?;
                Err(Error::BadRequest(format!(
                    "Pending plan is already {}",
                    current.status
                )))
            }
        }
    }

    /// Marks plans still pending after `ttl_days` as expired; returns how many changed.
    pub async fn expire_stale(&self, ttl_days: i64) -> Result<u64> {
        let res = sqlx::query(
            r#"UPDATE pending_plans
               SET status = 'expired', updated_at = NOW()
               WHERE status = 'pending'
                 AND created_at < NOW() - make_interval(days => $1)"#,
        )
        .bind(ttl_days.clamp(1, i64::from(i32::MAX)) as i32)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }
}
