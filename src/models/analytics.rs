//! Read-only rows pulled from the backend tables for analytics.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExpenseRow {
    pub category: String,
    pub amount: i64,
    pub spent_on: NaiveDate,
}

#[derive(Debug, Clone, FromRow)]
pub struct SignupRow {
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub user_id: Uuid,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProgressRow {
    pub content_type: String,
    pub content_id: Uuid,
    pub completed: bool,
}

/// Title of a papercraft or educational activity.
#[derive(Debug, Clone, FromRow)]
pub struct ContentTitle {
    pub id: Uuid,
    pub title: String,
}
