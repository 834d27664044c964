use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalyticsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// One point of a chart series. Money series carry cents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: i64,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: i64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyNet {
    pub month: String,
    pub revenue: i64,
    pub expenses: i64,
    pub net: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentRank {
    pub content_type: String,
    pub content_id: Uuid,
    pub title: String,
    pub completions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Totals {
    pub revenue: i64,
    pub expenses: i64,
    pub net: i64,
    pub revenue_display: String,
    pub expenses_display: String,
    pub net_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyticsOverview {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub totals: Totals,
    pub revenue_by_day: Vec<SeriesPoint>,
    pub expenses_by_category: Vec<SeriesPoint>,
    pub net_by_month: Vec<MonthlyNet>,
    pub signups_by_day: Vec<SeriesPoint>,
    pub active_users_by_day: Vec<SeriesPoint>,
    pub activity_by_action: Vec<SeriesPoint>,
    pub top_content: Vec<ContentRank>,
}
