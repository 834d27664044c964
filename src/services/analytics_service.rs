use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::analytics_dto::{
    AnalyticsOverview, AnalyticsQuery, ContentRank, MonthlyNet, SeriesPoint, Totals,
};
use crate::error::Result;
use crate::models::analytics::{
    ActivityRow, ContentTitle, ExpenseRow, ProgressRow, SignupRow, TransactionRow,
};
use crate::utils::money::format_brl;
use crate::utils::time::{day_key, month_key, DateRange};

pub const DEFAULT_RANGE_DAYS: i64 = 30;
pub const TOP_CONTENT_LIMIT: usize = 10;
const SETTLED_STATUSES: [&str; 3] = ["completed", "approved", "paid"];
const MISSING_CONTENT_TITLE: &str = "Conteúdo removido";
const UNCATEGORIZED: &str = "outros";
/// Title tables and the progress `content_type` each one backs.
const CONTENT_TABLES: [(&str, &str); 2] = [
    ("papercrafts", "papercraft"),
    ("educational_activities", "educational_activity"),
];

#[derive(Clone)]
pub struct AnalyticsService {
    pool: PgPool,
}

/// Everything the overview is computed from.
#[derive(Debug, Clone, Default)]
pub struct OverviewRows {
    pub transactions: Vec<TransactionRow>,
    pub expenses: Vec<ExpenseRow>,
    pub signups: Vec<SignupRow>,
    pub activity: Vec<ActivityRow>,
    pub progress: Vec<ProgressRow>,
    /// Keyed by content kind and id; ids are only unique per table.
    pub titles: HashMap<(String, Uuid), String>,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn overview(&self, query: &AnalyticsQuery) -> Result<AnalyticsOverview> {
        let today = chrono::Utc::now().date_naive();
        let range = DateRange::resolve(query.from, query.to, today, DEFAULT_RANGE_DAYS);
        let rows = self.fetch_rows(&range).await?;
        tracing::debug!(
            from = %range.from,
            to = %range.to,
            transactions = rows.transactions.len(),
            expenses = rows.expenses.len(),
            activity = rows.activity.len(),
            "analytics rows fetched"
        );
        Ok(build_overview(&range, &rows))
    }

    async fn fetch_rows(&self, range: &DateRange) -> Result<OverviewRows> {
        let (start, end) = range.bounds();

        let transactions = sqlx::query_as::<_, TransactionRow>(
            r#"SELECT COALESCE(amount, 0)::bigint AS amount, COALESCE(status, '') AS status, created_at
               FROM transactions
               WHERE created_at >= $1 AND created_at < $2"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let expenses = sqlx::query_as::<_, ExpenseRow>(
            r#"SELECT COALESCE(category, 'outros') AS category, COALESCE(amount, 0)::bigint AS amount, spent_on
               FROM admin_expenses
               WHERE spent_on BETWEEN $1 AND $2"#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        let signups = sqlx::query_as::<_, SignupRow>(
            "SELECT created_at FROM users WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let activity = sqlx::query_as::<_, ActivityRow>(
            r#"SELECT user_id, action, created_at
               FROM user_activity_logs
               WHERE created_at >= $1 AND created_at < $2"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let progress = sqlx::query_as::<_, ProgressRow>(
            r#"SELECT content_type, content_id, completed
               FROM user_progress
               WHERE updated_at >= $1 AND updated_at < $2"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut titles = HashMap::new();
        for (table, kind) in CONTENT_TABLES {
            let sql = format!("SELECT id, title FROM {}", table);
            let rows = sqlx::query_as::<_, ContentTitle>(&sql)
                .fetch_all(&self.pool)
                .await?;
            titles.extend(
                rows.into_iter()
                    .map(|row| ((kind.to_string(), row.id), row.title)),
            );
        }

        Ok(OverviewRows {
            transactions,
            expenses,
            signups,
            activity,
            progress,
            titles,
        })
    }
}

fn is_settled(tx: &TransactionRow) -> bool {
    SETTLED_STATUSES
        .iter()
        .any(|s| tx.status.eq_ignore_ascii_case(s))
}

/// One point per day of the range, zero-filled. Points outside the range are dropped.
pub fn daily_series<I>(range: &DateRange, points: I) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = (NaiveDate, i64)>,
{
    let mut buckets: BTreeMap<NaiveDate, i64> = range
        .from
        .iter_days()
        .take_while(|day| *day <= range.to)
        .map(|day| (day, 0))
        .collect();

    for (day, value) in points {
        if let Some(bucket) = buckets.get_mut(&day) {
            *bucket += value;
        }
    }

    buckets
        .into_iter()
        .map(|(day, value)| SeriesPoint::new(day_key(day), value))
        .collect()
}

/// Largest first; ties broken by label.
fn ranked(buckets: BTreeMap<String, i64>) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = buckets
        .into_iter()
        .map(|(label, value)| SeriesPoint::new(label, value))
        .collect();
    points.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    points
}

pub fn revenue_by_day(range: &DateRange, transactions: &[TransactionRow]) -> Vec<SeriesPoint> {
    daily_series(
        range,
        transactions
            .iter()
            .filter(|tx| is_settled(tx))
            .map(|tx| (tx.created_at.date_naive(), tx.amount)),
    )
}

pub fn expenses_by_category(expenses: &[ExpenseRow]) -> Vec<SeriesPoint> {
    let mut buckets = BTreeMap::new();
    for expense in expenses {
        let category = match expense.category.trim() {
            "" => UNCATEGORIZED.to_string(),
            named => named.to_lowercase(),
        };
        *buckets.entry(category).or_insert(0) += expense.amount;
    }
    ranked(buckets)
}

pub fn net_by_month(transactions: &[TransactionRow], expenses: &[ExpenseRow]) -> Vec<MonthlyNet> {
    let mut months: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| is_settled(tx)) {
        months.entry(month_key(tx.created_at.date_naive())).or_default().0 += tx.amount;
    }
    for expense in expenses {
        months.entry(month_key(expense.spent_on)).or_default().1 += expense.amount;
    }

    months
        .into_iter()
        .map(|(month, (revenue, expenses))| MonthlyNet {
            month,
            revenue,
            expenses,
            net: revenue - expenses,
        })
        .collect()
}

pub fn signups_by_day(range: &DateRange, signups: &[SignupRow]) -> Vec<SeriesPoint> {
    daily_series(range, signups.iter().map(|s| (s.created_at.date_naive(), 1)))
}

pub fn active_users_by_day(range: &DateRange, activity: &[ActivityRow]) -> Vec<SeriesPoint> {
    let mut users_per_day: BTreeMap<NaiveDate, HashSet<Uuid>> = BTreeMap::new();
    for row in activity {
        users_per_day
            .entry(row.created_at.date_naive())
            .or_default()
            .insert(row.user_id);
    }
    daily_series(
        range,
        users_per_day
            .into_iter()
            .map(|(day, users)| (day, users.len() as i64)),
    )
}

pub fn activity_by_action(activity: &[ActivityRow]) -> Vec<SeriesPoint> {
    let mut buckets = BTreeMap::new();
    for row in activity {
        *buckets.entry(row.action.clone()).or_insert(0) += 1;
    }
    ranked(buckets)
}

/// Maps a progress `content_type` onto the kind its title table is keyed by.
fn content_kind(content_type: &str) -> String {
    let kind = content_type.trim().to_lowercase();
    CONTENT_TABLES
        .iter()
        .find(|(table, _)| *table == kind)
        .map(|(_, singular)| singular.to_string())
        .unwrap_or(kind)
}

pub fn top_content(
    progress: &[ProgressRow],
    titles: &HashMap<(String, Uuid), String>,
    limit: usize,
) -> Vec<ContentRank> {
    let mut completions: BTreeMap<(String, Uuid), i64> = BTreeMap::new();
    for row in progress.iter().filter(|row| row.completed) {
        *completions
            .entry((row.content_type.clone(), row.content_id))
            .or_insert(0) += 1;
    }

    let mut ranks: Vec<ContentRank> = completions
        .into_iter()
        .map(|((content_type, content_id), completions)| ContentRank {
            title: titles
                .get(&(content_kind(&content_type), content_id))
                .cloned()
                .unwrap_or_else(|| MISSING_CONTENT_TITLE.to_string()),
            content_type,
            content_id,
            completions,
        })
        .collect();
    ranks.sort_by(|a, b| {
        b.completions
            .cmp(&a.completions)
            .then_with(|| a.title.cmp(&b.title))
    });
    ranks.truncate(limit);
    ranks
}

pub fn totals(transactions: &[TransactionRow], expenses: &[ExpenseRow]) -> Totals {
    let revenue: i64 = transactions
        .iter()
        .filter(|tx| is_settled(tx))
        .map(|tx| tx.amount)
        .sum();
    let spent: i64 = expenses.iter().map(|e| e.amount).sum();
    let net = revenue - spent;
    Totals {
        revenue,
        expenses: spent,
        net,
        revenue_display: format_brl(revenue),
        expenses_display: format_brl(spent),
        net_display: format_brl(net),
    }
}

pub fn build_overview(range: &DateRange, rows: &OverviewRows) -> AnalyticsOverview {
    AnalyticsOverview {
        from: range.from,
        to: range.to,
        totals: totals(&rows.transactions, &rows.expenses),
        revenue_by_day: revenue_by_day(range, &rows.transactions),
        expenses_by_category: expenses_by_category(&rows.expenses),
        net_by_month: net_by_month(&rows.transactions, &rows.expenses),
        signups_by_day: signups_by_day(range, &rows.signups),
        active_users_by_day: active_users_by_day(range, &rows.activity),
        activity_by_action: activity_by_action(&rows.activity),
        top_content: top_content(&rows.progress, &rows.titles, TOP_CONTENT_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn at(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, m, d, 15, 30, 0).unwrap()
    }

    fn tx(amount: i64, status: &str, m: u32, d: u32) -> TransactionRow {
        TransactionRow {
            amount,
            status: status.to_string(),
            created_at: at(m, d),
        }
    }

    fn expense(category: &str, amount: i64, m: u32, d: u32) -> ExpenseRow {
        ExpenseRow {
            category: category.to_string(),
            amount,
            spent_on: date(m, d),
        }
    }

    fn range() -> DateRange {
        DateRange {
            from: date(3, 30),
            to: date(4, 2),
        }
    }

    #[test]
    fn revenue_series_is_zero_filled_and_settled_only() {
        let txs = vec![
            tx(9700, "completed", 3, 30),
            tx(1000, "refunded", 3, 30),
            tx(4990, "PAID", 4, 1),
            tx(5000, "completed", 4, 20),
        ];
        let series = revenue_by_day(&range(), &txs);
        assert_eq!(
            series,
            vec![
                SeriesPoint::new("2026-03-30", 9700),
                SeriesPoint::new("2026-03-31", 0),
                SeriesPoint::new("2026-04-01", 4990),
                SeriesPoint::new("2026-04-02", 0),
            ]
        );
    }

    #[test]
    fn expenses_group_by_normalized_category() {
        let expenses = vec![
            expense("Ads", 3000, 3, 30),
            expense(" ads ", 2000, 4, 1),
            expense("Hosting", 900, 4, 1),
        ];
        assert_eq!(
            expenses_by_category(&expenses),
            vec![SeriesPoint::new("ads", 5000), SeriesPoint::new("hosting", 900)]
        );
    }

    #[test]
    fn blank_category_falls_into_outros() {
        let expenses = vec![
            expense("", 700, 4, 1),
            expense("   ", 300, 4, 2),
            expense("Outros", 100, 4, 3),
        ];
        assert_eq!(
            expenses_by_category(&expenses),
            vec![SeriesPoint::new("outros", 1100)]
        );
    }

    #[test]
    fn net_by_month_subtracts_expenses() {
        let txs = vec![tx(10_000, "completed", 3, 30), tx(2_000, "approved", 4, 1)];
        let expenses = vec![expense("ads", 4_000, 3, 31), expense("ads", 5_000, 4, 2)];
        assert_eq!(
            net_by_month(&txs, &expenses),
            vec![
                MonthlyNet { month: "2026-03".into(), revenue: 10_000, expenses: 4_000, net: 6_000 },
                MonthlyNet { month: "2026-04".into(), revenue: 2_000, expenses: 5_000, net: -3_000 },
            ]
        );
    }

    #[test]
    fn active_users_are_distinct_per_day() {
        let ana = Uuid::new_v4();
        let bia = Uuid::new_v4();
        let activity = vec![
            ActivityRow { user_id: ana, action: "login".into(), created_at: at(3, 30) },
            ActivityRow { user_id: ana, action: "download".into(), created_at: at(3, 30) },
            ActivityRow { user_id: bia, action: "login".into(), created_at: at(3, 30) },
            ActivityRow { user_id: bia, action: "login".into(), created_at: at(4, 2) },
        ];

        let active = active_users_by_day(&range(), &activity);
        assert_eq!(active[0], SeriesPoint::new("2026-03-30", 2));
        assert_eq!(active[3], SeriesPoint::new("2026-04-02", 1));

        assert_eq!(
            activity_by_action(&activity),
            vec![SeriesPoint::new("login", 3), SeriesPoint::new("download", 1)]
        );
    }

    #[test]
    fn top_content_counts_completions_and_resolves_titles() {
        let kit = Uuid::new_v4();
        let quiz = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let progress = vec![
            ProgressRow { content_type: "papercraft".into(), content_id: kit, completed: true },
            ProgressRow { content_type: "papercraft".into(), content_id: kit, completed: true },
            ProgressRow { content_type: "educational_activity".into(), content_id: quiz, completed: true },
            ProgressRow { content_type: "educational_activity".into(), content_id: quiz, completed: false },
            ProgressRow { content_type: "papercraft".into(), content_id: gone, completed: true },
        ];
        let titles = HashMap::from([
            (("papercraft".to_string(), kit), "Casinha".to_string()),
            (("educational_activity".to_string(), quiz), "Alfabeto".to_string()),
        ]);

        let ranks = top_content(&progress, &titles, 2);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].title, "Casinha");
        assert_eq!(ranks[0].completions, 2);
        assert_eq!(ranks[1].title, "Alfabeto");

        let all = top_content(&progress, &titles, 10);
        assert_eq!(all[2].title, MISSING_CONTENT_TITLE);
    }

    #[test]
    fn titles_resolve_per_content_type() {
        let shared = Uuid::new_v4();
        let progress = vec![
            ProgressRow { content_type: "papercraft".into(), content_id: shared, completed: true },
            ProgressRow { content_type: "papercraft".into(), content_id: shared, completed: true },
            ProgressRow { content_type: "educational_activities".into(), content_id: shared, completed: true },
        ];
        let titles = HashMap::from([
            (("papercraft".to_string(), shared), "Casinha".to_string()),
            (("educational_activity".to_string(), shared), "Alfabeto".to_string()),
        ]);

        let ranks = top_content(&progress, &titles, 10);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].title, "Casinha");
        assert_eq!(ranks[1].title, "Alfabeto");
        assert_eq!(ranks[1].content_type, "educational_activities");
    }

    #[test]
    fn totals_format_in_brl() {
        let t = totals(&[tx(1299, "completed", 4, 1)], &[expense("ads", 2000, 4, 1)]);
        assert_eq!(t.net, -701);
        assert_eq!(t.revenue_display, "R$ 12,99");
        assert_eq!(t.net_display, "-R$ 7,01");
    }

    #[test]
    fn overview_combines_all_series() {
        let rows = OverviewRows {
            transactions: vec![tx(9700, "completed", 4, 1)],
            signups: vec![SignupRow { created_at: at(4, 1) }],
            ..Default::default()
        };
        let overview = build_overview(&range(), &rows);
        assert_eq!(overview.revenue_by_day.len(), 4);
        assert_eq!(overview.signups_by_day[2], SeriesPoint::new("2026-04-01", 1));
        assert_eq!(overview.totals.revenue, 9700);
        assert!(overview.top_content.is_empty());
    }
}
