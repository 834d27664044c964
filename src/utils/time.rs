use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// `true` when the UTC calendar date of `at` lies within the inclusive bounds.
pub fn within_dates(at: DateTime<Utc>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    let date = at.date_naive();
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

/// Inclusive calendar-date range used by the analytics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Missing bounds default to the `default_days` days ending today. Reversed bounds are swapped.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
        default_days: i64,
    ) -> Self {
        let to = to.unwrap_or(today);
        let from = from.unwrap_or_else(|| to - Duration::days(default_days.max(1) - 1));
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// Half-open timestamp bounds `[start, end)` for SQL range filters.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            start_of_day(self.from),
            start_of_day(self.to) + Duration::days(1),
        )
    }
}
