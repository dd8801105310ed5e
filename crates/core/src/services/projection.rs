//! Pure aggregations over case snapshots.
//!
//! Everything here is a total function of its inputs: snapshots come in as
//! slices, `now` comes in as an argument, nothing reads the wall clock.
//! Dashboards recompute these on every snapshot emission.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::HashMap;

use vigia_store::{CasePriority, CaseRecord, CaseStatus, NotificationRecord};

/// Counts by priority bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Counts by lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub assigned: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
}

/// Aggregate statistics over one case snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseStats {
    pub total: usize,
    pub by_priority: PriorityCounts,
    pub by_status: StatusCounts,
    pub anonymous: usize,
    pub identified: usize,
}

/// Compute aggregate statistics in one pass.
#[must_use]
pub fn case_stats(cases: &[CaseRecord]) -> CaseStats {
    let mut stats = CaseStats {
        total: cases.len(),
        ..CaseStats::default()
    };

    for case in cases {
        match case.priority {
            CasePriority::Low => stats.by_priority.low += 1,
            CasePriority::Medium => stats.by_priority.medium += 1,
            CasePriority::High => stats.by_priority.high += 1,
        }
        match case.status {
            CaseStatus::Pending => stats.by_status.pending += 1,
            CaseStatus::Assigned => stats.by_status.assigned += 1,
            CaseStatus::InProgress => stats.by_status.in_progress += 1,
            CaseStatus::Resolved => stats.by_status.resolved += 1,
            CaseStatus::Closed => stats.by_status.closed += 1,
        }
        if case.is_anonymous {
            stats.anonymous += 1;
        } else {
            stats.identified += 1;
        }
    }

    stats
}

/// One city's case count in a ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityCount {
    pub city: String,
    pub count: usize,
}

/// Rank cities by case volume.
///
/// Count descending; equal counts order by city name ascending, so the
/// ranking is deterministic across runs. Cases without a city are skipped.
#[must_use]
pub fn top_cities(cases: &[CaseRecord], limit: usize) -> Vec<CityCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for case in cases {
        if let Some(city) = case.location.city.as_deref() {
            *counts.entry(city).or_insert(0) += 1;
        }
    }

    let mut ranking: Vec<CityCount> = counts
        .into_iter()
        .map(|(city, count)| CityCount {
            city: city.to_string(),
            count,
        })
        .collect();
    ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
    ranking.truncate(limit);
    ranking
}

/// Reporting window for dashboard filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// The current local calendar day.
    Today,
    /// The previous local calendar day.
    Yesterday,
    /// Rolling seven days ending now.
    LastSevenDays,
    /// From the first of the current local month.
    ThisMonth,
    /// No bounds.
    AllTime,
}

impl TimeWindow {
    /// Half-open `[start, end)` bounds in the caller's timezone.
    ///
    /// Today and Yesterday are local calendar days, not rolling 24-hour
    /// offsets: two instants on the same UTC day can land in different
    /// windows when the local day boundary sits between them. `None`
    /// means unbounded on that side.
    pub fn bounds<Tz: TimeZone>(
        self,
        now: &DateTime<Tz>,
    ) -> (Option<DateTime<Tz>>, Option<DateTime<Tz>>) {
        let tz = now.timezone();
        let today = now.date_naive();

        match self {
            Self::Today => (
                day_start(today, &tz),
                today
                    .checked_add_days(Days::new(1))
                    .and_then(|tomorrow| day_start(tomorrow, &tz)),
            ),
            Self::Yesterday => (
                today
                    .checked_sub_days(Days::new(1))
                    .and_then(|yesterday| day_start(yesterday, &tz)),
                day_start(today, &tz),
            ),
            Self::LastSevenDays => (Some(now.clone() - chrono::Duration::days(7)), None),
            Self::ThisMonth => (
                today.with_day(1).and_then(|first| day_start(first, &tz)),
                None,
            ),
            Self::AllTime => (None, None),
        }
    }

    /// Whether a stored (UTC) instant falls inside the window.
    pub fn contains<Tz: TimeZone>(self, instant: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        let (start, end) = self.bounds(now);
        let instant = instant.with_timezone(&now.timezone());
        start.is_none_or(|s| instant >= s) && end.is_none_or(|e| instant < e)
    }
}

/// First valid instant of a local calendar day.
///
/// Midnight can fall inside a DST gap; the day then starts at the first
/// representable instant after it.
fn day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..3).find_map(|hour| {
        tz.from_local_datetime(&(midnight + chrono::Duration::hours(hour)))
            .earliest()
    })
}

/// Select the cases created inside the window.
#[must_use]
pub fn filter_by_window<'a, Tz: TimeZone>(
    cases: &'a [CaseRecord],
    window: TimeWindow,
    now: &DateTime<Tz>,
) -> Vec<&'a CaseRecord> {
    cases
        .iter()
        .filter(|case| window.contains(case.created_at, now))
        .collect()
}

/// Unread badge count.
#[must_use]
pub fn unread_count(notifications: &[NotificationRecord]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}
