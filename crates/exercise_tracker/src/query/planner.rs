use std::num::NonZeroUsize;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LogFilters;
use crate::{
    error::{TrackerError, TrackerResult},
    records::{ExerciseRecord, UserId, render_calendar_day},
    storage::ExerciseStore,
};

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Unbounded,
    RangeOnly(DateWindow),
    LimitOnly(NonZeroUsize),
    /// The cap is applied to store order first, then the window filters what
    /// is left, so fewer than `limit` entries may come back even when more
    /// in-range records exist past the cap.
    RangeAndLimit(DateWindow, NonZeroUsize),
}

impl QueryMode {
    /// A window is only formed when both bounds are present; a lone bound
    /// does not filter.
    pub fn select(filters: &LogFilters) -> Self {
        let window = match (filters.from, filters.to) {
            (Some(from), Some(to)) => Some(DateWindow::new(from, to)),
            _ => None,
        };

        match (window, filters.limit) {
            (Some(window), Some(limit)) => Self::RangeAndLimit(window, limit),
            (Some(window), None) => Self::RangeOnly(window),
            (None, Some(limit)) => Self::LimitOnly(limit),
            (None, None) => Self::Unbounded,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unbounded => "unbounded",
            Self::RangeOnly(_) => "range_only",
            Self::LimitOnly(_) => "limit_only",
            Self::RangeAndLimit(..) => "range_and_limit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogQuery {
    pub user_id: UserId,
    pub filters: LogFilters,
}

impl LogQuery {
    pub fn new(user_id: UserId, filters: LogFilters) -> Self {
        Self { user_id, filters }
    }

    pub fn mode(&self) -> QueryMode {
        QueryMode::select(&self.filters)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub description: String,
    pub duration: u64,
    pub date: String,
}

impl From<ExerciseRecord> for LogEntry {
    fn from(record: ExerciseRecord) -> Self {
        Self {
            description: record.description,
            duration: record.duration,
            date: render_calendar_day(record.date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResult {
    pub username: String,
    pub count: usize,
    pub user_id: UserId,
    pub entries: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Run a log query against the store. Fails with `NotFound` before touching
/// exercises when the user does not exist; store errors pass through as-is.
pub async fn plan(store: &dyn ExerciseStore, query: &LogQuery) -> TrackerResult<LogResult> {
    let user = store
        .find_user_by_id(query.user_id)
        .await?
        .ok_or_else(|| TrackerError::not_found(query.user_id))?;

    let mode = query.mode();
    let records = match mode {
        QueryMode::Unbounded => store.find_exercises_by_user(user.id).await?,
        QueryMode::RangeOnly(window) => {
            store
                .find_exercises_between(user.id, window.from, window.to)
                .await?
        }
        QueryMode::LimitOnly(limit) => {
            let mut records = store.find_exercises_by_user(user.id).await?;
            records.truncate(limit.get());
            records
        }
        QueryMode::RangeAndLimit(window, limit) => {
            let mut records = store.find_exercises_by_user(user.id).await?;
            records.truncate(limit.get());
            records.retain(|record| window.contains(record.date));
            records
        }
    };

    let entries: Vec<LogEntry> = records.into_iter().map(LogEntry::from).collect();
    debug!(
        user_id = %user.id,
        mode = mode.label(),
        count = entries.len(),
        "log query planned"
    );

    Ok(LogResult {
        username: user.username,
        count: entries.len(),
        user_id: user.id,
        entries,
        from: query.filters.from.map(render_calendar_day),
        to: query.filters.to.map(render_calendar_day),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::sanitize,
        records::User,
        storage::{ExerciseStore, MemoryStore},
    };
    use anyhow::anyhow;
    use async_trait::async_trait;
    use uuid::Uuid;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    async fn seeded_store(dates: &[NaiveDate]) -> (MemoryStore, User) {
        let store = MemoryStore::default();
        let user = User::new("runner");
        store.insert_user(user.clone()).await.unwrap();
        for (index, date) in dates.iter().enumerate() {
            let duration = 10 + index as u64;
            let record = ExerciseRecord::new(&user, format!("session {index}"), duration, *date);
            store.insert_exercise(record).await.unwrap();
        }
        (store, user)
    }

    async fn january_store() -> (MemoryStore, User) {
        seeded_store(&[ymd(2023, 1, 1), ymd(2023, 1, 15), ymd(2023, 2, 1)]).await
    }

    async fn run(
        store: &MemoryStore,
        user: &User,
        from: Option<&str>,
        to: Option<&str>,
        limit: Option<&str>,
    ) -> LogResult {
        let query = LogQuery::new(user.id, sanitize(from, to, limit));
        plan(store, &query).await.expect("log query")
    }

    #[test]
    fn mode_selection_requires_both_bounds_for_a_window() {
        let window = DateWindow::new(ymd(2023, 1, 1), ymd(2023, 1, 31));
        let limit = NonZeroUsize::new(2).unwrap();

        let both = LogFilters {
            from: Some(window.from),
            to: Some(window.to),
            limit: Some(limit),
        };
        assert_eq!(
            QueryMode::select(&both),
            QueryMode::RangeAndLimit(window, limit)
        );

        let range = LogFilters { limit: None, ..both };
        assert_eq!(QueryMode::select(&range), QueryMode::RangeOnly(window));

        let from_only = LogFilters { to: None, ..both };
        assert_eq!(QueryMode::select(&from_only), QueryMode::LimitOnly(limit));

        let to_only = LogFilters {
            from: None,
            limit: None,
            ..both
        };
        assert_eq!(QueryMode::select(&to_only), QueryMode::Unbounded);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = DateWindow::new(ymd(2023, 1, 1), ymd(2023, 1, 31));
        assert!(window.contains(ymd(2023, 1, 1)));
        assert!(window.contains(ymd(2023, 1, 31)));
        assert!(!window.contains(ymd(2022, 12, 31)));
        assert!(!window.contains(ymd(2023, 2, 1)));
    }

    #[tokio::test]
    async fn january_range_returns_first_two_and_echoes_bounds() {
        let (store, user) = january_store().await;

        let result = run(&store, &user, Some("2023-01-01"), Some("2023-01-31"), None).await;

        assert_eq!(result.count, 2);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].date, "Sun Jan 01 2023");
        assert_eq!(result.entries[1].date, "Sun Jan 15 2023");
        assert_eq!(result.from.as_deref(), Some("Sun Jan 01 2023"));
        assert_eq!(result.to.as_deref(), Some("Tue Jan 31 2023"));
        assert_eq!(result.username, "runner");
        assert_eq!(result.user_id, user.id);
    }

    #[tokio::test]
    async fn limit_only_keeps_store_order() {
        let (store, user) = january_store().await;

        let result = run(&store, &user, None, None, Some("1")).await;
        assert_eq!(result.count, 1);
        assert_eq!(result.entries[0].description, "session 0");
        assert!(result.from.is_none());
        assert!(result.to.is_none());

        let result = run(&store, &user, None, None, Some("50")).await;
        assert_eq!(result.count, 3);
    }

    #[tokio::test]
    async fn unbounded_returns_everything_in_insertion_order() {
        let (store, user) =
            seeded_store(&[ymd(2023, 5, 1), ymd(2021, 1, 1), ymd(2022, 7, 7)]).await;

        let result = run(&store, &user, None, None, None).await;

        let descriptions: Vec<_> = result
            .entries
            .iter()
            .map(|entry| entry.description.as_str())
            .collect();
        assert_eq!(descriptions, ["session 0", "session 1", "session 2"]);
        assert_eq!(result.count, 3);
    }

    #[tokio::test]
    async fn cap_is_applied_before_the_window() {
        // Only the third record is in range, but the cap of two cuts it off first.
        let (store, user) = seeded_store(&[
            ymd(2022, 1, 1),
            ymd(2022, 6, 1),
            ymd(2023, 1, 10),
            ymd(2023, 1, 20),
        ])
        .await;

        let january = (Some("2023-01-01"), Some("2023-01-31"));
        let result = run(&store, &user, january.0, january.1, Some("2")).await;
        assert_eq!(result.count, 0);
        assert!(result.entries.is_empty());

        let result = run(&store, &user, january.0, january.1, Some("3")).await;
        assert_eq!(result.count, 1);
        assert_eq!(result.entries[0].description, "session 2");
    }

    #[tokio::test]
    async fn lowering_the_cap_never_grows_a_ranged_result() {
        let dates: Vec<_> = (1..=10).map(|day| ymd(2023, 1, day * 3)).collect();
        let (store, user) = seeded_store(&dates).await;

        let mut previous = usize::MAX;
        for limit in (1..=12usize).rev() {
            let raw_limit = limit.to_string();
            let result = run(
                &store,
                &user,
                Some("2023-01-05"),
                Some("2023-01-25"),
                Some(&raw_limit),
            )
            .await;
            assert!(result.count <= limit);
            assert!(result.count <= previous);
            assert_eq!(result.count, result.entries.len());
            previous = result.count;
        }
    }

    #[tokio::test]
    async fn ranged_entries_fall_inside_the_window() {
        let dates: Vec<_> = (1..=28).map(|day| ymd(2023, 2, day)).collect();
        let (store, user) = seeded_store(&dates).await;
        let window = DateWindow::new(ymd(2023, 2, 10), ymd(2023, 2, 20));

        let query = LogQuery::new(
            user.id,
            LogFilters {
                from: Some(window.from),
                to: Some(window.to),
                limit: None,
            },
        );
        let result = plan(&store, &query).await.unwrap();

        assert_eq!(result.count, 11);
        for entry in &result.entries {
            let date = crate::query::parse_calendar_date(&entry.date).unwrap();
            assert!(window.contains(date), "{} outside window", entry.date);
        }
    }

    #[tokio::test]
    async fn malformed_from_behaves_like_absent_from() {
        let (store, user) = january_store().await;

        let malformed =
            run(&store, &user, Some("not-a-date"), Some("2023-01-31"), None).await;
        let absent = run(&store, &user, None, Some("2023-01-31"), None).await;

        assert_eq!(malformed, absent);
        assert_eq!(malformed.count, 3);
        assert!(malformed.from.is_none());
        assert_eq!(malformed.to.as_deref(), Some("Tue Jan 31 2023"));
    }

    #[tokio::test]
    async fn inverted_window_is_empty_and_echoes_both_bounds() {
        let (store, user) = january_store().await;

        let result = run(&store, &user, Some("2023-01-31"), Some("2023-01-01"), None).await;

        assert_eq!(result.count, 0);
        assert!(result.entries.is_empty());
        assert_eq!(result.from.as_deref(), Some("Tue Jan 31 2023"));
        assert_eq!(result.to.as_deref(), Some("Sun Jan 01 2023"));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (store, _) = january_store().await;
        let query = LogQuery::new(Uuid::new_v4(), LogFilters::default());

        let err = plan(&store, &query).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
    }

    struct BrokenStore {
        fail_user_lookup: bool,
    }

    #[async_trait]
    impl ExerciseStore for BrokenStore {
        async fn find_user_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
            if self.fail_user_lookup {
                return Err(anyhow!("users file unreadable"));
            }
            Ok(Some(User {
                id,
                username: "ghost".to_string(),
            }))
        }

        async fn list_users(&self) -> anyhow::Result<Vec<User>> {
            Ok(Vec::new())
        }

        async fn insert_user(&self, _user: User) -> anyhow::Result<()> {
            Ok(())
        }

        async fn find_exercises_by_user(
            &self,
            _user_id: UserId,
        ) -> anyhow::Result<Vec<ExerciseRecord>> {
            Err(anyhow!("disk on fire"))
        }

        async fn insert_exercise(&self, _record: ExerciseRecord) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn store_failures_propagate_without_partial_results() {
        let query = LogQuery::new(Uuid::new_v4(), LogFilters::default());

        let store = BrokenStore {
            fail_user_lookup: false,
        };
        let err = plan(&store, &query).await.unwrap_err();
        match err {
            TrackerError::Store(inner) => assert_eq!(inner.to_string(), "disk on fire"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_user_lookup_is_a_store_failure_not_a_miss() {
        let query = LogQuery::new(Uuid::new_v4(), LogFilters::default());

        let store = BrokenStore {
            fail_user_lookup: true,
        };
        let err = plan(&store, &query).await.unwrap_err();
        match err {
            TrackerError::Store(inner) => {
                assert_eq!(inner.to_string(), "users file unreadable")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
