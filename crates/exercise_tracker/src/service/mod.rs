//! Tracker operations as seen by the transport layer. Each call runs against
//! the store and then reports its outcome to the audit sink.

use std::{sync::Arc, time::Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    audit::{AuditEvent, AuditSink},
    error::{TrackerError, TrackerResult},
    query::{LogQuery, LogResult, parse_calendar_date, plan, sanitize},
    records::{ExerciseRecord, User, UserId, render_calendar_day},
    storage::ExerciseStore,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Unvalidated exercise fields as they arrive from a client.
#[derive(Debug, Clone, Default)]
pub struct RawExercise {
    pub description: Option<String>,
    pub duration: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseReceipt {
    #[serde(rename = "_id")]
    pub user_id: UserId,
    pub username: String,
    pub description: String,
    pub duration: u64,
    pub date: String,
}

#[derive(Clone)]
pub struct ExerciseTracker {
    store: Arc<dyn ExerciseStore>,
    audit: Arc<dyn AuditSink>,
}

impl ExerciseTracker {
    pub fn new(store: Arc<dyn ExerciseStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn create_user(&self, raw_username: Option<&str>) -> TrackerResult<UserSummary> {
        let started = Instant::now();
        let request = json!({ "username": raw_username });

        let result = self.insert_user(raw_username).await;
        let user_id = result.as_ref().ok().map(|user| user.id.to_string());
        self.report("users.create", request, user_id, &result, started);
        result
    }

    async fn insert_user(&self, raw_username: Option<&str>) -> TrackerResult<UserSummary> {
        let username = raw_username
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| TrackerError::missing_field("username"))?;

        let user = User::new(username);
        self.store.insert_user(user.clone()).await?;
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user.into())
    }

    pub async fn list_users(&self) -> TrackerResult<Vec<UserSummary>> {
        let started = Instant::now();

        let result = self
            .store
            .list_users()
            .await
            .map(|users| users.into_iter().map(UserSummary::from).collect::<Vec<_>>())
            .map_err(TrackerError::from);
        self.report("users.list", Value::Null, None, &result, started);
        result
    }

    pub async fn add_exercise(
        &self,
        raw_user_id: &str,
        input: RawExercise,
    ) -> TrackerResult<ExerciseReceipt> {
        let started = Instant::now();
        let request = json!({
            "userId": raw_user_id,
            "description": input.description,
            "duration": input.duration,
            "date": input.date,
        });

        let result = self.insert_exercise(raw_user_id, input).await;
        self.report(
            "exercises.create",
            request,
            Some(raw_user_id.to_string()),
            &result,
            started,
        );
        result
    }

    async fn insert_exercise(
        &self,
        raw_user_id: &str,
        input: RawExercise,
    ) -> TrackerResult<ExerciseReceipt> {
        let user_id = parse_user_id(raw_user_id)?;
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| TrackerError::not_found(user_id))?;

        let description = non_blank(input.description.as_deref())
            .ok_or_else(|| TrackerError::missing_field("description"))?;

        let raw_duration = non_blank(input.duration.as_deref())
            .ok_or_else(|| TrackerError::missing_field("duration"))?;
        let duration: u64 = raw_duration.parse().map_err(|_| {
            TrackerError::InvalidInput(format!(
                "Path `duration` must be a non-negative integer, got \"{raw_duration}\"."
            ))
        })?;

        let date = match non_blank(input.date.as_deref()) {
            None => Utc::now().date_naive(),
            Some(raw_date) => parse_calendar_date(raw_date).ok_or_else(|| {
                TrackerError::InvalidInput(format!(
                    "Path `date` is not a valid date: \"{raw_date}\"."
                ))
            })?,
        };

        let record = ExerciseRecord::new(&user, description, duration, date);
        self.store.insert_exercise(record.clone()).await?;
        info!(user_id = %user.id, exercise_id = %record.id, "exercise logged");

        Ok(ExerciseReceipt {
            user_id: record.user_id,
            username: record.username,
            description: record.description,
            duration: record.duration,
            date: render_calendar_day(record.date),
        })
    }

    /// Fetch a user's exercise log. Malformed `from`/`to`/`limit` values are
    /// ignored rather than rejected.
    pub async fn exercise_log(
        &self,
        raw_user_id: &str,
        raw_from: Option<&str>,
        raw_to: Option<&str>,
        raw_limit: Option<&str>,
    ) -> TrackerResult<LogResult> {
        let started = Instant::now();
        let request = json!({
            "userId": raw_user_id,
            "from": raw_from,
            "to": raw_to,
            "limit": raw_limit,
        });

        let result = async {
            let user_id = parse_user_id(raw_user_id)?;
            let query = LogQuery::new(user_id, sanitize(raw_from, raw_to, raw_limit));
            info!(user_id = %user_id, mode = query.mode().label(), "querying exercise log");
            plan(self.store.as_ref(), &query).await
        }
        .await;

        self.report(
            "logs.query",
            request,
            Some(raw_user_id.to_string()),
            &result,
            started,
        );
        result
    }

    fn report<T: Serialize>(
        &self,
        operation: &str,
        request: Value,
        user_id: Option<String>,
        result: &TrackerResult<T>,
        started: Instant,
    ) {
        let event = match result {
            Ok(value) => {
                let response = serde_json::to_value(value).unwrap_or_else(|err| {
                    warn!(error = ?err, operation, "failed to encode audit response");
                    Value::Null
                });
                AuditEvent::success(operation, request, response)
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), operation, "tracker operation failed");
                AuditEvent::failure(operation, request, err)
            }
        };
        let event = match user_id {
            Some(user_id) => event.with_user(user_id),
            None => event,
        };
        self.audit.record(event.with_duration(started.elapsed()));
    }
}

/// An id that is not a UUID cannot name any user.
fn parse_user_id(raw: &str) -> TrackerResult<UserId> {
    Uuid::parse_str(raw.trim()).map_err(|_| TrackerError::not_found(raw))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
