use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format used for every calendar day handed back to clients, e.g. `Sun Jan 01 2023`.
pub const CALENDAR_DAY_FORMAT: &str = "%a %b %d %Y";

pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: Uuid,
    pub user_id: UserId,
    /// Owner's username as it was when the exercise was logged.
    pub username: String,
    pub description: String,
    pub duration: u64,
    pub date: NaiveDate,
}

impl ExerciseRecord {
    pub fn new(
        owner: &User,
        description: impl Into<String>,
        duration: u64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner.id,
            username: owner.username.clone(),
            description: description.into(),
            duration,
            date,
        }
    }
}

pub fn render_calendar_day(date: NaiveDate) -> String {
    date.format(CALENDAR_DAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_day_matches_client_format() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(render_calendar_day(date), "Sun Jan 01 2023");

        let date = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        assert_eq!(render_calendar_day(date), "Tue Jan 31 2023");
    }

    #[test]
    fn exercise_copies_owner_identity() {
        let user = User::new("ada");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let record = ExerciseRecord::new(&user, "rowing", 30, date);

        assert_eq!(record.user_id, user.id);
        assert_eq!(record.username, "ada");
        assert_ne!(record.id, user.id);
    }
}
