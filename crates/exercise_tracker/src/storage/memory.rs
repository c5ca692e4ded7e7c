use async_trait::async_trait;
use parking_lot::RwLock;

use super::ExerciseStore;
use crate::records::{ExerciseRecord, User, UserId};

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    exercises: RwLock<Vec<ExerciseRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExerciseStore for MemoryStore {
    async fn find_user_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let users = self.users.read();
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.read().clone())
    }

    async fn insert_user(&self, user: User) -> anyhow::Result<()> {
        self.users.write().push(user);
        Ok(())
    }

    async fn find_exercises_by_user(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Vec<ExerciseRecord>> {
        let exercises = self.exercises.read();
        Ok(exercises
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_exercise(&self, record: ExerciseRecord) -> anyhow::Result<()> {
        self.exercises.write().push(record);
        Ok(())
    }
}
