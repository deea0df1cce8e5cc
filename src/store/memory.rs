use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::error::AppError;
use crate::models::{NewUser, Session, Task, TaskInput, User};

#[derive(Default)]
struct Tables {
    next_user_id: i32,
    users: Vec<User>,
    // Insertion order doubles as creation order.
    tasks: Vec<Task>,
    sessions: HashMap<String, Session>,
}

/// An in-process [`Store`]. Data lives as long as the value does.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username already taken".into()));
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn update_user_password(
        &self,
        id: i32,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.password_hash = password_hash.to_string();
            user.clone()
        }))
    }

    async fn create_task(&self, task: Task) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == task.owner_id) {
            return Err(AppError::DatabaseError(format!(
                "Task owner {} does not exist",
                task.owner_id
            )));
        }
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(
        &self,
        owner_id: i32,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_all_tasks(&self, owner_id: i32) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_tasks_near_deadline(
        &self,
        owner_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.owner_id == owner_id && t.is_near_deadline(now))
            .cloned()
            .collect())
    }

    async fn update_task(
        &self,
        id: Uuid,
        input: TaskInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            task.apply(input, now);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        Ok(tables.tasks.len() != before)
    }

    async fn create_session(&self, session: Session) -> Result<Session, AppError> {
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(&session.token) {
            return Err(AppError::Conflict("Session token already exists".into()));
        }
        tables
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.sessions.remove(token);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| session.is_active_at(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}
