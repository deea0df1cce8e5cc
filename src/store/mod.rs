//! Persistence boundary.
//!
//! Handlers and the session authenticator only ever talk to a [`Store`]
//! handle that is built once in `main` and injected as `web::Data<dyn Store>`.
//! [`PgStore`] is the production implementation; [`MemoryStore`] keeps
//! everything in process and backs the test-suite.
//!
//! Every method is a single logical read or write. Implementations are
//! responsible for making each one atomic.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, Session, Task, TaskInput, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a user. A taken username is `AppError::Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// Returns `None` if the user does not exist.
    async fn update_user_password(
        &self,
        id: i32,
        password_hash: &str,
    ) -> Result<Option<User>, AppError>;

    async fn create_task(&self, task: Task) -> Result<Task, AppError>;
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;
    /// Tasks of `owner_id` in creation order, paginated.
    async fn list_tasks(&self, owner_id: i32, skip: i64, limit: i64)
        -> Result<Vec<Task>, AppError>;
    /// Every task of `owner_id` in creation order.
    async fn list_all_tasks(&self, owner_id: i32) -> Result<Vec<Task>, AppError>;
    /// Tasks of `owner_id` whose deadline lies in `(now, now + 24h]`.
    async fn list_tasks_near_deadline(
        &self,
        owner_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, AppError>;
    /// Replaces the editable fields. Returns `None` if the task does not exist.
    async fn update_task(
        &self,
        id: Uuid,
        input: TaskInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, AppError>;
    /// Returns whether a task was deleted.
    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError>;

    /// Inserts a session. A duplicate token is `AppError::Conflict`.
    async fn create_session(&self, session: Session) -> Result<Session, AppError>;
    async fn get_session(&self, token: &str) -> Result<Option<Session>, AppError>;
    /// Deleting an unknown token is not an error.
    async fn delete_session(&self, token: &str) -> Result<(), AppError>;
    /// Removes sessions that expired at or before `now`; returns how many.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
