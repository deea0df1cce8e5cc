use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::error::AppError;
use crate::models::task::NEAR_DEADLINE_WINDOW_HOURS;
use crate::models::{NewUser, Session, Task, TaskInput, User};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, deadline, owner_id, created_at, updated_at";

/// A [`Store`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Applies the migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2)
             RETURNING id, username, password_hash, created_at",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Username already taken".into()),
            other => other,
        })
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user_password(
        &self,
        id: i32,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET password_hash = $1 WHERE id = $2
             RETURNING id, username, password_hash, created_at",
        )
        .bind(password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_task(&self, task: Task) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks ({TASK_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.deadline)
            .bind(task.owner_id)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_tasks(
        &self,
        owner_id: i32,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1
             ORDER BY created_at, id OFFSET $2 LIMIT $3"
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(owner_id)
            .bind(skip.max(0))
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn list_all_tasks(&self, owner_id: i32) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 ORDER BY created_at, id"
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn list_tasks_near_deadline(
        &self,
        owner_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE owner_id = $1 AND deadline > $2 AND deadline <= $3
             ORDER BY created_at, id"
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(owner_id)
            .bind(now)
            .bind(now + Duration::hours(NEAR_DEADLINE_WINDOW_HOURS))
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn update_task(
        &self,
        id: Uuid,
        input: TaskInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "UPDATE tasks
             SET title = $1, description = $2, status = $3, priority = $4, deadline = $5,
                 updated_at = $6
             WHERE id = $7
             RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(input.title)
            .bind(input.description)
            .bind(input.status)
            .bind(input.priority)
            .bind(input.deadline)
            .bind(now)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_session(&self, session: Session) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING token, user_id, created_at, expires_at",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};

    async fn test_store() -> PgStore {
        dotenv::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let store = PgStore::connect(&url).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[ignore]
    #[actix_rt::test]
    async fn test_task_round_trip_against_postgres() {
        let store = test_store().await;
        let username = format!("pg{}", &Uuid::new_v4().simple().to_string()[..6]);
        let user = store
            .create_user(NewUser {
                username: username.clone(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        let task = Task::new(
            TaskInput {
                title: "Buy milk".into(),
                description: "2 litres".into(),
                status: TaskStatus::InProgress,
                priority: TaskPriority::High,
                deadline: Some(Utc::now() + Duration::hours(2)),
            },
            user.id,
        );
        let created = store.create_task(task.clone()).await.unwrap();
        assert_eq!(created.id, task.id);
        assert_eq!(created.status, TaskStatus::InProgress);

        let near = store
            .list_tasks_near_deadline(user.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(near.len(), 1);

        assert!(store.delete_task(task.id).await.unwrap());
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(store.pool())
            .await
            .unwrap();
    }
}
