use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// How far ahead a deadline counts as "near".
pub const NEAR_DEADLINE_WINDOW_HOURS: i64 = 24;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Position in the task list: high priority first.
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 2,
        }
    }
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    New,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::New, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

/// Input structure for creating or updating a task.
/// Contains validation rules for its fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task.
    /// Must be between 1 and 13 characters.
    #[validate(length(min = 1, max = 13))]
    pub title: String,

    /// The description of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub description: String,

    /// Defaults to `new` when omitted.
    #[serde(default)]
    pub status: TaskStatus,

    /// Defaults to `medium` when omitted.
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional deadline for the task.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub deadline: Option<DateTime<Utc>>,
    /// Identifier of the user who owns the task. Never changes.
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pagination parameters for listing tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl Task {
    /// Creates a new `Task` owned by `owner_id` with a fresh UUID and
    /// `created_at`/`updated_at` set to now.
    pub fn new(input: TaskInput, owner_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            deadline: input.deadline,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the editable fields with `input`. The owner is untouched.
    pub fn apply(&mut self, input: TaskInput, now: DateTime<Utc>) {
        self.title = input.title;
        self.description = input.description;
        self.status = input.status;
        self.priority = input.priority;
        self.deadline = input.deadline;
        self.updated_at = now;
    }

    /// True when the deadline lies in `(now, now + 24h]`.
    pub fn is_near_deadline(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => {
                deadline > now && deadline <= now + Duration::hours(NEAR_DEADLINE_WINDOW_HOURS)
            }
            None => false,
        }
    }
}

/// Keeps the tasks whose deadline falls within the next 24 hours.
pub fn tasks_near_deadline(tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| task.is_near_deadline(now))
        .collect()
}

/// Orders tasks high priority first, oldest first within a priority.
pub fn sort_by_priority(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (task.priority.rank(), task.created_at));
}
