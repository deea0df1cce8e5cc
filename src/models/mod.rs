pub mod session;
pub mod task;
pub mod user;

pub use session::Session;
pub use task::{
    sort_by_priority, tasks_near_deadline, Task, TaskInput, TaskPriority, TaskQuery, TaskStatus,
};
pub use user::{NewUser, User};
