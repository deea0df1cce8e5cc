use crate::error::AppError;
use crate::models::{Task, User};

/// Whether `user` owns `task`.
pub fn is_owner(user: &User, task: &Task) -> bool {
    task.owner_id == user.id
}

/// The single ownership gate for every operation on one task.
pub fn ensure_owner(user: &User, task: &Task) -> Result<(), AppError> {
    if is_owner(user, task) {
        Ok(())
    } else {
        log::warn!(
            "User {} denied access to task {} owned by {}",
            user.id,
            task.id,
            task.owner_id
        );
        Err(AppError::Forbidden("Permission denied".into()))
    }
}
