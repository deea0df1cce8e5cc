use crate::{
    auth::{ensure_owner, CurrentUser},
    error::AppError,
    models::{Task, TaskInput, TaskQuery, User},
    search::Matcher,
    store::Store,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use log::info;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Query parameters of the fuzzy title search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    /// Overrides the threshold of the configured matcher.
    pub threshold: Option<f64>,
}

/// Loads a task and checks that `user` owns it.
///
/// A missing task is `NotFound`; somebody else's task is `Forbidden`.
pub(crate) async fn owned_task(store: &dyn Store, user: &User, id: Uuid) -> Result<Task, AppError> {
    let task = store
        .get_task(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    ensure_owner(user, &task)?;
    Ok(task)
}

/// Runs `matcher` over every task of `user`.
pub(crate) async fn search_own_tasks(
    store: &dyn Store,
    matcher: Matcher,
    user: &User,
    query: &str,
) -> Result<Vec<Task>, AppError> {
    let tasks = store.list_all_tasks(user.id).await?;
    Ok(matcher.search(tasks, query))
}

/// Retrieves the tasks of the authenticated user in creation order.
///
/// ## Query Parameters:
/// - `skip` (optional, default 0): Number of tasks to skip.
/// - `limit` (optional, default 100): Maximum number of tasks to return.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of `Task` objects.
/// - `401 Unauthorized`: If the request carries no valid session.
#[get("")]
pub async fn get_tasks(
    store: web::Data<dyn Store>,
    query_params: web::Query<TaskQuery>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    if query_params.skip < 0 || query_params.limit < 0 {
        return Err(AppError::BadRequest(
            "skip and limit must not be negative".into(),
        ));
    }
    let tasks = store
        .list_tasks(user.0.id, query_params.skip, query_params.limit)
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// A JSON object matching `TaskInput`:
/// - `title`: 1 to 13 characters.
/// - `description`: 1 to 200 characters.
/// - `status` (optional): "new", "in-progress" or "done". Defaults to "new".
/// - `priority` (optional): "low", "medium" or "high". Defaults to "medium".
/// - `deadline` (optional): RFC 3339 timestamp.
///
/// ## Responses:
/// - `201 Created`: Returns the new `Task`.
/// - `401 Unauthorized`: If the request carries no valid session.
/// - `422 Unprocessable Entity`: If validation fails.
#[post("")]
pub async fn create_task(
    store: web::Data<dyn Store>,
    task_data: web::Json<TaskInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = store
        .create_task(Task::new(task_data.into_inner(), user.0.id))
        .await?;
    info!("User {} created task {}", user.0.id, task.id);

    Ok(HttpResponse::Created().json(task))
}

/// Fuzzy search over the titles of the authenticated user's tasks.
///
/// Results come best match first.
///
/// ## Query Parameters:
/// - `query`: The text to match titles against.
/// - `threshold` (optional): Maximum edit distance, or minimum similarity,
///   depending on the configured algorithm.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of matching `Task` objects.
/// - `400 Bad Request`: If the threshold does not fit the algorithm.
/// - `401 Unauthorized`: If the request carries no valid session.
#[get("/search")]
pub async fn search_tasks(
    store: web::Data<dyn Store>,
    matcher: web::Data<Matcher>,
    params: web::Query<SearchQuery>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let matcher = match params.threshold {
        Some(threshold) => matcher.with_threshold(threshold)?,
        None => **matcher,
    };
    let tasks = search_own_tasks(store.get_ref(), matcher, &user.0, &params.query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Tasks of the authenticated user that are due within the next 24 hours.
#[get("/near-deadline")]
pub async fn near_deadline_tasks(
    store: web::Data<dyn Store>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks = store
        .list_tasks_near_deadline(user.0.id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task`.
/// - `401 Unauthorized`: If the request carries no valid session.
/// - `403 Forbidden`: If the task belongs to another user.
/// - `404 Not Found`: If the task does not exist.
#[get("/{id}")]
pub async fn get_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<Uuid>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = owned_task(store.get_ref(), &user.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates an existing task.
///
/// Only the owner may update a task; the owner itself never changes.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task`.
/// - `401 Unauthorized`: If the request carries no valid session.
/// - `403 Forbidden`: If the task belongs to another user.
/// - `404 Not Found`: If the task does not exist.
/// - `422 Unprocessable Entity`: If validation fails.
#[put("/{id}")]
pub async fn update_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = owned_task(store.get_ref(), &user.0, task_id.into_inner()).await?;
    task_data.validate()?;

    let updated = store
        .update_task(task.id, task_data.into_inner(), Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    info!("User {} updated task {}", user.0.id, updated.id);

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes a task by its ID.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Task deleted successfully"}`.
/// - `401 Unauthorized`: If the request carries no valid session.
/// - `403 Forbidden`: If the task belongs to another user.
/// - `404 Not Found`: If the task does not exist.
#[delete("/{id}")]
pub async fn delete_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<Uuid>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = owned_task(store.get_ref(), &user.0, task_id.into_inner()).await?;

    if !store.delete_task(task.id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }
    info!("User {} deleted task {}", user.0.id, task.id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}
