//! Browser pages.
//!
//! Pages resolve the session softly: anonymous visitors get a "not signed in"
//! page instead of a 401, and anonymous form posts are sent to `/login`.
//! Form mistakes are shown on the re-rendered form; store failures still
//! surface as `AppError`.

use actix_web::{
    get,
    http::{header, StatusCode},
    post, web, HttpRequest, HttpResponse, ResponseError,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{LoginRequest, MaybeUser, PasswordHasher, RegisterRequest, UpdatePasswordRequest},
    error::AppError,
    models::{sort_by_priority, Task, TaskInput, TaskPriority, TaskStatus, User},
    routes::{
        auth::{authenticate, change_password, end_session, register_user, CookiePolicy},
        tasks::{owned_task, search_own_tasks},
    },
    search::Matcher,
    store::Store,
    views::{self, TaskFormValues, NOT_SIGNED_IN},
};

/// Task form as posted by the browser. An empty deadline means none.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub deadline: String,
}

impl TaskForm {
    fn values(&self) -> TaskFormValues<'_> {
        TaskFormValues {
            title: &self.title,
            description: &self.description,
            status: self.status,
            priority: self.priority,
            deadline: &self.deadline,
        }
    }

    /// Validated task input.
    fn to_input(&self) -> Result<TaskInput, AppError> {
        let input = TaskInput {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            status: self.status,
            priority: self.priority,
            deadline: parse_deadline(&self.deadline)?,
        };
        input.validate()?;
        Ok(input)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Accepts RFC 3339 or the browser's `datetime-local` format (taken as UTC).
pub fn parse_deadline(raw: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(deadline) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(deadline.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(Utc.from_utc_datetime(&naive)));
        }
    }
    Err(AppError::BadRequest(format!("Invalid deadline: {}", raw)))
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Turns a user-facing failure into a status and message for the form.
/// Server-side failures are passed on.
fn form_error(err: AppError) -> Result<(StatusCode, Vec<String>), AppError> {
    match err {
        AppError::DatabaseError(_) | AppError::InternalServerError(_) => Err(err),
        other => Ok((other.status_code(), vec![other.message().to_string()])),
    }
}

async fn near_deadline(store: &dyn Store, user: &User) -> Result<Vec<Task>, AppError> {
    store.list_tasks_near_deadline(user.id, Utc::now()).await
}

/// Renders a page for a signed-in user, including the near-deadline list.
async fn user_page(
    store: &dyn Store,
    user: &User,
    status: StatusCode,
    title: &str,
    content: &str,
) -> Result<HttpResponse, AppError> {
    let near = near_deadline(store, user).await?;
    Ok(views::html(
        status,
        views::layout(title, Some(user), &near, content),
    ))
}

fn anonymous_page(title: &str) -> HttpResponse {
    let content = format!("<p class=\"errors\">{}</p>", views::escape(NOT_SIGNED_IN));
    views::html(StatusCode::OK, views::layout(title, None, &[], &content))
}

fn login_form(errors: &[String]) -> String {
    format!(
        "{}{}<p><a href=\"/register\">Create an account</a></p>",
        views::errors(errors),
        views::simple_form(
            "/login",
            &[("username", "text", "Username"), ("password", "password", "Password")],
            "Log in",
        )
    )
}

fn register_form(errors: &[String]) -> String {
    format!(
        "{}{}",
        views::errors(errors),
        views::simple_form(
            "/register",
            &[("username", "text", "Username"), ("password", "password", "Password")],
            "Register",
        )
    )
}

fn password_form(errors: &[String]) -> String {
    format!(
        "{}{}",
        views::errors(errors),
        views::simple_form(
            "/update_password",
            &[
                ("old_password", "password", "Old password"),
                ("new_password", "password", "New password"),
                ("confirm_password", "password", "Confirm new password"),
            ],
            "Change password",
        )
    )
}

#[get("/")]
pub async fn index(
    store: web::Data<dyn Store>,
    user: MaybeUser,
) -> Result<HttpResponse, AppError> {
    match user.0 {
        Some(user) => {
            let content = format!(
                "<p>Welcome, {}.</p><p><a href=\"/tasks\">Your tasks</a></p>",
                views::escape(&user.username)
            );
            user_page(store.get_ref(), &user, StatusCode::OK, "Task tracker", &content).await
        }
        None => Ok(anonymous_page("Task tracker")),
    }
}

#[get("/login")]
pub async fn login_page() -> HttpResponse {
    views::html(
        StatusCode::OK,
        views::layout("Log in", None, &[], &login_form(&[])),
    )
}

#[post("/login")]
pub async fn login(
    store: web::Data<dyn Store>,
    hasher: web::Data<PasswordHasher>,
    cookies: web::Data<CookiePolicy>,
    form: web::Form<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    match authenticate(store.get_ref(), &hasher, &form).await {
        Ok((_, session)) => Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, "/tasks"))
            .cookie(cookies.session_cookie(&session))
            .finish()),
        Err(err) => {
            let (status, errors) = form_error(err)?;
            Ok(views::html(
                status,
                views::layout("Log in", None, &[], &login_form(&errors)),
            ))
        }
    }
}

#[get("/logout")]
pub async fn logout(
    store: web::Data<dyn Store>,
    cookies: web::Data<CookiePolicy>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    end_session(store.get_ref(), &req).await?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookies.removal_cookie())
        .finish())
}

#[get("/register")]
pub async fn register_page() -> HttpResponse {
    views::html(
        StatusCode::OK,
        views::layout("Register", None, &[], &register_form(&[])),
    )
}

#[post("/register")]
pub async fn register(
    store: web::Data<dyn Store>,
    hasher: web::Data<PasswordHasher>,
    form: web::Form<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    match register_user(store.get_ref(), &hasher, &form).await {
        Ok(_) => Ok(redirect("/login")),
        Err(err) => {
            let (status, errors) = form_error(err)?;
            Ok(views::html(
                status,
                views::layout("Register", None, &[], &register_form(&errors)),
            ))
        }
    }
}

#[get("/update_password")]
pub async fn update_password_page(
    store: web::Data<dyn Store>,
    user: MaybeUser,
) -> Result<HttpResponse, AppError> {
    match user.0 {
        Some(user) => {
            user_page(
                store.get_ref(),
                &user,
                StatusCode::OK,
                "Change password",
                &password_form(&[]),
            )
            .await
        }
        None => Ok(anonymous_page("Change password")),
    }
}

#[post("/update_password")]
pub async fn update_password(
    store: web::Data<dyn Store>,
    hasher: web::Data<PasswordHasher>,
    user: MaybeUser,
    form: web::Form<UpdatePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(redirect("/login"));
    };
    match change_password(store.get_ref(), &hasher, &user, &form).await {
        Ok(()) => Ok(redirect("/")),
        Err(err) => {
            let (status, errors) = form_error(err)?;
            user_page(
                store.get_ref(),
                &user,
                status,
                "Change password",
                &password_form(&errors),
            )
            .await
        }
    }
}

/// The signed-in user's tasks, high priority first.
#[get("/tasks")]
pub async fn tasks_page(
    store: web::Data<dyn Store>,
    user: MaybeUser,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(anonymous_page("Tasks"));
    };
    let mut tasks = store.list_all_tasks(user.id).await?;
    sort_by_priority(&mut tasks);
    let content = format!(
        "<p><a href=\"/tasks/create\">New task</a></p>{}",
        views::task_table(&tasks)
    );
    user_page(store.get_ref(), &user, StatusCode::OK, "Tasks", &content).await
}

#[get("/tasks/create")]
pub async fn create_task_page(
    store: web::Data<dyn Store>,
    user: MaybeUser,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(anonymous_page("New task"));
    };
    let form = views::task_form("/tasks/create", &TaskFormValues::default(), None);
    user_page(store.get_ref(), &user, StatusCode::OK, "New task", &form).await
}

#[post("/tasks/create")]
pub async fn create_task(
    store: web::Data<dyn Store>,
    user: MaybeUser,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(redirect("/login"));
    };

    let input = match form.to_input() {
        Ok(input) => input,
        Err(err) => {
            let (status, errors) = form_error(err)?;
            let content = format!(
                "{}{}",
                views::errors(&errors),
                views::task_form("/tasks/create", &form.values(), None)
            );
            return user_page(store.get_ref(), &user, status, "New task", &content).await;
        }
    };

    let task = store.create_task(Task::new(input, user.id)).await?;
    log::info!("User {} created task {} from the web form", user.id, task.id);
    Ok(redirect("/tasks"))
}

#[get("/tasks/{id}")]
pub async fn task_page(
    store: web::Data<dyn Store>,
    user: MaybeUser,
    task_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(anonymous_page("Task"));
    };

    let (status, content) = match owned_task(store.get_ref(), &user, task_id.into_inner()).await {
        Ok(task) => (StatusCode::OK, views::task_detail(&task)),
        Err(err) => {
            let (status, errors) = form_error(err)?;
            (status, views::errors(&errors))
        }
    };
    user_page(store.get_ref(), &user, status, "Task", &content).await
}

#[get("/tasks/{id}/edit")]
pub async fn edit_task_page(
    store: web::Data<dyn Store>,
    user: MaybeUser,
    task_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(anonymous_page("Edit task"));
    };

    let id = task_id.into_inner();
    let (status, content) = match owned_task(store.get_ref(), &user, id).await {
        Ok(task) => (
            StatusCode::OK,
            views::task_form(
                &format!("/tasks/{}/edit", id),
                &TaskFormValues::from(&task),
                views::deadline_input_value(&task),
            ),
        ),
        Err(err) => {
            let (status, errors) = form_error(err)?;
            (status, views::errors(&errors))
        }
    };
    user_page(store.get_ref(), &user, status, "Edit task", &content).await
}

#[post("/tasks/{id}/edit")]
pub async fn edit_task(
    store: web::Data<dyn Store>,
    user: MaybeUser,
    task_id: web::Path<Uuid>,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(redirect("/login"));
    };
    let id = task_id.into_inner();

    let result = async {
        let task = owned_task(store.get_ref(), &user, id).await?;
        let input = form.to_input()?;
        store
            .update_task(task.id, input, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }
    .await;

    match result {
        Ok(task) => {
            log::info!("User {} updated task {} from the web form", user.id, task.id);
            Ok(redirect(&format!("/tasks/{}", task.id)))
        }
        Err(err) => {
            let (status, errors) = form_error(err)?;
            let content = format!(
                "{}{}",
                views::errors(&errors),
                views::task_form(&format!("/tasks/{}/edit", id), &form.values(), None)
            );
            user_page(store.get_ref(), &user, status, "Edit task", &content).await
        }
    }
}

#[post("/tasks/{id}/delete")]
pub async fn delete_task(
    store: web::Data<dyn Store>,
    user: MaybeUser,
    task_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(redirect("/login"));
    };

    let result = async {
        let task = owned_task(store.get_ref(), &user, task_id.into_inner()).await?;
        store.delete_task(task.id).await?;
        Ok::<_, AppError>(task)
    }
    .await;

    match result {
        Ok(task) => {
            log::info!("User {} deleted task {} from the web form", user.id, task.id);
            Ok(redirect("/tasks"))
        }
        Err(err) => {
            let (status, errors) = form_error(err)?;
            user_page(store.get_ref(), &user, status, "Task", &views::errors(&errors)).await
        }
    }
}

#[get("/search")]
pub async fn search_page(
    store: web::Data<dyn Store>,
    matcher: web::Data<Matcher>,
    user: MaybeUser,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = user.0 else {
        return Ok(anonymous_page("Search"));
    };

    let query = params.query.as_deref().unwrap_or("").trim();
    let mut content = format!(
        "<form method=\"get\" action=\"/search\">\
         <input name=\"query\" value=\"{}\"><button type=\"submit\">Search</button></form>",
        views::escape(query)
    );
    if !query.is_empty() {
        let tasks = search_own_tasks(store.get_ref(), **matcher, &user, query).await?;
        if tasks.is_empty() {
            content.push_str("<p>Nothing matches your query.</p>");
        } else {
            content.push_str(&views::task_table(&tasks));
        }
    }
    user_page(store.get_ref(), &user, StatusCode::OK, "Search", &content).await
}
