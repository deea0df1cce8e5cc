pub mod auth;
pub mod health;
pub mod pages;
pub mod tasks;

use actix_web::web;

/// JSON API, mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::logout)
            .service(auth::update_password),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            // Fixed paths before `/{id}`.
            .service(tasks::search_tasks)
            .service(tasks::near_deadline_tasks)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// Browser pages, mounted at the root.
pub fn pages_config(cfg: &mut web::ServiceConfig) {
    cfg.service(pages::index)
        .service(pages::login_page)
        .service(pages::login)
        .service(pages::logout)
        .service(pages::register_page)
        .service(pages::register)
        .service(pages::update_password_page)
        .service(pages::update_password)
        .service(pages::tasks_page)
        .service(pages::create_task_page)
        .service(pages::create_task)
        .service(pages::search_page)
        .service(pages::task_page)
        .service(pages::edit_task_page)
        .service(pages::edit_task)
        .service(pages::delete_task);
}
