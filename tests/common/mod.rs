#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    test, web,
};
use serde_json::json;
use tasktrack::auth::{RegisterResponse, SESSION_COOKIE};
use tasktrack::store::{MemoryStore, Store};

/// Builds the full application (API, pages, health) over `$store`.
macro_rules! test_app {
    ($store:expr) => {
        test_app!($store, tasktrack::search::Matcher::default())
    };
    ($store:expr, $matcher:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($store.clone())
                .app_data(actix_web::web::Data::new($matcher))
                .app_data(actix_web::web::Data::new(
                    tasktrack::auth::PasswordHasher::new(tasktrack::auth::password::MIN_COST),
                ))
                .app_data(actix_web::web::Data::new(
                    tasktrack::routes::auth::CookiePolicy::default(),
                ))
                .wrap(tasktrack::auth::SessionMiddleware::new($store.clone()))
                .wrap(actix_web::middleware::Logger::default())
                .service(tasktrack::routes::health::health)
                .service(actix_web::web::scope("/api").configure(tasktrack::routes::config))
                .configure(tasktrack::routes::pages_config),
        )
        .await
    };
}

pub fn memory_store() -> web::Data<dyn Store> {
    web::Data::from(Arc::new(MemoryStore::new()) as Arc<dyn Store>)
}

pub struct TestUser {
    pub id: i32,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (actix_web::http::header::HeaderName, String) {
        (
            actix_web::http::header::AUTHORIZATION,
            format!("Bearer {}", self.token),
        )
    }
}

/// Registers `username` and logs in, returning the session token from the cookie.
pub async fn register_and_login<S, B>(app: &S, username: &str, password: &str) -> TestUser
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    let registered: RegisterResponse = test::read_body_json(resp).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let token = resp
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .expect("login sets the session cookie");

    TestUser {
        id: registered.user_id,
        token,
    }
}
