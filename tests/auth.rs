#[macro_use]
mod common;

use actix_web::{cookie::Cookie, http::StatusCode, test};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tasktrack::auth::{LoginResponse, SESSION_COOKIE};
use tasktrack::models::Session;

use common::{memory_store, register_and_login};

#[test_log::test(actix_rt::test)]
async fn test_register_and_login_flow() {
    let store = memory_store();
    let app = test_app!(store);

    let register_payload = json!({ "username": "alice", "password": "secret" });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());

    // Same username again
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Username already taken");

    // Wrong password
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "alice", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let before = Utc::now();
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "alice", "password": "secret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("session cookie is set");
    assert_eq!(cookie.value().len(), 64);
    assert_eq!(cookie.http_only(), Some(true));
    let token = cookie.value().to_string();

    let login: LoginResponse = test::read_body_json(resp).await;
    assert_eq!(login.username, "alice");
    assert!(login.expires_at >= before + Duration::days(7));
    assert!(login.expires_at <= Utc::now() + Duration::days(7));

    // The cookie opens the JSON API
    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .cookie(Cookie::new(SESSION_COOKIE, token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let session = store.get_session(&token).await.unwrap().unwrap();
    assert_eq!(session.user_id, login.user_id);
}

#[actix_rt::test]
async fn test_protected_routes_require_session() {
    let store = memory_store();
    let app = test_app!(store);

    for uri in [
        "/api/tasks",
        "/api/tasks/search?query=milk",
        "/api/tasks/near-deadline",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .cookie(Cookie::new(SESSION_COOKIE, "f".repeat(64)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Health stays public
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // An unknown session token is just anonymous there
    let req = test::TestRequest::get()
        .uri("/health")
        .cookie(Cookie::new(SESSION_COOKIE, "f".repeat(64)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_expired_session_is_rejected() {
    let store = memory_store();
    let app = test_app!(store);
    let alice = register_and_login(&app, "alice", "secret").await;

    // A session that ran out a minute ago
    let created = Utc::now() - Duration::days(7) - Duration::minutes(1);
    store
        .create_session(Session {
            token: "e".repeat(64),
            user_id: alice.id,
            created_at: created,
            expires_at: created + Duration::days(7),
        })
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .cookie(Cookie::new(SESSION_COOKIE, "e".repeat(64)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The row is still there; expiry is only checked on use.
    assert!(store.get_session(&"e".repeat(64)).await.unwrap().is_some());
    assert_eq!(store.purge_expired_sessions(Utc::now()).await.unwrap(), 1);
}

#[actix_rt::test]
async fn test_logout_ends_only_that_session() {
    let store = memory_store();
    let app = test_app!(store);
    let alice = register_and_login(&app, "alice", "secret").await;

    // Second login from another device
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "alice", "password": "secret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let other_token = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap();
    assert_ne!(other_token, alice.token);

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .cookie(Cookie::new(SESSION_COOKIE, alice.token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let removal = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("logout clears the cookie");
    assert_eq!(removal.value(), "");

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(alice.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header((
            actix_web::http::header::AUTHORIZATION,
            format!("Bearer {}", other_token),
        ))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Logging out without a session is harmless
    let req = test::TestRequest::post().uri("/api/auth/logout").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );
}

#[actix_rt::test]
async fn test_update_password() {
    let store = memory_store();
    let app = test_app!(store);
    let alice = register_and_login(&app, "alice", "secret").await;

    let req = test::TestRequest::put()
        .uri("/api/auth/password")
        .insert_header(alice.bearer())
        .set_json(json!({
            "old_password": "secret",
            "new_password": "fresh",
            "confirm_password": "different"
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = test::TestRequest::put()
        .uri("/api/auth/password")
        .insert_header(alice.bearer())
        .set_json(json!({
            "old_password": "wrong",
            "new_password": "fresh",
            "confirm_password": "fresh"
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::put()
        .uri("/api/auth/password")
        .insert_header(alice.bearer())
        .set_json(json!({
            "old_password": "secret",
            "new_password": "fresh",
            "confirm_password": "fresh"
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let login = |password: &str| {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "alice", "password": password }))
            .to_request()
    };
    assert_eq!(
        test::call_service(&app, login("secret")).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        test::call_service(&app, login("fresh")).await.status(),
        StatusCode::OK
    );
}
