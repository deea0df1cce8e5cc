use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::middleware::ResolvedSession;
use crate::error::AppError;
use crate::models::User;

/// The authenticated caller. Anonymous requests are rejected with 401.
///
/// Relies on `SessionMiddleware` having resolved the session; if it did not
/// run, the request is treated as anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match resolved_user(req) {
            Some(user) => ready(Ok(CurrentUser(user))),
            None => {
                let err = AppError::Unauthorized("Not authenticated".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

/// The caller if signed in, `None` for anonymous visitors. Never fails.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequest for MaybeUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MaybeUser(resolved_user(req))))
    }
}

fn resolved_user(req: &HttpRequest) -> Option<User> {
    req.extensions()
        .get::<ResolvedSession>()
        .and_then(|resolved| resolved.0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::Utc;

    fn alice() -> User {
        User {
            id: 123,
            username: "alice".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(ResolvedSession(Some(alice())));

        let mut payload = Payload::None;
        let extracted = CurrentUser::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap().0.id, 123);
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_rejects_anonymous() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(ResolvedSession(None));

        let mut payload = Payload::None;
        let err = CurrentUser::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_without_middleware() {
        let req = test::TestRequest::default().to_http_request();
        let mut payload = Payload::None;
        assert!(CurrentUser::from_request(&req, &mut payload).await.is_err());
    }

    #[actix_rt::test]
    async fn test_maybe_user_extractor() {
        let req = test::TestRequest::default().to_http_request();
        let mut payload = Payload::None;
        let extracted = MaybeUser::from_request(&req, &mut payload).await.unwrap();
        assert!(extracted.0.is_none());

        req.extensions_mut().insert(ResolvedSession(Some(alice())));
        let extracted = MaybeUser::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(extracted.0.map(|u| u.username).as_deref(), Some("alice"));
    }
}
