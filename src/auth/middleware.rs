use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, HttpRequest,
};
use chrono::Utc;
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::session::{resolve_session, SESSION_COOKIE};
use crate::models::User;
use crate::store::Store;

/// The outcome of session resolution for one request, stored in the request
/// extensions. `None` means the caller is anonymous.
#[derive(Debug, Clone)]
pub struct ResolvedSession(pub Option<User>);

/// Resolves the caller's session once per request.
///
/// The middleware never rejects a request by itself: anonymous callers pass
/// through and the `CurrentUser`/`MaybeUser` extractors decide what that
/// means for each handler. A failing store lookup does fail the request.
pub struct SessionMiddleware {
    store: web::Data<dyn Store>,
}

impl SessionMiddleware {
    pub fn new(store: web::Data<dyn Store>) -> Self {
        Self { store }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            store: self.store.clone(),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    store: web::Data<dyn Store>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let store = self.store.clone();

        Box::pin(async move {
            let now = Utc::now();
            let mut user = None;
            for token in session_tokens(req.request()) {
                user = resolve_session(store.get_ref(), Some(token.as_str()), now).await?;
                if user.is_some() {
                    break;
                }
            }
            if let Some(user) = &user {
                log::debug!("{} {} as user {}", req.method(), req.path(), user.id);
            }
            req.extensions_mut().insert(ResolvedSession(user));
            service.call(req).await
        })
    }
}

/// Candidate session tokens in the order they are tried: the session cookie,
/// then an `Authorization: Bearer` header. The scheme name is matched
/// case-insensitively.
pub fn session_tokens(req: &HttpRequest) -> Vec<String> {
    let mut tokens = Vec::with_capacity(2);
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        tokens.push(cookie.value().to_string());
    }
    if let Some(token) = bearer_token(req) {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}
