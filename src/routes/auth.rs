use crate::{
    auth::{
        self, middleware::session_tokens, session::SESSION_TTL_DAYS, CurrentUser, LoginRequest,
        LoginResponse, PasswordHasher, RegisterRequest, RegisterResponse, UpdatePasswordRequest,
        SESSION_COOKIE,
    },
    error::AppError,
    models::{NewUser, Session, User},
    store::Store,
};
use actix_web::{
    cookie::{time, Cookie, SameSite},
    post, put, web, HttpRequest, HttpResponse, Responder,
};
use chrono::Utc;
use log::info;
use validator::Validate;

/// How the session cookie is issued.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// Only send the cookie over HTTPS.
    pub secure: bool,
}

impl CookiePolicy {
    /// The cookie that carries a freshly opened session.
    pub fn session_cookie(&self, session: &Session) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, session.token.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::days(SESSION_TTL_DAYS))
            .finish()
    }

    /// A cookie that tells the browser to drop the session cookie.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
        cookie.make_removal();
        cookie
    }
}

/// Validates the registration form and creates the account.
pub(crate) async fn register_user(
    store: &dyn Store,
    hasher: &PasswordHasher,
    form: &RegisterRequest,
) -> Result<User, AppError> {
    form.validate()?;

    if store.get_user_by_username(&form.username).await?.is_some() {
        return Err(AppError::BadRequest("Username already taken".into()));
    }

    let password_hash = hasher.hash(&form.password)?;
    let user = store
        .create_user(NewUser {
            username: form.username.clone(),
            password_hash,
        })
        .await
        .map_err(|err| match err {
            // Lost a race against a concurrent registration.
            AppError::Conflict(msg) => AppError::BadRequest(msg),
            other => other,
        })?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

/// Checks the credentials and opens a new session.
pub(crate) async fn authenticate(
    store: &dyn Store,
    hasher: &PasswordHasher,
    form: &LoginRequest,
) -> Result<(User, Session), AppError> {
    form.validate()?;

    let invalid = || AppError::Unauthorized("Incorrect username or password".into());
    let user = store
        .get_user_by_username(&form.username)
        .await?
        .ok_or_else(invalid)?;
    if !hasher.verify(&form.password, &user.password_hash)? {
        return Err(invalid());
    }

    let session = auth::create_session(store, user.id, Utc::now()).await?;
    info!("User {} signed in", user.id);
    Ok((user, session))
}

/// Verifies the old password and stores the hash of the new one.
pub(crate) async fn change_password(
    store: &dyn Store,
    hasher: &PasswordHasher,
    user: &User,
    form: &UpdatePasswordRequest,
) -> Result<(), AppError> {
    form.validate()?;

    if !hasher.verify(&form.old_password, &user.password_hash)? {
        return Err(AppError::BadRequest("Old password is incorrect".into()));
    }

    let password_hash = hasher.hash(&form.new_password)?;
    store
        .update_user_password(user.id, &password_hash)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!("User {} changed their password", user.id);
    Ok(())
}

/// Ends every session the request carries a token for.
pub(crate) async fn end_session(store: &dyn Store, req: &HttpRequest) -> Result<(), AppError> {
    for token in session_tokens(req) {
        auth::destroy_session(store, &token).await?;
    }
    Ok(())
}

/// Register a new user
///
/// Creates a new account. The caller still has to log in.
#[post("/register")]
pub async fn register(
    store: web::Data<dyn Store>,
    hasher: web::Data<PasswordHasher>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = register_user(store.get_ref(), &hasher, &register_data).await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        user_id: user.id,
        username: user.username,
    }))
}

/// Login user
///
/// Authenticates a user and sets the `session_token` cookie.
#[post("/login")]
pub async fn login(
    store: web::Data<dyn Store>,
    hasher: web::Data<PasswordHasher>,
    cookies: web::Data<CookiePolicy>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let (user, session) = authenticate(store.get_ref(), &hasher, &login_data).await?;

    Ok(HttpResponse::Ok()
        .cookie(cookies.session_cookie(&session))
        .json(LoginResponse {
            user_id: user.id,
            username: user.username,
            expires_at: session.expires_at,
        }))
}

/// Logout user
///
/// Deletes the current session. Calling it without a session is harmless.
#[post("/logout")]
pub async fn logout(
    store: web::Data<dyn Store>,
    cookies: web::Data<CookiePolicy>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    end_session(store.get_ref(), &req).await?;

    Ok(HttpResponse::NoContent()
        .cookie(cookies.removal_cookie())
        .finish())
}

/// Change the signed-in user's password.
#[put("/password")]
pub async fn update_password(
    store: web::Data<dyn Store>,
    hasher: web::Data<PasswordHasher>,
    user: CurrentUser,
    form: web::Json<UpdatePasswordRequest>,
) -> Result<impl Responder, AppError> {
    change_password(store.get_ref(), &hasher, &user.0, &form).await?;
    Ok(HttpResponse::NoContent().finish())
}
