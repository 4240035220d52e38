//! Login, logout and current-user handlers.
//!
//! ```text
//! POST /api/v1/login {"username":"alice","password":"wonderland"}
//! POST /api/v1/logout
//! GET /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::UserProfileError;
use crate::domain::{ApiResult, Error, LoginCredentials, LoginValidationError, UserProfile};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Body of `POST /api/v1/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "wonderland")]
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

fn invalid_login(err: LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyUsername => ("username", "empty_username"),
        LoginValidationError::EmptyPassword => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Check credentials against the user directory and open a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from(payload.into_inner()).map_err(invalid_login)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    info!(%user_id, "session opened");
    Ok(HttpResponse::Ok().finish())
}

/// Forget the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Profile of the logged-in user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No profile for the session user", body = Error),
        (status = 503, description = "User directory unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserProfile>> {
    let user_id = session.require_user_id()?;
    match state.profiles.fetch_profile(&user_id).await {
        Ok(profile) => Ok(web::Json(profile)),
        Err(UserProfileError::NotFound { .. }) => Err(Error::not_found("user not found")),
        Err(error) => {
            warn!(%user_id, %error, "profile lookup failed");
            Err(Error::service_unavailable("user directory unavailable"))
        }
    }
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
