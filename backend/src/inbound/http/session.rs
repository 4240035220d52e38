//! Cookie session access for handlers.
//!
//! The upstream identity layer (or the development login endpoint) writes the
//! authenticated user id under [`USER_ID_KEY`]. Handlers and the WebSocket
//! gate read it back through [`SessionContext`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

/// Session key holding the authenticated user id.
pub const USER_ID_KEY: &str = "user_id";

/// Extractor wrapping the Actix session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Bind the session to `user_id`, rotating the cookie.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.as_ref())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop every session value and expire the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }

    /// Current user id. A malformed stored value counts as anonymous.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let stored = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        let Some(raw) = stored else {
            return Ok(None);
        };
        match UserId::new(&raw) {
            Ok(id) => Ok(Some(id)),
            Err(error) => {
                warn!(%error, "ignoring malformed user id in session");
                Ok(None)
            }
        }
    }

    /// Current user id, or `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { session.await.map(Self::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ApiResult;
    use crate::inbound::http::test_utils::{SESSION_COOKIE, test_session_middleware};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    const ALICE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    async fn persist(session: SessionContext) -> ApiResult<HttpResponse> {
        session.persist_user(&UserId::new(ALICE_ID).expect("fixture id"))?;
        Ok(HttpResponse::Ok().finish())
    }

    async fn whoami(session: SessionContext) -> ApiResult<HttpResponse> {
        let id = session.require_user_id()?;
        Ok(HttpResponse::Ok().body(id.to_string()))
    }

    async fn logout(session: SessionContext) -> HttpResponse {
        session.purge();
        HttpResponse::NoContent().finish()
    }

    async fn tamper(session: Session) -> ApiResult<HttpResponse> {
        session
            .insert(USER_ID_KEY, "not-a-uuid")
            .map_err(|error| Error::internal(error.to_string()))?;
        Ok(HttpResponse::Ok().finish())
    }

    fn session_cookie(res: &actix_web::dev::ServiceResponse) -> Cookie<'static> {
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .map(Cookie::into_owned)
            .expect("session cookie set")
    }

    macro_rules! session_app {
        () => {
            test::init_service(
                App::new()
                    .wrap(test_session_middleware())
                    .route("/persist", web::post().to(persist))
                    .route("/whoami", web::get().to(whoami))
                    .route("/logout", web::post().to(logout))
                    .route("/tamper", web::post().to(tamper)),
            )
            .await
        };
    }

    #[rstest]
    #[actix_web::test]
    async fn persisted_user_is_read_back() {
        let app = session_app!();
        let res = test::call_service(&app, test::TestRequest::post().uri("/persist").to_request()).await;
        let cookie = session_cookie(&res);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, ALICE_ID);
    }

    #[rstest]
    #[actix_web::test]
    async fn anonymous_requests_are_unauthorised() {
        let app = session_app!();
        let res = test::call_service(&app, test::TestRequest::get().uri("/whoami").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_user_id_is_unauthorised() {
        let app = session_app!();
        let res = test::call_service(&app, test::TestRequest::post().uri("/tamper").to_request()).await;
        let cookie = session_cookie(&res);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn purge_expires_the_cookie() {
        let app = session_app!();
        let res = test::call_service(&app, test::TestRequest::post().uri("/persist").to_request()).await;
        let cookie = session_cookie(&res);

        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/logout").cookie(cookie).to_request(),
        )
        .await;
        let expired = session_cookie(&res);
        assert_eq!(expired.value(), "");
    }
}
