//! WebSocket inbound adapter for group chat.
//!
//! Responsibilities:
//! - gate upgrades on session identity, origin, and group membership
//! - spawn one connection task per accepted upgrade
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::{HttpRequest, HttpResponse, get, routes, web};
use tracing::{error, info, warn};

use crate::domain::chat::RegistrySnapshot;
use crate::domain::{ApiResult, Error};
use crate::inbound::http::session::SessionContext;

pub mod origin;
mod session;
mod sink;
pub mod state;

use self::session::Admission;
use self::state::WsState;

/// Upgrade an authenticated group member to a chat connection.
///
/// Rejections happen before the handshake, in order: `401` without a session
/// user, `403`/`400` for a disallowed origin, `404` for an unknown group,
/// `403` for non-members, `503` when the group store is unreachable.
#[routes]
#[get("/ws/chat/groups/{group_slug}")]
#[get("/ws/chat/group/{group_slug}")]
pub async fn chat_entry(
    state: web::Data<WsState>,
    identity: SessionContext,
    path: web::Path<String>,
    req: HttpRequest,
    stream: web::Payload,
) -> actix_web::Result<HttpResponse> {
    let user_id = identity.require_user_id()?;
    state.origins.check(&req)?;
    let slug = path.into_inner();
    let group = state
        .router
        .authorize(&user_id, &slug)
        .await
        .inspect_err(|error| info!(user_id = %user_id, group_slug = %slug, %error, "chat upgrade refused"))?;

    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;

    let admission = Admission { user_id, group };
    actix_web::rt::spawn(session::handle_ws_session(
        state.get_ref().clone(),
        admission,
        session,
        messages,
    ));
    Ok(response)
}

/// Live connection counts.
#[utoipa::path(
    get,
    path = "/ws/stats",
    responses(
        (status = 200, description = "Registry snapshot", body = RegistrySnapshot),
        (status = 503, description = "Coordinator stopped", body = Error)
    ),
    tags = ["chat"],
    operation_id = "chatStats"
)]
#[get("/ws/stats")]
pub async fn stats(state: web::Data<WsState>) -> ApiResult<web::Json<RegistrySnapshot>> {
    state
        .router
        .coordinator()
        .snapshot()
        .await
        .map(web::Json)
        .map_err(|error| {
            warn!(%error, "stats requested while coordinator is down");
            Error::service_unavailable("chat coordinator unavailable")
        })
}
