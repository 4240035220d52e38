//! Group listing for the current user.

use actix_web::{get, web};
use tracing::warn;

use crate::domain::{ApiResult, Error, Group};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Groups the session user created or belongs to, ordered by slug.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use chat_gateway::inbound::http::groups::list_groups;
///
/// let app = App::new().service(web::scope("/api/v1").service(list_groups));
/// ```
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    responses(
        (status = 200, description = "Groups visible to the user", body = [Group]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Group store unavailable", body = Error)
    ),
    tags = ["groups"],
    operation_id = "listGroups"
)]
#[get("/groups")]
pub async fn list_groups(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Group>>> {
    let user_id = session.require_user_id()?;
    let groups = state.groups.list_for_member(&user_id).await.map_err(|error| {
        warn!(%user_id, %error, "group listing failed");
        Error::service_unavailable("group store unavailable")
    })?;
    Ok(web::Json(groups))
}
