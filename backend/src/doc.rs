//! OpenAPI document for the gateway's HTTP surface.
//!
//! Served by Swagger UI in debug builds. The WebSocket upgrade itself is not
//! described; `/ws/stats` is.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::chat::RegistrySnapshot;
use crate::domain::{Error, ErrorCode, Group, UserProfile};
use crate::inbound::http::users::LoginRequest;

/// Adds the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Chat gateway API",
        description = "Session login, group listing, chat statistics and health probes."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::groups::list_groups,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::ws::stats,
    ),
    components(schemas(Error, ErrorCode, UserProfile, Group, RegistrySnapshot, LoginRequest)),
    tags(
        (name = "users", description = "Session login and the current user"),
        (name = "groups", description = "Groups visible to the current user"),
        (name = "chat", description = "Live chat statistics"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn has_field(schema: &RefOr<Schema>, field: &str) -> bool {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.contains_key(field),
            _ => false,
        }
    }

    #[rstest]
    #[case("/api/v1/login")]
    #[case("/api/v1/logout")]
    #[case("/api/v1/users/me")]
    #[case("/api/v1/groups")]
    #[case("/ws/stats")]
    #[case("/health/ready")]
    fn documents_every_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "{path} missing");
    }

    #[rstest]
    #[case("Error", "code")]
    #[case("Error", "message")]
    #[case("UserProfile", "username")]
    #[case("Group", "slug")]
    #[case("RegistrySnapshot", "connections")]
    fn schemas_expose_wire_fields(#[case] name: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas
            .iter()
            .find(|(key, _)| key.as_str() == name || key.ends_with(&format!(".{name}")))
            .map(|(_, schema)| schema)
            .unwrap_or_else(|| panic!("{name} schema registered"));
        assert!(has_field(schema, field), "{name}.{field}");
    }
}
