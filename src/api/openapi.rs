use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::models::{
        ChangeMaxMembersRequest, CreateGroupRequest, DisplayNameRequest, DisplayNameResponse, ErrorResponse,
        GroupListResponse, RecentSearchesResponse, RecordSearchRequest, SignInResponse,
    },
    core::{
        membership::JoinStrategy,
        models::{
            audit::AppLog,
            group::{Group, NearbyGroup},
            location::GeoPoint,
        },
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::sign_in_anonymously,
        super::handlers::list_groups,
        super::handlers::list_nearby_groups,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::disband_group,
        super::handlers::join_group,
        super::handlers::leave_group,
        super::handlers::change_max_members,
        super::handlers::get_group_audits,
        super::handlers::get_app_logs,
        super::handlers::get_display_name,
        super::handlers::set_display_name,
        super::handlers::get_recent_searches,
        super::handlers::record_search
    ),
    components(schemas(
        CreateGroupRequest,
        ChangeMaxMembersRequest,
        DisplayNameRequest,
        RecordSearchRequest,
        SignInResponse,
        GroupListResponse,
        DisplayNameResponse,
        RecentSearchesResponse,
        ErrorResponse,
        Group,
        NearbyGroup,
        GeoPoint,
        JoinStrategy,
        AppLog
    )),
    modifiers(&BearerAuth),
    info(
        title = "Akahidegn API",
        description = "API for creating and joining short-lived carpool groups",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
