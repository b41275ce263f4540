use crate::{
    api::{AppService, models::*},
    core::{
        errors::AkahidegnError,
        models::{
            audit::AppLog,
            group::{Group, NearbyGroup},
            location::GeoPoint,
            user::Session,
        },
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put},
};
use http::header;

use std::sync::Arc;

// Middleware to validate JWT and attach the caller's session
async fn auth_middleware(
    State(service): State<Arc<AppService>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AkahidegnError::Unauthenticated("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AkahidegnError::Unauthenticated("Invalid Authorization header".to_string()))?;

    let session = service.session_from_token(token)?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

// Define API routes
pub fn api_routes(service: Arc<AppService>) -> Router {
    let protected_routes = Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/nearby", get(list_nearby_groups))
        .route("/groups/{group_id}", get(get_group).delete(disband_group))
        .route("/groups/{group_id}/join", post(join_group))
        .route("/groups/{group_id}/leave", post(leave_group))
        .route("/groups/{group_id}/max_members", put(change_max_members))
        .route("/groups/{group_id}/audits", get(get_group_audits))
        .route("/logs", get(get_app_logs))
        .route("/me/display_name", get(get_display_name).put(set_display_name))
        .route("/me/searches", get(get_recent_searches).post(record_search))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/auth/anonymous", post(sign_in_anonymously)) // Unprotected
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/auth/anonymous",
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn sign_in_anonymously(State(service): State<Arc<AppService>>) -> Result<Json<SignInResponse>, ApiError> {
    let (session, token) = service.sign_in_anonymously().await?;
    Ok(Json(SignInResponse {
        user_id: session.user_id().to_string(),
        token,
    }))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses(
        (status = 200, description = "Live groups, newest first", body = GroupListResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn list_groups(State(service): State<Arc<AppService>>) -> Json<GroupListResponse> {
    let state = service.refresh_groups().await;
    Json(GroupListResponse {
        groups: state.groups,
        stale_error: state.last_error,
        join_strategy: service.join_strategy(),
    })
}

#[utoipa::path(
    get,
    path = "/api/groups/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Live groups within the radius, closest first", body = Vec<NearbyGroup>),
        (status = 400, description = "Invalid coordinates or radius", body = ErrorResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn list_nearby_groups(
    State(service): State<Arc<AppService>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyGroup>>, ApiError> {
    let center = GeoPoint::new(query.lat, query.lng)?;
    let groups = service.list_nearby_groups(center, query.radius_km).await?;
    Ok(Json(groups))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 502, description = "Store error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn create_group(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = service
        .create_group(&session, &req.destination, req.pickup, req.image_url)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group found", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn get_group(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service.get_group(&group_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 204, description = "Group disbanded"),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn disband_group(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.disband_group(&session, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/join",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Joined", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group full, expired or already joined", body = ErrorResponse),
        (status = 502, description = "Store error or member count not updated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn join_group(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service.join_group(&session, &group_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/leave",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Left the group", body = Group),
        (status = 400, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn leave_group(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service.leave_group(&session, &group_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    put,
    path = "/api/groups/{group_id}/max_members",
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = ChangeMaxMembersRequest,
    responses(
        (status = 200, description = "Capacity changed", body = Group),
        (status = 400, description = "Capacity out of range", body = ErrorResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 409, description = "Capacity below current member count", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn change_max_members(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
    Json(req): Json<ChangeMaxMembersRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = service
        .change_max_members(&session, &group_id, req.max_members)
        .await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/audits",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group audit trail", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn get_group_audits(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let audits = service.get_group_audits(&group_id).await?;
    Ok(Json(audits))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application logs", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn get_app_logs(State(service): State<Arc<AppService>>) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(logs))
}

#[utoipa::path(
    get,
    path = "/api/me/display_name",
    responses(
        (status = 200, description = "Stored display name", body = DisplayNameResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn get_display_name(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
) -> Result<Json<DisplayNameResponse>, ApiError> {
    let display_name = service.display_name(&session).await?;
    Ok(Json(DisplayNameResponse { display_name }))
}

#[utoipa::path(
    put,
    path = "/api/me/display_name",
    request_body = DisplayNameRequest,
    responses(
        (status = 200, description = "Display name saved", body = DisplayNameResponse),
        (status = 400, description = "Invalid display name", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn set_display_name(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
    Json(req): Json<DisplayNameRequest>,
) -> Result<Json<DisplayNameResponse>, ApiError> {
    let display_name = service.set_display_name(&session, &req.display_name).await?;
    Ok(Json(DisplayNameResponse {
        display_name: Some(display_name),
    }))
}

#[utoipa::path(
    get,
    path = "/api/me/searches",
    responses(
        (status = 200, description = "Recent searches, newest first", body = RecentSearchesResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn get_recent_searches(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
) -> Result<Json<RecentSearchesResponse>, ApiError> {
    let searches = service.recent_searches(&session).await?;
    Ok(Json(RecentSearchesResponse { searches }))
}

#[utoipa::path(
    post,
    path = "/api/me/searches",
    request_body = RecordSearchRequest,
    responses(
        (status = 200, description = "Search recorded", body = RecentSearchesResponse)
    ),
    security(("bearer_auth" = []))
)]
async fn record_search(
    State(service): State<Arc<AppService>>,
    Extension(session): Extension<Session>,
    Json(req): Json<RecordSearchRequest>,
) -> Result<Json<RecentSearchesResponse>, ApiError> {
    let searches = service.record_search(&session, &req.query).await?;
    Ok(Json(RecentSearchesResponse { searches }))
}
