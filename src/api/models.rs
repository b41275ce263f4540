use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::core::{
    errors::AkahidegnError,
    membership::JoinStrategy,
    models::{group::Group, location::GeoPoint},
};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub destination: String,
    pub pickup: GeoPoint,
    pub image_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangeMaxMembersRequest {
    pub max_members: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct DisplayNameRequest {
    pub display_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordSearchRequest {
    pub query: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

// Response structs
#[derive(Serialize, ToSchema)]
pub struct SignInResponse {
    pub user_id: String,
    pub token: String,
}

#[derive(Serialize, ToSchema)]
pub struct GroupListResponse {
    pub groups: Vec<Group>,
    /// Set when the latest refresh failed and `groups` is the previous list.
    pub stale_error: Option<String>,
    pub join_strategy: JoinStrategy,
}

#[derive(Serialize, ToSchema)]
pub struct DisplayNameResponse {
    pub display_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RecentSearchesResponse {
    pub searches: Vec<String>,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for AkahidegnError to implement IntoResponse
pub struct ApiError(pub AkahidegnError);

impl From<AkahidegnError> for ApiError {
    fn from(err: AkahidegnError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AkahidegnError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            AkahidegnError::GroupExpired(_)
            | AkahidegnError::GroupFull(_)
            | AkahidegnError::AlreadyGroupMember { .. }
            | AkahidegnError::CannotReduceMaxMembers(_) => StatusCode::CONFLICT,
            AkahidegnError::NotGroupMember { .. }
            | AkahidegnError::InvalidMaxMembers { .. }
            | AkahidegnError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            AkahidegnError::NotGroupCreator(_) | AkahidegnError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AkahidegnError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AkahidegnError::MemberCountNotUpdated { .. }
            | AkahidegnError::StoreError(_)
            | AkahidegnError::TransactionConflict(_) => StatusCode::BAD_GATEWAY,
            AkahidegnError::ParseError(_)
            | AkahidegnError::LoggingError(_)
            | AkahidegnError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match self.0 {
            AkahidegnError::InvalidInput(_, field_error) => {
                format!("{}: {}", field_error.title, field_error.description)
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
