use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Serialize)]
pub enum AkahidegnError {
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("Group {0} has expired")]
    GroupExpired(String),
    #[error("Group {0} is full")]
    GroupFull(String),
    #[error("User {user_id} is already a member of group {group_id}")]
    AlreadyGroupMember { group_id: String, user_id: String },
    #[error("User {user_id} is not a member of group {group_id}")]
    NotGroupMember { group_id: String, user_id: String },
    #[error("User {0} is not the group creator")]
    NotGroupCreator(String),
    #[error("Max members must be between {min} and {max}")]
    InvalidMaxMembers { min: u32, max: u32 },
    #[error("Cannot reduce max members below current member count {0}")]
    CannotReduceMaxMembers(u32),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Joined group {group_id} but member count update failed: {reason}")]
    MemberCountNotUpdated {
        group_id: String,
        user_id: String,
        reason: String,
    },
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Transaction on {0} gave up after repeated conflicts")]
    TransactionConflict(String),
    #[error("Malformed record: {0}")]
    ParseError(String),
    #[error("Logging error: {0}")]
    LoggingError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AkahidegnError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        AkahidegnError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }
}

impl From<serde_json::Error> for AkahidegnError {
    fn from(err: serde_json::Error) -> Self {
        AkahidegnError::ParseError(err.to_string())
    }
}
