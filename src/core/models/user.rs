use serde::Serialize;
use utoipa::ToSchema;

/// Proof that the caller holds an identity.
///
/// Only the crate can mint one, either by signing in anonymously or by
/// validating a bearer token, so every operation that takes a `&Session`
/// runs with a known user id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub(crate) fn new(user_id: impl Into<String>) -> Self {
        Session { user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}
