//! Membership rules shared by the client-side pre-check and the bodies of
//! store transactions.

use crate::constants::limits::{MAX_MAX_MEMBERS, MIN_MAX_MEMBERS};
use crate::core::errors::AkahidegnError;
use crate::core::models::group::Group;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// How a join reaches the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// One transaction over the whole group record.
    #[default]
    Atomic,
    /// Member write followed by a counter transaction. A failed counter
    /// update leaves the member entry in place.
    TwoStep,
}

impl FromStr for JoinStrategy {
    type Err = AkahidegnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(JoinStrategy::Atomic),
            "two_step" | "two-step" | "twostep" => Ok(JoinStrategy::TwoStep),
            other => Err(AkahidegnError::invalid_input(
                "join_strategy",
                "Unknown join strategy",
                format!("`{}` is not one of atomic, two_step", other),
            )),
        }
    }
}

/// Checks, in order: expiry, capacity, existing membership.
pub fn check_join(group: &Group, user_id: &str, now_ms: i64) -> Result<(), AkahidegnError> {
    if group.is_expired(now_ms) {
        return Err(AkahidegnError::GroupExpired(group.group_id.clone()));
    }
    if group.is_full() {
        return Err(AkahidegnError::GroupFull(group.group_id.clone()));
    }
    if group.has_member(user_id) {
        return Err(AkahidegnError::AlreadyGroupMember {
            group_id: group.group_id.clone(),
            user_id: user_id.to_string(),
        });
    }
    Ok(())
}

/// Caller must have run [`check_join`] against the same value.
pub fn apply_join(group: &mut Group, user_id: &str) {
    if group.members.insert(user_id.to_string()) {
        group.member_count += 1;
    }
}

pub fn apply_leave(group: &mut Group, user_id: &str) -> Result<(), AkahidegnError> {
    if !group.members.remove(user_id) {
        return Err(AkahidegnError::NotGroupMember {
            group_id: group.group_id.clone(),
            user_id: user_id.to_string(),
        });
    }
    group.member_count = group.member_count.saturating_sub(1);
    Ok(())
}

pub fn check_max_members_range(new_max: u32) -> Result<(), AkahidegnError> {
    if !(MIN_MAX_MEMBERS..=MAX_MAX_MEMBERS).contains(&new_max) {
        return Err(AkahidegnError::InvalidMaxMembers {
            min: MIN_MAX_MEMBERS,
            max: MAX_MAX_MEMBERS,
        });
    }
    Ok(())
}

pub fn check_max_members_change(group: &Group, new_max: u32) -> Result<(), AkahidegnError> {
    check_max_members_range(new_max)?;
    if new_max < group.member_count {
        return Err(AkahidegnError::CannotReduceMaxMembers(group.member_count));
    }
    Ok(())
}

pub fn require_creator(group: &Group, user_id: &str) -> Result<(), AkahidegnError> {
    if !group.is_creator(user_id) {
        return Err(AkahidegnError::NotGroupCreator(user_id.to_string()));
    }
    Ok(())
}

/// The member count implied by the member set, capped at capacity.
pub fn reconciled_member_count(group: &Group) -> u32 {
    let actual = u32::try_from(group.members.len()).unwrap_or(u32::MAX);
    actual.min(group.max_members)
}
