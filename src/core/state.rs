//! Cached result of the group listing, advanced only through [`GroupListState::reduce`].

use crate::core::expiry;
use crate::core::models::group::Group;
use serde::Serialize;
use std::cmp::Reverse;
use utoipa::ToSchema;

#[derive(Clone, Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupListState {
    pub groups: Vec<Group>,
    /// Set when the last refresh failed; `groups` then holds the previous list.
    pub last_error: Option<String>,
    pub refreshed_at: Option<i64>,
}

#[derive(Clone, Debug)]
pub enum GroupEvent {
    SnapshotLoaded { groups: Vec<Group>, now: i64 },
    SnapshotFailed { message: String },
    GroupCreated(Group),
    GroupUpdated(Group),
    GroupRemoved(String),
}

impl GroupListState {
    pub fn reduce(self, event: GroupEvent) -> Self {
        match event {
            GroupEvent::SnapshotLoaded { groups, now } => GroupListState {
                groups: sorted(expiry::filter_expired(groups, now)),
                last_error: None,
                refreshed_at: Some(now),
            },
            GroupEvent::SnapshotFailed { message } => GroupListState {
                last_error: Some(message),
                ..self
            },
            GroupEvent::GroupCreated(group) | GroupEvent::GroupUpdated(group) => {
                let mut groups = self.groups;
                groups.retain(|g| g.group_id != group.group_id);
                groups.push(group);
                GroupListState {
                    groups: sorted(groups),
                    ..self
                }
            }
            GroupEvent::GroupRemoved(group_id) => {
                let mut groups = self.groups;
                groups.retain(|g| g.group_id != group_id);
                GroupListState { groups, ..self }
            }
        }
    }
}

// Newest first; untimed groups last.
fn sorted(mut groups: Vec<Group>) -> Vec<Group> {
    groups.sort_by(|a, b| {
        Reverse(a.timestamp.unwrap_or(i64::MIN))
            .cmp(&Reverse(b.timestamp.unwrap_or(i64::MIN)))
            .then_with(|| a.group_id.cmp(&b.group_id))
    });
    groups
}
