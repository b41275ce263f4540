use super::location::GeoPoint;
use crate::constants::limits::DEFAULT_MAX_MEMBERS;
use crate::core::expiry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// A carpool group as the rest of the crate sees it.
///
/// The wire shape written to the store lives in [`super::wire`]; this type is
/// what listings, joins and the HTTP layer hand around.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: String,
    pub creator_id: String,
    pub destination_name: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    /// Creation time in epoch milliseconds.
    pub timestamp: Option<i64>,
    pub max_members: u32,
    pub member_count: u32,
    pub members: BTreeSet<String>,
    pub image_url: Option<String>,
}

impl Group {
    /// A freshly created group with its creator as the only member.
    pub fn new(
        group_id: String,
        creator_id: &str,
        destination_name: String,
        pickup: GeoPoint,
        created_at: i64,
        image_url: Option<String>,
    ) -> Self {
        Group {
            group_id,
            creator_id: creator_id.to_string(),
            destination_name,
            pickup_lat: Some(pickup.lat),
            pickup_lng: Some(pickup.lng),
            timestamp: Some(created_at),
            max_members: DEFAULT_MAX_MEMBERS,
            member_count: 1,
            members: BTreeSet::from([creator_id.to_string()]),
            image_url,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        expiry::is_expired(self.timestamp, now_ms)
    }

    pub fn is_full(&self) -> bool {
        self.member_count >= self.max_members
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }

    pub fn available_seats(&self) -> u32 {
        self.max_members.saturating_sub(self.member_count)
    }

    pub fn pickup_point(&self) -> Option<GeoPoint> {
        match (self.pickup_lat, self.pickup_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

/// A listing entry annotated with its distance from the caller.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyGroup {
    #[serde(flatten)]
    pub group: Group,
    pub distance_km: f64,
}
