//! Stored shape of a group record.
//!
//! Every write uses the canonical field names of [`FIELD_MAP`]. Older clients
//! wrote some fields under other names; the reader renames those before
//! decoding so both shapes land on the same [`Group`].

use super::group::Group;
use crate::constants::limits::DEFAULT_MAX_MEMBERS;
use crate::core::errors::AkahidegnError;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub canonical: &'static str,
    pub legacy: &'static [&'static str],
}

pub const FIELD_MAP: &[FieldMapping] = &[
    FieldMapping { canonical: "id", legacy: &["groupId"] },
    FieldMapping { canonical: "creatorId", legacy: &["createdBy"] },
    FieldMapping { canonical: "destinationName", legacy: &["to"] },
    FieldMapping { canonical: "pickupLat", legacy: &[] },
    FieldMapping { canonical: "pickupLng", legacy: &[] },
    FieldMapping { canonical: "timestamp", legacy: &["createdAt"] },
    FieldMapping { canonical: "maxMembers", legacy: &[] },
    FieldMapping { canonical: "memberCount", legacy: &[] },
    FieldMapping { canonical: "members", legacy: &[] },
    FieldMapping { canonical: "imageUrl", legacy: &[] },
    FieldMapping { canonical: "schemaVersion", legacy: &[] },
];

fn default_max_members() -> u32 {
    DEFAULT_MAX_MEMBERS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub destination_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default = "default_max_members")]
    pub max_members: u32,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub members: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub schema_version: u32,
}

impl From<&Group> for GroupRecord {
    fn from(group: &Group) -> Self {
        GroupRecord {
            id: group.group_id.clone(),
            creator_id: group.creator_id.clone(),
            destination_name: group.destination_name.clone(),
            pickup_lat: group.pickup_lat,
            pickup_lng: group.pickup_lng,
            timestamp: group.timestamp,
            max_members: group.max_members,
            member_count: group.member_count,
            members: group.members.iter().map(|m| (m.clone(), true)).collect(),
            image_url: group.image_url.clone(),
            schema_version: SCHEMA_VERSION,
        }
    }
}

impl GroupRecord {
    /// The storage key is authoritative for the id.
    pub fn into_group(self, key: &str) -> Group {
        if !self.id.is_empty() && self.id != key {
            warn!("Group record {} carries mismatching id field {}", key, self.id);
        }
        Group {
            group_id: key.to_string(),
            creator_id: self.creator_id,
            destination_name: self.destination_name,
            pickup_lat: self.pickup_lat,
            pickup_lng: self.pickup_lng,
            timestamp: self.timestamp,
            max_members: self.max_members,
            member_count: self.member_count,
            members: self
                .members
                .into_iter()
                .filter_map(|(user_id, present)| present.then_some(user_id))
                .collect(),
            image_url: self.image_url.filter(|url| !url.is_empty()),
        }
    }
}

/// Renames legacy field names to their canonical form. Canonical values win
/// when a record carries both.
pub fn upgrade_legacy_fields(record: &mut Map<String, Value>) {
    for mapping in FIELD_MAP {
        for alias in mapping.legacy {
            if let Some(value) = record.remove(*alias) {
                record.entry(mapping.canonical.to_string()).or_insert(value);
            }
        }
    }
}

pub fn encode_group(group: &Group) -> Result<Value, AkahidegnError> {
    Ok(serde_json::to_value(GroupRecord::from(group))?)
}

pub fn decode_group(key: &str, value: Value) -> Result<Group, AkahidegnError> {
    let Value::Object(mut record) = value else {
        return Err(AkahidegnError::ParseError(format!("group {} is not an object", key)));
    };
    upgrade_legacy_fields(&mut record);
    let record: GroupRecord = serde_json::from_value(Value::Object(record))
        .map_err(|e| AkahidegnError::ParseError(format!("group {}: {}", key, e)))?;
    Ok(record.into_group(key))
}

/// Decodes every child of a `groups` snapshot, dropping records that fail.
pub fn decode_collection(snapshot: Value) -> Vec<Group> {
    let Value::Object(children) = snapshot else {
        warn!("Groups snapshot is not an object, ignoring it");
        return Vec::new();
    };
    children
        .into_iter()
        .filter_map(|(key, value)| match decode_group(&key, value) {
            Ok(group) => Some(group),
            Err(e) => {
                warn!("Skipping malformed group record: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::location::GeoPoint;
    use serde_json::json;

    fn sample() -> Group {
        let mut group = Group::new(
            "-Nabc".to_string(),
            "alice",
            "bole international airport".to_string(),
            GeoPoint { lat: 9.005401, lng: 38.763611 },
            1_700_000_000_000,
            Some("https://example.com/a.png".to_string()),
        );
        group.members.insert("bob".to_string());
        group.member_count = 2;
        group
    }

    #[test]
    fn every_canonical_field_is_written() {
        let payload = encode_group(&sample()).unwrap();
        let object = payload.as_object().unwrap();
        for mapping in FIELD_MAP {
            assert!(object.contains_key(mapping.canonical), "missing {}", mapping.canonical);
            for alias in mapping.legacy {
                assert!(!object.contains_key(*alias), "legacy name {} written", alias);
            }
        }
        assert_eq!(object.len(), FIELD_MAP.len());
        assert_eq!(payload["schemaVersion"], json!(SCHEMA_VERSION));
        assert_eq!(payload["members"], json!({ "alice": true, "bob": true }));
    }

    #[test]
    fn write_then_read_keeps_fields() {
        let group = sample();
        let decoded = decode_group(&group.group_id, encode_group(&group).unwrap()).unwrap();
        assert_eq!(decoded, group);
    }

    #[test]
    fn legacy_aliases_decode_to_canonical_fields() {
        let legacy = json!({
            "groupId": "-Nold",
            "createdBy": "carol",
            "to": "piassa",
            "createdAt": 1_700_000_000_123_i64,
            "pickupLat": 9.03,
            "pickupLng": 38.74,
            "maxMembers": 3,
            "memberCount": 1,
            "members": { "carol": true, "dave": false },
            "imageUrl": "",
            "from": "Current Location",
            "availableSeats": 2
        });
        let group = decode_group("-Nold", legacy).unwrap();
        assert_eq!(group.creator_id, "carol");
        assert_eq!(group.destination_name, "piassa");
        assert_eq!(group.timestamp, Some(1_700_000_000_123));
        assert_eq!(group.max_members, 3);
        assert_eq!(group.members.len(), 1);
        assert!(group.image_url.is_none());
    }

    #[test]
    fn canonical_name_wins_over_alias() {
        let mut record = Map::new();
        record.insert("creatorId".to_string(), json!("new"));
        record.insert("createdBy".to_string(), json!("old"));
        upgrade_legacy_fields(&mut record);
        assert_eq!(record["creatorId"], json!("new"));
        assert!(!record.contains_key("createdBy"));
    }

    #[test]
    fn storage_key_is_authoritative() {
        let mut payload = encode_group(&sample()).unwrap();
        payload["id"] = json!("something-else");
        let group = decode_group("-Nkey", payload).unwrap();
        assert_eq!(group.group_id, "-Nkey");
    }

    #[test]
    fn missing_capacity_defaults() {
        let group = decode_group("k", json!({ "destinationName": "mexico" })).unwrap();
        assert_eq!(group.max_members, DEFAULT_MAX_MEMBERS);
        assert_eq!(group.member_count, 0);
        assert!(group.timestamp.is_none());
    }

    #[test]
    fn malformed_records_are_dropped_from_collections() {
        let snapshot = json!({
            "good": encode_group(&sample()).unwrap(),
            "bad": { "memberCount": "many" },
            "worse": 42
        });
        let groups = decode_collection(snapshot);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_id, "good");
    }
}
