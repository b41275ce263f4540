//! The 30 minute validity window of a group.

use crate::constants::limits::GROUP_EXPIRY_MS;
use crate::core::models::group::Group;

/// A group without a timestamp never expires.
pub fn is_expired(timestamp: Option<i64>, now_ms: i64) -> bool {
    match timestamp {
        Some(created) => now_ms.saturating_sub(created) > GROUP_EXPIRY_MS,
        None => false,
    }
}

pub fn expires_at(timestamp: Option<i64>) -> Option<i64> {
    timestamp.map(|created| created.saturating_add(GROUP_EXPIRY_MS))
}

pub fn filter_expired(groups: impl IntoIterator<Item = Group>, now_ms: i64) -> Vec<Group> {
    groups.into_iter().filter(|g| !g.is_expired(now_ms)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::location::GeoPoint;
    use crate::core::models::wire::decode_collection;

    const NOW: i64 = 1_700_000_000_000;

    fn created_at(timestamp: Option<i64>) -> Group {
        let mut group = Group::new(
            format!("g{}", timestamp.unwrap_or(0)),
            "u",
            "bole".to_string(),
            GeoPoint { lat: 0.0, lng: 0.0 },
            0,
            None,
        );
        group.timestamp = timestamp;
        group
    }

    #[test]
    fn boundary_is_inclusive() {
        assert!(!is_expired(Some(NOW - GROUP_EXPIRY_MS), NOW));
        assert!(is_expired(Some(NOW - GROUP_EXPIRY_MS - 1), NOW));
        assert!(!is_expired(Some(NOW), NOW));
        assert!(!is_expired(None, NOW));
    }

    #[test]
    fn filter_keeps_fresh_and_untimed_groups() {
        let groups = vec![
            created_at(Some(NOW - 2_000_000)),
            created_at(Some(NOW - 60_000)),
            created_at(None),
            created_at(Some(NOW - 1_800_000)),
        ];
        let kept = filter_expired(groups, NOW);
        let stamps: Vec<_> = kept.iter().map(|g| g.timestamp).collect();
        assert_eq!(stamps, vec![Some(NOW - 60_000), None, Some(NOW - 1_800_000)]);
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        assert!(is_expired(Some(i64::MIN), NOW));
        assert!(!is_expired(Some(i64::MAX), NOW));
        assert_eq!(expires_at(Some(i64::MAX)), Some(i64::MAX));

        let snapshot = serde_json::json!({
            "ancient": { "destinationName": "x", "timestamp": i64::MIN },
            "fresh": { "destinationName": "y", "timestamp": NOW }
        });
        let kept = filter_expired(decode_collection(snapshot), NOW);
        let ids: Vec<_> = kept.iter().map(|g| g.group_id.as_str()).collect();
        assert_eq!(ids, vec!["fresh"]);
    }

    #[test]
    fn expiry_instant() {
        assert_eq!(expires_at(Some(NOW)), Some(NOW + GROUP_EXPIRY_MS));
        assert_eq!(expires_at(None), None);
    }
}
