use super::{NOW, TestService, bole, create_controlled_service, session};
use crate::constants::actions::{MEMBER_JOIN_PARTIAL, MEMBER_JOINED, MEMBER_LEFT};
use crate::core::errors::AkahidegnError;
use crate::core::membership::JoinStrategy;
use crate::infrastructure::store::RealtimeStore;
use crate::infrastructure::store::in_memory::InMemoryStore;
use crate::infrastructure::store::paths::{group_path, member_count_path, member_path};
use serde_json::json;
use std::sync::Arc;

async fn stored_record(store: &InMemoryStore, group_id: &str) -> serde_json::Value {
    store.get(&group_path(group_id)).await.unwrap().unwrap()
}

async fn scenario_fills_group(strategy: JoinStrategy) {
    let (service, _, _) = create_controlled_service(strategy);
    let group = service
        .create_group(&session("creator"), "bole", bole(), None)
        .await
        .unwrap();
    assert_eq!((group.max_members, group.member_count), (4, 1));

    for (i, user) in ["u1", "u2", "u3"].into_iter().enumerate() {
        let joined = service.join_group(&session(user), &group.group_id).await.unwrap();
        assert_eq!(joined.member_count, 2 + i as u32);
        assert!(joined.has_member(user));
    }

    let result = service.join_group(&session("u4"), &group.group_id).await;
    assert!(matches!(result, Err(AkahidegnError::GroupFull(_))));

    let group = service.get_group(&group.group_id).await.unwrap();
    assert_eq!(group.member_count, 4);
    assert_eq!(group.members.len(), 4);
    assert!(!group.has_member("u4"));
}

#[tokio::test]
async fn test_three_joins_fill_group_atomic() {
    let _ = env_logger::try_init();
    scenario_fills_group(JoinStrategy::Atomic).await;
}

#[tokio::test]
async fn test_three_joins_fill_group_two_step() {
    let _ = env_logger::try_init();
    scenario_fills_group(JoinStrategy::TwoStep).await;
}

#[tokio::test]
async fn test_rejected_joins_do_not_mutate() {
    let _ = env_logger::try_init();
    let (service, store, clock) = create_controlled_service(JoinStrategy::Atomic);
    let creator = session("creator");
    let group = service.create_group(&creator, "bole", bole(), None).await.unwrap();
    let before = stored_record(&store, &group.group_id).await;

    assert!(matches!(
        service.join_group(&creator, &group.group_id).await,
        Err(AkahidegnError::AlreadyGroupMember { .. })
    ));
    assert_eq!(stored_record(&store, &group.group_id).await, before);

    clock.set(NOW + 1_800_001);
    assert!(matches!(
        service.join_group(&session("late"), &group.group_id).await,
        Err(AkahidegnError::GroupExpired(_))
    ));
    assert_eq!(stored_record(&store, &group.group_id).await, before);

    assert!(matches!(
        service.join_group(&session("late"), "missing").await,
        Err(AkahidegnError::GroupNotFound(_))
    ));
}

#[tokio::test]
async fn test_join_at_exact_expiry_boundary_succeeds() {
    let _ = env_logger::try_init();
    let (service, _, clock) = create_controlled_service(JoinStrategy::Atomic);
    let group = service
        .create_group(&session("creator"), "bole", bole(), None)
        .await
        .unwrap();

    clock.set(NOW + 1_800_000);
    let joined = service.join_group(&session("u1"), &group.group_id).await.unwrap();
    assert_eq!(joined.member_count, 2);
}

#[tokio::test]
async fn test_full_group_rejects_without_mutation() {
    let _ = env_logger::try_init();
    let (service, store, _) = create_controlled_service(JoinStrategy::TwoStep);
    let creator = session("creator");
    let group = service.create_group(&creator, "bole", bole(), None).await.unwrap();
    service.change_max_members(&creator, &group.group_id, 1).await.unwrap();
    let before = stored_record(&store, &group.group_id).await;

    assert!(matches!(
        service.join_group(&session("u1"), &group.group_id).await,
        Err(AkahidegnError::GroupFull(_))
    ));
    assert_eq!(stored_record(&store, &group.group_id).await, before);
}

async fn race_for_seats(strategy: JoinStrategy, joiners: usize) -> (Arc<TestService>, String, usize) {
    let (service, _, _) = create_controlled_service(strategy);
    let service = Arc::new(service);
    let group = service
        .create_group(&session("creator"), "bole", bole(), None)
        .await
        .unwrap();

    let handles = (0..joiners).map(|i| {
        let service = service.clone();
        let group_id = group.group_id.clone();
        tokio::spawn(async move { service.join_group(&session(&format!("rider-{}", i)), &group_id).await })
    });

    let mut successes = 0;
    for handle in futures::future::join_all(handles).await {
        match handle.unwrap() {
            Ok(_) => successes += 1,
            Err(AkahidegnError::GroupFull(_)) | Err(AkahidegnError::MemberCountNotUpdated { .. }) => {}
            Err(other) => panic!("unexpected join error: {}", other),
        }
    }
    (service, group.group_id, successes)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_fill_exactly_free_seats_atomic() {
    let _ = env_logger::try_init();
    let (service, group_id, successes) = race_for_seats(JoinStrategy::Atomic, 8).await;

    assert_eq!(successes, 3);
    let group = service.get_group(&group_id).await.unwrap();
    assert_eq!(group.member_count, 4);
    assert_eq!(group.members.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_fill_exactly_free_seats_two_step() {
    let _ = env_logger::try_init();
    let (service, group_id, successes) = race_for_seats(JoinStrategy::TwoStep, 8).await;

    assert_eq!(successes, 3);
    let group = service.get_group(&group_id).await.unwrap();
    assert_eq!(group.member_count, 4);
    assert!(group.members.len() >= 4);
}

#[tokio::test]
async fn test_two_step_partial_failure_is_reported_not_rolled_back() {
    let _ = env_logger::try_init();
    let (service, store, _) = create_controlled_service(JoinStrategy::TwoStep);
    let group = service
        .create_group(&session("creator"), "bole", bole(), None)
        .await
        .unwrap();
    store.deny_writes(&member_count_path(&group.group_id)).await;

    let result = service.join_group(&session("rider"), &group.group_id).await;
    match result {
        Err(AkahidegnError::MemberCountNotUpdated { group_id, user_id, .. }) => {
            assert_eq!(group_id, group.group_id);
            assert_eq!(user_id, "rider");
        }
        other => panic!("expected partial failure, got {:?}", other.map(|g| g.group_id)),
    }

    assert_eq!(
        store.get(&member_path(&group.group_id, "rider")).await.unwrap(),
        Some(json!(true))
    );
    assert_eq!(
        store.get(&member_count_path(&group.group_id)).await.unwrap(),
        Some(json!(1))
    );

    let audits = service.get_group_audits(&group.group_id).await.unwrap();
    assert!(audits.iter().any(|a| a.action == MEMBER_JOIN_PARTIAL));
    assert!(audits.iter().all(|a| a.action != MEMBER_JOINED));
}

#[tokio::test]
async fn test_atomic_join_surfaces_permission_denied() {
    let _ = env_logger::try_init();
    let (service, store, _) = create_controlled_service(JoinStrategy::Atomic);
    let group = service
        .create_group(&session("creator"), "bole", bole(), None)
        .await
        .unwrap();
    store.deny_writes(&group_path(&group.group_id)).await;

    assert!(matches!(
        service.join_group(&session("rider"), &group.group_id).await,
        Err(AkahidegnError::PermissionDenied(_))
    ));
    store.allow_all_writes().await;
    assert_eq!(service.get_group(&group.group_id).await.unwrap().member_count, 1);
}

#[tokio::test]
async fn test_leave_group() {
    let _ = env_logger::try_init();
    let (service, _, _) = create_controlled_service(JoinStrategy::Atomic);
    let group = service
        .create_group(&session("creator"), "bole", bole(), None)
        .await
        .unwrap();
    service.join_group(&session("rider"), &group.group_id).await.unwrap();

    let left = service.leave_group(&session("rider"), &group.group_id).await.unwrap();
    assert_eq!(left.member_count, 1);
    assert!(!left.has_member("rider"));

    assert!(matches!(
        service.leave_group(&session("rider"), &group.group_id).await,
        Err(AkahidegnError::NotGroupMember { .. })
    ));
    assert!(matches!(
        service.leave_group(&session("rider"), "missing").await,
        Err(AkahidegnError::GroupNotFound(_))
    ));

    let audits = service.get_group_audits(&group.group_id).await.unwrap();
    assert_eq!(audits.last().unwrap().action, MEMBER_LEFT);
}

#[tokio::test]
async fn test_group_ids_that_are_not_single_keys_are_rejected() {
    let _ = env_logger::try_init();
    let (service, store, _) = create_controlled_service(JoinStrategy::Atomic);
    let creator = session("creator");
    let group = service.create_group(&creator, "bole", bole(), None).await.unwrap();
    let before = stored_record(&store, &group.group_id).await;

    let nested = format!("{}/members", group.group_id);
    let rider = session("rider");
    for bad in [nested.as_str(), "", "  ", ".", "..", "a.b", "x#y", "groups/x"] {
        let is_invalid = |r: &Result<_, AkahidegnError>| {
            matches!(r, Err(AkahidegnError::InvalidInput(field, _)) if field == "group_id")
        };
        assert!(is_invalid(&service.join_group(&rider, bad).await.map(|_| ())), "join {:?}", bad);
        assert!(is_invalid(&service.leave_group(&rider, bad).await.map(|_| ())), "leave {:?}", bad);
        assert!(is_invalid(&service.get_group(bad).await.map(|_| ())), "get {:?}", bad);
        assert!(is_invalid(&service.disband_group(&creator, bad).await), "disband {:?}", bad);
        assert!(is_invalid(&service.change_max_members(&creator, bad, 5).await.map(|_| ())));
        assert!(is_invalid(&service.reconcile_member_count(bad).await.map(|_| ())));
        assert!(is_invalid(&service.get_group_audits(bad).await.map(|_| ())));
    }

    assert_eq!(stored_record(&store, &group.group_id).await, before);
    let listed = service.list_groups().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].member_count, 1);
}

#[tokio::test]
async fn test_two_step_member_write_failure_skips_counter() {
    let _ = env_logger::try_init();
    let (service, store, _) = create_controlled_service(JoinStrategy::TwoStep);
    let group = service
        .create_group(&session("creator"), "bole", bole(), None)
        .await
        .unwrap();
    store.deny_writes(&member_path(&group.group_id, "rider")).await;

    assert!(matches!(
        service.join_group(&session("rider"), &group.group_id).await,
        Err(AkahidegnError::PermissionDenied(_))
    ));

    assert_eq!(store.get(&member_path(&group.group_id, "rider")).await.unwrap(), None);
    assert_eq!(
        store.get(&member_count_path(&group.group_id)).await.unwrap(),
        Some(json!(1))
    );
    let audits = service.get_group_audits(&group.group_id).await.unwrap();
    assert!(audits.iter().all(|a| a.action != MEMBER_JOIN_PARTIAL && a.action != MEMBER_JOINED));
}
