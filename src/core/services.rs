use crate::auth::jwt::{ANONYMOUS_ROLE, JwtService};
use crate::constants::actions::{
    DISPLAY_NAME_UPDATED, GROUP_CREATED, GROUP_DISBANDED, GROUP_EXPIRED_REMOVED, MAX_MEMBERS_CHANGED,
    MEMBER_COUNT_RECONCILED, MEMBER_JOIN_PARTIAL, MEMBER_JOINED, MEMBER_LEFT, SIGNED_IN_ANONYMOUSLY,
};
use crate::constants::limits::{GROUPS_PATH, MAX_DESTINATION_LENGTH, MAX_DISPLAY_NAME_LENGTH};
use crate::core::clock::{Clock, SystemClock};
use crate::core::errors::AkahidegnError;
use crate::core::expiry;
use crate::core::membership::{self, JoinStrategy};
use crate::core::models::{
    audit::AppLog,
    group::{Group, NearbyGroup},
    location::GeoPoint,
    user::Session,
    wire::{decode_collection, decode_group, encode_group},
};
use crate::core::search_history;
use crate::core::state::{GroupEvent, GroupListState};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::preferences::{
    PreferenceStore,
    preference_keys::{display_name_key, recent_searches_key},
};
use crate::infrastructure::store::{
    RealtimeStore, TransactionStep,
    paths::{group_path, member_count_path, member_path},
};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Debug, Default, Clone, ToSchema)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub reconciled: Vec<String>,
    pub failed: Vec<String>,
}

/// A group id must be a single store key: non-empty, no path separator, no
/// characters the store reserves.
pub fn validate_group_id(group_id: &str) -> Result<(), AkahidegnError> {
    let reserved = |c: char| matches!(c, '/' | '.' | '#' | '$' | '[' | ']') || c.is_control();
    if group_id.trim().is_empty() || group_id.chars().any(reserved) {
        return Err(AkahidegnError::invalid_input(
            "group_id",
            "Invalid group id",
            format!("`{}` is not a valid group id", group_id),
        ));
    }
    Ok(())
}

pub struct AkahidegnService<L: LoggingService, S: RealtimeStore, P: PreferenceStore> {
    storage: S,
    logging: L,
    preferences: P,
    jwt_service: JwtService,
    clock: Arc<dyn Clock>,
    join_strategy: JoinStrategy,
    state: RwLock<GroupListState>,
}

impl<L: LoggingService, S: RealtimeStore, P: PreferenceStore> AkahidegnService<L, S, P> {
    pub fn new(storage: S, logging: L, preferences: P, jwt_secret: String) -> Self {
        AkahidegnService {
            storage,
            logging,
            preferences,
            jwt_service: JwtService::new(jwt_secret),
            clock: Arc::new(SystemClock),
            join_strategy: JoinStrategy::default(),
            state: RwLock::new(GroupListState::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_join_strategy(mut self, join_strategy: JoinStrategy) -> Self {
        self.join_strategy = join_strategy;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.jwt_service = self.jwt_service.with_ttl(ttl);
        self
    }

    pub fn join_strategy(&self) -> JoinStrategy {
        self.join_strategy
    }

    fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    // IDENTITY

    pub async fn sign_in_anonymously(&self) -> Result<(Session, String), AkahidegnError> {
        let user_id = Uuid::new_v4().simple().to_string();
        let token = self.jwt_service.generate_token(&user_id, ANONYMOUS_ROLE)?;
        info!("Anonymous sign-in for user {}", user_id);
        self.log_and_audit(None, SIGNED_IN_ANONYMOUSLY, json!({ "user_id": user_id }), Some(user_id.as_str()))
            .await?;
        Ok((Session::new(user_id), token))
    }

    pub fn session_from_token(&self, token: &str) -> Result<Session, AkahidegnError> {
        let claims = self.jwt_service.validate_token(token)?;
        Ok(Session::new(claims.sub))
    }

    // HELPERS

    async fn log_and_audit(
        &self,
        group_id: Option<&str>,
        action: &str,
        details: Value,
        user_id: Option<&str>,
    ) -> Result<(), AkahidegnError> {
        self.logging.log_action(action, details, user_id, group_id).await
    }

    async fn dispatch(&self, event: GroupEvent) -> GroupListState {
        let mut state = self.state.write().await;
        let next = std::mem::take(&mut *state).reduce(event);
        *state = next.clone();
        next
    }

    fn validate_destination(&self, raw: &str) -> Result<String, AkahidegnError> {
        let destination = raw.trim().to_lowercase();
        if destination.is_empty() {
            return Err(AkahidegnError::invalid_input(
                "destination",
                "Invalid destination",
                "destination cannot be empty",
            ));
        }
        if destination.chars().count() > MAX_DESTINATION_LENGTH {
            return Err(AkahidegnError::invalid_input(
                "destination",
                "Destination Too Long",
                format!("destination cannot exceed {} characters", MAX_DESTINATION_LENGTH),
            ));
        }
        if destination.chars().any(char::is_control) {
            return Err(AkahidegnError::invalid_input(
                "destination",
                "Invalid destination",
                "destination contains invalid characters",
            ));
        }
        Ok(destination)
    }

    async fn fetch_group(&self, group_id: &str) -> Result<Group, AkahidegnError> {
        validate_group_id(group_id)?;
        let value = self
            .storage
            .get(&group_path(group_id))
            .await?
            .ok_or_else(|| AkahidegnError::GroupNotFound(group_id.to_string()))?;
        decode_group(group_id, value)
    }

    // LISTING

    /// Re-reads every group. On a failed read the previous list is kept and the
    /// error is recorded on the returned state.
    pub async fn refresh_groups(&self) -> GroupListState {
        let now = self.now();
        let event = match self.storage.get(GROUPS_PATH).await {
            Ok(snapshot) => {
                let groups = snapshot.map(decode_collection).unwrap_or_default();
                debug!("Loaded {} group records", groups.len());
                GroupEvent::SnapshotLoaded { groups, now }
            }
            Err(e) => {
                warn!("Failed to load groups, keeping previous list: {}", e);
                GroupEvent::SnapshotFailed { message: e.to_string() }
            }
        };
        self.dispatch(event).await
    }

    pub async fn list_groups(&self) -> Vec<Group> {
        self.refresh_groups().await.groups
    }

    pub async fn list_nearby_groups(&self, center: GeoPoint, radius_km: f64) -> Result<Vec<NearbyGroup>, AkahidegnError> {
        center.validate()?;
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(AkahidegnError::invalid_input(
                "radius_km",
                "Invalid radius",
                "radius must be a positive number of kilometres",
            ));
        }
        let mut nearby: Vec<NearbyGroup> = self
            .list_groups()
            .await
            .into_iter()
            .filter_map(|group| {
                let distance_km = group.pickup_point()?.distance_km(&center);
                (distance_km <= radius_km).then_some(NearbyGroup { group, distance_km })
            })
            .collect();
        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(nearby)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, AkahidegnError> {
        self.fetch_group(group_id).await
    }

    // GROUP LIFECYCLE

    pub async fn create_group(
        &self,
        session: &Session,
        destination: &str,
        pickup: GeoPoint,
        image_url: Option<String>,
    ) -> Result<Group, AkahidegnError> {
        let destination = self.validate_destination(destination)?;
        pickup.validate()?;
        let image_url = image_url.map(|url| url.trim().to_string()).filter(|url| !url.is_empty());

        let group_id = self.storage.push_key(GROUPS_PATH).await?;
        let group = Group::new(group_id, session.user_id(), destination, pickup, self.now(), image_url);
        let payload = encode_group(&group)?;

        if let Err(e) = self.storage.set(&group_path(&group.group_id), payload).await {
            error!("Failed to create group '{}': {}", group.destination_name, e);
            return Err(e);
        }
        info!("Group '{}' created with ID {}", group.destination_name, group.group_id);

        self.dispatch(GroupEvent::GroupCreated(group.clone())).await;
        self.log_and_audit(
            Some(group.group_id.as_str()),
            GROUP_CREATED,
            json!({
                "group_id": group.group_id,
                "destination": group.destination_name,
                "pickup_lat": group.pickup_lat,
                "pickup_lng": group.pickup_lng,
                "max_members": group.max_members
            }),
            Some(session.user_id()),
        )
        .await?;
        Ok(group)
    }

    /// Adds the caller to a group. Expiry, capacity and existing membership
    /// are checked against the current record before anything is written.
    pub async fn join_group(&self, session: &Session, group_id: &str) -> Result<Group, AkahidegnError> {
        let now = self.now();
        let group = self.fetch_group(group_id).await?;
        if let Err(e) = membership::check_join(&group, session.user_id(), now) {
            info!("Join of group {} by {} rejected: {}", group_id, session.user_id(), e);
            return Err(e);
        }

        let joined = match self.join_strategy {
            JoinStrategy::Atomic => self.join_atomic(session, group_id, now).await?,
            JoinStrategy::TwoStep => self.join_two_step(session, &group).await?,
        };

        info!("User {} joined group {}", session.user_id(), group_id);
        self.dispatch(GroupEvent::GroupUpdated(joined.clone())).await;
        self.log_and_audit(
            Some(group_id),
            MEMBER_JOINED,
            json!({
                "group_id": group_id,
                "user_id": session.user_id(),
                "member_count": joined.member_count,
                "available_seats": joined.available_seats()
            }),
            Some(session.user_id()),
        )
        .await?;
        Ok(joined)
    }

    async fn join_atomic(&self, session: &Session, group_id: &str, now: i64) -> Result<Group, AkahidegnError> {
        let key = group_id.to_string();
        let user_id = session.user_id().to_string();
        let outcome = self
            .storage
            .transaction(&group_path(group_id), move |current| {
                let Some(value) = current else {
                    return TransactionStep::Abort;
                };
                let Ok(mut group) = decode_group(&key, value) else {
                    return TransactionStep::Abort;
                };
                if membership::check_join(&group, &user_id, now).is_err() {
                    return TransactionStep::Abort;
                }
                membership::apply_join(&mut group, &user_id);
                match encode_group(&group) {
                    Ok(payload) => TransactionStep::Commit(payload),
                    Err(_) => TransactionStep::Abort,
                }
            })
            .await?;

        let snapshot = outcome
            .snapshot
            .ok_or_else(|| AkahidegnError::GroupNotFound(group_id.to_string()))?;
        let group = decode_group(group_id, snapshot)?;
        if outcome.committed {
            return Ok(group);
        }
        warn!("Join transaction aborted for group {}", group_id);
        membership::check_join(&group, session.user_id(), now)?;
        Err(AkahidegnError::StoreError(format!("join of group {} was aborted", group_id)))
    }

    async fn join_two_step(&self, session: &Session, group: &Group) -> Result<Group, AkahidegnError> {
        let group_id = group.group_id.as_str();
        let user_id = session.user_id();

        if let Err(e) = self.storage.set(&member_path(group_id, user_id), Value::Bool(true)).await {
            error!("Failed to add {} to members of group {}: {}", user_id, group_id, e);
            return Err(e);
        }

        let max_members = u64::from(group.max_members);
        let counted = self
            .storage
            .transaction(&member_count_path(group_id), move |current| {
                let count = current.as_ref().and_then(Value::as_u64).unwrap_or(0);
                if count >= max_members {
                    TransactionStep::Abort
                } else {
                    TransactionStep::Commit(json!(count + 1))
                }
            })
            .await;

        let reason = match counted {
            Ok(outcome) if outcome.committed => return self.fetch_group(group_id).await,
            Ok(_) => format!("group {} filled up", group_id),
            Err(e) => e.to_string(),
        };
        error!(
            "Member count of group {} not updated after adding {}: {}",
            group_id, user_id, reason
        );
        self.log_and_audit(
            Some(group_id),
            MEMBER_JOIN_PARTIAL,
            json!({ "group_id": group_id, "user_id": user_id, "reason": reason }),
            Some(user_id),
        )
        .await?;
        Err(AkahidegnError::MemberCountNotUpdated {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            reason,
        })
    }

    pub async fn leave_group(&self, session: &Session, group_id: &str) -> Result<Group, AkahidegnError> {
        validate_group_id(group_id)?;
        let key = group_id.to_string();
        let user_id = session.user_id().to_string();
        let outcome = self
            .storage
            .transaction(&group_path(group_id), move |current| {
                let Some(Ok(mut group)) = current.map(|value| decode_group(&key, value)) else {
                    return TransactionStep::Abort;
                };
                if membership::apply_leave(&mut group, &user_id).is_err() {
                    return TransactionStep::Abort;
                }
                match encode_group(&group) {
                    Ok(payload) => TransactionStep::Commit(payload),
                    Err(_) => TransactionStep::Abort,
                }
            })
            .await?;

        let snapshot = outcome
            .snapshot
            .ok_or_else(|| AkahidegnError::GroupNotFound(group_id.to_string()))?;
        let mut group = decode_group(group_id, snapshot)?;
        if !outcome.committed {
            // Reproduce the rejection from the value the transaction saw.
            membership::apply_leave(&mut group, session.user_id())?;
            return Err(AkahidegnError::StoreError(format!("leave of group {} was aborted", group_id)));
        }

        info!("User {} left group {}", session.user_id(), group_id);
        self.dispatch(GroupEvent::GroupUpdated(group.clone())).await;
        self.log_and_audit(
            Some(group_id),
            MEMBER_LEFT,
            json!({ "group_id": group_id, "user_id": session.user_id(), "member_count": group.member_count }),
            Some(session.user_id()),
        )
        .await?;
        Ok(group)
    }

    pub async fn disband_group(&self, session: &Session, group_id: &str) -> Result<(), AkahidegnError> {
        let group = self.fetch_group(group_id).await?;
        membership::require_creator(&group, session.user_id())?;

        self.storage.remove(&group_path(group_id)).await?;
        info!("Group {} disbanded by {}", group_id, session.user_id());

        self.dispatch(GroupEvent::GroupRemoved(group_id.to_string())).await;
        self.log_and_audit(
            Some(group_id),
            GROUP_DISBANDED,
            json!({ "group_id": group_id, "destination": group.destination_name }),
            Some(session.user_id()),
        )
        .await?;
        Ok(())
    }

    pub async fn change_max_members(
        &self,
        session: &Session,
        group_id: &str,
        new_max: u32,
    ) -> Result<Group, AkahidegnError> {
        membership::check_max_members_range(new_max)?;
        let group = self.fetch_group(group_id).await?;
        membership::require_creator(&group, session.user_id())?;

        let key = group_id.to_string();
        let outcome = self
            .storage
            .transaction(&group_path(group_id), move |current| {
                let Some(Ok(mut group)) = current.map(|value| decode_group(&key, value)) else {
                    return TransactionStep::Abort;
                };
                if membership::check_max_members_change(&group, new_max).is_err() {
                    return TransactionStep::Abort;
                }
                group.max_members = new_max;
                match encode_group(&group) {
                    Ok(payload) => TransactionStep::Commit(payload),
                    Err(_) => TransactionStep::Abort,
                }
            })
            .await?;

        let snapshot = outcome
            .snapshot
            .ok_or_else(|| AkahidegnError::GroupNotFound(group_id.to_string()))?;
        let updated = decode_group(group_id, snapshot)?;
        if !outcome.committed {
            membership::check_max_members_change(&updated, new_max)?;
            return Err(AkahidegnError::StoreError(format!(
                "capacity change of group {} was aborted",
                group_id
            )));
        }

        info!("Group {} capacity changed from {} to {}", group_id, group.max_members, new_max);
        self.dispatch(GroupEvent::GroupUpdated(updated.clone())).await;
        self.log_and_audit(
            Some(group_id),
            MAX_MEMBERS_CHANGED,
            json!({ "group_id": group_id, "old_max_members": group.max_members, "new_max_members": new_max }),
            Some(session.user_id()),
        )
        .await?;
        Ok(updated)
    }

    // MAINTENANCE

    /// Sets `memberCount` to the size of the member set, capped at capacity.
    pub async fn reconcile_member_count(&self, group_id: &str) -> Result<Group, AkahidegnError> {
        validate_group_id(group_id)?;
        let key = group_id.to_string();
        let outcome = self
            .storage
            .transaction(&group_path(group_id), move |current| {
                let Some(Ok(mut group)) = current.map(|value| decode_group(&key, value)) else {
                    return TransactionStep::Abort;
                };
                let reconciled = membership::reconciled_member_count(&group);
                if reconciled == group.member_count {
                    return TransactionStep::Abort;
                }
                group.member_count = reconciled;
                match encode_group(&group) {
                    Ok(payload) => TransactionStep::Commit(payload),
                    Err(_) => TransactionStep::Abort,
                }
            })
            .await?;

        let snapshot = outcome
            .snapshot
            .ok_or_else(|| AkahidegnError::GroupNotFound(group_id.to_string()))?;
        let group = decode_group(group_id, snapshot)?;
        if outcome.committed {
            warn!("Member count of group {} reconciled to {}", group_id, group.member_count);
            self.dispatch(GroupEvent::GroupUpdated(group.clone())).await;
            self.log_and_audit(
                Some(group_id),
                MEMBER_COUNT_RECONCILED,
                json!({ "group_id": group_id, "member_count": group.member_count }),
                None,
            )
            .await?;
        }
        Ok(group)
    }

    /// Deletes expired groups and repairs member counts that drifted from the
    /// member set. Failures on single groups are logged and reported, not
    /// propagated.
    pub async fn cleanup_expired_groups(&self) -> Result<CleanupReport, AkahidegnError> {
        let now = self.now();
        let groups = self
            .storage
            .get(GROUPS_PATH)
            .await?
            .map(decode_collection)
            .unwrap_or_default();

        let (expired, live): (Vec<Group>, Vec<Group>) = groups.into_iter().partition(|g| g.is_expired(now));
        let mut report = CleanupReport::default();

        let removals = expired.iter().map(|group| async move {
            let result = self.storage.remove(&group_path(&group.group_id)).await;
            (group, result)
        });
        for (group, result) in futures::future::join_all(removals).await {
            match result {
                Ok(()) => {
                    self.dispatch(GroupEvent::GroupRemoved(group.group_id.clone())).await;
                    self.log_and_audit(
                        Some(group.group_id.as_str()),
                        GROUP_EXPIRED_REMOVED,
                        json!({
                            "group_id": group.group_id,
                            "timestamp": group.timestamp,
                            "expired_at": expiry::expires_at(group.timestamp)
                        }),
                        None,
                    )
                    .await?;
                    report.removed.push(group.group_id.clone());
                }
                Err(e) => {
                    error!("Failed to remove expired group {}: {}", group.group_id, e);
                    report.failed.push(group.group_id.clone());
                }
            }
        }

        for group in live
            .iter()
            .filter(|g| g.member_count != membership::reconciled_member_count(g))
        {
            match self.reconcile_member_count(&group.group_id).await {
                Ok(_) => report.reconciled.push(group.group_id.clone()),
                Err(e) => {
                    error!("Failed to reconcile group {}: {}", group.group_id, e);
                    report.failed.push(group.group_id.clone());
                }
            }
        }

        info!(
            "Cleanup removed {} expired groups, reconciled {}, failed {}",
            report.removed.len(),
            report.reconciled.len(),
            report.failed.len()
        );
        Ok(report)
    }

    // PREFERENCES

    pub async fn set_display_name(&self, session: &Session, name: &str) -> Result<String, AkahidegnError> {
        let name = name.trim();
        let length = name.chars().count();
        if length == 0 || length > MAX_DISPLAY_NAME_LENGTH {
            return Err(AkahidegnError::invalid_input(
                "display_name",
                "Invalid display name",
                format!("display name must be 1 to {} characters", MAX_DISPLAY_NAME_LENGTH),
            ));
        }
        if name.chars().any(char::is_control) {
            return Err(AkahidegnError::invalid_input(
                "display_name",
                "Invalid display name",
                "display name contains invalid characters",
            ));
        }
        self.preferences
            .put_string(&display_name_key(session.user_id()), name)
            .await?;
        self.log_and_audit(
            None,
            DISPLAY_NAME_UPDATED,
            json!({ "user_id": session.user_id(), "display_name": name }),
            Some(session.user_id()),
        )
        .await?;
        Ok(name.to_string())
    }

    pub async fn display_name(&self, session: &Session) -> Result<Option<String>, AkahidegnError> {
        self.preferences.get_string(&display_name_key(session.user_id())).await
    }

    pub async fn record_search(&self, session: &Session, query: &str) -> Result<Vec<String>, AkahidegnError> {
        let key = recent_searches_key(session.user_id());
        let mut history = self.preferences.get_list(&key).await?;
        search_history::record_search(&mut history, query);
        self.preferences.put_list(&key, history.clone()).await?;
        Ok(history)
    }

    pub async fn recent_searches(&self, session: &Session) -> Result<Vec<String>, AkahidegnError> {
        self.preferences.get_list(&recent_searches_key(session.user_id())).await
    }

    // LOGS

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, AkahidegnError> {
        self.logging.get_logs().await
    }

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<AppLog>, AkahidegnError> {
        validate_group_id(group_id)?;
        self.logging.get_group_audits(group_id).await
    }
}
