// Action names written to the audit log.
pub const SIGNED_IN_ANONYMOUSLY: &str = "SIGNED_IN_ANONYMOUSLY";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const GROUP_DISBANDED: &str = "GROUP_DISBANDED";
pub const GROUP_EXPIRED_REMOVED: &str = "GROUP_EXPIRED_REMOVED";
pub const MEMBER_JOINED: &str = "MEMBER_JOINED";
pub const MEMBER_JOIN_PARTIAL: &str = "MEMBER_JOIN_PARTIAL";
pub const MEMBER_LEFT: &str = "MEMBER_LEFT";
pub const MAX_MEMBERS_CHANGED: &str = "MAX_MEMBERS_CHANGED";
pub const MEMBER_COUNT_RECONCILED: &str = "MEMBER_COUNT_RECONCILED";
pub const DISPLAY_NAME_UPDATED: &str = "DISPLAY_NAME_UPDATED";
