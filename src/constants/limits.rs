/// Groups older than this are expired.
pub const GROUP_EXPIRY_MS: i64 = 30 * 60 * 1000;

pub const DEFAULT_MAX_MEMBERS: u32 = 4;
pub const MIN_MAX_MEMBERS: u32 = 1;
pub const MAX_MAX_MEMBERS: u32 = 10;

pub const MAX_DESTINATION_LENGTH: usize = 100;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 50;
pub const MAX_RECENT_SEARCHES: usize = 5;

/// Attempts a store transaction makes before reporting a conflict.
pub const MAX_TRANSACTION_RETRIES: usize = 25;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Root collection holding every group record.
pub const GROUPS_PATH: &str = "groups";
