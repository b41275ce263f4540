use crate::constants::limits::GROUPS_PATH;

pub fn group_path(group_id: &str) -> String {
    format!("{}/{}", GROUPS_PATH, group_id)
}

pub fn member_path(group_id: &str, user_id: &str) -> String {
    format!("{}/{}/members/{}", GROUPS_PATH, group_id, user_id)
}

pub fn member_count_path(group_id: &str) -> String {
    format!("{}/{}/memberCount", GROUPS_PATH, group_id)
}
