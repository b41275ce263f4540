pub fn display_name_key(user_id: &str) -> String {
    format!("display_name:{}", user_id)
}

pub fn recent_searches_key(user_id: &str) -> String {
    format!("recent_searches:{}", user_id)
}
