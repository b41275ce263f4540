use crate::constants::limits::MAX_RECENT_SEARCHES;

/// Puts `query` at the front of `history`, dropping an earlier copy of it and
/// evicting the oldest entries past the cap. Blank queries are ignored.
pub fn record_search(history: &mut Vec<String>, query: &str) {
    let query = query.trim();
    if query.is_empty() {
        return;
    }
    history.retain(|previous| !previous.eq_ignore_ascii_case(query));
    history.insert(0, query.to_string());
    history.truncate(MAX_RECENT_SEARCHES);
}
