use crate::types::Contest;

const EXPIRED_LABEL: &str = "Expired";

/// Countdown label until `expiry`. Seconds are dropped once an hour or more remains.
pub fn time_remaining(expiry: u64, now: u64) -> String {
    if expiry <= now {
        return EXPIRED_LABEL.to_string();
    }
    let delta = expiry - now;
    let h = delta / 3600;
    let m = (delta % 3600) / 60;
    let s = delta % 60;

    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

/// Contests still open for joining (`now < contest_expiry`), newest first.
/// Equal `created_at` values keep their input order.
pub fn filter_live(contests: &[Contest], now: u64) -> Vec<Contest> {
    let mut live: Vec<Contest> = contests
        .iter()
        .filter(|c| now < c.contest_expiry)
        .cloned()
        .collect();
    live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    live
}

/// `filter_live` restricted to a single match.
pub fn filter_live_for_match(contests: &[Contest], match_id: &str, now: u64) -> Vec<Contest> {
    let mut live = filter_live(contests, now);
    live.retain(|c| c.match_id == match_id);
    live
}
