use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{Innings, Match, MatchFormat, Scorecard};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedStats {
    pub api_total: usize,
    pub rejected_no_id: usize,
    pub parsed: usize,
}

/// Read-only client for the cricket match-data backend.
#[derive(Clone)]
pub struct MatchFeed {
    http: reqwest::Client,
    base_url: String,
}

impl MatchFeed {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self { http, base_url: cfg.match_api_url.trim_end_matches('/').to_string() })
    }

    pub async fn live_matches(&self) -> Result<Vec<Match>> {
        self.fetch_matches("live-matches").await
    }

    pub async fn upcoming_matches(&self) -> Result<Vec<Match>> {
        self.fetch_matches("upcoming-matches").await
    }

    pub async fn scorecard(&self, match_id: &str) -> Result<Scorecard> {
        let url = format!("{}/scorecard/{}", self.base_url, match_id);
        let resp = self.http.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("scorecard for match {match_id}")));
        }
        let body: Value = resp.error_for_status()?.json().await?;
        Ok(parse_scorecard(match_id, unwrap_data(&body)))
    }

    async fn fetch_matches(&self, path: &str) -> Result<Vec<Match>> {
        let url = format!("{}/{}", self.base_url, path);
        let body: Value = self.http.get(&url).send().await?.error_for_status()?.json().await?;
        let (matches, stats) = parse_match_list(&body)?;
        if stats.rejected_no_id > 0 {
            warn!(path, rejected = stats.rejected_no_id, "match feed entries without an id were dropped");
        }
        debug!(path, total = stats.api_total, parsed = stats.parsed, "match feed fetched");
        Ok(matches)
    }
}

/// The backend wraps payloads as `{ "data": ... }` on some routes and not others.
fn unwrap_data(v: &Value) -> &Value {
    match v.get("data") {
        Some(inner) if !inner.is_null() => inner,
        _ => v,
    }
}

pub fn parse_match_list(body: &Value) -> Result<(Vec<Match>, FeedStats)> {
    let items = unwrap_data(body)
        .as_array()
        .ok_or_else(|| AppError::Rpc("match feed response was not an array".to_string()))?;

    let mut stats = FeedStats { api_total: items.len(), ..FeedStats::default() };
    let mut matches = Vec::with_capacity(items.len());
    for item in items {
        match parse_match(item) {
            Some(m) => matches.push(m),
            None => stats.rejected_no_id += 1,
        }
    }
    stats.parsed = matches.len();
    Ok((matches, stats))
}

/// Parse one match object. Returns None only when it carries no usable id.
pub fn parse_match(v: &Value) -> Option<Match> {
    let id = str_or_num(v.get("id").or_else(|| v.get("matchId")))?;
    if id.is_empty() {
        return None;
    }

    let teams: Vec<String> = v
        .get("teams")
        .and_then(|t| t.as_array())
        .map(|a| a.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let team1 = text(v, "team1").or_else(|| teams.first().cloned()).unwrap_or_default();
    let team2 = text(v, "team2").or_else(|| teams.get(1).cloned()).unwrap_or_default();

    let name = text(v, "name").unwrap_or_else(|| format!("{team1} vs {team2}"));
    let format = text(v, "matchType")
        .or_else(|| text(v, "format"))
        .map(|s| MatchFormat::from_match_type(&s))
        .unwrap_or(MatchFormat::Other);

    let starts_at = v
        .get("startTime")
        .or_else(|| v.get("dateTimeGMT"))
        .and_then(|t| {
            t.as_u64()
                .or_else(|| t.as_str().and_then(|s| s.parse().ok().or_else(|| parse_iso_to_unix_secs(s))))
        });

    Some(Match {
        id,
        name,
        team1,
        team2,
        format,
        status: text(v, "status").unwrap_or_default(),
        venue: text(v, "venue"),
        starts_at,
    })
}

pub fn parse_scorecard(match_id: &str, v: &Value) -> Scorecard {
    let innings = v
        .get("score")
        .or_else(|| v.get("innings"))
        .and_then(|s| s.as_array())
        .map(|a| a.iter().map(parse_innings).collect())
        .unwrap_or_default();

    Scorecard {
        match_id: str_or_num(v.get("id")).unwrap_or_else(|| match_id.to_string()),
        status: text(v, "status").unwrap_or_default(),
        result: text(v, "result"),
        innings,
    }
}

fn parse_innings(v: &Value) -> Innings {
    let count = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| v.get(*k))
            .find_map(|x| x.as_u64().or_else(|| x.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(0) as u32
    };
    Innings {
        team: text(v, "inning").or_else(|| text(v, "team")).unwrap_or_default(),
        runs: count(&["r", "runs"]),
        wickets: count(&["w", "wickets"]),
        overs: ["o", "overs"]
            .iter()
            .filter_map(|k| v.get(*k))
            .find_map(|x| x.as_f64().or_else(|| x.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(0.0),
    }
}

fn text(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|s| s.as_str()).map(|s| s.to_string())
}

fn str_or_num(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an RFC 3339 / ISO 8601 UTC timestamp string to Unix seconds.
pub fn parse_iso_to_unix_secs(s: &str) -> Option<u64> {
    let s = s.trim();
    if !s.is_ascii() {
        return None;
    }
    let s = s.strip_suffix('Z').unwrap_or(s);
    let s = if let Some(dot) = s.find('.') { &s[..dot] } else { s };
    let s = if s.len() > 19 {
        let b = s.as_bytes()[19];
        if b == b'+' || b == b'-' { &s[..19] } else { s }
    } else {
        s
    };
    let (year, month, day, hour, minute, second): (i64, i64, i64, i64, i64, i64) =
        if s.len() == 10 {
            (s[0..4].parse().ok()?, s[5..7].parse().ok()?, s[8..10].parse().ok()?, 0, 0, 0)
        } else if s.len() >= 19 {
            (s[0..4].parse().ok()?, s[5..7].parse().ok()?, s[8..10].parse().ok()?,
             s[11..13].parse().ok()?, s[14..16].parse().ok()?, s[17..19].parse().ok()?)
        } else {
            return None;
        };

    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    let jdn = day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045;
    let unix_days = jdn - 2_440_588;
    u64::try_from(unix_days * 86400 + hour * 3600 + minute * 60 + second).ok()
}
