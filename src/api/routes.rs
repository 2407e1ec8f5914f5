use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::health::HealthState;
use crate::derive::{build_view_model, filter_live, parse_amount, ContestView};
use crate::error::AppError;
use crate::matches::MatchFeed;
use crate::refresh::now_secs;
use crate::state::ContestStore;
use crate::types::{Address, Contest, ContestState, Match, Scorecard};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<ContestStore>,
    pub health: Arc<HealthState>,
    pub feed: MatchFeed,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/contests", get(get_contests))
        .route("/contests/live", get(get_live_contests))
        .route("/contests/:id", get(get_contest))
        .route("/users/:address/contests", get(get_user_contests))
        .route("/matches/live", get(get_live_matches))
        .route("/matches/upcoming", get(get_upcoming_matches))
        .route("/matches/:id/scorecard", get(get_scorecard))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ContestsQuery {
    pub viewer: Option<String>,
    pub state: Option<String>,
    pub match_id: Option<String>,
    /// Minimum stake in whole tokens, e.g. `"2.5"`.
    pub min_stake: Option<String>,
}

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub viewer: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub last_refresh_ok: bool,
    pub last_refresh_at: u64,
    pub consecutive_failures: u64,
    pub contests: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        last_refresh_ok: state.health.last_refresh_ok(),
        last_refresh_at: state.health.last_refresh_at(),
        consecutive_failures: state.health.consecutive_failures(),
        contests: state.store.len(),
    })
}

async fn get_contests(
    State(state): State<ApiState>,
    Query(params): Query<ContestsQuery>,
) -> Result<Json<Vec<ContestView>>, AppError> {
    let viewer = parse_viewer(params.viewer.as_deref())?;
    let wanted: Option<ContestState> = params.state.as_deref().map(str::parse).transpose()?;
    let min_stake = params.min_stake.as_deref().map(parse_amount).transpose()?;

    let contests = match params.match_id.as_deref() {
        Some(m) => state.store.for_match(m),
        None => state.store.all(),
    };
    let mut views = views_for(&contests, viewer.as_ref(), now_secs());
    if let Some(wanted) = wanted {
        views.retain(|v| v.state == wanted);
    }
    if let Some(min) = min_stake {
        views.retain(|v| v.stake >= min);
    }
    Ok(Json(views))
}

async fn get_live_contests(
    State(state): State<ApiState>,
    Query(params): Query<ContestsQuery>,
) -> Result<Json<Vec<ContestView>>, AppError> {
    let viewer = parse_viewer(params.viewer.as_deref())?;
    let now = now_secs();
    let contests = match params.match_id.as_deref() {
        Some(m) => state.store.for_match(m),
        None => state.store.all(),
    };
    Ok(Json(views_for(&filter_live(&contests, now), viewer.as_ref(), now)))
}

async fn get_contest(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<ContestView>, AppError> {
    let viewer = parse_viewer(params.viewer.as_deref())?;
    let contest = state
        .store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("contest {id}")))?;
    Ok(Json(build_view_model(&contest, viewer.as_ref(), now_secs())?))
}

async fn get_user_contests(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> Result<Json<Vec<ContestView>>, AppError> {
    let user = Address::parse(&address)?;
    let contests = state.store.for_user(&user);
    Ok(Json(views_for(&contests, Some(&user), now_secs())))
}

async fn get_live_matches(State(state): State<ApiState>) -> Result<Json<Vec<Match>>, AppError> {
    Ok(Json(state.feed.live_matches().await?))
}

async fn get_upcoming_matches(State(state): State<ApiState>) -> Result<Json<Vec<Match>>, AppError> {
    Ok(Json(state.feed.upcoming_matches().await?))
}

async fn get_scorecard(
    State(state): State<ApiState>,
    Path(match_id): Path<String>,
) -> Result<Json<Scorecard>, AppError> {
    Ok(Json(state.feed.scorecard(&match_id).await?))
}

fn parse_viewer(viewer: Option<&str>) -> Result<Option<Address>, AppError> {
    Ok(viewer.filter(|v| !v.is_empty()).map(Address::parse).transpose()?)
}

/// Build views for a list, skipping snapshots whose arithmetic inputs are invalid.
fn views_for(contests: &[Contest], viewer: Option<&Address>, now: u64) -> Vec<ContestView> {
    contests
        .iter()
        .filter_map(|c| match build_view_model(c, viewer, now) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(contest_id = c.id, "Skipping contest: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    const CREATOR: &str = "0x1111111111111111111111111111111111111111";

    fn contest(id: u64, created_at: u64, expiry: u64, odds: u128) -> Contest {
        Contest {
            id,
            stake: 1_000_000 * id as u128,
            creator: Address::parse(CREATOR).unwrap(),
            opponent: Address::zero(),
            statement: format!("contest {id}"),
            match_id: "m1".to_string(),
            odds,
            contest_expiry: expiry,
            settle_time: expiry + 600,
            created_at,
            updated_at: created_at,
            opponent_stake: 0,
            settled: false,
            verdict: false,
            active: true,
            cancelled: false,
            day_number: 0,
        }
    }

    fn test_config() -> Config {
        Config { match_api_url: "http://127.0.0.1:9".to_string(), http_timeout_secs: 2, ..Config::default() }
    }

    async fn serve(contests: Vec<Contest>) -> String {
        let store = ContestStore::new();
        store.replace_all(contests);
        let state = ApiState {
            store,
            health: Arc::new(HealthState::new()),
            feed: MatchFeed::new(&test_config()).unwrap(),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn live_contests_are_newest_first_and_exclude_expired() {
        let now = now_secs();
        let base = serve(vec![
            contest(1, 10, now + 3_600, 1_000_000),
            contest(2, 30, now + 3_600, 1_000_000),
            contest(3, 20, now + 3_600, 1_000_000),
            contest(4, 40, now - 10, 1_000_000),
        ])
        .await;

        let views: Vec<serde_json::Value> =
            reqwest::get(format!("{base}/contests/live")).await.unwrap().json().await.unwrap();
        let ids: Vec<u64> = views.iter().map(|v| v["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn contest_by_id_and_missing_id() {
        let now = now_secs();
        let base = serve(vec![contest(1, 10, now + 3_600, 3_000_000)]).await;

        let resp = reqwest::get(format!("{base}/contests/1?viewer={CREATOR}")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let view: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(view["odds_display"], "3:1");
        assert_eq!(view["is_creator"], true);
        assert_eq!(view["join_amount"], "3000000");

        let resp = reqwest::get(format!("{base}/contests/99")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_viewer_and_state_are_rejected() {
        let base = serve(vec![]).await;
        let resp = reqwest::get(format!("{base}/contests?viewer=nope")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let resp = reqwest::get(format!("{base}/contests?state=sideways")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn state_filter_and_invalid_snapshots_skipped() {
        let now = now_secs();
        let base = serve(vec![
            contest(1, 10, now + 3_600, 1_000_000),
            contest(2, 20, now - 10, 1_000_000),
            contest(3, 30, now + 3_600, 0),
        ])
        .await;

        let all: Vec<serde_json::Value> =
            reqwest::get(format!("{base}/contests")).await.unwrap().json().await.unwrap();
        assert_eq!(all.len(), 2);

        let expired: Vec<serde_json::Value> =
            reqwest::get(format!("{base}/contests?state=expired")).await.unwrap().json().await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0]["id"], 2);
    }

    #[tokio::test]
    async fn min_stake_filter_parses_decimal_tokens() {
        let now = now_secs();
        let base = serve(vec![
            contest(1, 10, now + 3_600, 1_000_000),
            contest(2, 20, now + 3_600, 1_000_000),
            contest(3, 30, now + 3_600, 1_000_000),
        ])
        .await;

        let views: Vec<serde_json::Value> =
            reqwest::get(format!("{base}/contests?min_stake=1.5")).await.unwrap().json().await.unwrap();
        let ids: Vec<u64> = views.iter().map(|v| v["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(views[0]["stake_display"], "3");

        let resp = reqwest::get(format!("{base}/contests?min_stake=1.0000001")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_store_size() {
        let now = now_secs();
        let base = serve(vec![contest(1, 10, now + 60, 1_000_000)]).await;
        let health: serde_json::Value =
            reqwest::get(format!("{base}/health")).await.unwrap().json().await.unwrap();
        assert_eq!(health["contests"], 1);
        assert_eq!(health["last_refresh_ok"], false);
    }
}
