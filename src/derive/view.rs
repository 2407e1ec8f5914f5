use serde::{Serialize, Serializer};
use tracing::warn;

use crate::derive::countdown::time_remaining;
use crate::derive::odds::{format_amount, format_odds_ratio, join_amount, potential_profit};
use crate::derive::status::{classify, settlement_outcome};
use crate::error::DeriveError;
use crate::types::{wire, Address, Contest, ContestState, SettlementOutcome, TokenAmount};

/// Everything a contest card needs, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContestView {
    pub id: u64,
    pub match_id: String,
    pub statement: String,
    pub creator: Address,
    pub opponent: Option<Address>,
    pub state: ContestState,
    pub is_creator: bool,
    pub is_opponent: bool,
    pub has_opponent: bool,
    #[serde(with = "wire::amount")]
    pub stake: TokenAmount,
    /// Stake in whole tokens, e.g. `"2.5"`.
    pub stake_display: String,
    /// Only while unfilled; afterwards `opponent_stake` is authoritative.
    #[serde(serialize_with = "opt_amount")]
    pub join_amount: Option<TokenAmount>,
    #[serde(serialize_with = "opt_amount")]
    pub opponent_stake: Option<TokenAmount>,
    #[serde(with = "wire::amount")]
    pub potential_profit: TokenAmount,
    pub odds_display: String,
    pub countdown_label: Option<String>,
    pub can_join: bool,
    pub can_cancel: bool,
    pub outcome: Option<SettlementOutcome>,
}

fn opt_amount<S: Serializer>(v: &Option<TokenAmount>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(n) => s.serialize_some(&n.to_string()),
        None => s.serialize_none(),
    }
}

/// Compose classifier, odds and countdown output for `viewer` at `now`.
///
/// A snapshot with an invalid flag combination is logged and shown as
/// `Unknown` instead of failing the whole view.
pub fn build_view_model(
    contest: &Contest,
    viewer: Option<&Address>,
    now: u64,
) -> Result<ContestView, DeriveError> {
    let state = match classify(contest, now) {
        Ok(state) => state,
        Err(e @ DeriveError::DataIntegrityViolation { .. }) => {
            warn!(contest_id = contest.id, "{e}");
            ContestState::Unknown
        }
        Err(e) => return Err(e),
    };

    let has_opponent = contest.has_opponent();
    let is_creator = viewer.is_some_and(|v| v == &contest.creator);
    let is_opponent = has_opponent && viewer.is_some_and(|v| v == &contest.opponent);

    let join = if has_opponent { None } else { Some(join_amount(contest.stake, contest.odds)?) };
    let odds_display = format_odds_ratio(contest.odds)?;

    let countdown_label = match state {
        ContestState::Active => Some(time_remaining(contest.contest_expiry, now)),
        ContestState::Pending => Some(time_remaining(contest.settle_time, now)),
        _ => None,
    };

    Ok(ContestView {
        id: contest.id,
        match_id: contest.match_id.clone(),
        statement: contest.statement.clone(),
        creator: contest.creator.clone(),
        opponent: has_opponent.then(|| contest.opponent.clone()),
        state,
        is_creator,
        is_opponent,
        has_opponent,
        stake: contest.stake,
        stake_display: format_amount(contest.stake),
        join_amount: join,
        opponent_stake: has_opponent.then_some(contest.opponent_stake),
        potential_profit: potential_profit(contest.stake),
        odds_display,
        countdown_label,
        can_join: state == ContestState::Active && !is_creator,
        can_cancel: matches!(state, ContestState::Active | ContestState::Expired)
            && !has_opponent
            && is_creator,
        outcome: settlement_outcome(contest, state),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;
    const CREATOR: &str = "0xAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAa";
    const OPPONENT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn open_contest() -> Contest {
        Contest {
            id: 3,
            creator: Address::parse(CREATOR).unwrap(),
            opponent: Address::zero(),
            statement: "Australia chase 300".to_string(),
            match_id: "m77".to_string(),
            stake: 2_000_000,
            odds: 1_500_000,
            contest_expiry: NOW + 61,
            settle_time: NOW + 7_200,
            created_at: NOW - 600,
            updated_at: NOW - 600,
            opponent_stake: 0,
            settled: false,
            verdict: false,
            active: true,
            cancelled: false,
            day_number: 0,
        }
    }

    fn joined_contest() -> Contest {
        Contest {
            opponent: Address::parse(OPPONENT).unwrap(),
            opponent_stake: 3_000_000,
            active: false,
            ..open_contest()
        }
    }

    #[test]
    fn open_contest_for_anonymous_viewer() {
        let v = build_view_model(&open_contest(), None, NOW).unwrap();
        assert_eq!(v.state, ContestState::Active);
        assert!(!v.is_creator && !v.is_opponent && !v.has_opponent);
        assert_eq!(v.join_amount, Some(3_000_000));
        assert_eq!(v.opponent_stake, None);
        assert_eq!(v.potential_profit, 2_000_000);
        assert_eq!(v.stake_display, "2");
        assert_eq!(v.odds_display, "2:1");
        assert_eq!(v.countdown_label.as_deref(), Some("1m 1s"));
        assert!(v.can_join);
        assert!(!v.can_cancel);
        assert!(v.outcome.is_none());
    }

    #[test]
    fn creator_match_is_case_insensitive() {
        let viewer = Address::parse(&CREATOR.to_lowercase()).unwrap();
        let v = build_view_model(&open_contest(), Some(&viewer), NOW).unwrap();
        assert!(v.is_creator);
        assert!(!v.can_join);
        assert!(v.can_cancel);
    }

    #[test]
    fn joined_contest_uses_settle_time_and_fixed_stake() {
        let viewer = Address::parse(&OPPONENT.to_uppercase().replacen("0X", "0x", 1)).unwrap();
        let v = build_view_model(&joined_contest(), Some(&viewer), NOW).unwrap();
        assert_eq!(v.state, ContestState::Pending);
        assert!(v.is_opponent && v.has_opponent);
        assert_eq!(v.join_amount, None);
        assert_eq!(v.opponent_stake, Some(3_000_000));
        assert_eq!(v.countdown_label.as_deref(), Some("2h 0m"));
        assert!(!v.can_join && !v.can_cancel);
    }

    #[test]
    fn expired_contest_has_no_countdown_but_can_be_cancelled_by_creator() {
        let c = Contest { contest_expiry: NOW - 1, ..open_contest() };
        let creator = Address::parse(CREATOR).unwrap();
        let v = build_view_model(&c, Some(&creator), NOW).unwrap();
        assert_eq!(v.state, ContestState::Expired);
        assert_eq!(v.countdown_label, None);
        assert!(v.can_cancel);
        assert!(!v.can_join);
    }

    #[test]
    fn completed_contest_reports_outcome() {
        let c = Contest { settled: true, verdict: false, ..joined_contest() };
        let v = build_view_model(&c, None, NOW).unwrap();
        assert_eq!(v.state, ContestState::Completed);
        assert_eq!(v.countdown_label, None);
        match v.outcome {
            Some(SettlementOutcome::Won { winner, payout, .. }) => {
                assert_eq!(winner, Address::parse(OPPONENT).unwrap());
                assert_eq!(payout, 5_000_000);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn integrity_violation_surfaces_as_unknown() {
        let c = Contest { settled: true, ..open_contest() };
        let v = build_view_model(&c, None, NOW).unwrap();
        assert_eq!(v.state, ContestState::Unknown);
        assert!(!v.can_join);
        assert_eq!(v.countdown_label, None);
    }

    #[test]
    fn zero_odds_is_rejected() {
        let c = Contest { odds: 0, ..open_contest() };
        assert!(matches!(build_view_model(&c, None, NOW), Err(DeriveError::InvalidArgument(_))));
    }

    #[test]
    fn view_model_is_idempotent() {
        let c = joined_contest();
        let viewer = Address::parse(OPPONENT).unwrap();
        assert_eq!(
            build_view_model(&c, Some(&viewer), NOW),
            build_view_model(&c, Some(&viewer), NOW)
        );
    }

    #[test]
    fn amounts_serialize_as_strings() {
        let v = build_view_model(&open_contest(), None, NOW).unwrap();
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["join_amount"], "3000000");
        assert_eq!(json["opponent_stake"], serde_json::Value::Null);
        assert_eq!(json["state"], "active");
    }
}
