use crate::error::DeriveError;
use crate::types::{Contest, ContestState, SettlementOutcome, Side};

/// Classify a contest snapshot into its lifecycle state.
///
/// Rules are applied in order and the first match wins, because the raw flags
/// are not mutually exclusive:
/// 1. cancelled                      -> Cancelled
/// 2. active, expiry >= now          -> Active
/// 3. active, expiry < now           -> Expired
/// 4. not active, not settled        -> Pending
/// 5. not active, settled            -> Completed
///
/// A non-cancelled snapshot that is both active and settled matches no valid
/// state and is reported as a data-integrity violation.
pub fn classify(contest: &Contest, now: u64) -> Result<ContestState, DeriveError> {
    if contest.cancelled {
        return Ok(ContestState::Cancelled);
    }

    match (contest.active, contest.settled) {
        (true, true) => Err(DeriveError::DataIntegrityViolation {
            contest_id: contest.id,
            detail: "contest is flagged both active and settled".to_string(),
        }),
        (true, false) if contest.contest_expiry >= now => Ok(ContestState::Active),
        (true, false) => Ok(ContestState::Expired),
        (false, false) => Ok(ContestState::Pending),
        (false, true) => Ok(ContestState::Completed),
    }
}

/// Winner and payout of a finished contest. `None` while the contest is still open.
pub fn settlement_outcome(contest: &Contest, state: ContestState) -> Option<SettlementOutcome> {
    match state {
        ContestState::Cancelled => Some(SettlementOutcome::Refunded),
        ContestState::Completed => {
            let (side, winner) = if contest.verdict {
                (Side::Creator, contest.creator.clone())
            } else {
                (Side::Opponent, contest.opponent.clone())
            };
            Some(SettlementOutcome::Won {
                side,
                winner,
                payout: contest.stake.saturating_add(contest.opponent_stake),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    const NOW: u64 = 1_700_000_000;

    fn contest(active: bool, settled: bool, cancelled: bool, expiry: u64) -> Contest {
        Contest {
            id: 42,
            creator: Address::parse("0x1111111111111111111111111111111111111111").unwrap(),
            opponent: Address::parse("0x2222222222222222222222222222222222222222").unwrap(),
            statement: "Kohli scores a fifty".to_string(),
            match_id: "m1".to_string(),
            stake: 1_000_000,
            odds: 1_500_000,
            contest_expiry: expiry,
            settle_time: expiry + 3_600,
            created_at: NOW - 100,
            updated_at: NOW - 100,
            opponent_stake: 1_500_000,
            settled,
            verdict: true,
            active,
            cancelled,
            day_number: 0,
        }
    }

    #[test]
    fn cancelled_wins_over_every_other_flag() {
        for active in [true, false] {
            for settled in [true, false] {
                let c = contest(active, settled, true, NOW + 10);
                assert_eq!(classify(&c, NOW), Ok(ContestState::Cancelled));
            }
        }
    }

    #[test]
    fn active_until_expiry_inclusive() {
        assert_eq!(classify(&contest(true, false, false, NOW + 1), NOW), Ok(ContestState::Active));
        assert_eq!(classify(&contest(true, false, false, NOW), NOW), Ok(ContestState::Active));
    }

    #[test]
    fn active_flag_past_expiry_is_expired() {
        assert_eq!(classify(&contest(true, false, false, NOW - 1), NOW), Ok(ContestState::Expired));
    }

    #[test]
    fn joined_and_unsettled_is_pending() {
        assert_eq!(classify(&contest(false, false, false, NOW - 500), NOW), Ok(ContestState::Pending));
    }

    #[test]
    fn settled_is_completed() {
        assert_eq!(classify(&contest(false, true, false, NOW - 500), NOW), Ok(ContestState::Completed));
    }

    #[test]
    fn active_and_settled_is_integrity_violation() {
        let err = classify(&contest(true, true, false, NOW + 10), NOW).unwrap_err();
        assert!(matches!(err, DeriveError::DataIntegrityViolation { contest_id: 42, .. }));
    }

    #[test]
    fn every_flag_combination_yields_exactly_one_result() {
        let mut seen = Vec::new();
        for cancelled in [false, true] {
            for active in [false, true] {
                for settled in [false, true] {
                    for expiry in [NOW - 1, NOW + 1] {
                        let r = classify(&contest(active, settled, cancelled, expiry), NOW);
                        let valid = cancelled || !(active && settled);
                        assert_eq!(r.is_ok(), valid, "active={active} settled={settled} cancelled={cancelled}");
                        if let Ok(state) = r {
                            seen.push(state);
                        }
                    }
                }
            }
        }
        for state in [
            ContestState::Active,
            ContestState::Expired,
            ContestState::Pending,
            ContestState::Completed,
            ContestState::Cancelled,
        ] {
            assert!(seen.contains(&state), "{state} never produced");
        }
        assert!(!seen.contains(&ContestState::Unknown));
    }

    #[test]
    fn classify_is_idempotent() {
        let c = contest(false, false, false, NOW - 1);
        assert_eq!(classify(&c, NOW), classify(&c, NOW));
    }

    #[test]
    fn completed_outcome_pays_winner_both_stakes() {
        let mut c = contest(false, true, false, NOW - 500);
        let out = settlement_outcome(&c, ContestState::Completed).unwrap();
        assert_eq!(
            out,
            SettlementOutcome::Won { side: Side::Creator, winner: c.creator.clone(), payout: 2_500_000 }
        );

        c.verdict = false;
        match settlement_outcome(&c, ContestState::Completed).unwrap() {
            SettlementOutcome::Won { side, winner, .. } => {
                assert_eq!(side, Side::Opponent);
                assert_eq!(winner, c.opponent);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn open_contests_have_no_outcome() {
        let c = contest(true, false, false, NOW + 10);
        assert!(settlement_outcome(&c, ContestState::Active).is_none());
        assert!(settlement_outcome(&c, ContestState::Pending).is_none());
        assert_eq!(settlement_outcome(&c, ContestState::Cancelled), Some(SettlementOutcome::Refunded));
    }
}
