use crate::config::{settle_buffers, Config};
use crate::error::DeriveError;
use crate::types::{CreateContestArgs, MatchFormat};

/// Minutes added after match end before settlement is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleBuffers {
    pub short_format_minutes: u64,
    pub long_format_minutes: u64,
}

impl Default for SettleBuffers {
    fn default() -> Self {
        Self {
            short_format_minutes: settle_buffers::SHORT_FORMAT_MINUTES,
            long_format_minutes: settle_buffers::LONG_FORMAT_MINUTES,
        }
    }
}

impl SettleBuffers {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            short_format_minutes: cfg.settle_buffer_short_minutes,
            long_format_minutes: cfg.settle_buffer_long_minutes,
        }
    }

    pub fn for_format(&self, format: MatchFormat) -> u64 {
        if format.is_short() {
            self.short_format_minutes
        } else {
            self.long_format_minutes
        }
    }
}

/// Expected settlement time for a contest on a match ending at `match_end`.
pub fn settle_time_for(match_end: u64, format: MatchFormat, buffers: &SettleBuffers) -> u64 {
    match_end.saturating_add(buffers.for_format(format).saturating_mul(60))
}

impl CreateContestArgs {
    /// Reject arguments the contract would refuse, before a transaction is built.
    pub fn validate(&self, format: MatchFormat, now: u64) -> Result<(), DeriveError> {
        let invalid = |msg: &str| Err(DeriveError::InvalidArgument(msg.to_string()));

        if self.statement.trim().is_empty() {
            return invalid("statement must not be empty");
        }
        if self.match_id.trim().is_empty() {
            return invalid("match id must not be empty");
        }
        if self.stake == 0 {
            return invalid("stake must be greater than zero");
        }
        if self.odds == 0 {
            return invalid("odds must be greater than zero");
        }
        if self.contest_expiry <= now {
            return invalid("contest expiry must be in the future");
        }
        if self.settle_time < self.contest_expiry {
            return invalid("settle time must not precede contest expiry");
        }
        if self.day_number > 0 && !format.is_multi_day() {
            return invalid("day number is only valid for multi-day matches");
        }
        Ok(())
    }
}
