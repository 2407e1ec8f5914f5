//! Pure contest derivations: lifecycle state, stake/odds arithmetic,
//! countdowns and the composed view model. No I/O and no shared state.

pub mod countdown;
pub mod odds;
pub mod schedule;
pub mod status;
pub mod view;

pub use countdown::{filter_live, filter_live_for_match, time_remaining};
pub use odds::{format_amount, format_odds_ratio, join_amount, parse_amount, potential_profit};
pub use schedule::{settle_time_for, SettleBuffers};
pub use status::{classify, settlement_outcome};
pub use view::{build_view_model, ContestView};
