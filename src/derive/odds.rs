use crate::config::{ODDS_SCALE, TOKEN_DECIMALS, TOKEN_SCALE};
use crate::error::DeriveError;
use crate::types::TokenAmount;

/// Amount an opponent must stake to join: `floor(stake * odds / 1e6)`.
///
/// Integer arithmetic only; the result has to equal the contract's own
/// computation exactly.
pub fn join_amount(stake: TokenAmount, odds: u128) -> Result<TokenAmount, DeriveError> {
    if odds == 0 {
        return Err(DeriveError::InvalidArgument("odds must be greater than zero".to_string()));
    }
    stake
        .checked_mul(odds)
        .map(|n| n / ODDS_SCALE)
        .ok_or_else(|| DeriveError::InvalidArgument(format!("stake {stake} * odds {odds} overflows")))
}

/// Profit for the winning opponent: the creator's stake, unchanged.
pub fn potential_profit(stake: TokenAmount) -> TokenAmount {
    stake
}

/// Render odds as `"N:1"` (odds >= 1) or `"1:N"` (odds < 1), N rounded half away from zero.
pub fn format_odds_ratio(odds: u128) -> Result<String, DeriveError> {
    if odds == 0 {
        return Err(DeriveError::InvalidArgument("odds must be greater than zero".to_string()));
    }
    if odds >= ODDS_SCALE {
        Ok(format!("{}:1", round_div(odds, ODDS_SCALE)))
    } else {
        Ok(format!("1:{}", round_div(ODDS_SCALE, odds)))
    }
}

/// `round(n / d)` with halves rounded up; operands are non-negative.
fn round_div(n: u128, d: u128) -> u128 {
    let q = n / d;
    if (n % d) * 2 >= d {
        q + 1
    } else {
        q
    }
}

/// `1_500_000` -> `"1.5"`, `2_000_000` -> `"2"`.
pub fn format_amount(amount: TokenAmount) -> String {
    let whole = amount / TOKEN_SCALE;
    let frac = amount % TOKEN_SCALE;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = TOKEN_DECIMALS as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Parse user-entered decimal text into a fixed-point amount.
pub fn parse_amount(text: &str) -> Result<TokenAmount, DeriveError> {
    let text = text.trim();
    let invalid = || DeriveError::InvalidArgument(format!("{text:?} is not a valid amount"));

    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > TOKEN_DECIMALS as usize {
        return Err(DeriveError::InvalidArgument(format!(
            "{text:?} has more than {TOKEN_DECIMALS} decimal places"
        )));
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = TOKEN_DECIMALS as usize);
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(TOKEN_SCALE)
        .and_then(|n| n.checked_add(frac_units))
        .ok_or_else(invalid)
}
