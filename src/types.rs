use serde::{Deserialize, Serialize};

use crate::config::ZERO_ADDRESS;
use crate::error::DeriveError;

/// Fixed-point token amount, 6 implied decimals.
pub type TokenAmount = u128;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// 20-byte account address, stored as lowercase `0x`-prefixed hex so equality
/// is case-insensitive with respect to the input text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(s: &str) -> std::result::Result<Self, DeriveError> {
        let s = s.trim();
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| DeriveError::InvalidArgument(format!("address {s:?} must start with 0x")))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DeriveError::InvalidArgument(format!(
                "address {s:?} must have 40 hex characters"
            )));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn zero() -> Self {
        Self(ZERO_ADDRESS.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDRESS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<String> for Address {
    type Error = DeriveError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Address::parse(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Contest
// ---------------------------------------------------------------------------

/// A contest snapshot as read from the contract. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    #[serde(with = "wire::u64_num")]
    pub id: u64,
    pub creator: Address,
    #[serde(default)]
    pub opponent: Address,
    #[serde(default)]
    pub statement: String,
    #[serde(with = "wire::text")]
    pub match_id: String,
    #[serde(with = "wire::amount")]
    pub stake: TokenAmount,
    /// Creator profit : stake, scaled by 1e6.
    #[serde(with = "wire::amount")]
    pub odds: u128,
    #[serde(with = "wire::u64_num")]
    pub contest_expiry: u64,
    #[serde(with = "wire::u64_num")]
    pub settle_time: u64,
    #[serde(default, with = "wire::u64_num")]
    pub created_at: u64,
    #[serde(default, with = "wire::u64_num")]
    pub updated_at: u64,
    #[serde(default, with = "wire::amount")]
    pub opponent_stake: TokenAmount,
    #[serde(default)]
    pub settled: bool,
    /// True when the creator's side won.
    #[serde(default)]
    pub verdict: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub cancelled: bool,
    /// Day of a multi-day match the contest settles on; 0 = end of match.
    #[serde(default, with = "wire::u64_num")]
    pub day_number: u64,
}

impl Contest {
    pub fn has_opponent(&self) -> bool {
        !self.opponent.is_zero()
    }

    pub fn involves(&self, who: &Address) -> bool {
        &self.creator == who || (self.has_opponent() && &self.opponent == who)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestState {
    /// Open for joining.
    Active,
    /// Unfilled and past its join window.
    Expired,
    /// Opponent joined; awaiting settlement.
    Pending,
    Completed,
    Cancelled,
    /// Snapshot with a flag combination the classifier does not accept.
    Unknown,
}

impl std::fmt::Display for ContestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContestState::Active => "active",
            ContestState::Expired => "expired",
            ContestState::Pending => "pending",
            ContestState::Completed => "completed",
            ContestState::Cancelled => "cancelled",
            ContestState::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ContestState {
    type Err = DeriveError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(ContestState::Active),
            "expired" => Ok(ContestState::Expired),
            "pending" => Ok(ContestState::Pending),
            "completed" => Ok(ContestState::Completed),
            "cancelled" => Ok(ContestState::Cancelled),
            "unknown" => Ok(ContestState::Unknown),
            other => Err(DeriveError::InvalidArgument(format!("unknown contest state {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Settlement outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Creator,
    Opponent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementOutcome {
    Won {
        side: Side,
        winner: Address,
        #[serde(with = "wire::amount")]
        payout: TokenAmount,
    },
    /// Cancelled contests return each stake to its owner.
    Refunded,
}

// ---------------------------------------------------------------------------
// Write arguments
// ---------------------------------------------------------------------------

/// Arguments of `createContest`, in contract parameter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContestArgs {
    pub statement: String,
    pub match_id: String,
    #[serde(with = "wire::amount")]
    pub stake: TokenAmount,
    #[serde(with = "wire::amount")]
    pub odds: u128,
    pub contest_expiry: u64,
    pub settle_time: u64,
    pub day_number: u64,
}

// ---------------------------------------------------------------------------
// Match data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchFormat {
    T10,
    T20,
    Odi,
    Test,
    Other,
}

impl MatchFormat {
    pub fn from_match_type(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "t10" => MatchFormat::T10,
            "t20" | "t20i" => MatchFormat::T20,
            "odi" => MatchFormat::Odi,
            "test" => MatchFormat::Test,
            _ => MatchFormat::Other,
        }
    }

    /// Limited-overs formats that finish within a few hours.
    pub fn is_short(self) -> bool {
        matches!(self, MatchFormat::T10 | MatchFormat::T20)
    }

    pub fn is_multi_day(self) -> bool {
        self == MatchFormat::Test
    }
}

impl std::fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchFormat::T10 => "t10",
            MatchFormat::T20 => "t20",
            MatchFormat::Odi => "odi",
            MatchFormat::Test => "test",
            MatchFormat::Other => "other",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub name: String,
    pub team1: String,
    pub team2: String,
    pub format: MatchFormat,
    pub status: String,
    pub venue: Option<String>,
    /// Unix seconds, when the feed provides a start time.
    pub starts_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Innings {
    pub team: String,
    pub runs: u32,
    pub wickets: u32,
    pub overs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub match_id: String,
    pub status: String,
    pub result: Option<String>,
    pub innings: Vec<Innings>,
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

/// Contract integers arrive as JSON numbers or decimal strings.
pub mod wire {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    fn to_u128(v: &serde_json::Value) -> Option<u128> {
        match v {
            serde_json::Value::Number(n) => n.as_u64().map(u128::from).or_else(|| n.to_string().parse().ok()),
            serde_json::Value::String(s) => {
                let s = s.trim();
                match s.strip_prefix("0x") {
                    Some(hex) => u128::from_str_radix(hex, 16).ok(),
                    None => s.parse().ok(),
                }
            }
            _ => None,
        }
    }

    /// Amounts are written as decimal strings to stay exact for JS consumers.
    pub mod amount {
        use super::*;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(v: &u128, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&v.to_string())
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
            let v = serde_json::Value::deserialize(d)?;
            to_u128(&v).ok_or_else(|| D::Error::custom(format!("expected unsigned integer, got {v}")))
        }
    }

    pub mod u64_num {
        use super::*;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(v: &u64, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_u64(*v)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
            let v = serde_json::Value::deserialize(d)?;
            to_u128(&v)
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| D::Error::custom(format!("expected u64, got {v}")))
        }
    }

    /// Identifiers that may be numeric on the wire but are opaque text here.
    pub mod text {
        use super::*;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(v: &str, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(v)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
            match serde_json::Value::deserialize(d)? {
                serde_json::Value::String(s) => Ok(s),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                other => Err(D::Error::custom(format!("expected string or number, got {other}"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parse_normalizes_case() {
        let a = Address::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        let b = Address::parse("0xabcdef0123456789ABCDEF0123456789abcdef01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn address_parse_rejects_malformed() {
        assert!(Address::parse("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn contest_deserializes_string_and_number_integers() {
        let json = serde_json::json!({
            "id": "7",
            "creator": "0x1111111111111111111111111111111111111111",
            "opponent": "0x0000000000000000000000000000000000000000",
            "statement": "India win the toss",
            "matchId": 4521,
            "stake": "2500000",
            "odds": 1500000,
            "contestExpiry": 1_700_000_000u64,
            "settleTime": "1700009000",
            "createdAt": 1_699_990_000u64,
            "updatedAt": 1_699_990_000u64,
            "opponentStake": "0",
            "settled": false,
            "verdict": false,
            "active": true,
            "cancelled": false,
            "dayNumber": 0
        });
        let c: Contest = serde_json::from_value(json).unwrap();
        assert_eq!(c.id, 7);
        assert_eq!(c.match_id, "4521");
        assert_eq!(c.stake, 2_500_000);
        assert_eq!(c.odds, 1_500_000);
        assert_eq!(c.settle_time, 1_700_009_000);
        assert!(!c.has_opponent());
    }

    #[test]
    fn contest_serializes_amounts_as_strings() {
        let c = Contest {
            id: 1,
            creator: Address::parse("0x1111111111111111111111111111111111111111").unwrap(),
            opponent: Address::zero(),
            statement: "s".into(),
            match_id: "m1".into(),
            stake: 10u128.pow(12),
            odds: 1_000_000,
            contest_expiry: 10,
            settle_time: 20,
            created_at: 1,
            updated_at: 1,
            opponent_stake: 0,
            settled: false,
            verdict: false,
            active: true,
            cancelled: false,
            day_number: 0,
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["stake"], "1000000000000");
        assert_eq!(v["contestExpiry"], 10);
    }

    #[test]
    fn match_format_from_feed_labels() {
        assert_eq!(MatchFormat::from_match_type("T20"), MatchFormat::T20);
        assert_eq!(MatchFormat::from_match_type("odi"), MatchFormat::Odi);
        assert!(MatchFormat::from_match_type("t10").is_short());
        assert!(MatchFormat::from_match_type("Test").is_multi_day());
        assert_eq!(MatchFormat::from_match_type("hundred"), MatchFormat::Other);
    }
}
