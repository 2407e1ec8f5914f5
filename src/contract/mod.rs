//! Typed interface to the external contest and token contracts.
//!
//! One method per contract operation. Callers receive an implementation
//! (gateway or in-memory) instead of reaching for ambient wallet state.

pub mod gateway;
pub mod sim;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{wire, Address, Contest, CreateContestArgs, TokenAmount};

pub use gateway::GatewayClient;
pub use sim::InMemoryContract;

/// Opaque handle of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub hash: String,
    pub success: bool,
    #[serde(default)]
    pub block_number: Option<u64>,
}

/// Arguments of the token's `permit`; the signature comes from the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitArgs {
    pub owner: Address,
    pub spender: Address,
    #[serde(with = "wire::amount")]
    pub amount: TokenAmount,
    pub deadline: u64,
    pub signature: String,
}

pub trait ContestReader: Send + Sync {
    fn get_contest(&self, id: u64) -> impl Future<Output = Result<Contest>> + Send;

    fn get_contests(&self) -> impl Future<Output = Result<Vec<Contest>>> + Send;

    fn get_user_contests(&self, user: &Address) -> impl Future<Output = Result<Vec<Contest>>> + Send;

    fn get_active_contests(&self) -> impl Future<Output = Result<Vec<Contest>>> + Send;

    fn get_active_contests_by_match_id(
        &self,
        match_id: &str,
    ) -> impl Future<Output = Result<Vec<Contest>>> + Send;
}

pub trait ContestWriter: Send + Sync {
    fn create_contest(&self, args: &CreateContestArgs) -> impl Future<Output = Result<TxHandle>> + Send;

    fn join_contest(&self, id: u64, stake_amount: TokenAmount) -> impl Future<Output = Result<TxHandle>> + Send;

    fn cancel_contest(&self, id: u64) -> impl Future<Output = Result<TxHandle>> + Send;

    fn settle(&self, id: u64, verdict: bool) -> impl Future<Output = Result<TxHandle>> + Send;

    fn emergency_withdraw(&self) -> impl Future<Output = Result<TxHandle>> + Send;

    /// Wait until the transaction is final. A reverted transaction is an error.
    fn confirm(&self, tx: &TxHandle) -> impl Future<Output = Result<TxReceipt>> + Send;
}

pub trait TokenClient: Send + Sync {
    fn approve(&self, spender: &Address, amount: TokenAmount) -> impl Future<Output = Result<TxHandle>> + Send;

    fn permit(&self, args: &PermitArgs) -> impl Future<Output = Result<TxHandle>> + Send;

    fn allowance(&self, owner: &Address, spender: &Address) -> impl Future<Output = Result<TokenAmount>> + Send;

    fn balance_of(&self, owner: &Address) -> impl Future<Output = Result<TokenAmount>> + Send;

    /// Faucet; rate-limited by the token contract.
    fn mint(&self, to: &Address, amount: TokenAmount) -> impl Future<Output = Result<TxHandle>> + Send;
}
