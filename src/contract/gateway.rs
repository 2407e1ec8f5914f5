use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::contract::{ContestReader, ContestWriter, PermitArgs, TokenClient, TxHandle, TxReceipt};
use crate::error::{AppError, Result};
use crate::types::{wire, Address, Contest, CreateContestArgs, TokenAmount};

/// JSON-RPC 2.0 client for a gateway that fronts the contest and token contracts.
///
/// Each request carries the contract function name as `method`, positional
/// `params`, the target contract in `to` and the signing account in `from`.
pub struct GatewayClient {
    http: reqwest::Client,
    url: String,
    contest_address: Address,
    token_address: Address,
    /// Account that signs writes; reads work without one.
    account: Option<Address>,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Deserialize)]
struct Amount(#[serde(with = "wire::amount")] TokenAmount);

impl GatewayClient {
    pub fn new(cfg: &Config, url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            contest_address: Address::parse(&cfg.contest_address)?,
            token_address: Address::parse(&cfg.token_address)?,
            account: None,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    async fn call<T: DeserializeOwned>(&self, to: &Address, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
            "to": to,
            "from": self.account,
        });

        let started = Instant::now();
        let resp = self.http.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::Rpc(format!("{method}: HTTP {status}: {text}")));
        }
        let reply: RpcReply = resp.json().await?;
        debug!(
            method,
            rpc_id = id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "gateway call"
        );

        if let Some(err) = reply.error {
            return Err(AppError::Contract(err.message));
        }
        let result = reply
            .result
            .ok_or_else(|| AppError::Rpc(format!("{method}: reply has neither result nor error")))?;
        Ok(serde_json::from_value(result)?)
    }

    async fn contest_call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        self.call(&self.contest_address, method, params).await
    }

    async fn token_call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        self.call(&self.token_address, method, params).await
    }

    fn require_account(&self) -> Result<&Address> {
        self.account
            .as_ref()
            .ok_or_else(|| AppError::Contract("no signing account configured".to_string()))
    }
}

impl ContestReader for GatewayClient {
    async fn get_contest(&self, id: u64) -> Result<Contest> {
        self.contest_call("getContest", json!([id])).await
    }

    async fn get_contests(&self) -> Result<Vec<Contest>> {
        self.contest_call("getContests", json!([])).await
    }

    async fn get_user_contests(&self, user: &Address) -> Result<Vec<Contest>> {
        self.contest_call("getUserContests", json!([user])).await
    }

    async fn get_active_contests(&self) -> Result<Vec<Contest>> {
        self.contest_call("getActiveContests", json!([])).await
    }

    async fn get_active_contests_by_match_id(&self, match_id: &str) -> Result<Vec<Contest>> {
        self.contest_call("getActiveContestsByMatchId", json!([match_id])).await
    }
}

impl ContestWriter for GatewayClient {
    async fn create_contest(&self, args: &CreateContestArgs) -> Result<TxHandle> {
        self.require_account()?;
        self.contest_call(
            "createContest",
            json!([
                args.statement,
                args.match_id,
                args.stake.to_string(),
                args.odds.to_string(),
                args.contest_expiry,
                args.settle_time,
                args.day_number,
            ]),
        )
        .await
    }

    async fn join_contest(&self, id: u64, stake_amount: TokenAmount) -> Result<TxHandle> {
        self.require_account()?;
        self.contest_call("joinContest", json!([id, stake_amount.to_string()])).await
    }

    async fn cancel_contest(&self, id: u64) -> Result<TxHandle> {
        self.require_account()?;
        self.contest_call("cancelContest", json!([id])).await
    }

    async fn settle(&self, id: u64, verdict: bool) -> Result<TxHandle> {
        self.require_account()?;
        self.contest_call("settle", json!([id, verdict])).await
    }

    async fn emergency_withdraw(&self) -> Result<TxHandle> {
        self.require_account()?;
        self.contest_call("emergencyWithdraw", json!([])).await
    }

    async fn confirm(&self, tx: &TxHandle) -> Result<TxReceipt> {
        let receipt: TxReceipt = self.contest_call("waitForTransaction", json!([tx.hash])).await?;
        if !receipt.success {
            return Err(AppError::Contract(format!("transaction {} reverted", receipt.hash)));
        }
        Ok(receipt)
    }
}

impl TokenClient for GatewayClient {
    async fn approve(&self, spender: &Address, amount: TokenAmount) -> Result<TxHandle> {
        self.require_account()?;
        self.token_call("approve", json!([spender, amount.to_string()])).await
    }

    async fn permit(&self, args: &PermitArgs) -> Result<TxHandle> {
        self.require_account()?;
        self.token_call(
            "permit",
            json!([args.owner, args.spender, args.amount.to_string(), args.deadline, args.signature]),
        )
        .await
    }

    async fn allowance(&self, owner: &Address, spender: &Address) -> Result<TokenAmount> {
        let Amount(n) = self.token_call("allowance", json!([owner, spender])).await?;
        Ok(n)
    }

    async fn balance_of(&self, owner: &Address) -> Result<TokenAmount> {
        let Amount(n) = self.token_call("balanceOf", json!([owner])).await?;
        Ok(n)
    }

    async fn mint(&self, to: &Address, amount: TokenAmount) -> Result<TxHandle> {
        self.require_account()?;
        self.token_call("mint", json!([to, amount.to_string()])).await
    }
}
