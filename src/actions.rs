use std::sync::Arc;

use tracing::info;

use crate::contract::{ContestReader, ContestWriter, TokenClient, TxHandle, TxReceipt};
use crate::derive::{classify, join_amount, settle_time_for, SettleBuffers};
use crate::error::{AppError, DeriveError, Result};
use crate::state::{ContestStore, StoreDiff};
use crate::types::{Address, Contest, ContestState, CreateContestArgs, MatchFormat, TokenAmount};

/// What has to happen before `joinContest` can succeed for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPreflight {
    Ready { required: TokenAmount },
    NeedsApproval { required: TokenAmount, allowance: TokenAmount },
    InsufficientBalance { required: TokenAmount, balance: TokenAmount },
}

pub fn join_preflight(required: TokenAmount, balance: TokenAmount, allowance: TokenAmount) -> JoinPreflight {
    if balance < required {
        JoinPreflight::InsufficientBalance { required, balance }
    } else if allowance < required {
        JoinPreflight::NeedsApproval { required, allowance }
    } else {
        JoinPreflight::Ready { required }
    }
}

/// Write flows for one signing account: submit, wait for confirmation, then
/// re-fetch the canonical snapshot into the store. Nothing is computed locally
/// and written back.
pub struct Actions<C> {
    client: Arc<C>,
    store: Arc<ContestStore>,
    account: Address,
    /// Spender that escrows stakes (the contest contract).
    escrow: Address,
    buffers: SettleBuffers,
}

impl<C> Actions<C>
where
    C: ContestReader + ContestWriter + TokenClient,
{
    pub fn new(client: Arc<C>, store: Arc<ContestStore>, account: Address, escrow: Address) -> Self {
        Self { client, store, account, escrow, buffers: SettleBuffers::default() }
    }

    /// Use the configured settle buffers instead of the built-in defaults.
    pub fn with_settle_buffers(mut self, buffers: SettleBuffers) -> Self {
        self.buffers = buffers;
        self
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    async fn submit(&self, tx: TxHandle) -> Result<TxReceipt> {
        let receipt = self.client.confirm(&tx).await?;
        info!(tx = %receipt.hash, block = ?receipt.block_number, "transaction confirmed");
        Ok(receipt)
    }

    async fn refetch(&self, id: u64) -> Result<Contest> {
        let fresh = self.client.get_contest(id).await?;
        self.store.upsert(fresh.clone());
        Ok(fresh)
    }

    /// Approve the escrow for `amount` if the current allowance falls short.
    async fn ensure_allowance(&self, amount: TokenAmount) -> Result<()> {
        let allowance = self.client.allowance(&self.account, &self.escrow).await?;
        if allowance < amount {
            let tx = self.client.approve(&self.escrow, amount).await?;
            self.submit(tx).await?;
        }
        Ok(())
    }

    pub async fn prepare_join(&self, id: u64, now: u64) -> Result<JoinPreflight> {
        let contest = self.client.get_contest(id).await?;
        if classify(&contest, now)? != ContestState::Active {
            return Err(DeriveError::InvalidArgument(format!("contest {id} is not open for joining")).into());
        }
        if contest.creator == self.account {
            return Err(DeriveError::InvalidArgument("creator cannot join their own contest".to_string()).into());
        }
        let required = join_amount(contest.stake, contest.odds)?;
        let (balance, allowance) = tokio::try_join!(
            self.client.balance_of(&self.account),
            self.client.allowance(&self.account, &self.escrow),
        )?;
        Ok(join_preflight(required, balance, allowance))
    }

    pub async fn join(&self, id: u64, now: u64) -> Result<Contest> {
        let required = match self.prepare_join(id, now).await? {
            JoinPreflight::InsufficientBalance { required, balance } => {
                return Err(AppError::Contract(format!(
                    "Insufficient balance: need {required}, have {balance}"
                )));
            }
            JoinPreflight::NeedsApproval { required, .. } => {
                self.ensure_allowance(required).await?;
                required
            }
            JoinPreflight::Ready { required } => required,
        };

        let tx = self.client.join_contest(id, required).await?;
        self.submit(tx).await?;
        let fresh = self.refetch(id).await?;
        info!(contest_id = id, opponent_stake = %fresh.opponent_stake, "joined contest");
        Ok(fresh)
    }

    /// Create a contest and reload this account's contests (the new id is
    /// assigned by the contract).
    pub async fn create(&self, args: &CreateContestArgs, format: MatchFormat, now: u64) -> Result<Vec<Contest>> {
        args.validate(format, now)?;
        self.ensure_allowance(args.stake).await?;

        let tx = self.client.create_contest(args).await?;
        self.submit(tx).await?;

        let mine = self.client.get_user_contests(&self.account).await?;
        for c in &mine {
            self.store.upsert(c.clone());
        }
        info!(match_id = %args.match_id, stake = %args.stake, "created contest");
        Ok(mine)
    }

    /// Create a contest whose settle time is derived from the match end and
    /// the configured buffer for its format.
    pub async fn create_for_match(
        &self,
        args: CreateContestArgs,
        format: MatchFormat,
        match_end: u64,
        now: u64,
    ) -> Result<Vec<Contest>> {
        let args = CreateContestArgs { settle_time: settle_time_for(match_end, format, &self.buffers), ..args };
        self.create(&args, format, now).await
    }

    pub async fn cancel(&self, id: u64) -> Result<Contest> {
        let tx = self.client.cancel_contest(id).await?;
        self.submit(tx).await?;
        self.refetch(id).await
    }

    pub async fn settle(&self, id: u64, verdict: bool) -> Result<Contest> {
        let tx = self.client.settle(id, verdict).await?;
        self.submit(tx).await?;
        self.refetch(id).await
    }

    /// Refunds every open escrow; reloads the full contest set afterwards.
    pub async fn emergency_withdraw(&self) -> Result<StoreDiff> {
        let tx = self.client.emergency_withdraw().await?;
        self.submit(tx).await?;
        let all = self.client.get_contests().await?;
        Ok(self.store.replace_all(all))
    }

    /// Faucet mint to this account; returns the new balance.
    pub async fn claim_faucet(&self, amount: TokenAmount) -> Result<TokenAmount> {
        let tx = self.client.mint(&self.account, amount).await?;
        self.submit(tx).await?;
        self.client.balance_of(&self.account).await
    }
}
