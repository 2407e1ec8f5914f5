use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::contract::{ContestReader, ContestWriter, PermitArgs, TokenClient, TxHandle, TxReceipt};
use crate::derive::odds::join_amount;
use crate::error::{AppError, Result};
use crate::types::{Address, Contest, CreateContestArgs, TokenAmount};

/// Minimum seconds between two faucet mints to the same address.
pub const MINT_COOLDOWN_SECS: u64 = 86_400;

/// Chain-wide state shared by every account handle.
#[derive(Default)]
struct Chain {
    contests: BTreeMap<u64, Contest>,
    next_contest_id: u64,
    balances: HashMap<Address, TokenAmount>,
    /// (owner, spender) -> allowance
    allowances: HashMap<(Address, Address), TokenAmount>,
    receipts: HashMap<String, TxReceipt>,
    tx_count: u64,
    last_mint: HashMap<Address, u64>,
    /// Fixed clock for tests; `None` follows wall time.
    clock: Option<u64>,
}

impl Chain {
    fn now(&self) -> u64 {
        self.clock.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        })
    }

    fn record_tx(&mut self) -> TxHandle {
        self.tx_count += 1;
        let hash = format!("0x{:064x}", self.tx_count);
        self.receipts.insert(
            hash.clone(),
            TxReceipt { hash: hash.clone(), success: true, block_number: Some(self.tx_count) },
        );
        TxHandle { hash }
    }

    fn balance(&self, who: &Address) -> TokenAmount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn credit(&mut self, who: &Address, amount: TokenAmount) {
        let balance = self.balances.entry(who.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Pull `amount` from `owner` into `escrow` using the owner's allowance for it.
    fn transfer_from(&mut self, owner: &Address, escrow: &Address, amount: TokenAmount) -> Result<()> {
        let key = (owner.clone(), escrow.clone());
        let allowed = self.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err(revert("Insufficient allowance"));
        }
        if self.balance(owner) < amount {
            return Err(revert("Insufficient balance"));
        }
        self.allowances.insert(key, allowed - amount);
        *self.balances.entry(owner.clone()).or_insert(0) -= amount;
        self.credit(escrow, amount);
        Ok(())
    }

    fn pay_out(&mut self, escrow: &Address, to: &Address, amount: TokenAmount) {
        if let Some(held) = self.balances.get_mut(escrow) {
            *held = held.saturating_sub(amount);
        }
        self.credit(to, amount);
    }

    fn contest(&self, id: u64) -> Result<&Contest> {
        self.contests.get(&id).ok_or_else(|| revert("Contest does not exist"))
    }
}

fn revert(reason: &str) -> AppError {
    AppError::Contract(reason.to_string())
}

/// In-process stand-in for the contest and token contracts.
///
/// Each handle acts as one account (`caller`); `as_account` returns another
/// handle over the same chain state.
#[derive(Clone)]
pub struct InMemoryContract {
    chain: Arc<Mutex<Chain>>,
    contest_address: Address,
    avs: Address,
    caller: Address,
}

impl InMemoryContract {
    pub fn new(contest_address: Address, avs: Address) -> Self {
        Self {
            chain: Arc::new(Mutex::new(Chain { next_contest_id: 1, ..Chain::default() })),
            caller: avs.clone(),
            contest_address,
            avs,
        }
    }

    pub fn as_account(&self, caller: Address) -> Self {
        Self { caller, ..self.clone() }
    }

    pub fn caller(&self) -> &Address {
        &self.caller
    }

    pub fn contest_address(&self) -> &Address {
        &self.contest_address
    }

    /// Pin the chain clock (Unix seconds).
    pub fn set_time(&self, now: u64) -> Result<()> {
        self.lock()?.clock = Some(now);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Chain>> {
        self.chain
            .lock()
            .map_err(|_| AppError::Contract("in-memory chain state poisoned".to_string()))
    }
}

impl ContestReader for InMemoryContract {
    async fn get_contest(&self, id: u64) -> Result<Contest> {
        self.lock()?.contest(id).cloned()
    }

    async fn get_contests(&self) -> Result<Vec<Contest>> {
        Ok(self.lock()?.contests.values().cloned().collect())
    }

    async fn get_user_contests(&self, user: &Address) -> Result<Vec<Contest>> {
        Ok(self.lock()?.contests.values().filter(|c| c.involves(user)).cloned().collect())
    }

    async fn get_active_contests(&self) -> Result<Vec<Contest>> {
        Ok(self
            .lock()?
            .contests
            .values()
            .filter(|c| c.active && !c.cancelled)
            .cloned()
            .collect())
    }

    async fn get_active_contests_by_match_id(&self, match_id: &str) -> Result<Vec<Contest>> {
        Ok(self
            .lock()?
            .contests
            .values()
            .filter(|c| c.active && !c.cancelled && c.match_id == match_id)
            .cloned()
            .collect())
    }
}

impl ContestWriter for InMemoryContract {
    async fn create_contest(&self, args: &CreateContestArgs) -> Result<TxHandle> {
        let mut chain = self.lock()?;
        let now = chain.now();
        if args.stake == 0 {
            return Err(revert("Stake must be positive"));
        }
        if args.odds == 0 {
            return Err(revert("Odds must be positive"));
        }
        if args.contest_expiry <= now || args.settle_time < args.contest_expiry {
            return Err(revert("Invalid timing"));
        }
        chain.transfer_from(&self.caller, &self.contest_address, args.stake)?;

        let id = chain.next_contest_id;
        chain.next_contest_id += 1;
        chain.contests.insert(
            id,
            Contest {
                id,
                creator: self.caller.clone(),
                opponent: Address::zero(),
                statement: args.statement.clone(),
                match_id: args.match_id.clone(),
                stake: args.stake,
                odds: args.odds,
                contest_expiry: args.contest_expiry,
                settle_time: args.settle_time,
                created_at: now,
                updated_at: now,
                opponent_stake: 0,
                settled: false,
                verdict: false,
                active: true,
                cancelled: false,
                day_number: args.day_number,
            },
        );
        debug!(contest_id = id, creator = %self.caller, "contest created");
        Ok(chain.record_tx())
    }

    async fn join_contest(&self, id: u64, stake_amount: TokenAmount) -> Result<TxHandle> {
        let mut chain = self.lock()?;
        let now = chain.now();
        let c = chain.contest(id)?;
        if c.cancelled || !c.active {
            return Err(revert(if c.has_opponent() { "Taken" } else { "Not active" }));
        }
        if c.has_opponent() {
            return Err(revert("Taken"));
        }
        if now > c.contest_expiry {
            return Err(revert("Expired"));
        }
        if c.creator == self.caller {
            return Err(revert("Creator cannot join"));
        }
        let required = join_amount(c.stake, c.odds)?;
        if stake_amount != required {
            return Err(revert("Wrong stake"));
        }

        chain.transfer_from(&self.caller, &self.contest_address, stake_amount)?;
        if let Some(c) = chain.contests.get_mut(&id) {
            c.opponent = self.caller.clone();
            c.opponent_stake = stake_amount;
            c.active = false;
            c.updated_at = now;
        }
        debug!(contest_id = id, opponent = %self.caller, "contest joined");
        Ok(chain.record_tx())
    }

    async fn cancel_contest(&self, id: u64) -> Result<TxHandle> {
        let mut chain = self.lock()?;
        let now = chain.now();
        let c = chain.contest(id)?;
        if c.creator != self.caller {
            return Err(revert("Only creator"));
        }
        if c.has_opponent() {
            return Err(revert("Taken"));
        }
        if c.cancelled || !c.active {
            return Err(revert("Not active"));
        }
        let (creator, stake) = (c.creator.clone(), c.stake);

        let escrow = self.contest_address.clone();
        chain.pay_out(&escrow, &creator, stake);
        if let Some(c) = chain.contests.get_mut(&id) {
            c.cancelled = true;
            c.settled = true;
            c.active = false;
            c.updated_at = now;
        }
        debug!(contest_id = id, "contest cancelled");
        Ok(chain.record_tx())
    }

    async fn settle(&self, id: u64, verdict: bool) -> Result<TxHandle> {
        let mut chain = self.lock()?;
        if self.caller != self.avs {
            return Err(revert("Only AVS"));
        }
        let now = chain.now();
        let c = chain.contest(id)?;
        if c.settled {
            return Err(revert("Already settled"));
        }
        if c.active || !c.has_opponent() {
            return Err(revert("Not active"));
        }
        let winner = if verdict { c.creator.clone() } else { c.opponent.clone() };
        let payout = c.stake.saturating_add(c.opponent_stake);

        let escrow = self.contest_address.clone();
        chain.pay_out(&escrow, &winner, payout);
        if let Some(c) = chain.contests.get_mut(&id) {
            c.settled = true;
            c.verdict = verdict;
            c.updated_at = now;
        }
        debug!(contest_id = id, verdict, winner = %winner, "contest settled");
        Ok(chain.record_tx())
    }

    /// Refund every unsettled contest and cancel it.
    async fn emergency_withdraw(&self) -> Result<TxHandle> {
        let mut chain = self.lock()?;
        if self.caller != self.avs {
            return Err(revert("Only AVS"));
        }
        let now = chain.now();
        let refunds: Vec<(u64, Address, TokenAmount, Option<(Address, TokenAmount)>)> = chain
            .contests
            .values()
            .filter(|c| !c.settled && !c.cancelled)
            .map(|c| {
                let opp = c.has_opponent().then(|| (c.opponent.clone(), c.opponent_stake));
                (c.id, c.creator.clone(), c.stake, opp)
            })
            .collect();

        let escrow = self.contest_address.clone();
        for (id, creator, stake, opp) in refunds {
            chain.pay_out(&escrow, &creator, stake);
            if let Some((opponent, amount)) = opp {
                chain.pay_out(&escrow, &opponent, amount);
            }
            if let Some(c) = chain.contests.get_mut(&id) {
                c.cancelled = true;
                c.settled = true;
                c.active = false;
                c.updated_at = now;
            }
        }
        Ok(chain.record_tx())
    }

    async fn confirm(&self, tx: &TxHandle) -> Result<TxReceipt> {
        self.lock()?
            .receipts
            .get(&tx.hash)
            .cloned()
            .ok_or_else(|| AppError::Contract(format!("unknown transaction {}", tx.hash)))
    }
}

impl TokenClient for InMemoryContract {
    async fn approve(&self, spender: &Address, amount: TokenAmount) -> Result<TxHandle> {
        let mut chain = self.lock()?;
        chain.allowances.insert((self.caller.clone(), spender.clone()), amount);
        Ok(chain.record_tx())
    }

    async fn permit(&self, args: &PermitArgs) -> Result<TxHandle> {
        let mut chain = self.lock()?;
        if args.deadline < chain.now() {
            return Err(revert("Permit expired"));
        }
        if args.signature.trim().is_empty() {
            return Err(revert("Invalid signature"));
        }
        chain.allowances.insert((args.owner.clone(), args.spender.clone()), args.amount);
        Ok(chain.record_tx())
    }

    async fn allowance(&self, owner: &Address, spender: &Address) -> Result<TokenAmount> {
        Ok(self
            .lock()?
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0))
    }

    async fn balance_of(&self, owner: &Address) -> Result<TokenAmount> {
        Ok(self.lock()?.balance(owner))
    }

    async fn mint(&self, to: &Address, amount: TokenAmount) -> Result<TxHandle> {
        let mut chain = self.lock()?;
        let now = chain.now();
        if let Some(&last) = chain.last_mint.get(to) {
            if now < last.saturating_add(MINT_COOLDOWN_SECS) {
                return Err(revert("Mint cooldown"));
            }
        }
        chain.last_mint.insert(to.clone(), now);
        chain.credit(to, amount);
        Ok(chain.record_tx())
    }
}
