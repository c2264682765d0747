use crate::blockchain::{Block, Blockchain, MiningSettings, ValidationFailure};
use crate::error::EngineError;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, TryLockError};

/// Shared application state. One mutex around the chain serializes mining,
/// submission and pool selection.
pub struct AppState {
    pub blockchain: Mutex<Blockchain>,
}

impl AppState {
    pub fn new(settings: MiningSettings) -> Self {
        Self {
            blockchain: Mutex::new(Blockchain::new(settings)),
        }
    }

    /// Take the chain without waiting; `Busy` while a search holds the lock.
    pub fn chain(&self) -> Result<MutexGuard<'_, Blockchain>, EngineError> {
        match self.blockchain.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(EngineError::Busy),
            Err(TryLockError::Poisoned(_)) => panic!("mutex poisoned"),
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub invalid_at: Option<ValidationFailure>,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub miner_address: String,
    /// default | greedy | unpredictable | altruistic | address
    #[serde(default)]
    pub policy: Option<String>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub mined_index: u64,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub block_time_ms: u128,
    pub transactions: usize,
    pub pending: usize,
}

#[derive(Deserialize)]
pub struct SettingsRequest {
    pub threaded: Option<bool>,
    pub dynamic_difficulty: Option<bool>,
    pub fixed_difficulty: Option<u32>,
}

/* ---------- TX API Models ---------- */

/// Amount and fee arrive as text and are parsed server-side.
#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: String,
    pub private_key: String,
    pub recipient: String,
    pub amount: String,
    pub fee: String,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub hash: String,
    pub transaction: Transaction,
}

#[derive(Serialize)]
pub struct MempoolResponse {
    pub size: usize,
    pub transactions: Vec<MempoolEntry>,
}

#[derive(Serialize)]
pub struct MempoolEntry {
    pub hash: String,
    pub signature_valid: bool,
}

#[derive(Deserialize)]
pub struct VerifySignatureRequest {
    pub public_key: String,
    pub signature: String,
    /// Hex SHA-256 digest that was signed (a transaction hash).
    pub digest: String,
}

#[derive(Serialize)]
pub struct VerifySignatureResponse {
    pub valid: bool,
}

/* ---------- Wallet API Models ---------- */

#[derive(Serialize)]
pub struct NewWalletResponse {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

#[derive(Deserialize)]
pub struct ValidateKeysRequest {
    pub private_key: String,
    pub public_key: String,
}

#[derive(Serialize)]
pub struct ValidateKeysResponse {
    pub valid: bool,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub pending: usize,
    pub last_difficulty: u32,
    pub next_difficulty: u32,
    pub last_block_time_ms: u128,
    pub total_mining_time_ms: u128,
    pub avg_block_time_ms: u128,
    pub settings: MiningSettings,
}
