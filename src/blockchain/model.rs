use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::{Block, MiningSettings, difficulty};
use crate::error::{EngineError, Result};
use crate::transaction::{SelectionPolicy, Transaction, TransactionPool};

/// Which check a block failed during full-chain validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// `previous_hash` does not match the preceding block's hash.
    Linkage,
    /// Stored hash differs from the recomputed one.
    Hash,
    /// Hash is genuine but lacks the required leading zeros.
    InsufficientWork,
    /// Transaction digests or the merkle root do not match the transactions.
    MerkleRoot,
}

/// First failing block found by [`Blockchain::first_invalid_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub index: u64,
    pub reason: InvalidReason,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block #{} failed {:?} check", self.index, self.reason)
    }
}

/// Simple in-memory blockchain with Proof-of-Work.
#[derive(Debug)]
pub struct Blockchain {
    pub chain: Vec<Block>,
    pool: TransactionPool,
    /// Sum of every block's `block_time`, genesis included.
    total_mining_time: Duration,
    settings: MiningSettings,
}

impl Blockchain {
    /// Initialize a new blockchain with a freshly mined genesis block.
    pub fn new(settings: MiningSettings) -> Self {
        let genesis = Block::genesis(&settings);
        let total_mining_time = genesis.block_time;
        Self {
            chain: vec![genesis],
            pool: TransactionPool::new(),
            total_mining_time,
            settings,
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn settings(&self) -> MiningSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: MiningSettings) {
        // NOTE: affects future blocks only.
        self.settings = settings;
    }

    pub fn total_mining_time(&self) -> Duration {
        self.total_mining_time
    }

    pub fn average_block_time(&self) -> Duration {
        self.total_mining_time / self.chain.len() as u32
    }

    /// Difficulty the next mined block would get under the current settings.
    pub fn next_difficulty(&self) -> u32 {
        if self.settings.dynamic_difficulty {
            difficulty::next_difficulty(self.last_block(), self.total_mining_time)
        } else {
            self.settings.fixed_difficulty
        }
    }

    pub fn pending(&self) -> &TransactionPool {
        &self.pool
    }

    /// Queue a transaction for a future block.
    pub fn submit_transaction(&mut self, tx: Transaction) {
        debug!(
            "POOL - queued tx {} ({} -> {}, amount={}, fee={})",
            tx.hash, tx.sender_address, tx.recipient_address, tx.amount, tx.fee
        );
        self.pool.push(tx);
    }

    /// Pull a batch from the pool with `policy`, mine it on top of the tip and
    /// append the result.
    pub fn mine_next_block(&mut self, policy: SelectionPolicy, miner_address: &str) -> &Block {
        self.mine_next_block_with_rng(policy, miner_address, &mut rand::thread_rng())
    }

    pub fn mine_next_block_with_rng<R: Rng>(
        &mut self,
        policy: SelectionPolicy,
        miner_address: &str,
        rng: &mut R,
    ) -> &Block {
        let batch = self.pool.select(
            self.settings.max_txs_per_block,
            policy,
            miner_address,
            rng,
        );
        debug!(
            "MINER - policy={} selected {} txs ({} left pending)",
            policy,
            batch.len(),
            self.pool.len()
        );

        let block = Block::mine_next(
            self.last_block(),
            batch,
            miner_address,
            self.total_mining_time,
            &self.settings,
        );
        self.total_mining_time += block.block_time;
        self.chain.push(block);
        self.last_block()
    }

    pub fn get_block(&self, index: u64) -> Result<&Block> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.chain.get(i))
            .ok_or(EngineError::NotFound(index))
    }

    /// Credits received minus amounts and fees sent, over every mined transaction.
    pub fn balance(&self, address: &str) -> f64 {
        self.chain
            .iter()
            .flat_map(|b| b.transactions.iter())
            .fold(0.0, |mut acc, tx| {
                if tx.recipient_address == address {
                    acc += tx.amount;
                }
                if tx.sender_address == address {
                    acc -= tx.amount + tx.fee;
                }
                acc
            })
    }

    /// Walk the chain and report the first block that fails a check.
    ///
    /// A genesis-only chain is checked by its hash alone. Otherwise every block
    /// from index 1 through the tip must link to its predecessor, carry a
    /// genuine hash meeting its difficulty, and match its merkle root.
    pub fn first_invalid_block(&self) -> Option<ValidationFailure> {
        if self.chain.len() == 1 {
            let genesis = &self.chain[0];
            return (genesis.hash != genesis.compute_hash()).then_some(ValidationFailure {
                index: genesis.index,
                reason: InvalidReason::Hash,
            });
        }

        for pair in self.chain.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);
            let reason = if current.previous_hash != prev.hash {
                Some(InvalidReason::Linkage)
            } else if current.hash != current.compute_hash() {
                Some(InvalidReason::Hash)
            } else if !current.is_valid() {
                Some(InvalidReason::InsufficientWork)
            } else if !current.has_valid_merkle_root() {
                Some(InvalidReason::MerkleRoot)
            } else {
                None
            };

            if let Some(reason) = reason {
                let failure = ValidationFailure {
                    index: current.index,
                    reason,
                };
                warn!("VALIDATE - {failure}");
                return Some(failure);
            }
        }
        None
    }

    /// Validate the entire chain: linkage, hashes, PoW and merkle roots.
    pub fn is_valid_chain(&self) -> bool {
        let valid = self.first_invalid_block().is_none();
        info!("VALIDATE - {} blocks, valid={}", self.chain.len(), valid);
        valid
    }

    /// Human-readable dump of one block.
    pub fn render_block(&self, index: u64) -> Result<String> {
        self.get_block(index).map(|b| b.to_string())
    }

    pub fn render_pending(&self) -> String {
        if self.pool.is_empty() {
            return "No Transactions Are Pending.".to_string();
        }
        self.pool
            .iter()
            .map(|tx| tx.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.chain.iter().enumerate() {
            if i > 0 {
                write!(f, "\n \n")?;
            }
            write!(f, "{block}")?;
        }
        Ok(())
    }
}
