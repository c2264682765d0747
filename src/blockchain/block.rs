use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use super::{BASE_REWARD, MiningSettings, difficulty, merkle, pow};
use crate::digest::{hash_hex, meets_difficulty};
use crate::transaction::Transaction;

/// A single block in the blockchain holding a list of transactions.
/// The last transaction of every mined block is its reward transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: String,
    pub hash: String,
    pub merkle_root: String,
    /// Required number of leading hex zeros in `hash`.
    pub difficulty: u32,
    pub nonce: u64,
    pub miner_address: String,
    pub reward: f64,
    pub transactions: Vec<Transaction>,
    /// Wall-clock time spent in the proof-of-work search.
    pub block_time: Duration,
}

impl Block {
    /// Create and mine the genesis block (first block in the chain).
    pub fn genesis(settings: &MiningSettings) -> Self {
        let mut block = Self {
            index: 0,
            timestamp: Utc::now(),
            previous_hash: String::new(),
            hash: String::new(),
            merkle_root: merkle::merkle_root(&[]),
            difficulty: settings.fixed_difficulty,
            nonce: 0,
            miner_address: String::new(),
            reward: 0.0,
            transactions: Vec::new(),
            block_time: Duration::ZERO,
        };
        block.seal(settings.threaded);
        block
    }

    /// Assemble the successor of `previous` from `transactions`, append the
    /// reward for `miner_address` and perform the proof-of-work search.
    ///
    /// `total_mining_time` is the sum of every earlier block's `block_time`;
    /// it only matters when dynamic difficulty is enabled.
    pub fn mine_next(
        previous: &Block,
        mut transactions: Vec<Transaction>,
        miner_address: &str,
        total_mining_time: Duration,
        settings: &MiningSettings,
    ) -> Self {
        let fees: f64 = transactions.iter().map(|t| t.fee).sum();
        transactions.push(Transaction::reward(miner_address, BASE_REWARD + fees));

        let difficulty = if settings.dynamic_difficulty {
            difficulty::next_difficulty(previous, total_mining_time)
        } else {
            settings.fixed_difficulty
        };

        let mut block = Self {
            index: previous.index + 1,
            timestamp: Utc::now(),
            previous_hash: previous.hash.clone(),
            hash: String::new(),
            merkle_root: merkle::merkle_root(&transactions),
            difficulty,
            nonce: 0,
            miner_address: miner_address.to_string(),
            reward: BASE_REWARD,
            transactions,
            block_time: Duration::ZERO,
        };
        block.seal(settings.threaded);
        block
    }

    /// Run the nonce search and record the winning nonce, hash and elapsed time.
    fn seal(&mut self, threaded: bool) {
        let started = Instant::now();
        let solution = if threaded {
            pow::search_racing(self)
        } else {
            pow::search_sequential(self)
        };
        self.block_time = started.elapsed();
        self.nonce = solution.nonce;
        self.hash = solution.hash;

        info!(
            "MINER - block #{} difficulty={} nonce={} time={} ms (threaded={})",
            self.index,
            self.difficulty,
            self.nonce,
            self.block_time.as_millis(),
            threaded
        );
    }

    /// SHA-256 over timestamp, index, previous hash, `nonce` and merkle root.
    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        let preimage = format!(
            "{}{}{}{}{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.index,
            self.previous_hash,
            nonce,
            self.merkle_root
        );
        hash_hex(preimage.as_bytes())
    }

    /// Recompute the hash from the stored fields.
    pub fn compute_hash(&self) -> String {
        self.hash_with_nonce(self.nonce)
    }

    /// The cached hash matches the content and satisfies the block's difficulty.
    /// (Does NOT validate chain linkage or the merkle root.)
    pub fn is_valid(&self) -> bool {
        self.hash == self.compute_hash() && meets_difficulty(&self.hash, self.difficulty)
    }

    /// Every transaction digest matches its content and the stored merkle
    /// root matches the digests.
    pub fn has_valid_merkle_root(&self) -> bool {
        self.transactions.iter().all(|t| t.hash == t.compute_hash())
            && self.merkle_root == merkle::merkle_root(&self.transactions)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[BLOCK START]")?;
        writeln!(f, "Index: {}", self.index)?;
        writeln!(
            f,
            "Timestamp: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
        )?;
        writeln!(f, "Previous Hash: {}", self.previous_hash)?;
        writeln!(f, "-- PoW --")?;
        writeln!(f, "Difficulty Level: {}", self.difficulty)?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        writeln!(f, "Hash: {}", self.hash)?;
        writeln!(f, "Block Time: {} ms", self.block_time.as_millis())?;
        writeln!(f, "-- Rewards --")?;
        writeln!(f, "Reward: {}", self.reward)?;
        writeln!(f, "Miners Address: {}", self.miner_address)?;
        writeln!(f, "-- {} Transactions --", self.transactions.len())?;
        writeln!(f, "Merkle Root: {}", self.merkle_root)?;
        for tx in &self.transactions {
            writeln!(f, "{tx}")?;
        }
        write!(f, "[BLOCK END]")
    }
}

#[cfg(test)]
mod tests {
    use super::Block;
    use chrono::SecondsFormat;
    use crate::blockchain::MiningSettings;
    use crate::digest::meets_difficulty;
    use crate::transaction::Transaction;
    use std::time::Duration;

    fn batch() -> Vec<Transaction> {
        vec![
            Transaction::new("alice", "bob", 10.0, 1.0),
            Transaction::new("carol", "dave", 5.0, 0.5),
        ]
    }

    #[test]
    fn display_shows_hashed_timestamp() {
        let b = Block::genesis(&MiningSettings::fixed(1));
        let stamp = b.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
        assert!(b.to_string().contains(&format!("Timestamp: {stamp}\n")));
    }

    #[test]
    fn genesis_has_valid_hash() {
        let b = Block::genesis(&MiningSettings::fixed(1));
        assert_eq!(b.index, 0);
        assert_eq!(b.hash, b.compute_hash());
        assert!(b.previous_hash.is_empty());
        assert!(b.merkle_root.is_empty());
        assert!(b.transactions.is_empty());
        assert!(b.is_valid());
    }

    #[test]
    fn mining_produces_leading_zeros() {
        let settings = MiningSettings::fixed(2);
        let genesis = Block::genesis(&settings);
        let b = Block::mine_next(&genesis, batch(), "miner", Duration::ZERO, &settings);
        assert!(b.hash.starts_with("00"));
        assert_eq!(b.hash, b.compute_hash());
        assert!(b.is_valid());
        assert!(b.has_valid_merkle_root());
        assert_eq!(b.previous_hash, genesis.hash);
        assert_eq!(b.index, 1);
    }

    #[test]
    fn reward_is_last_and_collects_fees() {
        let settings = MiningSettings::fixed(1);
        let genesis = Block::genesis(&settings);
        let b = Block::mine_next(&genesis, batch(), "miner", Duration::ZERO, &settings);
        assert_eq!(b.transactions.len(), 3);
        let reward = b.transactions.last().unwrap();
        assert!(reward.is_reward());
        assert_eq!(reward.recipient_address, "miner");
        assert_eq!(reward.amount, 2.5);
        assert_eq!(b.reward, 1.0);
    }

    #[test]
    fn zero_difficulty_accepts_first_nonce() {
        for threaded in [false, true] {
            let settings = MiningSettings {
                threaded,
                ..MiningSettings::fixed(0)
            };
            let genesis = Block::genesis(&settings);
            let b = Block::mine_next(&genesis, batch(), "miner", Duration::ZERO, &settings);
            assert_eq!(b.nonce, 0);
            assert_eq!(b.hash, b.hash_with_nonce(0));
        }
    }

    #[test]
    fn threaded_search_yields_valid_block() {
        let settings = MiningSettings {
            threaded: true,
            ..MiningSettings::fixed(2)
        };
        let genesis = Block::genesis(&settings);
        let b = Block::mine_next(&genesis, batch(), "miner", Duration::ZERO, &settings);
        assert!(b.is_valid());
        assert!(meets_difficulty(&b.hash, 2));
    }

    #[test]
    fn invalid_when_mutated() {
        let settings = MiningSettings::fixed(2);
        let genesis = Block::genesis(&settings);
        let mut b = Block::mine_next(&genesis, batch(), "miner", Duration::ZERO, &settings);
        let old_hash = b.hash.clone();

        // Tampering with a transaction breaks the merkle check, not the header hash
        b.transactions[0].amount = 1_000.0;
        assert!(!b.has_valid_merkle_root());
        b.transactions[0].hash = b.transactions[0].compute_hash();
        assert!(!b.has_valid_merkle_root());
        assert_eq!(old_hash, b.compute_hash());

        // Tampering with a header field breaks the hash
        b.previous_hash = "forged".into();
        assert_ne!(old_hash, b.compute_hash());
        assert!(!b.is_valid());
    }
}
