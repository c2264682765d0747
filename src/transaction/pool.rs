use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::model::Transaction;
use crate::error::EngineError;

/// How a miner picks the next batch out of the pending pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Oldest submissions first (insertion order).
    #[default]
    Default,
    /// Highest fee first.
    Greedy,
    /// Uniformly random, without replacement.
    Unpredictable,
    /// Earliest creation timestamp first.
    Altruistic,
    /// The miner's own transactions first, then insertion order.
    #[serde(rename = "address")]
    AddressBased,
}

impl FromStr for SelectionPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(Self::Default),
            "greedy" => Ok(Self::Greedy),
            "unpredictable" | "random" => Ok(Self::Unpredictable),
            "altruistic" => Ok(Self::Altruistic),
            "address" | "address-based" | "address_based" => Ok(Self::AddressBased),
            other => Err(EngineError::InvalidInput(format!(
                "unknown selection policy '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Greedy => "greedy",
            Self::Unpredictable => "unpredictable",
            Self::Altruistic => "altruistic",
            Self::AddressBased => "address",
        };
        f.write_str(name)
    }
}

/// Pending transactions, kept in submission order.
#[derive(Debug, Default, Clone)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.pending.iter()
    }

    /// Remove and return up to `max_per_block` transactions chosen by `policy`.
    /// Greedy and altruistic leave the remaining pool in their sorted order.
    pub fn select<R: Rng>(
        &mut self,
        max_per_block: usize,
        policy: SelectionPolicy,
        miner_address: &str,
        rng: &mut R,
    ) -> Vec<Transaction> {
        let limit = max_per_block.min(self.pending.len());

        match policy {
            SelectionPolicy::Default => self.pending.drain(..limit).collect(),
            SelectionPolicy::Greedy => {
                // sort_by is stable: equal fees keep submission order
                self.pending.sort_by(|a, b| b.fee.total_cmp(&a.fee));
                self.pending.drain(..limit).collect()
            }
            SelectionPolicy::Unpredictable => {
                let mut picked = Vec::with_capacity(limit);
                while picked.len() < limit {
                    let i = rng.gen_range(0..self.pending.len());
                    picked.push(self.pending.remove(i));
                }
                picked
            }
            SelectionPolicy::Altruistic => {
                self.pending.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
                self.pending.drain(..limit).collect()
            }
            SelectionPolicy::AddressBased => self.take_address_first(limit, miner_address),
        }
    }

    fn take_address_first(&mut self, limit: usize, miner_address: &str) -> Vec<Transaction> {
        let mut chosen = vec![false; self.pending.len()];
        let mut order = Vec::with_capacity(limit);

        for (i, tx) in self.pending.iter().enumerate() {
            if order.len() == limit {
                break;
            }
            if tx.sender_address == miner_address {
                chosen[i] = true;
                order.push(i);
            }
        }
        for i in 0..self.pending.len() {
            if order.len() == limit {
                break;
            }
            if !chosen[i] {
                chosen[i] = true;
                order.push(i);
            }
        }

        let mut slots: Vec<Option<Transaction>> = self.pending.drain(..).map(Some).collect();
        let picked = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect();
        self.pending = slots.into_iter().flatten().collect();
        picked
    }
}
