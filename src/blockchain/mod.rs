pub mod block;
pub mod difficulty;
pub mod merkle;
pub mod model;
pub mod pow;

use serde::Serialize;

pub use block::Block;
pub use model::{Blockchain, InvalidReason, ValidationFailure};

/// Default Proof-of-Work difficulty (number of leading zeros) when dynamic
/// adjustment is off.
pub const DEFAULT_DIFFICULTY: u32 = difficulty::BASELINE_DIFFICULTY;

/// Fixed block subsidy, paid on top of the collected fees.
pub const BASE_REWARD: f64 = 1.0;

/// Upper bound on transactions pulled from the pool per block (reward excluded).
pub const MAX_TXS_PER_BLOCK: usize = 5;

/// Highest fixed difficulty accepted at runtime (keep low in dev to avoid long waits).
pub const DIFF_MAX: u32 = 6;

/// Knobs that shape how the next blocks are mined. Changing them affects
/// future blocks only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MiningSettings {
    /// Race two worker threads (even/odd nonces) instead of one sequential search.
    pub threaded: bool,
    /// Pick difficulty 3/4/5 from recent block times instead of `fixed_difficulty`.
    pub dynamic_difficulty: bool,
    /// Used for the genesis block and whenever dynamic difficulty is off.
    pub fixed_difficulty: u32,
    pub max_txs_per_block: usize,
}

impl Default for MiningSettings {
    fn default() -> Self {
        Self {
            threaded: true,
            dynamic_difficulty: true,
            fixed_difficulty: DEFAULT_DIFFICULTY,
            max_txs_per_block: MAX_TXS_PER_BLOCK,
        }
    }
}

impl MiningSettings {
    /// Single-threaded, constant difficulty.
    pub fn fixed(difficulty: u32) -> Self {
        Self {
            threaded: false,
            dynamic_difficulty: false,
            fixed_difficulty: difficulty,
            max_txs_per_block: MAX_TXS_PER_BLOCK,
        }
    }
}
