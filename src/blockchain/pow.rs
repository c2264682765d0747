//! Proof-of-work nonce search.
//!
//! Both searches are unbounded: they loop until a hash with `difficulty`
//! leading hex zeros turns up.

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use super::Block;
use crate::digest::meets_difficulty;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowSolution {
    pub nonce: u64,
    pub hash: String,
}

/// Try nonce 0, 1, 2, ... on the calling thread.
pub fn search_sequential(block: &Block) -> PowSolution {
    let mut nonce: u64 = 0;
    loop {
        let hash = block.hash_with_nonce(nonce);
        if meets_difficulty(&hash, block.difficulty) {
            return PowSolution { nonce, hash };
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Two workers race over disjoint nonce spaces: even nonces from 0 and odd
/// nonces from 1. After each miss a worker polls the other parity's flag and
/// gives up once the other side has a hit. The even result wins ties.
pub fn search_racing(block: &Block) -> PowSolution {
    let even_found = AtomicBool::new(false);
    let odd_found = AtomicBool::new(false);

    let (even, odd) = thread::scope(|s| {
        let even = s.spawn(|| race(block, 0, &even_found, &odd_found));
        let odd = s.spawn(|| race(block, 1, &odd_found, &even_found));
        (
            even.join().unwrap_or_else(|e| std::panic::resume_unwind(e)),
            odd.join().unwrap_or_else(|e| std::panic::resume_unwind(e)),
        )
    });

    if meets_difficulty(&even.hash, block.difficulty) {
        debug!("POW - even worker won at nonce {}", even.nonce);
        even
    } else {
        debug!("POW - odd worker won at nonce {}", odd.nonce);
        odd
    }
}

/// Returns the last nonce/hash tried, which only satisfies the difficulty if
/// this worker found it before seeing the other's flag.
fn race(block: &Block, start: u64, own: &AtomicBool, other: &AtomicBool) -> PowSolution {
    let mut nonce = start;
    loop {
        let hash = block.hash_with_nonce(nonce);
        if meets_difficulty(&hash, block.difficulty) {
            own.store(true, Ordering::Release);
            return PowSolution { nonce, hash };
        }
        // best-effort read: may see the other's hit one iteration late
        if other.load(Ordering::Acquire) {
            return PowSolution { nonce, hash };
        }
        nonce = nonce.wrapping_add(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::MiningSettings;

    fn candidate(difficulty: u32) -> Block {
        let mut block = Block::genesis(&MiningSettings::fixed(0));
        block.difficulty = difficulty;
        block
    }

    #[test]
    fn sequential_finds_first_matching_nonce() {
        let block = candidate(2);
        let sol = search_sequential(&block);
        assert!(meets_difficulty(&sol.hash, 2));
        assert_eq!(sol.hash, block.hash_with_nonce(sol.nonce));
        assert!((0..sol.nonce).all(|n| !meets_difficulty(&block.hash_with_nonce(n), 2)));
    }

    #[test]
    fn racing_solution_is_valid() {
        let block = candidate(2);
        let sol = search_racing(&block);
        assert!(meets_difficulty(&sol.hash, 2));
        assert_eq!(sol.hash, block.hash_with_nonce(sol.nonce));
    }

    #[test]
    fn racing_prefers_even_on_trivial_difficulty() {
        let block = candidate(0);
        assert_eq!(search_racing(&block).nonce, 0);
        assert_eq!(search_sequential(&block).nonce, 0);
    }

    #[test]
    fn losing_worker_stops_once_other_found() {
        let block = candidate(1);
        let flag_set = AtomicBool::new(true);
        let own = AtomicBool::new(false);
        // with the other flag already raised the worker returns after one attempt
        let sol = race(&block, 1, &own, &flag_set);
        assert_eq!(sol.nonce, 1);
    }
}
