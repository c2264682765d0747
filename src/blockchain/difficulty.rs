use std::time::Duration;

use super::Block;

/// Difficulty when the previous block was mined much faster than average.
pub const RAISED_DIFFICULTY: u32 = 5;
/// Difficulty when the previous block took about as long as average.
pub const BASELINE_DIFFICULTY: u32 = 4;
/// Difficulty when the previous block was mined much slower than average.
pub const LOWERED_DIFFICULTY: u32 = 3;

/// Below this fraction of the average block time the chain is "too fast".
pub const FAST_RATIO: f64 = 0.125;
/// Above this multiple of the average block time the chain is "too slow".
pub const SLOW_RATIO: f64 = 1.25;

/// Difficulty for the block following `previous`, given the total mining time
/// of every block up to and including `previous`.
pub fn next_difficulty(previous: &Block, total_mining_time: Duration) -> u32 {
    adjust(previous.block_time, previous.index + 1, total_mining_time)
}

/// Compare the last block time against the average over `block_count` blocks.
pub fn adjust(last_block_time: Duration, block_count: u64, total_mining_time: Duration) -> u32 {
    let average = total_mining_time.as_secs_f64() / block_count.max(1) as f64;
    let last = last_block_time.as_secs_f64();

    if last < average * FAST_RATIO {
        RAISED_DIFFICULTY
    } else if last > average * SLOW_RATIO {
        LOWERED_DIFFICULTY
    } else {
        BASELINE_DIFFICULTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fast_block_raises_difficulty() {
        // average 100ms, last 10ms < 12.5ms
        assert_eq!(adjust(ms(10), 4, ms(400)), RAISED_DIFFICULTY);
    }

    #[test]
    fn slow_block_lowers_difficulty() {
        // average 100ms, last 130ms > 125ms
        assert_eq!(adjust(ms(130), 4, ms(400)), LOWERED_DIFFICULTY);
    }

    #[test]
    fn typical_block_keeps_baseline() {
        assert_eq!(adjust(ms(100), 4, ms(400)), BASELINE_DIFFICULTY);
        // boundaries are exclusive
        assert_eq!(adjust(ms(125), 4, ms(400)), BASELINE_DIFFICULTY);
        assert_eq!(adjust(ms(50), 4, ms(400)), BASELINE_DIFFICULTY);
    }

    #[test]
    fn zero_history_is_baseline() {
        assert_eq!(adjust(Duration::ZERO, 1, Duration::ZERO), BASELINE_DIFFICULTY);
    }
}
