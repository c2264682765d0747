use log::warn;
use std::env;
use std::str::FromStr;

use crate::blockchain::{DEFAULT_DIFFICULTY, DIFF_MAX, MAX_TXS_PER_BLOCK, MiningSettings};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mining: MiningSettings,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);

        let mining = MiningSettings {
            threaded: parse_or(&lookup, "MINING_THREADED", true),
            dynamic_difficulty: parse_or(&lookup, "DYNAMIC_DIFFICULTY", true),
            fixed_difficulty: fixed_difficulty(&lookup),
            max_txs_per_block: parse_or(&lookup, "MAX_TXS_PER_BLOCK", MAX_TXS_PER_BLOCK),
        };

        Self { host, port, mining }
    }
}

/// `FIXED_DIFFICULTY`, capped at `DIFF_MAX` like the settings route.
fn fixed_difficulty<F>(lookup: &F) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    let difficulty = parse_or(lookup, "FIXED_DIFFICULTY", DEFAULT_DIFFICULTY);
    if difficulty > DIFF_MAX {
        warn!(
            "CONFIG - FIXED_DIFFICULTY={difficulty} exceeds {DIFF_MAX}, using {DEFAULT_DIFFICULTY}"
        );
        return DEFAULT_DIFFICULTY;
    }
    difficulty
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("CONFIG - {key}={raw:?} is not valid, using {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup_in(&[]));
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.mining, MiningSettings::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = Config::from_lookup(lookup_in(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("MINING_THREADED", "false"),
            ("DYNAMIC_DIFFICULTY", "false"),
            ("FIXED_DIFFICULTY", "2"),
            ("MAX_TXS_PER_BLOCK", "10"),
        ]));
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9000);
        assert!(!cfg.mining.threaded);
        assert!(!cfg.mining.dynamic_difficulty);
        assert_eq!(cfg.mining.fixed_difficulty, 2);
        assert_eq!(cfg.mining.max_txs_per_block, 10);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let cfg = Config::from_lookup(lookup_in(&[("PORT", "eighty"), ("FIXED_DIFFICULTY", "-1")]));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.mining.fixed_difficulty, DEFAULT_DIFFICULTY);

        for too_hard in ["7", "65"] {
            let cfg = Config::from_lookup(lookup_in(&[("FIXED_DIFFICULTY", too_hard)]));
            assert_eq!(cfg.mining.fixed_difficulty, DEFAULT_DIFFICULTY);
        }
        let cfg = Config::from_lookup(lookup_in(&[("FIXED_DIFFICULTY", "6")]));
        assert_eq!(cfg.mining.fixed_difficulty, DIFF_MAX);
    }
}
