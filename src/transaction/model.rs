use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::digest::hash_hex;
use crate::error::{EngineError, Result};
use crate::wallet;

/// A signed value transfer. Immutable once built; `hash` is computed at construction
/// over (timestamp, sender, recipient, amount, fee).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    /// Sender public key (hex). Empty for reward transactions.
    pub sender_address: String,
    pub recipient_address: String,
    pub amount: f64,
    pub fee: f64,
    pub hash: String,
    /// Hex DER ECDSA signature over `hash`. Empty for reward transactions.
    pub signature: String,
}

impl Transaction {
    /// Build an unsigned transaction stamped with the current time.
    pub fn new(sender: &str, recipient: &str, amount: f64, fee: f64) -> Self {
        Self::new_with_timestamp(sender, recipient, amount, fee, Utc::now())
    }

    pub fn new_with_timestamp(
        sender: &str,
        recipient: &str,
        amount: f64,
        fee: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut tx = Self {
            timestamp,
            sender_address: sender.to_string(),
            recipient_address: recipient.to_string(),
            amount,
            fee,
            hash: String::new(),
            signature: String::new(),
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Build a transaction and sign its digest with the sender's private key.
    pub fn new_signed(
        sender: &str,
        sender_private_key: &str,
        recipient: &str,
        amount: f64,
        fee: f64,
    ) -> Result<Self> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(EngineError::InvalidInput(format!("amount must be >= 0, got {amount}")));
        }
        if !(fee.is_finite() && fee >= 0.0) {
            return Err(EngineError::InvalidInput(format!("fee must be >= 0, got {fee}")));
        }
        let mut tx = Self::new(sender, recipient, amount, fee);
        tx.signature = wallet::sign(sender, sender_private_key, &tx.hash)?;
        Ok(tx)
    }

    /// Block reward: no sender, no signature, no fee.
    pub fn reward(miner_address: &str, amount: f64) -> Self {
        Self::new("", miner_address, amount, 0.0)
    }

    pub fn is_reward(&self) -> bool {
        self.sender_address.is_empty()
    }

    pub fn compute_hash(&self) -> String {
        let preimage = format!(
            "{}{}{}{}{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.sender_address,
            self.recipient_address,
            self.amount,
            self.fee
        );
        hash_hex(preimage.as_bytes())
    }

    /// Check the stored signature against the sender key. Rewards carry none.
    pub fn has_valid_signature(&self) -> bool {
        if self.is_reward() {
            return self.signature.is_empty();
        }
        wallet::verify_signature_hex(&self.sender_address, &self.signature, &self.hash)
            .unwrap_or(false)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   [TRANSACTION START]")?;
        writeln!(
            f,
            "  Timestamp: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
        )?;
        writeln!(f, "  -- Verification --")?;
        writeln!(f, "  Hash: {}", self.hash)?;
        writeln!(f, "  Signature: {}", self.signature)?;
        writeln!(f, "  -- Quantities --")?;
        writeln!(f, "  Transferred: {} Rubyte", self.amount)?;
        writeln!(f, "  Fee: {}", self.fee)?;
        writeln!(f, "  -- Participants --")?;
        writeln!(f, "  Sender: {}", self.sender_address)?;
        writeln!(f, "  Receiver: {}", self.recipient_address)?;
        write!(f, "  [TRANSACTION END]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::generate_keypair_hex;

    #[test]
    fn hash_covers_every_field() {
        let tx = Transaction::new("alice", "bob", 10.0, 1.0);
        assert_eq!(tx.hash, tx.compute_hash());

        let mut tampered = tx.clone();
        tampered.amount = 11.0;
        assert_ne!(tampered.compute_hash(), tx.hash);

        let mut tampered = tx.clone();
        tampered.fee = 0.5;
        assert_ne!(tampered.compute_hash(), tx.hash);
    }

    #[test]
    fn signed_transaction_verifies() {
        let (sk, pk, _) = generate_keypair_hex();
        let tx = Transaction::new_signed(&pk, &sk, "bob", 3.0, 0.1).unwrap();
        assert!(!tx.signature.is_empty());
        assert!(tx.has_valid_signature());
    }

    #[test]
    fn negative_amount_is_rejected_before_signing() {
        let (sk, pk, _) = generate_keypair_hex();
        let err = Transaction::new_signed(&pk, &sk, "bob", -1.0, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        let err = Transaction::new_signed(&pk, &sk, "bob", 1.0, f64::NAN).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn reward_has_no_sender_or_signature() {
        let tx = Transaction::reward("miner", 2.5);
        assert!(tx.is_reward());
        assert_eq!(tx.fee, 0.0);
        assert!(tx.signature.is_empty());
        assert!(tx.has_valid_signature());
    }
}
