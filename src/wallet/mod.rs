use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

use crate::error::{EngineError, Result};

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex_compressed, address_hex).
/// Address is simply the hex of the compressed public key (didactic).
pub fn generate_keypair_hex() -> (String, String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    let sk_hex = hex::encode(sk.secret_bytes());
    let pk_hex = hex::encode(pk.serialize()); // compressed (33 bytes)
    let address = pk_hex.clone();
    (sk_hex, pk_hex, address)
}

fn parse_secret_key(private_key_hex: &str) -> Result<SecretKey> {
    let bytes = hex::decode(private_key_hex.trim())
        .map_err(|_| EngineError::Wallet("invalid private key hex"))?;
    SecretKey::from_slice(&bytes).map_err(|_| EngineError::Wallet("invalid private key bytes"))
}

fn parse_public_key(pubkey_hex: &str) -> Result<PublicKey> {
    let bytes =
        hex::decode(pubkey_hex.trim()).map_err(|_| EngineError::Wallet("invalid pubkey hex"))?;
    PublicKey::from_slice(&bytes).map_err(|_| EngineError::Wallet("invalid pubkey bytes"))
}

fn digest_message(digest_hex: &str) -> Result<Message> {
    let bytes =
        hex::decode(digest_hex).map_err(|_| EngineError::Wallet("invalid digest hex"))?;
    Message::from_digest_slice(&bytes).map_err(|_| EngineError::Wallet("invalid digest length"))
}

/// Key-pair consistency check: does `private_key_hex` derive `public_address`?
/// Malformed input of either kind is simply "not valid".
pub fn verify_keys(private_key_hex: &str, public_address: &str) -> bool {
    let (Ok(sk), Ok(pk)) = (
        parse_secret_key(private_key_hex),
        parse_public_key(public_address),
    ) else {
        return false;
    };
    PublicKey::from_secret_key(&Secp256k1::signing_only(), &sk) == pk
}

/// Sign a hex-encoded 32-byte digest, returning a hex DER ECDSA signature.
/// Refuses to sign when the private key does not belong to `public_address`.
pub fn sign(public_address: &str, private_key_hex: &str, digest_hex: &str) -> Result<String> {
    let secp = Secp256k1::signing_only();
    let sk = parse_secret_key(private_key_hex)?;
    let pk = parse_public_key(public_address)?;
    if PublicKey::from_secret_key(&secp, &sk) != pk {
        return Err(EngineError::Wallet("private key does not match public key"));
    }
    let msg = digest_message(digest_hex)?;
    Ok(hex::encode(secp.sign_ecdsa(&msg, &sk).serialize_der()))
}

/// Verify a signature (hex DER) against the given pubkey (hex, compressed) and digest (hex, 32 bytes).
pub fn verify_signature_hex(pubkey_hex: &str, sig_hex: &str, digest_hex: &str) -> Result<bool> {
    let secp = Secp256k1::verification_only();

    let sig_bytes =
        hex::decode(sig_hex).map_err(|_| EngineError::Wallet("invalid signature hex"))?;
    let sig =
        Signature::from_der(&sig_bytes).map_err(|_| EngineError::Wallet("invalid DER signature"))?;
    let pk = parse_public_key(pubkey_hex)?;
    let msg = digest_message(digest_hex)?;

    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::hash_hex;

    #[test]
    fn generated_keys_are_consistent() {
        let (sk, pk, addr) = generate_keypair_hex();
        assert_eq!(pk, addr);
        assert_eq!(pk.len(), 66);
        assert!(verify_keys(&sk, &pk));
    }

    #[test]
    fn mismatched_or_malformed_keys_are_rejected() {
        let (sk, _, _) = generate_keypair_hex();
        let (_, other_pk, _) = generate_keypair_hex();
        assert!(!verify_keys(&sk, &other_pk));
        assert!(!verify_keys("zz", &other_pk));
        assert!(!verify_keys(&sk, "not-a-key"));
    }

    #[test]
    fn sign_then_verify() {
        let (sk, pk, _) = generate_keypair_hex();
        let digest = hash_hex(b"payload");
        let sig = sign(&pk, &sk, &digest).unwrap();
        assert!(verify_signature_hex(&pk, &sig, &digest).unwrap());

        let other = hash_hex(b"other payload");
        assert!(!verify_signature_hex(&pk, &sig, &other).unwrap());
    }

    #[test]
    fn sign_refuses_foreign_key() {
        let (sk, _, _) = generate_keypair_hex();
        let (_, other_pk, _) = generate_keypair_hex();
        let err = sign(&other_pk, &sk, &hash_hex(b"x")).unwrap_err();
        assert_eq!(
            err,
            EngineError::Wallet("private key does not match public key")
        );
    }
}
