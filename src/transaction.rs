//! Transaction module split into types and validation for better modularity

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::SignatureMode;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_address, secret_material, KeyPair};
    use crate::error::LedgerError;

    struct Signer {
        keypair: KeyPair,
        address: String,
    }

    fn signer(name: &str) -> Signer {
        let keypair = KeyPair::generate();
        let address = derive_address(&keypair.public_key_hex(), name);
        Signer { keypair, address }
    }

    fn signed_issue(from: &Signer, to: &str, amount: u64) -> Transaction {
        let secret = secret_material(&from.keypair);
        let tx = Transaction::issue(&from.address, to, amount, "Gold Coins");
        sign_transaction(tx, secret.expose(), &from.keypair.public_key_hex()).unwrap()
    }

    #[test]
    fn test_id_is_fixed_at_construction() {
        let tx = Transaction::transfer("a", "b", 5);
        assert_eq!(tx.id().len(), 64);
        assert_eq!(tx.id(), tx.calculate_hash());

        let authorized = tx.clone().with_authorization(Authorization::BasicMode);
        assert_eq!(authorized.id(), tx.id());
    }

    #[test]
    fn test_explicit_timestamp_is_kept() {
        let ts = "2026-03-01T12:00:00.000Z".to_string();
        let a = Transaction::new(None, None, 0, TxBody::Transfer, Some(ts.clone()), None);
        let b = Transaction::new(None, None, 0, TxBody::Transfer, Some(ts.clone()), None);
        assert_eq!(a.timestamp(), ts);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_id_covers_asset_label() {
        let ts = Some("2026-03-01T12:00:00.000Z".to_string());
        let gold = Transaction::new(
            Some("a".into()),
            Some("b".into()),
            1,
            TxBody::Issue { asset: "gold".into() },
            ts.clone(),
            None,
        );
        let silver = Transaction::new(
            Some("a".into()),
            Some("b".into()),
            1,
            TxBody::Issue { asset: "silver".into() },
            ts,
            None,
        );
        assert_ne!(gold.id(), silver.id());
        assert_eq!(gold.signing_payload(), silver.signing_payload());
    }

    #[test]
    fn test_signed_issue_is_valid() {
        let issuer = signer("bank");
        let tx = signed_issue(&issuer, "recipient", 100);
        assert!(tx.is_valid());
    }

    #[test]
    fn test_unsigned_transaction_fails() {
        let tx = Transaction::transfer("a", "b", 10);
        assert!(!tx.is_valid());
        assert!(!tx.is_valid_in(SignatureMode::AllowBasicMode));
    }

    #[test]
    fn test_tampered_amount_fails() {
        let issuer = signer("bank");
        let mut tx = signed_issue(&issuer, "recipient", 100);
        tx.amount = 1_000_000;
        assert!(!tx.is_valid());
    }

    #[test]
    fn test_tampered_asset_label_still_verifies() {
        let issuer = signer("bank");
        let mut tx = signed_issue(&issuer, "recipient", 100);
        tx.body = TxBody::Issue { asset: "Other".into() };
        assert!(tx.is_valid());
    }

    #[test]
    fn test_signature_from_other_key_fails() {
        let issuer = signer("bank");
        let impostor = signer("impostor");
        let tx = signed_issue(&impostor, "recipient", 100);
        let Some(Authorization::Signed { signature, .. }) = tx.authorization().cloned() else {
            panic!("expected signed authorization");
        };
        let forged = tx.with_authorization(Authorization::Signed {
            signature,
            public_key: issuer.keypair.public_key_hex(),
        });
        assert!(!forged.is_valid());
    }

    #[test]
    fn test_basic_mode_requires_explicit_mode() {
        let tx = Transaction::transfer("a", "b", 10).with_authorization(Authorization::BasicMode);
        assert!(!tx.is_valid());
        assert!(tx.is_valid_in(SignatureMode::AllowBasicMode));
    }

    #[test]
    fn test_wire_marker_maps_to_basic_mode() {
        let auth = Authorization::from_parts(Some(BASIC_MODE_SIGNATURE.to_string()), None);
        assert_eq!(auth, Some(Authorization::BasicMode));
        assert_eq!(Authorization::from_parts(Some("ab".into()), None), None);
        assert_eq!(Authorization::from_parts(None, Some("pk".into())), None);
    }

    #[test]
    fn test_attestation_validity() {
        assert!(Transaction::attestation("abc123", "report.pdf").is_valid());
        assert!(!Transaction::attestation("", "report.pdf").is_valid());
        assert!(!Transaction::attestation("abc123", "").is_valid());
    }

    #[test]
    fn test_genesis_always_valid() {
        let tx = Transaction::genesis();
        assert!(tx.is_valid());
        assert!(tx.authorization().is_none());
        assert_eq!(tx.body().asset_label(), Some(GENESIS_LABEL));
    }

    #[test]
    fn test_sign_with_malformed_key_fails() {
        let tx = Transaction::issue("a", "b", 1, "gold");
        let err = sign_transaction(tx, "garbage", "pk").unwrap_err();
        assert_eq!(err, LedgerError::InvalidSignature);
    }

    #[test]
    fn test_serialized_shape() {
        let tx = Transaction::attestation("d1", "notes.txt");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "attestation");
        assert_eq!(json["digest"], "d1");
        assert_eq!(json["fromAddress"], ATTESTATION_SYSTEM_ADDRESS);
        assert!(json.get("authorization").is_none());
    }
}
