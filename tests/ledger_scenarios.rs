//! End-to-end ledger scenarios: issuance, transfers, mining, attestations and search

use assetledger::blockchain::{Direction, Ledger, SearchHit, Submission};
use assetledger::crypto::{derive_address, sha256_hex};
use assetledger::error::LedgerError;
use assetledger::registry::Registration;
use assetledger::transaction::{sign_transaction, Transaction, TxKind};

struct Parties {
    issuer: Registration,
    alice: Registration,
    bob: Registration,
}

/// Issuer, two participants and a payment provider named "miner".
fn setup(ledger: &mut Ledger) -> Result<Parties, Box<dyn std::error::Error>> {
    let issuer = ledger.register("BankIssuer", "issuer")?;
    let alice = ledger.register("Alice", "participant")?;
    let bob = ledger.register("Bob", "participant")?;
    ledger.register("miner", "payment_provider")?;
    Ok(Parties { issuer, alice, bob })
}

fn issue(from: &Registration, to: &Registration, amount: u64) -> Result<Transaction, LedgerError> {
    sign_transaction(
        Transaction::issue(&from.address, &to.address, amount, "Gold Coins"),
        from.private_key.expose(),
        &from.public_key,
    )
}

fn transfer(from: &Registration, to: &Registration, amount: u64) -> Result<Transaction, LedgerError> {
    sign_transaction(
        Transaction::transfer(&from.address, &to.address, amount),
        from.private_key.expose(),
        &from.public_key,
    )
}

#[test]
fn test_issue_then_transfer() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(2);
    let p = setup(&mut ledger)?;

    ledger.submit_transaction(issue(&p.issuer, &p.alice, 100)?)?;
    assert!(ledger.mine_pending("miner")?.is_some());
    assert_eq!(ledger.balance_of(&p.alice.address), 100);
    assert_eq!(ledger.balance_of(&p.bob.address), 0);

    ledger.submit_transaction(transfer(&p.alice, &p.bob, 40)?)?;
    ledger.mine_pending("miner")?;
    assert_eq!(ledger.balance_of(&p.alice.address), 60);
    assert_eq!(ledger.balance_of(&p.bob.address), 40);

    let balances = ledger.balances_view();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances["Alice"], 60);
    assert_eq!(balances["Bob"], 40);
    assert!(!balances.contains_key("BankIssuer"));

    assert_eq!(ledger.chain().len(), 3);
    assert!(ledger.is_chain_valid());
    for block in &ledger.chain()[1..] {
        assert!(block.hash().starts_with("00"));
        assert_eq!(block.hash(), block.calculate_hash());
    }
    Ok(())
}

#[test]
fn test_overdraft_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;
    ledger.submit_transaction(issue(&p.issuer, &p.alice, 30)?)?;
    ledger.mine_pending("miner")?;

    let err = ledger
        .submit_transaction(transfer(&p.alice, &p.bob, 31)?)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientBalance { available: 30, required: 31, .. }
    ));
    assert!(ledger.pending().is_empty());
    Ok(())
}

#[test]
fn test_pending_balance_not_counted() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;
    ledger.submit_transaction(issue(&p.issuer, &p.alice, 50)?)?;

    // Issue not yet mined: Alice still holds nothing.
    let err = ledger.submit_transaction(transfer(&p.alice, &p.bob, 10)?).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    assert_eq!(ledger.pending().len(), 1);
    Ok(())
}

#[test]
fn test_participant_cannot_issue() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;
    let err = ledger.submit_transaction(issue(&p.alice, &p.bob, 10)?).unwrap_err();
    assert!(matches!(err, LedgerError::PermissionDenied(_)));
    assert!(ledger.pending().is_empty());
    Ok(())
}

#[test]
fn test_unsigned_transfer_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;
    let err = ledger
        .submit_transaction(Transaction::transfer(&p.alice.address, &p.bob.address, 1))
        .unwrap_err();
    assert_eq!(err, LedgerError::InvalidSignature);
    Ok(())
}

#[test]
fn test_transfer_to_unknown_address() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;
    let tx = sign_transaction(
        Transaction::transfer(&p.alice.address, "unknown", 1),
        p.alice.private_key.expose(),
        &p.alice.public_key,
    )?;
    assert_eq!(
        ledger.submit_transaction(tx).unwrap_err(),
        LedgerError::MissingIdentity("unknown".to_string())
    );
    Ok(())
}

#[test]
fn test_duplicate_attestation() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let digest = sha256_hex(b"quarterly report");

    let first = ledger.submit_transaction(Transaction::attestation(&digest, "report-v1.pdf"))?;
    let Submission::Attested(receipt) = first else {
        panic!("attestation must be recorded immediately");
    };

    let err = ledger
        .submit_transaction(Transaction::attestation(&digest, "report-v2.pdf"))
        .unwrap_err();
    assert_eq!(err, LedgerError::DuplicateAttestation(digest.clone()));

    match ledger.search_by_hash(&receipt.transaction_id) {
        Some(SearchHit::Transaction(hit)) => {
            assert_eq!(hit.transaction.attested(), Some((digest.as_str(), "report-v1.pdf")));
            assert_eq!(hit.block_hash, receipt.block_hash);
        }
        other => panic!("expected transaction hit, got {:?}", other),
    }
    match ledger.search_by_hash(&receipt.block_hash) {
        Some(SearchHit::Block(block)) => assert_eq!(block.transactions().len(), 1),
        other => panic!("expected block hit, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_attest_content_and_verify() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    ledger.attest_content(b"first file", "a.txt")?;
    ledger.attest_content(b"second file", "b.txt")?;

    let record = ledger.verify_content(b"first file").expect("attested");
    assert_eq!(record.label, "a.txt");
    assert_eq!(record.digest, sha256_hex(b"first file"));
    assert!(ledger.verify_content(b"never seen").is_none());

    let all = ledger.attestations();
    assert_eq!(all.len(), 2);
    assert!(all[0].timestamp >= all[1].timestamp);

    assert!(matches!(
        ledger.attest_content(b"first file", "copy.txt"),
        Err(LedgerError::DuplicateAttestation(_))
    ));
    assert!(ledger.is_chain_valid());
    Ok(())
}

#[test]
fn test_search_block_preserves_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;

    let txs = vec![
        issue(&p.issuer, &p.alice, 10)?,
        issue(&p.issuer, &p.bob, 20)?,
        issue(&p.issuer, &p.alice, 30)?,
    ];
    let ids: Vec<String> = txs.iter().map(|tx| tx.id().to_string()).collect();
    for tx in txs {
        ledger.submit_transaction(tx)?;
    }
    let block = ledger.mine_pending("miner")?.expect("block");

    match ledger.search_by_hash(block.hash()) {
        Some(SearchHit::Block(found)) => {
            let found_ids: Vec<&str> = found.transactions().iter().map(|tx| tx.id()).collect();
            assert_eq!(found_ids, ids);
        }
        other => panic!("expected block hit, got {:?}", other),
    }
    assert!(ledger.search_by_hash("no-such-hash").is_none());
    Ok(())
}

#[test]
fn test_transaction_hit_names_parties() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;
    let tx = issue(&p.issuer, &p.alice, 5)?;
    let id = tx.id().to_string();
    ledger.submit_transaction(tx)?;
    let block = ledger.mine_pending("miner")?.expect("block");

    let Some(SearchHit::Transaction(hit)) = ledger.search_by_hash(&id) else {
        panic!("expected transaction hit");
    };
    assert_eq!(hit.from_username.as_deref(), Some("BankIssuer"));
    assert_eq!(hit.to_username.as_deref(), Some("Alice"));
    assert_eq!(hit.block_hash, block.hash());
    assert_eq!(hit.block_timestamp, block.timestamp_rfc3339());
    Ok(())
}

#[test]
fn test_search_by_address() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;

    ledger.submit_transaction(issue(&p.issuer, &p.alice, 100)?)?;
    ledger.mine_pending("miner")?;
    ledger.submit_transaction(transfer(&p.alice, &p.bob, 25)?)?;
    ledger.mine_pending("miner")?;

    let activity = ledger.search_by_address(&p.alice.address);
    assert_eq!(activity.username.as_deref(), Some("Alice"));
    assert_eq!(activity.transactions.len(), 2);
    assert_eq!(activity.transactions[0].block_index, 2);
    assert_eq!(activity.transactions[0].direction, Direction::Sent);
    assert_eq!(activity.transactions[1].block_index, 1);
    assert_eq!(activity.transactions[1].direction, Direction::Received);
    assert_eq!(activity.summary.total_transactions, 2);
    assert_eq!(activity.summary.total_received, 100);
    assert_eq!(activity.summary.total_sent, 25);
    assert_eq!(activity.summary.current_balance, 75);

    let unknown = ledger.search_by_address("ffff");
    assert!(unknown.username.is_none());
    assert!(unknown.transactions.is_empty());
    assert_eq!(unknown.summary.total_transactions, 0);
    Ok(())
}

#[test]
fn test_address_derivation_matches_registration() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_difficulty(1);
    let p = setup(&mut ledger)?;
    for reg in [&p.issuer, &p.alice, &p.bob] {
        assert_eq!(reg.address.len(), 40);
        assert_eq!(reg.address, derive_address(&reg.public_key, &reg.username));
        let identity = ledger.lookup_by_address(&reg.address).expect("indexed");
        assert_eq!(identity.username(), reg.username);
        assert!(ledger.validate_secret(&reg.username, reg.private_key.expose()));
    }
    let users = ledger.users_view();
    assert_eq!(users.len(), 4);
    assert!(users.windows(2).all(|w| w[0].username <= w[1].username));
    Ok(())
}

#[test]
fn test_genesis_excluded_from_chain_validation() {
    let ledger = Ledger::with_difficulty(3);
    assert_eq!(ledger.chain()[0].transactions()[0].kind(), TxKind::Genesis);
    assert!(ledger.is_chain_valid());
    assert_eq!(ledger.latest_block().map(|b| b.previous_hash()), Some("0"));
}
