//! End-to-end tests for the stealth-deposit core
//!
//! Tests cover:
//! - The full sender → ledger → scanner → claim flow
//! - Scanner isolation across many recipients
//! - Idempotent re-scans over an unchanged ledger
//! - The weaker keystream cipher under wrong keys

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use crate::aad::{Aad, AadBuilder};
    use crate::address::Address;
    use crate::cipher::CipherKind;
    use crate::claim::{submit_claim, validate_claim};
    use crate::commitment::{keccak256, Secret};
    use crate::deposit::{prepare_deposit, resolve_recipient_key, submit_deposit, KeyLookup};
    use crate::engine::EncryptionEngine;
    use crate::envelope::{bundle, unbundle};
    use crate::error::{ClaimValidationError, DepositError};
    use crate::keys::KeyPair;
    use crate::ledger::{AccessGrant, InMemoryLedger, RecordRange, RecordSource, Submitter};
    use crate::payload::ClaimPayload;
    use crate::record::DepositRecord;
    use crate::scanner::{ScanCancel, Scanner};

    fn contract() -> Address {
        "0xabc0000000000000000000000000000000000abc".parse().unwrap()
    }

    /// Concrete scenario: chain 270, context Hash("v1"), deposit id 0x01..
    #[test]
    fn test_concrete_scenario() {
        let keys = KeyPair::generate().unwrap();
        let recipient = Address::new([0x42; 20]);
        let secret = Secret::random();
        let commitment = secret.commitment();

        let deposit_id = [0x01; 32];
        let aad = Aad::pack(270, &contract(), &keccak256(b"v1"), &deposit_id);
        let plaintext = ClaimPayload::new(recipient, secret.clone()).encode();

        let engine = EncryptionEngine::default();
        let sealed = engine.seal(keys.public_key(), &plaintext, aad.as_bytes()).unwrap();
        let bytes = bundle(&deposit_id, &sealed.ephemeral_pubkey, &sealed.nonce, &sealed.sealed);

        let parsed = unbundle(&bytes).unwrap();
        assert_eq!(parsed.deposit_id, deposit_id);

        let recovered = engine
            .open(
                keys.private_key(),
                &parsed.ephemeral_pubkey,
                &parsed.nonce,
                &parsed.sealed,
                aad.as_bytes(),
            )
            .unwrap();

        assert_eq!(&recovered[..20], recipient.as_bytes());
        let mut revealed = [0u8; 32];
        revealed.copy_from_slice(&recovered[20..]);
        assert_eq!(keccak256(&revealed), commitment);
    }

    #[tokio::test]
    async fn test_full_deposit_scan_claim_flow() {
        let config = crate::config::ProtocolConfig {
            contract: contract(),
            ..Default::default()
        };
        let engine = config.engine();
        let aad = config.aad_builder();

        let ledger = Arc::new(InMemoryLedger::new());
        let sender_addr = Address::new([0x5e; 20]);
        let recipient_addr = Address::new([0x7e; 20]);
        let sender = ledger.handle(sender_addr);
        let recipient = ledger.handle(recipient_addr);
        let sender_grant = AccessGrant::new(sender_addr);
        let recipient_grant = AccessGrant::new(recipient_addr);

        // 1. Recipient publishes a key
        let keys = KeyPair::generate().unwrap();
        recipient
            .submit(
                &recipient_grant,
                &crate::calls::LedgerCall::RegisterKey {
                    public_key: keys.public_key().to_bytes(),
                }
                .encode(),
                0,
            )
            .await
            .unwrap();

        // 2. Sender resolves it and deposits
        let key = match resolve_recipient_key(&sender, &sender_grant, &recipient_addr)
            .await
            .unwrap()
        {
            KeyLookup::Found(key) => key,
            KeyLookup::Absent => panic!("recipient key should be published"),
        };
        let prepared = prepare_deposit(&engine, &aad, &key, recipient_addr).unwrap();
        submit_deposit(&sender, &sender_grant, &prepared, 5_000).await.unwrap();

        // 3. Recipient scans
        let report = Scanner::new(&engine, &keys, recipient_addr, &aad)
            .scan_ledger(&recipient, &recipient_grant, RecordRange::all(), &ScanCancel::new())
            .await
            .unwrap();
        assert_eq!(report.matches.len(), 1);
        let found = &report.matches[0];
        assert_eq!(found.secret, prepared.secret);
        assert_eq!(found.amount, 5_000);

        // 4. Recipient claims
        let records = recipient
            .list_records(&recipient_grant, RecordRange::all())
            .await
            .unwrap();
        let record = &records[found.index as usize];
        assert!(validate_claim(record, &found.secret));
        submit_claim(&recipient, &recipient_grant, record, found).await.unwrap();

        let state = ledger.snapshot().unwrap();
        assert!(state.records[0].claimed);
        assert_eq!(state.payouts.get(&recipient_addr), Some(&5_000));

        // 5. A second claim is blocked client-side
        let records = recipient
            .list_records(&recipient_grant, RecordRange::all())
            .await
            .unwrap();
        let err = submit_claim(&recipient, &recipient_grant, &records[0], found)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DepositError::ClaimValidation(ClaimValidationError::AlreadyClaimed)
        ));
    }

    fn build_mixed_ledger(
        engine: &EncryptionEngine,
        aad: &AadBuilder,
        target: &KeyPair,
        target_addr: Address,
        target_positions: &[usize],
        total: usize,
    ) -> Vec<DepositRecord> {
        (0..total)
            .map(|i| {
                let (key, addr) = if target_positions.contains(&i) {
                    (*target.public_key(), target_addr)
                } else {
                    let stranger = KeyPair::generate().unwrap();
                    (*stranger.public_key(), Address::new([i as u8 + 1; 20]))
                };
                let prepared = prepare_deposit(engine, aad, &key, addr).unwrap();
                DepositRecord {
                    index: i as u64,
                    deposit_id: prepared.deposit_id,
                    commitment: prepared.commitment,
                    ciphertext: prepared.envelope.to_bytes(),
                    amount: 1,
                    created_at: i as u64,
                    claimed: false,
                }
            })
            .collect()
    }

    #[test]
    fn test_scanner_isolation_three_of_ten() {
        for kind in [CipherKind::AesGcm, CipherKind::Keystream] {
            let engine = EncryptionEngine::new(kind);
            let aad = AadBuilder::new(270, contract(), "v1");
            let target = KeyPair::generate().unwrap();
            let target_addr = Address::new([0xee; 20]);

            let mut records = build_mixed_ledger(&engine, &aad, &target, target_addr, &[1, 4, 8], 10);

            let scanner = Scanner::new(&engine, &target, target_addr, &aad);
            let report = scanner.scan(&records);
            let indices: Vec<u64> = report.matches.iter().map(|m| m.index).collect();
            assert_eq!(indices, vec![1, 4, 8], "cipher {}", kind);
            assert_eq!(report.examined, 10);
            assert_eq!(report.discarded, 7);

            // Order of the input does not change the match set
            records.reverse();
            let mut reversed: Vec<u64> = scanner.scan(&records).matches.iter().map(|m| m.index).collect();
            assert_eq!(reversed, vec![8, 4, 1]);
            reversed.sort_unstable();
            assert_eq!(reversed, vec![1, 4, 8]);
        }
    }

    #[tokio::test]
    async fn test_rescan_is_idempotent() {
        let engine = EncryptionEngine::default();
        let aad = AadBuilder::new(270, contract(), "v1");
        let target = KeyPair::generate().unwrap();
        let target_addr = Address::new([0xee; 20]);

        let ledger = Arc::new(InMemoryLedger::without_inline_ciphertexts());
        let sender = ledger.handle(Address::new([0x01; 20]));
        let grant = AccessGrant::new(Address::new([0x01; 20]));

        for record in build_mixed_ledger(&engine, &aad, &target, target_addr, &[0, 2, 5], 6) {
            let call = crate::calls::LedgerCall::Deposit {
                deposit_id: record.deposit_id,
                commitment: record.commitment,
                bundle: record.ciphertext,
            };
            sender.submit(&grant, &call.encode(), 1).await.unwrap();
        }

        let scanner = Scanner::new(&engine, &target, target_addr, &aad).with_concurrency(3);
        let first = scanner
            .scan_ledger(ledger.as_ref(), &grant, RecordRange::all(), &ScanCancel::new())
            .await
            .unwrap();
        let second = scanner
            .scan_ledger(ledger.as_ref(), &grant, RecordRange::all(), &ScanCancel::new())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.matches.iter().map(|m| m.index).collect::<Vec<_>>(),
            vec![0, 2, 5]
        );
    }

    #[tokio::test]
    async fn test_resume_from_checkpoint() {
        let engine = EncryptionEngine::default();
        let aad = AadBuilder::new(270, contract(), "v1");
        let target = KeyPair::generate().unwrap();
        let target_addr = Address::new([0xee; 20]);

        let ledger = Arc::new(InMemoryLedger::new());
        let sender = ledger.handle(Address::new([0x01; 20]));
        let grant = AccessGrant::new(Address::new([0x01; 20]));
        for record in build_mixed_ledger(&engine, &aad, &target, target_addr, &[0, 3], 5) {
            let call = crate::calls::LedgerCall::Deposit {
                deposit_id: record.deposit_id,
                commitment: record.commitment,
                bundle: record.ciphertext,
            };
            sender.submit(&grant, &call.encode(), 1).await.unwrap();
        }

        let scanner = Scanner::new(&engine, &target, target_addr, &aad);

        let first_page = scanner
            .scan_ledger(
                ledger.as_ref(),
                &grant,
                RecordRange { start: 0, limit: Some(2) },
                &ScanCancel::new(),
            )
            .await
            .unwrap();
        assert_eq!(first_page.matches.len(), 1);

        let rest = scanner
            .scan_ledger(ledger.as_ref(), &grant, RecordRange::from(2), &ScanCancel::new())
            .await
            .unwrap();
        assert_eq!(rest.matches.iter().map(|m| m.index).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_keystream_wrong_key_never_matches() {
        let engine = EncryptionEngine::new(CipherKind::Keystream);
        let aad = AadBuilder::new(270, contract(), "v1");
        let recipient = KeyPair::generate().unwrap();
        let recipient_addr = Address::new([0x33; 20]);

        let prepared = prepare_deposit(&engine, &aad, recipient.public_key(), recipient_addr).unwrap();
        let record = DepositRecord {
            index: 0,
            deposit_id: prepared.deposit_id,
            commitment: prepared.commitment,
            ciphertext: prepared.envelope.to_bytes(),
            amount: 1,
            created_at: 0,
            claimed: false,
        };

        for _ in 0..32 {
            let intruder = KeyPair::generate().unwrap();

            // The cipher itself "succeeds" with garbage...
            let garbage = engine
                .open_envelope(&intruder, &prepared.envelope, &aad.for_deposit(&prepared.deposit_id))
                .unwrap();
            assert_eq!(garbage.len(), 52);
            assert_ne!(&garbage[..20], recipient_addr.as_bytes());

            // ...which the scanner refuses for both the true and a guessed address
            for claimed_addr in [recipient_addr, Address::new([0x44; 20])] {
                let scanner = Scanner::new(&engine, &intruder, claimed_addr, &aad);
                assert!(scanner.scan(&[record.clone()]).matches.is_empty());
            }
        }
    }

    #[test]
    fn test_envelope_replayed_under_other_deposit_fails() {
        let engine = EncryptionEngine::default();
        let aad = AadBuilder::new(270, contract(), "v1");
        let keys = KeyPair::generate().unwrap();
        let me = Address::new([0x11; 20]);

        let original = prepare_deposit(&engine, &aad, keys.public_key(), me).unwrap();

        // Same envelope re-labelled with a new deposit id
        let mut replayed = original.envelope.clone();
        replayed.deposit_id = [0x77; 32];
        let record = DepositRecord {
            index: 0,
            deposit_id: [0x77; 32],
            commitment: original.commitment,
            ciphertext: replayed.to_bytes(),
            amount: 1,
            created_at: 0,
            claimed: false,
        };

        let report = Scanner::new(&engine, &keys, me, &aad).scan(&[record]);
        assert!(report.matches.is_empty());
        assert_eq!(report.discarded, 1);

        // And under another chain
        let other_chain = AadBuilder::new(1, contract(), "v1");
        assert!(engine
            .open_envelope(&keys, &original.envelope, &other_chain.for_deposit(&original.deposit_id))
            .is_err());
    }
}
