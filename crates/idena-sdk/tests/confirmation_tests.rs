//! Bulk submission and confirmation tests for idena-sdk
//!
//! Polling runs on tokio's paused clock, so intervals elapse instantly and
//! elapsed time is exact.

use idena_rlp::RlpItem;
use idena_sdk::{
    Address, Dna, Idena, LocalKey, MockReply, MockTransport, PollConfig, RpcClient, SdkConfig,
    SdkError, TransactionParameters, U256,
};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("idena_sdk=debug")
        .with_test_writer()
        .try_init();
}

fn setup(poll: PollConfig) -> (Idena, MockTransport) {
    let transport = MockTransport::new();
    let client = RpcClient::with_transport(transport.clone());
    let config = SdkConfig {
        poll,
        ..SdkConfig::default()
    };
    (Idena::new(LocalKey::random(), client, config), transport)
}

fn pending(used_fee: &str) -> Value {
    json!({
        "hash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
        "type": "send",
        "from": "0x754b6e821cfb21e63b28ffdeae2e593882d332d3",
        "to": "0x754b6e821cfb21e63b28ffdeae2e593882d332d3",
        "amount": "0.001",
        "nonce": 6,
        "epoch": 42,
        "payload": "0x",
        "usedFee": used_fee,
        "timestamp": 0
    })
}

fn sent_nonce(transport: &MockTransport, i: usize) -> U256 {
    let calls = transport.calls("bcn_sendRawTx");
    let raw = calls[i][0].as_str().unwrap();
    let bytes = hex::decode(&raw[2..]).unwrap();
    let item = RlpItem::decode(&bytes).unwrap();
    item.as_list().unwrap()[0].to_uint().unwrap()
}

fn batch(n: usize) -> Vec<TransactionParameters> {
    (0..n)
        .map(|i| {
            TransactionParameters::new(Address::from_bytes([i as u8; 20]), Dna::from_whole(i as u64 + 1))
        })
        .collect()
}

// ==================== Bulk Submission Tests ====================

#[tokio::test]
async fn test_bulk_nonces_are_contiguous() {
    init_tracing();
    let (idena, transport) = setup(PollConfig::default());
    transport.set_response("dna_getBalance", json!({ "balance": "100", "stake": "0", "nonce": 20 }));

    let operations = idena.bulk_transactions(batch(5), 0).await.unwrap();
    assert_eq!(operations.len(), 5);

    let nonces: Vec<U256> = (0..5).map(|i| sent_nonce(&transport, i)).collect();
    let expected: Vec<U256> = (21u64..=25).map(U256::from).collect();
    assert_eq!(nonces, expected);
    assert_eq!(transport.call_count("dna_getBalance"), 1);
}

#[tokio::test]
async fn test_bulk_hashes_are_distinct() {
    let (idena, _transport) = setup(PollConfig::default());
    let operations = idena.bulk_transactions(batch(4), 0).await.unwrap();

    let mut hashes: Vec<String> = operations.iter().map(|op| op.hash().to_hex()).collect();
    hashes.sort();
    hashes.dedup();
    assert_eq!(hashes.len(), 4);
}

#[tokio::test]
async fn test_bulk_stops_at_first_rejection() {
    let (idena, transport) = setup(PollConfig::default());
    transport.push_reply("bcn_sendRawTx", MockReply::Result(json!(
        "0x1111111111111111111111111111111111111111111111111111111111111111"
    )));
    transport.push_reply("bcn_sendRawTx", MockReply::Error {
        code: -32000,
        message: "tx with same nonce already exists".to_string(),
    });

    let result = idena.bulk_transactions(batch(3), 0).await;
    match result {
        Err(SdkError::SubmissionRejected(message)) => {
            assert_eq!(message, "tx with same nonce already exists")
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(transport.call_count("bcn_sendRawTx"), 2);
}

#[tokio::test]
async fn test_bulk_nonce_lookup_failure() {
    let (idena, transport) = setup(PollConfig::default());
    transport.push_reply("dna_getBalance", MockReply::Unreachable);

    assert!(matches!(
        idena.bulk_transactions(batch(2), 0).await,
        Err(SdkError::NetworkUnavailable(_))
    ));
    assert_eq!(transport.call_count("bcn_sendRawTx"), 0);
}

// ==================== Confirmation Tests ====================

#[tokio::test(start_paused = true)]
async fn test_confirmation_on_first_positive_fee() {
    init_tracing();
    let (idena, transport) = setup(PollConfig::new(Duration::from_secs(5), 15));
    transport.push_reply("bcn_transaction", MockReply::Result(pending("0")));
    transport.push_reply("bcn_transaction", MockReply::Result(pending("0")));
    transport.push_reply("bcn_transaction", MockReply::Result(pending("0.0000021")));
    transport.push_reply("bcn_transaction", MockReply::Result(pending("0.0000099")));

    let operation = idena
        .transfer(TransactionParameters::new(Address::from_bytes([1; 20]), Dna::from_whole(1)), 0)
        .await
        .unwrap();

    let start = Instant::now();
    let record = operation.confirmation().await.unwrap();
    assert_eq!(record.used_fee, Some(Dna::from_dna_str("0.0000021").unwrap()));
    assert_eq!(transport.call_count("bcn_transaction"), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_times_out_exactly_at_bound() {
    let (idena, transport) = setup(PollConfig::new(Duration::from_secs(5), 15));
    transport.set_response("bcn_transaction", pending("0"));

    let operation = idena
        .transfer(TransactionParameters::new(Address::from_bytes([1; 20]), Dna::from_whole(1)), 0)
        .await
        .unwrap();

    let start = Instant::now();
    match operation.confirmation().await {
        Err(SdkError::ConfirmationTimeout { hash, attempts }) => {
            assert_eq!(hash, operation.hash());
            assert_eq!(attempts, 15);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(transport.call_count("bcn_transaction"), 15);
    assert_eq!(start.elapsed(), Duration::from_secs(75));
}

#[tokio::test(start_paused = true)]
async fn test_bulk_then_confirm_concurrently() {
    let (idena, transport) = setup(PollConfig::new(Duration::from_secs(1), 5));
    let operations = idena.bulk_transactions(batch(3), 0).await.unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for operation in operations {
        tasks.spawn(async move { operation.confirmation().await });
    }

    let start = Instant::now();
    let mut confirmed = 0;
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().unwrap().is_mined());
        confirmed += 1;
    }
    assert_eq!(confirmed, 3);
    assert_eq!(transport.call_count("bcn_transaction"), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_of_one_operation_does_not_affect_another() {
    let (idena, transport) = setup(PollConfig::new(Duration::from_secs(1), 3));
    let operations = idena.bulk_transactions(batch(2), 0).await.unwrap();

    let stuck = operations[0].clone();
    let mined = operations[1].clone();
    let stuck_hash = stuck.hash().to_hex();
    transport.set_response("bcn_transaction", pending("0"));

    let first = tokio::spawn(async move { stuck.confirmation().await });
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert!(matches!(
        first.await.unwrap(),
        Err(SdkError::ConfirmationTimeout { attempts: 3, .. })
    ));

    transport.clear_responses();
    let record = mined.confirmation().await.unwrap();
    assert!(record.is_mined());
    assert_ne!(stuck_hash, mined.hash().to_hex());
}
