//! Signing backend tests for idena-sdk
//!
//! Every backend is driven through the account facade against the mock node.

use idena_crypto::{keccak256, public_key_to_address, recover_public_key, Signature};
use idena_rlp::RlpItem;
use idena_sdk::hardware::{MockConnector, MockDevice, TcpConnector};
use idena_sdk::{
    Address, Dna, HardwareWallet, HdWallet, Idena, LocalKey, MockTransport, RpcClient, SdkConfig,
    SdkError, Signer, TransactionParameters,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn idena(signer: impl Into<Signer>) -> (Idena, MockTransport) {
    let transport = MockTransport::new();
    let client = RpcClient::with_transport(transport.clone());
    (Idena::new(signer, client, SdkConfig::default()), transport)
}

fn transfer() -> TransactionParameters {
    TransactionParameters::new(Address::from_bytes([0x42; 20]), Dna::from_dna_str("0.001").unwrap())
}

/// Recover the signer address of the i-th raw transaction sent to the mock node
fn sent_signer(transport: &MockTransport, i: usize) -> Address {
    let calls = transport.calls("bcn_sendRawTx");
    let raw = calls[i][0].as_str().unwrap();
    let bytes = hex::decode(&raw[2..]).unwrap();
    let fields = RlpItem::decode(&bytes).unwrap().as_list().unwrap().to_vec();

    let signature = Signature::from_slice(fields[8].as_bytes().unwrap()).unwrap();
    let unsigned = idena_rlp::encode_list(&fields[..8]);
    let public_key = recover_public_key(&keccak256(&unsigned), &signature).unwrap();
    public_key_to_address(&public_key)
}

// ==================== Local Key ====================

#[tokio::test]
async fn test_local_key_transfer_signed_by_key() {
    let key = LocalKey::random();
    let address = *key.address();
    let (idena, transport) = idena(key);

    idena.transfer(transfer(), 0).await.unwrap();
    assert_eq!(sent_signer(&transport, 0), address);
}

#[tokio::test]
async fn test_local_key_rejects_other_accounts() {
    let (idena, transport) = idena(LocalKey::random());
    assert!(matches!(
        idena.transfer(transfer(), 1).await,
        Err(SdkError::InvalidArgument(_))
    ));
    assert_eq!(transport.call_count("bcn_sendRawTx"), 0);
}

// ==================== HD Wallet ====================

#[tokio::test]
async fn test_hd_wallet_signs_with_indexed_account() {
    let wallet = HdWallet::from_mnemonic(PHRASE, "").unwrap();
    let second = wallet.get_address(2).unwrap();
    let (idena, transport) = idena(wallet);

    idena.transfer(transfer(), 2).await.unwrap();
    assert_eq!(sent_signer(&transport, 0), second);

    let lookup = transport.calls("dna_getBalance");
    assert_eq!(lookup[0][0], serde_json::json!(second.to_hex()));
}

#[tokio::test]
async fn test_hd_wallet_bulk_from_account() {
    let wallet = HdWallet::from_mnemonic(PHRASE, "").unwrap();
    let account = wallet.get_address(1).unwrap();
    let (idena, transport) = idena(wallet);

    idena.bulk_transactions(vec![transfer(), transfer()], 1).await.unwrap();
    assert_eq!(sent_signer(&transport, 0), account);
    assert_eq!(sent_signer(&transport, 1), account);
}

// ==================== Hardware Wallet ====================

#[tokio::test]
async fn test_hardware_transfer_signed_by_device() {
    let device = MockDevice::with_test_seed();
    let wallet = HardwareWallet::new(MockConnector::new(device.clone()));
    let (idena, transport) = idena(wallet);

    let address = idena.get_address(0).await.unwrap();
    idena.transfer(transfer(), 0).await.unwrap();
    assert_eq!(sent_signer(&transport, 0), address);
    assert_eq!(device.open_count(), 1);
}

#[tokio::test]
async fn test_hardware_sign_without_app_is_application_not_open() {
    let device = MockDevice::with_test_seed();
    let wallet = HardwareWallet::new(MockConnector::new(device.clone()));
    let (idena, transport) = idena(wallet);

    // address lookup succeeds, then the app is closed before signing
    let params = transfer().nonce(1).epoch(1).max_fee(Dna::from_whole(1));
    idena.get_address(0).await.unwrap();
    device.set_app_open(false);

    assert!(matches!(
        idena.transfer(params, 0).await,
        Err(SdkError::ApplicationNotOpen)
    ));
    assert_eq!(transport.call_count("bcn_sendRawTx"), 0);
}

#[tokio::test]
async fn test_hardware_without_device() {
    let (idena, transport) = idena(HardwareWallet::new(MockConnector::disconnected()));
    assert!(matches!(
        idena.transfer(transfer(), 0).await,
        Err(SdkError::DeviceUnavailable(_))
    ));
    assert_eq!(transport.call_count("dna_getBalance"), 0);
}

#[tokio::test]
async fn test_hardware_garbled_signature() {
    let device = MockDevice::with_test_seed();
    device.push_response(vec![0x01, 0x02, 0x03, 0x90, 0x00]);
    let (idena, _transport) = idena(HardwareWallet::new(MockConnector::new(device)));

    let params = transfer().nonce(1).epoch(1).max_fee(Dna::from_whole(1));
    assert!(matches!(
        idena.transfer(params, 0).await,
        Err(SdkError::InvalidDeviceResponse(_))
    ));
}

#[tokio::test]
async fn test_hardware_close_then_reopen() {
    let device = MockDevice::with_test_seed();
    let (idena, _transport) = idena(HardwareWallet::new(MockConnector::new(device.clone())));

    idena.get_address(0).await.unwrap();
    idena.close().await.unwrap();
    idena.close().await.unwrap();
    assert_eq!(device.close_count(), 1);

    idena.get_address(0).await.unwrap();
    assert_eq!(device.open_count(), 2);
}

#[tokio::test]
async fn test_hardware_over_tcp_empty_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        while let Ok(len) = socket.read_u32().await {
            let mut command = vec![0u8; len as usize];
            socket.read_exact(&mut command).await.unwrap();
            // app closed: no data, status word only
            socket.write_all(&[0, 0, 0, 0, 0x6e, 0x00]).await.unwrap();
        }
    });

    let wallet = HardwareWallet::new(TcpConnector::new(addr));
    assert!(matches!(
        wallet.sign(b"forged", 0).await,
        Err(SdkError::ApplicationNotOpen)
    ));
    wallet.close().await.unwrap();
}
