//! Idena - account facade

use idena_primitives::{Address, Nonce, H256};
use std::sync::Arc;

use crate::client::RpcClient;
use crate::config::SdkConfig;
use crate::forge::TransactionForge;
use crate::operation::Operation;
use crate::signer::Signer;
use crate::types::{BalanceInfo, Identity, TransactionParameters, TransactionRecord};
use crate::SdkError;

/// Reference to a submitted transaction: an operation, a hash, or hash text
#[derive(Debug, Clone, Copy)]
pub enum OperationRef<'a> {
    /// Parsed hash
    Hash(H256),
    /// `0x`-prefixed hash text, validated on use
    Text(&'a str),
}

impl OperationRef<'_> {
    /// Resolve to a hash; malformed text is [`SdkError::InvalidArgument`]
    pub fn hash(&self) -> Result<H256, SdkError> {
        match self {
            OperationRef::Hash(hash) => Ok(*hash),
            OperationRef::Text(text) => Ok(H256::from_hex(text)?),
        }
    }
}

impl From<&Operation> for OperationRef<'_> {
    fn from(op: &Operation) -> Self {
        OperationRef::Hash(op.hash())
    }
}

impl From<H256> for OperationRef<'_> {
    fn from(hash: H256) -> Self {
        OperationRef::Hash(hash)
    }
}

impl<'a> From<&'a str> for OperationRef<'a> {
    fn from(text: &'a str) -> Self {
        OperationRef::Text(text)
    }
}

impl<'a> From<&'a String> for OperationRef<'a> {
    fn from(text: &'a String) -> Self {
        OperationRef::Text(text)
    }
}

/// Account-level entry point bound to one signer and one node
#[derive(Debug)]
pub struct Idena {
    signer: Signer,
    client: Arc<RpcClient>,
    config: SdkConfig,
}

impl Idena {
    /// Facade over `signer` and `client`
    pub fn new(signer: impl Into<Signer>, client: RpcClient, config: SdkConfig) -> Self {
        Self {
            signer: signer.into(),
            client: Arc::new(client),
            config,
        }
    }

    /// Facade talking HTTP to the configured node
    #[cfg(feature = "http")]
    pub fn connect(signer: impl Into<Signer>, config: SdkConfig) -> Self {
        let client = RpcClient::from_config(&config);
        Self::new(signer, client, config)
    }

    /// Signing backend
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// RPC client
    pub fn client(&self) -> &Arc<RpcClient> {
        &self.client
    }

    /// Configuration
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    fn forge(&self) -> TransactionForge<'_> {
        TransactionForge::new(&self.client, &self.signer, &self.config)
    }

    /// Send one transaction from account `index`
    pub async fn transfer(
        &self,
        params: TransactionParameters,
        index: u32,
    ) -> Result<Operation, SdkError> {
        self.forge().submit(&params, index).await
    }

    /// Send several transactions from account `index` with consecutive nonces
    ///
    /// The nonce is looked up once; the k-th transaction gets `nonce + k + 1`,
    /// overriding any nonce it carries. Submissions run one after another and
    /// stop at the first failure; earlier ones stay submitted.
    pub async fn bulk_transactions(
        &self,
        transactions: Vec<TransactionParameters>,
        index: u32,
    ) -> Result<Vec<Operation>, SdkError> {
        let address = self.signer.get_address(index).await?;
        let base = self
            .client
            .get_nonce(&address)
            .await
            .map_err(SdkError::into_network)?;

        let forge = self.forge();
        let mut operations = Vec::with_capacity(transactions.len());
        for (position, params) in transactions.into_iter().enumerate() {
            let nonce = next_nonce(base, position)?;
            operations.push(forge.submit(&params.nonce(nonce), index).await?);
        }
        Ok(operations)
    }

    /// Fetch the record of a submitted transaction
    pub async fn get_transaction_by_operation<'a>(
        &self,
        operation: impl Into<OperationRef<'a>>,
    ) -> Result<TransactionRecord, SdkError> {
        let hash = operation.into().hash()?;
        self.client.get_transaction_by_hash(&hash).await
    }

    /// Address of account `index`
    pub async fn get_address(&self, index: u32) -> Result<Address, SdkError> {
        self.signer.get_address(index).await
    }

    /// Balance, stake and nonce of account `index`
    pub async fn get_balance(&self, index: u32) -> Result<BalanceInfo, SdkError> {
        let address = self.get_address(index).await?;
        self.client.get_nonce_and_balance(&address).await
    }

    /// Last used nonce of account `index`
    pub async fn get_nonce(&self, index: u32) -> Result<Nonce, SdkError> {
        let address = self.get_address(index).await?;
        self.client.get_nonce(&address).await
    }

    /// Identity of account `index`
    pub async fn get_identity(&self, index: u32) -> Result<Identity, SdkError> {
        let address = self.get_address(index).await?;
        self.client.get_identity_by_address(&address).await
    }

    /// Balance, stake and nonce of any address
    pub async fn get_balance_by_address(&self, address: &Address) -> Result<BalanceInfo, SdkError> {
        self.client.get_nonce_and_balance(address).await
    }

    /// Identity of any address
    pub async fn get_identity_by_address(&self, address: &Address) -> Result<Identity, SdkError> {
        self.client.get_identity_by_address(address).await
    }

    /// Release the signer's resources
    pub async fn close(&self) -> Result<(), SdkError> {
        self.signer.close().await
    }
}

fn next_nonce(base: Nonce, position: usize) -> Result<Nonce, SdkError> {
    u32::try_from(position)
        .ok()
        .and_then(|offset| base.checked_add(offset))
        .and_then(|nonce| nonce.checked_add(1))
        .ok_or_else(|| SdkError::InvalidArgument("nonce overflows".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::LocalKey;
    use crate::transport::MockTransport;
    use idena_primitives::Dna;

    fn idena() -> (Idena, MockTransport) {
        let transport = MockTransport::new();
        let client = RpcClient::with_transport(transport.clone());
        (
            Idena::new(LocalKey::random(), client, SdkConfig::default()),
            transport,
        )
    }

    #[test]
    fn test_next_nonce() {
        assert_eq!(next_nonce(5, 0).unwrap(), 6);
        assert_eq!(next_nonce(5, 2).unwrap(), 8);
        assert!(next_nonce(u32::MAX, 0).is_err());
    }

    #[test]
    fn test_operation_ref_text() {
        let text = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
        assert_eq!(OperationRef::from(text).hash().unwrap().to_hex(), text);
        assert!(matches!(
            OperationRef::from("0x1234").hash(),
            Err(SdkError::InvalidArgument(_))
        ));
        assert!(matches!(
            OperationRef::from("not a hash").hash(),
            Err(SdkError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_uses_one_nonce_lookup() {
        let (idena, transport) = idena();
        let to = Address::from_bytes([1; 20]);
        let batch = vec![
            TransactionParameters::new(to, Dna::from_whole(1)),
            TransactionParameters::new(to, Dna::from_whole(2)).nonce(99),
            TransactionParameters::new(to, Dna::from_whole(3)),
        ];

        let operations = idena.bulk_transactions(batch, 0).await.unwrap();
        assert_eq!(operations.len(), 3);
        assert_eq!(transport.call_count("dna_getBalance"), 1);
        assert_eq!(transport.call_count("bcn_sendRawTx"), 3);
    }

    #[tokio::test]
    async fn test_bulk_empty() {
        let (idena, transport) = idena();
        assert!(idena.bulk_transactions(Vec::new(), 0).await.unwrap().is_empty());
        assert_eq!(transport.call_count("bcn_sendRawTx"), 0);
    }

    #[tokio::test]
    async fn test_account_queries() {
        let (idena, _transport) = idena();
        assert_eq!(idena.get_nonce(0).await.unwrap(), 5);
        assert_eq!(idena.get_balance(0).await.unwrap().balance, Dna::from_whole(10));
        assert_eq!(idena.get_identity(0).await.unwrap().state, "Human");
        assert!(matches!(idena.get_balance(1).await, Err(SdkError::InvalidArgument(_))));
    }
}
