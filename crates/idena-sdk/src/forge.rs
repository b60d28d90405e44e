//! Forge, sign and submit a transaction

use std::sync::Arc;

use crate::client::RpcClient;
use crate::codec::{resolve_defaults, ForgedTransaction};
use crate::config::SdkConfig;
use crate::operation::Operation;
use crate::signer::Signer;
use crate::types::TransactionParameters;
use crate::SdkError;

/// Turns transaction parameters into a submitted [`Operation`]
#[derive(Debug)]
pub struct TransactionForge<'a> {
    client: &'a Arc<RpcClient>,
    signer: &'a Signer,
    config: &'a SdkConfig,
}

impl<'a> TransactionForge<'a> {
    /// Forge with `signer` and submit through `client`
    pub fn new(client: &'a Arc<RpcClient>, signer: &'a Signer, config: &'a SdkConfig) -> Self {
        Self {
            client,
            signer,
            config,
        }
    }

    /// Resolve missing fields, sign, and return the resolved transaction with its signed encoding
    pub async fn forge(
        &self,
        params: &TransactionParameters,
        index: u32,
    ) -> Result<(ForgedTransaction, Vec<u8>), SdkError> {
        let resolved = resolve_defaults(
            params,
            self.signer,
            index,
            self.client,
            &self.config.fee,
        )
        .await?;

        let unsigned = resolved.forge(None)?;
        let signature = self.signer.sign(&unsigned, index).await?;
        let signed = resolved.forge(Some(&signature))?;
        Ok((resolved, signed))
    }

    /// Forge, sign and submit
    ///
    /// A node refusal becomes [`SdkError::SubmissionRejected`] carrying the
    /// node message as is.
    pub async fn submit(
        &self,
        params: &TransactionParameters,
        index: u32,
    ) -> Result<Operation, SdkError> {
        let (resolved, signed) = self.forge(params, index).await?;

        let hash = self
            .client
            .submit_raw_transaction(&signed)
            .await
            .map_err(|err| match err {
                SdkError::Rpc { message, .. } => SdkError::SubmissionRejected(message),
                other => other,
            })?;

        tracing::info!(
            %hash,
            nonce = resolved.nonce,
            epoch = resolved.epoch,
            to = %resolved.to,
            amount = %resolved.amount,
            "transaction submitted"
        );
        Ok(Operation::new(hash, self.client, self.config.poll))
    }
}
