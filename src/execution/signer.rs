use std::fmt;

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope},
    eips::eip2718::Encodable2718,
    network::TxSignerSync,
    signers::local::PrivateKeySigner,
};
use alloy_primitives::{Address, Bytes, TxKind};
use tracing::info;

use crate::execution::{
    client::ChainClient,
    errors::ExecutionError,
    models::{CallKind, PendingTransactionId, SignedTransaction, TransactionRequest},
    utils::parse_private_key,
};

/// Signs transactions for one account. The key stays in memory and is never printed.
#[derive(Clone)]
pub struct TransactionSigner {
    address: Address,
    wallet: PrivateKeySigner,
}

impl fmt::Debug for TransactionSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionSigner")
            .field("address", &self.address.to_string())
            .finish()
    }
}

impl TransactionSigner {
    pub fn new(wallet: PrivateKeySigner) -> Self {
        Self { address: wallet.address(), wallet }
    }

    /// Loads the signer from a hex private key.
    pub fn from_credential(credential: &str) -> Result<Self, ExecutionError> {
        let key = parse_private_key(credential)?;
        let wallet = PrivateKeySigner::from_bytes(&key).map_err(|_| {
            ExecutionError::InvalidInput("Credential is not a valid private key".to_string())
        })?;
        Ok(Self::new(wallet))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn validate(&self, request: &TransactionRequest) -> Result<(), ExecutionError> {
        if request.chain_id == 0 {
            return Err(ExecutionError::MalformedTransaction("Chain id is zero".to_string()));
        }
        if request.gas_limit == 0 {
            return Err(ExecutionError::MalformedTransaction("Gas limit is zero".to_string()));
        }
        if request.max_priority_fee_per_gas > request.max_fee_per_gas {
            return Err(ExecutionError::MalformedTransaction(format!(
                "Priority fee {} exceeds max fee {}",
                request.max_priority_fee_per_gas, request.max_fee_per_gas
            )));
        }
        if request.sender != self.address {
            return Err(ExecutionError::MalformedTransaction(format!(
                "Sender {} does not match signer {}",
                request.sender, self.address
            )));
        }
        Ok(())
    }

    /// Signs `request` as an EIP-1559 transaction and returns its network encoding.
    pub fn sign(&self, request: &TransactionRequest) -> Result<SignedTransaction, ExecutionError> {
        self.validate(request)?;

        let mut tx = TxEip1559 {
            chain_id: request.chain_id,
            nonce: request.nonce,
            gas_limit: request.gas_limit,
            max_fee_per_gas: request.max_fee_per_gas,
            max_priority_fee_per_gas: request.max_priority_fee_per_gas,
            to: TxKind::Call(request.to),
            value: request.value,
            access_list: Default::default(),
            input: request.data.clone(),
        };
        let signature = self
            .wallet
            .sign_transaction_sync(&mut tx)
            .map_err(|e| ExecutionError::FatalError(format!("Failed to sign transaction: {}", e)))?;
        let envelope = TxEnvelope::from(tx.into_signed(signature));

        Ok(SignedTransaction {
            hash: *envelope.tx_hash(),
            raw: Bytes::from(envelope.encoded_2718()),
        })
    }
}

/// Broadcasts an already signed transaction without waiting for it to be mined.
pub async fn submit_signed<C: ChainClient + ?Sized>(
    client: &C,
    signed: &SignedTransaction,
    kind: CallKind,
    nonce: u64,
) -> Result<PendingTransactionId, ExecutionError> {
    let hash = client
        .send_raw_transaction(&signed.raw)
        .await?;
    info!(tx_hash = %hash, %kind, nonce, "Submitted transaction");
    Ok(PendingTransactionId { hash, kind, nonce })
}

/// Signs and broadcasts `request`. Local validation errors are reported before anything is sent.
pub async fn submit<C: ChainClient + ?Sized>(
    client: &C,
    signer: &TransactionSigner,
    request: &TransactionRequest,
) -> Result<PendingTransactionId, ExecutionError> {
    let signed = signer.sign(request)?;
    submit_signed(client, &signed, request.kind, request.nonce).await
}
