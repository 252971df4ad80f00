//! Test fixtures: a provider backed by alloy's mocked transport.
//!
//! Responses are consumed in request order, so each test pushes exactly the
//! replies the code under test is expected to ask for.

use alloy::consensus::{Eip658Value, Receipt, ReceiptEnvelope, ReceiptWithBloom};
use alloy::primitives::{Address, Bloom, Bytes, TxHash, B256, U128, U64};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::abi::TokenSeq;
use alloy::sol_types::{SolType, SolValue};
use alloy::transports::mock::Asserter;

use crate::chains::{profile_for, ChainProfile, BASE_CHAIN_ID};

// Hardhat account #0 - never use on public networks
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub fn mock_provider() -> (DynProvider, Asserter) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new()
        .connect_mocked_client(asserter.clone())
        .erased();
    (provider, asserter)
}

pub fn base_profile() -> ChainProfile {
    profile_for(BASE_CHAIN_ID).unwrap()
}

pub fn test_address() -> Address {
    TEST_ADDRESS.parse().unwrap()
}

/// Queue an `eth_call` reply. `values` is the full return tuple.
pub fn push_call_return<T: SolValue>(asserter: &Asserter, values: T)
where
    for<'a> <T::SolType as SolType>::Token<'a>: TokenSeq<'a>,
{
    asserter.push_success(&Bytes::from(values.abi_encode_params()));
}

/// Gas price every queued submission reports: 1 gwei.
pub const GAS_PRICE: u64 = 1_000_000_000;

/// Nonce every queued submission reports.
pub const NONCE: u64 = 7;

/// Raw gas estimate every queued submission reports.
pub const GAS_ESTIMATE: u64 = 100_000;

pub fn receipt(tx_hash: TxHash, status: bool) -> TransactionReceipt {
    TransactionReceipt {
        inner: ReceiptEnvelope::Legacy(ReceiptWithBloom {
            receipt: Receipt {
                status: Eip658Value::Eip658(status),
                cumulative_gas_used: GAS_ESTIMATE,
                logs: vec![],
            },
            logs_bloom: Bloom::default(),
        }),
        transaction_hash: tx_hash,
        transaction_index: Some(0),
        block_hash: Some(B256::repeat_byte(0x22)),
        block_number: Some(1),
        gas_used: GAS_ESTIMATE,
        effective_gas_price: GAS_PRICE as u128,
        blob_gas_used: None,
        blob_gas_price: None,
        from: test_address(),
        to: None,
        contract_address: None,
    }
}

/// Queue the replies of a draft: gas price, then nonce.
pub fn push_draft(asserter: &Asserter) {
    asserter.push_success(&U128::from(GAS_PRICE));
    asserter.push_success(&U64::from(NONCE));
}

/// Queue the replies of a submission up to the broadcast: gas estimate, gas
/// price for the fee, then the hash the node assigns.
pub fn push_broadcast(asserter: &Asserter, tx_hash: TxHash) {
    asserter.push_success(&U64::from(GAS_ESTIMATE));
    asserter.push_success(&U128::from(GAS_PRICE));
    asserter.push_success(&tx_hash);
}

/// Queue a whole `TxSender::send` that gets mined with `status`.
///
/// The receipt is asked for twice: once when the watch is registered and
/// once by the poll loop.
pub fn push_send(asserter: &Asserter, tx_hash: TxHash, status: bool) {
    push_draft(asserter);
    push_broadcast(asserter, tx_hash);
    asserter.push_success(&receipt(tx_hash, status));
    asserter.push_success(&receipt(tx_hash, status));
}
