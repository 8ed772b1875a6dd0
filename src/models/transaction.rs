use alloy_primitives::{Address, Bytes, B256, U256};
use serde::Deserialize;

/// Transaction format versions, resolved by explicit match everywhere a
/// scheme decision is made. Unknown tags are carried through so errors can
/// report the observed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxFormat {
    Legacy,
    AccessList,
    DynamicFee,
    Unknown(u64),
}

impl TxFormat {
    pub fn from_tag(tag: u64) -> Self {
        match tag {
            0 => TxFormat::Legacy,
            1 => TxFormat::AccessList,
            2 => TxFormat::DynamicFee,
            other => TxFormat::Unknown(other),
        }
    }
}

/// Header reference delivered by the newHeads subscription. Only the height
/// is consumed: it drives the follow-up block fetch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockHeader {
    pub number: U256,
}

impl BlockHeader {
    pub fn height(&self) -> u64 {
        u64::try_from(self.number).unwrap_or(u64::MAX)
    }
}

/// Full block as returned by eth_getBlockByNumber with transaction objects.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: U256,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn height(&self) -> u64 {
        u64::try_from(self.number).unwrap_or(u64::MAX)
    }
}

/// One entry of an EIP-2930 access list.
#[derive(Debug, Clone, PartialEq, Deserialize, alloy_rlp::RlpEncodable)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

/// Wire model of a JSON-RPC transaction object. The sender is not part of
/// the trusted fields; it is recovered cryptographically from the signature.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, rename = "type")]
    pub tx_type: Option<U256>,
    pub nonce: U256,
    #[serde(default)]
    pub gas_price: Option<U256>,
    #[serde(default)]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<U256>,
    pub gas: U256,
    #[serde(default)]
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    #[serde(default)]
    pub access_list: Option<Vec<AccessListItem>>,
    #[serde(default)]
    pub chain_id: Option<U256>,
    pub v: U256,
    pub r: U256,
    pub s: U256,
    pub hash: B256,
}

impl Transaction {
    /// The transaction's declared format version. A missing type tag means a
    /// legacy transaction (nodes omit it for pre-typed transactions).
    pub fn format(&self) -> TxFormat {
        match self.tx_type {
            None => TxFormat::Legacy,
            Some(tag) => TxFormat::from_tag(u64::try_from(tag).unwrap_or(u64::MAX)),
        }
    }

    /// The chain identity the transaction declares: the chainId field for
    /// typed transactions, the identity folded into `v` for replay-protected
    /// legacy transactions, and None for pre-EIP-155 legacy ones.
    pub fn chain_identity(&self) -> Option<U256> {
        match self.format() {
            TxFormat::Legacy => {
                if self.v >= U256::from(35u64) {
                    Some((self.v - U256::from(35u64)) >> 1)
                } else {
                    None
                }
            }
            _ => self.chain_id,
        }
    }

    /// True once `v` carries a chain identity (EIP-155) or the transaction is
    /// typed and therefore signs over the chain id directly.
    pub fn is_replay_protected(&self) -> bool {
        match self.format() {
            TxFormat::Legacy => self.v >= U256::from(35u64),
            _ => true,
        }
    }
}
