use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_rlp::{BufMut, Encodable, EMPTY_STRING_CODE};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use log::debug;
use thiserror::Error;

use crate::models::transaction::{Transaction, TxFormat};

#[derive(Error, Debug)]
pub enum SenderResolutionError {
    #[error("transaction type not supported: {0}")]
    UnsupportedType(u64),
    #[error("transaction field missing: {0}")]
    MissingField(&'static str),
    #[error("invalid signature values (v={v})")]
    InvalidSignature { v: U256 },
    #[error("sender recovery failed: {0}")]
    Recovery(#[from] k256::ecdsa::Error),
}

/// Recovers transaction senders from their ECDSA signatures. The sender is
/// never taken from the RPC response; it is always derived from the
/// signature over the format's signing payload.
pub struct SenderResolver;

impl SenderResolver {
    pub fn new() -> Self {
        SenderResolver
    }

    /// Recover the sender address of a signed transaction.
    ///
    /// Scheme selection is an explicit match on the transaction format:
    /// replay-protected legacy transactions hash their payload with the
    /// chain id folded in, unprotected ones (v of 27 or 28) fall back to
    /// the original six-field payload, and typed transactions prefix the
    /// payload with their type tag. Anything else is rejected with the
    /// observed tag.
    pub fn recover(&self, tx: &Transaction) -> Result<Address, SenderResolutionError> {
        let payload = self.signing_payload(tx)?;
        let sighash = keccak256(&payload);
        let recovery_id = self.recovery_id(tx)?;
        let sender = recover_address(&sighash, tx.r, tx.s, recovery_id)?;
        debug!("recovered sender {} for tx {}", sender, tx.hash);
        Ok(sender)
    }

    /// The exact byte string whose keccak256 the signer committed to.
    pub fn signing_payload(&self, tx: &Transaction) -> Result<Vec<u8>, SenderResolutionError> {
        match tx.format() {
            TxFormat::Legacy => {
                let gas_price = tx
                    .gas_price
                    .ok_or(SenderResolutionError::MissingField("gasPrice"))?;
                match tx.chain_identity() {
                    Some(chain_id) => Ok(rlp_list(&[
                        &tx.nonce,
                        &gas_price,
                        &tx.gas,
                        &MaybeRecipient(tx.to.as_ref()),
                        &tx.value,
                        &tx.input,
                        &chain_id,
                        &0u8,
                        &0u8,
                    ])),
                    None => Ok(rlp_list(&[
                        &tx.nonce,
                        &gas_price,
                        &tx.gas,
                        &MaybeRecipient(tx.to.as_ref()),
                        &tx.value,
                        &tx.input,
                    ])),
                }
            }
            TxFormat::AccessList => {
                let chain_id = tx
                    .chain_id
                    .ok_or(SenderResolutionError::MissingField("chainId"))?;
                let gas_price = tx
                    .gas_price
                    .ok_or(SenderResolutionError::MissingField("gasPrice"))?;
                let access_list = tx.access_list.clone().unwrap_or_default();
                let mut payload = vec![0x01u8];
                payload.extend(rlp_list(&[
                    &chain_id,
                    &tx.nonce,
                    &gas_price,
                    &tx.gas,
                    &MaybeRecipient(tx.to.as_ref()),
                    &tx.value,
                    &tx.input,
                    &access_list,
                ]));
                Ok(payload)
            }
            TxFormat::DynamicFee => {
                let chain_id = tx
                    .chain_id
                    .ok_or(SenderResolutionError::MissingField("chainId"))?;
                let max_priority = tx
                    .max_priority_fee_per_gas
                    .ok_or(SenderResolutionError::MissingField("maxPriorityFeePerGas"))?;
                let max_fee = tx
                    .max_fee_per_gas
                    .ok_or(SenderResolutionError::MissingField("maxFeePerGas"))?;
                let access_list = tx.access_list.clone().unwrap_or_default();
                let mut payload = vec![0x02u8];
                payload.extend(rlp_list(&[
                    &chain_id,
                    &tx.nonce,
                    &max_priority,
                    &max_fee,
                    &tx.gas,
                    &MaybeRecipient(tx.to.as_ref()),
                    &tx.value,
                    &tx.input,
                    &access_list,
                ]));
                Ok(payload)
            }
            TxFormat::Unknown(tag) => Err(SenderResolutionError::UnsupportedType(tag)),
        }
    }

    fn recovery_id(&self, tx: &Transaction) -> Result<u8, SenderResolutionError> {
        let invalid = || SenderResolutionError::InvalidSignature { v: tx.v };
        match tx.format() {
            TxFormat::Legacy => match tx.chain_identity() {
                Some(chain_id) => {
                    let offset = chain_id
                        .checked_mul(U256::from(2u64))
                        .and_then(|doubled| doubled.checked_add(U256::from(35u64)))
                        .ok_or_else(invalid)?;
                    let parity = tx.v.checked_sub(offset).ok_or_else(invalid)?;
                    u8::try_from(parity)
                        .ok()
                        .filter(|p| *p <= 1)
                        .ok_or_else(invalid)
                }
                None => {
                    let parity = tx
                        .v
                        .checked_sub(U256::from(27u64))
                        .ok_or_else(invalid)?;
                    u8::try_from(parity)
                        .ok()
                        .filter(|p| *p <= 1)
                        .ok_or_else(invalid)
                }
            },
            TxFormat::AccessList | TxFormat::DynamicFee => u8::try_from(tx.v)
                .ok()
                .filter(|p| *p <= 1)
                .ok_or_else(invalid),
            TxFormat::Unknown(tag) => Err(SenderResolutionError::UnsupportedType(tag)),
        }
    }
}

impl Default for SenderResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn recover_address(
    sighash: &B256,
    r: U256,
    s: U256,
    recovery_id: u8,
) -> Result<Address, SenderResolutionError> {
    let signature = Signature::from_scalars(r.to_be_bytes::<32>(), s.to_be_bytes::<32>())?;
    if signature.normalize_s().is_some() {
        // Consensus rejects malleable high-s signatures (EIP-2).
        return Err(SenderResolutionError::InvalidSignature {
            v: U256::from(recovery_id),
        });
    }
    let recovery = RecoveryId::from_byte(recovery_id)
        .ok_or(SenderResolutionError::InvalidSignature {
            v: U256::from(recovery_id),
        })?;
    let key = VerifyingKey::recover_from_prehash(sighash.as_slice(), &signature, recovery)?;
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    Ok(Address::from_slice(&digest[12..]))
}

fn rlp_list(fields: &[&dyn Encodable]) -> Vec<u8> {
    let payload_length: usize = fields.iter().map(|field| field.length()).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    alloy_rlp::Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}

/// Contract creations encode the recipient slot as an empty byte string.
struct MaybeRecipient<'a>(Option<&'a Address>);

impl Encodable for MaybeRecipient<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        match self.0 {
            Some(addr) => addr.encode(out),
            None => out.put_u8(EMPTY_STRING_CODE),
        }
    }

    fn length(&self) -> usize {
        match self.0 {
            Some(addr) => addr.length(),
            None => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, hex};

    fn eip155_tx() -> Transaction {
        serde_json::from_value(serde_json::json!({
            "nonce": "0x9",
            "gasPrice": "0x4a817c800",
            "gas": "0x5208",
            "to": "0x3535353535353535353535353535353535353535",
            "value": "0xde0b6b3a7640000",
            "input": "0x",
            "v": "0x25",
            "r": "0x28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276",
            "s": "0x67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83",
            "hash": "0x33469b22e9f636356c4160a87eb19df52b7412e8eaac37fd1a8201c3712e8f0a"
        }))
        .unwrap()
    }

    #[test]
    fn test_eip155_signing_payload() {
        let resolver = SenderResolver::new();
        let payload = resolver.signing_payload(&eip155_tx()).unwrap();
        assert_eq!(
            payload,
            hex::decode(
                "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
            )
            .unwrap()
        );
        assert_eq!(
            keccak256(&payload),
            "0xdaf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
                .parse::<B256>()
                .unwrap()
        );
    }

    #[test]
    fn test_eip155_sender_recovery() {
        let resolver = SenderResolver::new();
        let sender = resolver.recover(&eip155_tx()).unwrap();
        assert_eq!(
            sender,
            address!("9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F")
        );
    }

    #[test]
    fn test_unprotected_legacy_payload_omits_chain_id() {
        let resolver = SenderResolver::new();
        let mut tx = eip155_tx();
        tx.v = U256::from(27u64);
        let payload = resolver.signing_payload(&tx).unwrap();
        // Six fields only; no trailing chain_id, 0, 0.
        assert_eq!(
            payload,
            hex::decode(
                "e9098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080"
            )
            .unwrap()
        );
    }

    #[test]
    fn test_contract_creation_payload_has_empty_recipient() {
        let resolver = SenderResolver::new();
        let mut tx = eip155_tx();
        tx.to = None;
        let payload = resolver.signing_payload(&tx).unwrap();
        // The 21-byte recipient item collapses to the 1-byte empty string.
        assert_eq!(
            payload,
            hex::decode("d8098504a817c80082520880880de0b6b3a764000080018080").unwrap()
        );
    }

    #[test]
    fn test_dynamic_fee_payload_is_type_prefixed() {
        let resolver = SenderResolver::new();
        let tx: Transaction = serde_json::from_value(serde_json::json!({
            "type": "0x2",
            "nonce": "0x1",
            "maxFeePerGas": "0x77359400",
            "maxPriorityFeePerGas": "0x3b9aca00",
            "gas": "0x5208",
            "to": "0x3535353535353535353535353535353535353535",
            "value": "0x0",
            "input": "0x",
            "accessList": [],
            "chainId": "0x1",
            "v": "0x0",
            "r": "0x1",
            "s": "0x1",
            "hash": "0x0000000000000000000000000000000000000000000000000000000000000001"
        }))
        .unwrap();
        let payload = resolver.signing_payload(&tx).unwrap();
        assert_eq!(payload[0], 0x02);
        // Byte 1 opens an RLP list covering the rest of the payload.
        assert!(payload[1] >= 0xc0);
        assert_eq!(*payload.last().unwrap(), 0xc0, "empty access list");
    }

    #[test]
    fn test_access_list_payload_is_type_prefixed() {
        let resolver = SenderResolver::new();
        let tx: Transaction = serde_json::from_value(serde_json::json!({
            "type": "0x1",
            "nonce": "0x0",
            "gasPrice": "0x4a817c800",
            "gas": "0x5208",
            "to": "0x3535353535353535353535353535353535353535",
            "value": "0x0",
            "input": "0x",
            "accessList": [{
                "address": "0x3535353535353535353535353535353535353535",
                "storageKeys": ["0x0000000000000000000000000000000000000000000000000000000000000001"]
            }],
            "chainId": "0x1",
            "v": "0x1",
            "r": "0x1",
            "s": "0x1",
            "hash": "0x0000000000000000000000000000000000000000000000000000000000000002"
        }))
        .unwrap();
        let payload = resolver.signing_payload(&tx).unwrap();
        assert_eq!(payload[0], 0x01);
        assert!(payload[1] >= 0xc0);
    }

    #[test]
    fn test_unknown_type_is_rejected_with_tag() {
        let resolver = SenderResolver::new();
        let mut tx = eip155_tx();
        tx.tx_type = Some(U256::from(126u64));
        let err = resolver.recover(&tx).unwrap_err();
        match err {
            SenderResolutionError::UnsupportedType(tag) => assert_eq!(tag, 126),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), "transaction type not supported: 126");
    }

    #[test]
    fn test_invalid_v_is_rejected() {
        let resolver = SenderResolver::new();
        let mut tx = eip155_tx();
        // v = 30 is neither 27/28 nor >= 35.
        tx.v = U256::from(30u64);
        assert!(matches!(
            resolver.recover(&tx),
            Err(SenderResolutionError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_zero_scalars_are_rejected() {
        let resolver = SenderResolver::new();
        let mut tx = eip155_tx();
        tx.r = U256::ZERO;
        assert!(matches!(
            resolver.recover(&tx),
            Err(SenderResolutionError::Recovery(_))
        ));
    }

    #[test]
    fn test_high_s_is_rejected() {
        let resolver = SenderResolver::new();
        let mut tx = eip155_tx();
        // Curve order minus the original s flips it into the high half.
        let order = U256::from_str_radix(
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141",
            16,
        )
        .unwrap();
        tx.s = order - tx.s;
        tx.v = U256::from(38u64);
        assert!(matches!(
            resolver.recover(&tx),
            Err(SenderResolutionError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_missing_gas_price_on_legacy() {
        let resolver = SenderResolver::new();
        let mut tx = eip155_tx();
        tx.gas_price = None;
        assert!(matches!(
            resolver.recover(&tx),
            Err(SenderResolutionError::MissingField("gasPrice"))
        ));
    }
}
