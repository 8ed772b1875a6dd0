use alloy_primitives::{Address, U256};
use log::warn;
use once_cell::sync::Lazy;

use crate::blockchain::sender_resolver::SenderResolver;
use crate::models::{MatchEvent, Transaction};

static WEI_PER_ETH: Lazy<U256> = Lazy::new(|| U256::from(1_000_000_000_000_000_000u64));

/// Decides per transaction whether the recovered sender is the watched
/// address, and turns matches into dispatchable events. Holds no state
/// beyond the configured address; blocks stream through it.
pub struct TransactionFilter {
    watched: Address,
    resolver: SenderResolver,
}

impl TransactionFilter {
    pub fn new(watched: Address) -> Self {
        Self {
            watched,
            resolver: SenderResolver::new(),
        }
    }

    pub fn watched_address(&self) -> Address {
        self.watched
    }

    /// Inspect a single transaction. Returns the match event when the
    /// recovered sender equals the watched address, None when it does not.
    /// Transactions whose sender cannot be recovered are skipped with a
    /// warning so one malformed entry never stalls the block.
    pub fn inspect(&self, tx: &Transaction, block_height: u64) -> Option<MatchEvent> {
        let sender = match self.resolver.recover(tx) {
            Ok(sender) => sender,
            Err(err) => {
                warn!("skipping tx {} in block {}: {}", tx.hash, block_height, err);
                return None;
            }
        };
        if sender != self.watched {
            return None;
        }
        Some(MatchEvent {
            sender,
            recipient: tx.to,
            value_eth: format_eth(tx.value),
            tx_hash: tx.hash,
            block_height,
        })
    }
}

/// Render a wei amount as a decimal ether string, full precision, no
/// trailing zeros. Integer amounts render without a fractional part.
pub fn format_eth(wei: U256) -> String {
    let whole = wei / *WEI_PER_ETH;
    let frac = wei % *WEI_PER_ETH;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac_digits = format!("{:0>18}", frac.to_string());
    format!("{}.{}", whole, frac_digits.trim_end_matches('0'))
}
