use alloy_primitives::{Address, B256};
use std::fmt;

/// A matched outgoing transaction, carrying everything the log line and the
/// push notification need. Derived per transaction and dropped after
/// dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEvent {
    pub sender: Address,
    /// None for contract creations.
    pub recipient: Option<Address>,
    /// Ether value as a decimal string, already scaled down from wei.
    pub value_eth: String,
    pub tx_hash: B256,
    pub block_height: u64,
}

impl MatchEvent {
    /// Recipient rendered for humans. Contract creations have no recipient
    /// address, so they show a fixed sentinel instead.
    pub fn recipient_display(&self) -> RecipientDisplay<'_> {
        RecipientDisplay(self.recipient.as_ref())
    }

    /// Body of the push notification, matching the log line wording.
    pub fn message(&self) -> String {
        format!(
            "{} -> {} : {} ETH",
            self.sender,
            self.recipient_display(),
            self.value_eth
        )
    }

    /// Notification title, just the transferred amount.
    pub fn title(&self) -> String {
        format!("{} ETH", self.value_eth)
    }

    /// Block-explorer link for the notification's supplementary URL field.
    pub fn explorer_url(&self) -> String {
        format!("https://etherscan.io/tx/{}", self.tx_hash)
    }
}

pub struct RecipientDisplay<'a>(Option<&'a Address>);

impl fmt::Display for RecipientDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(addr) => write!(f, "{addr}"),
            None => f.write_str("contract creation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    fn sample_event(recipient: Option<Address>) -> MatchEvent {
        MatchEvent {
            sender: address!("9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F"),
            recipient,
            value_eth: "1.5".to_string(),
            tx_hash: b256!("33469b22e9f636356c4160a87eb19df52b7412e8eaac37fd1a8201c3712e8f0a"),
            block_height: 18_000_000,
        }
    }

    #[test]
    fn test_message_with_recipient() {
        let to = address!("3535353535353535353535353535353535353535");
        let event = sample_event(Some(to));
        let message = event.message();
        assert_eq!(
            message,
            format!("{} -> {} : 1.5 ETH", event.sender, to)
        );
    }

    #[test]
    fn test_message_for_contract_creation() {
        let event = sample_event(None);
        assert!(event.message().contains("-> contract creation :"));
    }

    #[test]
    fn test_title_is_the_amount() {
        assert_eq!(sample_event(None).title(), "1.5 ETH");
    }

    #[test]
    fn test_explorer_url_uses_tx_hash() {
        let event = sample_event(None);
        assert_eq!(
            event.explorer_url(),
            "https://etherscan.io/tx/0x33469b22e9f636356c4160a87eb19df52b7412e8eaac37fd1a8201c3712e8f0a"
        );
    }
}
