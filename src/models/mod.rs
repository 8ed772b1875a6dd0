pub mod event;
pub mod transaction;

pub use event::MatchEvent;
pub use transaction::{AccessListItem, Block, BlockHeader, Transaction, TxFormat};
