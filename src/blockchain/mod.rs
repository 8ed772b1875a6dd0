pub mod block_monitor;
pub mod rpc_client;
pub mod sender_resolver;
pub mod source;
pub mod subscription;
pub mod tx_filter;

pub use block_monitor::{BlockMonitor, MonitorError, ShutdownHandle};
pub use rpc_client::{RpcClient, RpcError};
pub use sender_resolver::{SenderResolutionError, SenderResolver};
pub use source::{ChainSource, NodeClient};
pub use subscription::{HeaderSubscription, SubscriptionError};
pub use tx_filter::{format_eth, TransactionFilter};
