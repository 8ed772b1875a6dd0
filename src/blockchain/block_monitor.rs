use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::sync::Notify;

use crate::blockchain::source::ChainSource;
use crate::blockchain::subscription::SubscriptionError;
use crate::blockchain::tx_filter::TransactionFilter;
use crate::models::BlockHeader;
use crate::notification::{NotificationError, Notifier};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("header feed failed: {0}")]
    Subscription(#[from] SubscriptionError),
    #[error("notification delivery failed: {0}")]
    Notification(#[from] NotificationError),
}

/// Cooperative shutdown flag shared between the monitor loop and the signal
/// handler task.
pub struct ShutdownHandle {
    flag: AtomicBool,
    notify: Notify,
}

impl ShutdownHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            flag: AtomicBool::new(false),
            notify: Notify::new(),
        })
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested, immediately if it already
    /// was. The waiter is registered before the flag check so a concurrent
    /// `request` cannot slip between them.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.flag.load(Ordering::SeqCst) {
            return;
        }
        notified.await;
    }
}

/// The monitoring loop: waits on the header feed, fetches each announced
/// block, runs every transaction through the filter and dispatches matches.
/// A failed block fetch skips that header; a failed delivery ends the run.
pub struct BlockMonitor<S: ChainSource, N: Notifier> {
    source: S,
    filter: TransactionFilter,
    notifier: N,
    shutdown: Arc<ShutdownHandle>,
}

impl<S: ChainSource, N: Notifier> BlockMonitor<S, N> {
    pub fn new(source: S, filter: TransactionFilter, notifier: N) -> Self {
        Self {
            source,
            filter,
            notifier,
            shutdown: ShutdownHandle::new(),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<ShutdownHandle> {
        Arc::clone(&self.shutdown)
    }

    /// Run until the feed closes, shutdown is requested, or a fatal error
    /// occurs.
    pub async fn run(&mut self) -> Result<(), MonitorError> {
        info!("watching address {}", self.filter.watched_address());

        loop {
            let shutdown = Arc::clone(&self.shutdown);
            let header = tokio::select! {
                _ = shutdown.wait() => {
                    info!("shutdown requested, stopping monitor");
                    return Ok(());
                }
                header = self.source.next_header() => header?,
            };

            let Some(header) = header else {
                info!("header feed closed, stopping monitor");
                return Ok(());
            };

            self.process_header(&header).await?;
        }
    }

    async fn process_header(&self, header: &BlockHeader) -> Result<(), MonitorError> {
        let block = match self.source.block_by_number(header.height()).await {
            Ok(block) => block,
            Err(e) => {
                warn!("failed to fetch block {}: {}", header.height(), e);
                return Ok(());
            }
        };

        debug!(
            "inspecting block {} with {} transactions",
            block.height(),
            block.transactions.len()
        );

        for tx in &block.transactions {
            if let Some(event) = self.filter.inspect(tx, block.height()) {
                info!("outgoing transaction in block {}: {}", event.block_height, event.message());
                if let Err(e) = self.notifier.notify(&event).await {
                    error!("notification delivery failed for tx {}: {}", event.tx_hash, e);
                    return Err(MonitorError::Notification(e));
                }
            }
        }

        Ok(())
    }
}
