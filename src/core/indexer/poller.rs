use super::client::IndexerClient;
use super::decode::decode_requests;
use crate::core::constants::DEFAULT_POLL_INTERVAL;
use crate::types::OrderHistory;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    // No account connected, history is empty
    Idle,
    Polling,
}

/// Order history of one account, refreshed from the indexer.
///
/// Every successful tick replaces the whole list. A tick where both
/// endpoints fail keeps the previous list and marks it stale.
pub struct OrderHistoryPoller<C> {
    client: C,
    account: Option<String>,
    history: OrderHistory,
}

impl<C: IndexerClient> OrderHistoryPoller<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            account: None,
            history: OrderHistory::default(),
        }
    }

    pub fn with_account(mut self, account: &str) -> Self {
        self.set_account(Some(account.to_string()));
        self
    }

    pub fn set_account(&mut self, account: Option<String>) {
        if account != self.account {
            self.account = account;
            self.history = OrderHistory::default();
        }
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn state(&self) -> PollerState {
        match self.account {
            Some(_) => PollerState::Polling,
            None => PollerState::Idle,
        }
    }

    pub fn history(&self) -> &OrderHistory {
        &self.history
    }

    pub async fn tick(&mut self) -> &OrderHistory {
        let Some(account) = self.account.clone() else {
            self.history = OrderHistory::default();
            return &self.history;
        };

        match self.client.requests_by_register(&account).await {
            Ok(requests) => {
                self.history = OrderHistory {
                    orders: decode_requests(&requests),
                    stale: false,
                };
            }
            Err(err) => {
                error!(%account, error = %err, "failed to refresh order history");
                self.history.stale = true;
            }
        }
        &self.history
    }
}

impl<C: IndexerClient + 'static> OrderHistoryPoller<C> {
    /// Runs `tick` every `interval` on the tokio runtime until the returned
    /// handle is dropped.
    pub fn spawn(self, interval: Duration) -> PollerHandle {
        let interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        let (history_tx, history_rx) = watch::channel(self.history.clone());
        let (account_tx, mut account_rx) = watch::channel(self.account.clone());

        let mut poller = self;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let account = account_rx.borrow_and_update().clone();
                poller.set_account(account);

                let history = poller.tick().await.clone();
                if history_tx.send(history).is_err() {
                    debug!("order history has no subscribers, stopping");
                    break;
                }
            }
        });

        PollerHandle {
            history: history_rx,
            account: account_tx,
            task,
        }
    }
}

/// Handle to a running poller. Dropping it aborts the polling task, so a
/// response still in flight is discarded.
pub struct PollerHandle {
    history: watch::Receiver<OrderHistory>,
    account: watch::Sender<Option<String>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<OrderHistory> {
        self.history.clone()
    }

    pub fn latest(&self) -> OrderHistory {
        self.history.borrow().clone()
    }

    // Takes effect on the next tick
    pub fn set_account(&self, account: Option<String>) {
        self.account.send_replace(account);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
