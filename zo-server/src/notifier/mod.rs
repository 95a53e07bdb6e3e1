//! Admin order notifier
//!
//! Polls the order count while at least one admin console is connected and
//! announces growth on the console hub.
//!
//! ```text
//! ConsoleHub session count (watch)
//!       │ 0 → n: start, first poll takes the baseline
//!       ▼
//! OrderNotifier ── every period ──▶ OrderFeed::order_count
//!       │ count grew
//!       ▼
//! Notifier::notify_new_orders ──▶ ConsoleMessage::NewOrder
//! ```

use async_trait::async_trait;
use shared::console::ConsoleMessage;
use shared::models::Order;
use shared::watch::{OrderWatch, PollOutcome};
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::db::{self, BoxError};
use crate::live::ConsoleHub;

/// Source of the order count
#[async_trait]
pub trait OrderFeed: Send + Sync {
    async fn order_count(&self) -> Result<u64, BoxError>;

    async fn latest_order(&self) -> Result<Option<Order>, BoxError>;
}

#[async_trait]
impl OrderFeed for PgPool {
    async fn order_count(&self) -> Result<u64, BoxError> {
        let count = db::orders::count_orders(self).await?;
        Ok(u64::try_from(count)?)
    }

    async fn latest_order(&self) -> Result<Option<Order>, BoxError> {
        db::orders::latest_order(self).await
    }
}

/// Receives new-order announcements
pub trait Notifier: Send + Sync {
    fn notify_new_orders(&self, latest: Option<Order>, new_orders: u64, total_orders: u64);
}

/// Pushes announcements to every connected admin console
pub struct ConsoleNotifier {
    hub: ConsoleHub,
}

impl ConsoleNotifier {
    pub fn new(hub: ConsoleHub) -> Self {
        Self { hub }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify_new_orders(&self, latest: Option<Order>, new_orders: u64, total_orders: u64) {
        self.hub.publish(ConsoleMessage::NewOrder {
            order: latest.map(Box::new),
            new_orders,
            total_orders,
        });
    }
}

pub struct OrderNotifier<F, N> {
    feed: F,
    notifier: N,
    watch: OrderWatch,
}

impl<F: OrderFeed, N: Notifier> OrderNotifier<F, N> {
    pub fn new(feed: F, notifier: N) -> Self {
        Self {
            feed,
            notifier,
            watch: OrderWatch::new(),
        }
    }

    #[cfg(test)]
    pub fn watch(&self) -> &OrderWatch {
        &self.watch
    }

    pub fn start(&mut self) {
        self.watch.start();
    }

    pub fn stop(&mut self) {
        self.watch.stop();
    }

    /// One poll: fetch the count, advance the watch, notify on growth
    pub async fn tick(&mut self) -> PollOutcome {
        let count = match self.feed.order_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "Order count poll failed");
                return self.watch.observe_failure();
            }
        };

        let outcome = self.watch.observe(count);
        match outcome {
            PollOutcome::NewOrders { previous, current } => {
                tracing::info!(previous, current, "New orders received");
                let latest = self.feed.latest_order().await.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to load latest order");
                    None
                });
                self.notifier.notify_new_orders(latest, outcome.new_orders(), current);
            }
            PollOutcome::Rebaselined { previous, current } => {
                tracing::info!(previous, current, "Order count decreased, baseline reset");
            }
            PollOutcome::Baseline { count } => {
                tracing::debug!(count, "Order watch baseline");
            }
            _ => {}
        }
        outcome
    }

    /// Poll while consoles are connected; returns once the session sender is dropped
    pub async fn run(mut self, mut sessions: watch::Receiver<usize>, period: Duration) {
        loop {
            loop {
                let connected = *sessions.borrow_and_update();
                if connected > 0 {
                    break;
                }
                if sessions.changed().await.is_err() {
                    return;
                }
            }

            self.start();
            tracing::info!(period_secs = period.as_secs(), "Order watch started");

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let closed = loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                    changed = sessions.changed() => {
                        if changed.is_err() {
                            break true;
                        }
                        if *sessions.borrow_and_update() == 0 {
                            break false;
                        }
                    }
                }
            };

            self.stop();
            tracing::info!("Order watch stopped");
            if closed {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::OrderStatus;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct MemoryFeed {
        count: Arc<AtomicU64>,
        failing: Arc<AtomicBool>,
        latest: Arc<Mutex<Option<Order>>>,
        latest_failing: Arc<AtomicBool>,
    }

    impl MemoryFeed {
        fn set(&self, count: u64) {
            self.count.store(count, Ordering::SeqCst);
        }

        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Appends orders up to `count`; the last one becomes the latest
        fn place(&self, count: u64) {
            *self.latest.lock().unwrap() = Some(make_order(count as i64));
            self.set(count);
        }

        fn fail_latest(&self, failing: bool) {
            self.latest_failing.store(failing, Ordering::SeqCst);
        }
    }

    fn make_order(id: i64) -> Order {
        Order {
            id,
            client_id: Some(1),
            customer_name: "Awa".to_string(),
            phone: "+221770000000".to_string(),
            address: "Dakar".to_string(),
            note: None,
            status: OrderStatus::Pending,
            total_amount: 15000,
            created_at: id,
            updated_at: id,
        }
    }

    /// (latest order id, new orders, total)
    type Notice = (Option<i64>, u64, u64);

    #[async_trait]
    impl OrderFeed for MemoryFeed {
        async fn order_count(&self) -> Result<u64, BoxError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err("database unavailable".into());
            }
            Ok(self.count.load(Ordering::SeqCst))
        }

        async fn latest_order(&self) -> Result<Option<Order>, BoxError> {
            if self.latest_failing.load(Ordering::SeqCst) {
                return Err("latest order query failed".into());
            }
            Ok(self.latest.lock().unwrap().clone())
        }
    }

    struct Recorder(mpsc::UnboundedSender<Notice>);

    impl Notifier for Recorder {
        fn notify_new_orders(&self, latest: Option<Order>, new_orders: u64, total_orders: u64) {
            let _ = self.0.send((latest.map(|o| o.id), new_orders, total_orders));
        }
    }

    fn notifier() -> (
        MemoryFeed,
        OrderNotifier<MemoryFeed, Recorder>,
        mpsc::UnboundedReceiver<Notice>,
    ) {
        let feed = MemoryFeed::default();
        let (tx, rx) = mpsc::unbounded_channel();
        (feed.clone(), OrderNotifier::new(feed, Recorder(tx)), rx)
    }

    #[tokio::test]
    async fn idle_notifier_never_notifies() {
        let (feed, mut n, mut rx) = notifier();
        feed.set(3);
        assert_eq!(n.tick().await, PollOutcome::Idle);
        feed.set(9);
        assert_eq!(n.tick().await, PollOutcome::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn growth_notifies_once() {
        let (feed, mut n, mut rx) = notifier();
        n.start();

        feed.place(5);
        assert_eq!(n.tick().await, PollOutcome::Baseline { count: 5 });
        assert!(rx.try_recv().is_err());

        feed.place(7);
        assert!(n.tick().await.should_notify());
        assert_eq!(rx.try_recv().unwrap(), (Some(7), 2, 7));
        assert!(rx.try_recv().is_err());

        assert_eq!(n.tick().await, PollOutcome::Unchanged { count: 7 });
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_poll_keeps_baseline() {
        let (feed, mut n, mut rx) = notifier();
        n.start();
        feed.set(5);
        n.tick().await;

        feed.fail(true);
        feed.set(6);
        assert_eq!(n.tick().await, PollOutcome::Skipped);
        assert_eq!(n.watch().last_count(), Some(5));
        assert!(rx.try_recv().is_err());

        feed.fail(false);
        n.tick().await;
        assert_eq!(rx.try_recv().unwrap(), (None, 1, 6));
    }

    #[tokio::test]
    async fn notifies_without_order_when_latest_fails() {
        let (feed, mut n, mut rx) = notifier();
        n.start();
        feed.place(5);
        n.tick().await;

        feed.place(8);
        feed.fail_latest(true);
        assert_eq!(n.tick().await, PollOutcome::NewOrders { previous: 5, current: 8 });
        assert_eq!(rx.try_recv().unwrap(), (None, 3, 8));
        assert_eq!(n.watch().last_count(), Some(8));

        feed.fail_latest(false);
        feed.place(9);
        n.tick().await;
        assert_eq!(rx.try_recv().unwrap(), (Some(9), 1, 9));
    }

    #[tokio::test]
    async fn stop_discards_baseline() {
        let (feed, mut n, mut rx) = notifier();
        n.start();
        feed.set(5);
        n.tick().await;
        n.stop();

        feed.set(8);
        n.start();
        assert_eq!(n.tick().await, PollOutcome::Baseline { count: 8 });
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn run_follows_console_sessions() {
        let (feed, n, mut rx) = notifier();
        let (sessions_tx, sessions_rx) = watch::channel(0usize);
        feed.set(5);

        let handle = tokio::spawn(n.run(sessions_rx, Duration::from_millis(10)));

        sessions_tx.send(1).unwrap();
        // let the first poll take the baseline
        tokio::time::sleep(Duration::from_millis(50)).await;
        feed.place(7);

        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("notification")
            .unwrap();
        assert_eq!(got, (Some(7), 2, 7));

        sessions_tx.send(0).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        feed.set(12);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        drop(sessions_tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("notifier exits")
            .unwrap();
    }

    #[tokio::test]
    async fn console_notifier_publishes_new_order() {
        let hub = ConsoleHub::new();
        let mut rx = hub.subscribe();
        ConsoleNotifier::new(hub).notify_new_orders(None, 3, 10);

        match rx.recv().await.unwrap() {
            ConsoleMessage::NewOrder {
                order,
                new_orders,
                total_orders,
            } => {
                assert!(order.is_none());
                assert_eq!(new_orders, 3);
                assert_eq!(total_orders, 10);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
