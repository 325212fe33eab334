use crate::broker::Broker;
use crate::error::CloseError;
use crate::types::{ActionRequest, ActionState};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{info, warn};

/// Manual kill-switch. Executes the operator's close command against the
/// venue with at most one in-flight request per symbol; a duplicate while
/// the first is pending is rejected as Busy without touching the venue.
///
/// A successful close nudges the scheduler (via `refresh`) so the closed
/// position drops off the open-positions view without waiting out the
/// sleep.
pub struct PositionActionController {
    broker: Arc<dyn Broker>,
    refresh: Arc<Notify>,
    pending: Mutex<HashSet<String>>,
}

impl PositionActionController {
    pub fn new(broker: Arc<dyn Broker>, refresh: Arc<Notify>) -> Self {
        Self {
            broker,
            refresh,
            pending: Mutex::new(HashSet::new()),
        }
    }

    pub async fn request_close(&self, symbol: &str) -> Result<ActionRequest, CloseError> {
        // Claim the per-symbol slot before the venue sees anything.
        if !self.pending.lock().unwrap().insert(symbol.to_string()) {
            return Err(CloseError::Busy(symbol.to_string()));
        }

        let mut request = ActionRequest::new(symbol);
        let result = self.broker.close_position(symbol).await;

        // Resolved either way; the slot frees up for a future retry.
        self.pending.lock().unwrap().remove(symbol);

        match result {
            Ok(()) => {
                request.state = ActionState::Succeeded;
                info!(
                    "close order accepted for {} in {}ms, refreshing now",
                    request.symbol,
                    (Utc::now() - request.requested_at).num_milliseconds()
                );
                self.refresh.notify_one();
                Ok(request)
            }
            Err(e) => {
                request.state = ActionState::Failed;
                warn!("close order for {symbol} failed: {e}");
                Err(CloseError::Broker(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrokerError;
    use crate::types::{AccountSnapshot, DailyBar, Position};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Venue stub: counts close calls, optionally slow, optionally failing.
    struct StubBroker {
        close_calls: AtomicUsize,
        close_delay: Duration,
        fail_close: bool,
    }

    impl StubBroker {
        fn new(close_delay: Duration, fail_close: bool) -> Self {
            Self {
                close_calls: AtomicUsize::new(0),
                close_delay,
                fail_close,
            }
        }
    }

    #[async_trait]
    impl Broker for StubBroker {
        async fn fetch_account(&self) -> Result<AccountSnapshot, BrokerError> {
            unimplemented!("not used by the controller")
        }

        async fn list_open_positions(&self) -> Result<Vec<Position>, BrokerError> {
            unimplemented!("not used by the controller")
        }

        async fn fetch_daily_bars(
            &self,
            _symbols: &[String],
            _lookback_days: i64,
        ) -> Result<HashMap<String, Vec<DailyBar>>, BrokerError> {
            unimplemented!("not used by the controller")
        }

        async fn close_position(&self, _symbol: &str) -> Result<(), BrokerError> {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.close_delay).await;
            if self.fail_close {
                Err(BrokerError::Action("rejected by venue".into()))
            } else {
                Ok(())
            }
        }
    }

    fn controller(broker: Arc<StubBroker>) -> (Arc<PositionActionController>, Arc<Notify>) {
        let refresh = Arc::new(Notify::new());
        let controller = Arc::new(PositionActionController::new(broker, Arc::clone(&refresh)));
        (controller, refresh)
    }

    #[tokio::test]
    async fn duplicate_request_is_busy_and_issues_no_second_order() {
        let broker = Arc::new(StubBroker::new(Duration::from_millis(50), false));
        let (controller, _refresh) = controller(Arc::clone(&broker));

        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.request_close("SPY").await })
        };
        // Let the first request reach the venue before the duplicate.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = controller.request_close("SPY").await;
        assert!(matches!(second, Err(CloseError::Busy(ref s)) if s == "SPY"));

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.state, ActionState::Succeeded);
        assert_eq!(broker.close_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_symbols_are_not_blocked() {
        let broker = Arc::new(StubBroker::new(Duration::from_millis(50), false));
        let (controller, _refresh) = controller(Arc::clone(&broker));

        let spy = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.request_close("SPY").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // A different symbol goes straight through.
        let gld = controller.request_close("GLD").await.unwrap();
        assert_eq!(gld.state, ActionState::Succeeded);

        spy.await.unwrap().unwrap();
        assert_eq!(broker.close_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resolution_frees_the_symbol_for_retry() {
        let broker = Arc::new(StubBroker::new(Duration::ZERO, true));
        let (controller, _refresh) = controller(Arc::clone(&broker));

        let first = controller.request_close("SPY").await;
        assert!(matches!(first, Err(CloseError::Broker(_))));

        // The failed request cleared its slot; a retry reaches the venue.
        let second = controller.request_close("SPY").await;
        assert!(matches!(second, Err(CloseError::Broker(_))));
        assert_eq!(broker.close_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn success_signals_an_immediate_refresh() {
        let broker = Arc::new(StubBroker::new(Duration::ZERO, false));
        let (controller, refresh) = controller(broker);

        controller.request_close("GLD").await.unwrap();

        // The stored permit resolves a waiter immediately.
        tokio::time::timeout(Duration::from_millis(50), refresh.notified())
            .await
            .expect("refresh interrupt was not signalled");
    }

    #[tokio::test]
    async fn failure_does_not_signal_a_refresh() {
        let broker = Arc::new(StubBroker::new(Duration::ZERO, true));
        let (controller, refresh) = controller(broker);

        controller.request_close("GLD").await.unwrap_err();

        let woke = tokio::time::timeout(Duration::from_millis(20), refresh.notified()).await;
        assert!(woke.is_err());
    }
}
