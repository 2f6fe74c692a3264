use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::order_board::{OrderBoard, Refresh};
use quickbite_types::ports::order_gateway::{OrderSource, OrderStatusUpdater};

/// Owns the polling task; dropping it stops the polling.
pub struct PollingHandle {
    task: JoinHandle<()>,
}

impl PollingHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fetches right away, then every `every`, and whenever a control asks for it.
///
/// The timer is not reset by requested refreshes, so two fetches may overlap;
/// whichever resolves last sets the board.
pub fn spawn_polling<G>(board: Arc<OrderBoard<G>>, every: Duration) -> PollingHandle
where
    G: OrderSource + OrderStatusUpdater,
{
    let signal = board.refresh_signal();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let trigger = tokio::select! {
                _ = ticker.tick() => Refresh::Scheduled,
                _ = signal.notified() => Refresh::Requested,
            };
            // Errors are logged (and surfaced when requested) by the board.
            let _ = board.refresh(trigger).await;
        }
    });
    PollingHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::memory::InMemoryOrders;
    use crate::outbound::notifier::TracingNotifier;
    use quickbite_types::domain::order::{Order, OrderItem, OrderStatus, Rates};

    const RATES: Rates = Rates {
        tax_bps: 0,
        service_fee_bps: 0,
    };

    fn seeded() -> (Arc<OrderBoard<InMemoryOrders>>, InMemoryOrders) {
        let repo = InMemoryOrders::new(RATES);
        repo.insert(
            Order::new(
                "a",
                "A001",
                1,
                vec![OrderItem {
                    name: "Tea".into(),
                    quantity: 1,
                    unit_price_cents: 300,
                }],
                RATES,
            )
            .unwrap(),
        );
        let board = Arc::new(OrderBoard::new(
            Arc::new(repo.clone()),
            Arc::new(TracingNotifier),
        ));
        (board, repo)
    }

    async fn wait_for_status(
        board: &OrderBoard<InMemoryOrders>,
        status: OrderStatus,
    ) -> bool {
        for _ in 0..100 {
            if board.find("a").map(|o| o.status) == Some(status) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn polls_on_an_interval() {
        let (board, repo) = seeded();
        let _handle = spawn_polling(board.clone(), Duration::from_millis(20));

        assert!(wait_for_status(&board, OrderStatus::Pending).await);
        repo.map
            .get_mut("a")
            .unwrap()
            .update_status(OrderStatus::Ready);
        assert!(wait_for_status(&board, OrderStatus::Ready).await);
    }

    #[tokio::test]
    async fn successful_update_triggers_refresh_before_next_tick() {
        let (board, _repo) = seeded();
        let _handle = spawn_polling(board.clone(), Duration::from_secs(3600));
        assert!(wait_for_status(&board, OrderStatus::Pending).await);

        board.advance("a").await.unwrap();
        assert!(wait_for_status(&board, OrderStatus::Confirmed).await);
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_polling() {
        let (board, repo) = seeded();
        let handle = spawn_polling(board.clone(), Duration::from_millis(20));
        assert!(wait_for_status(&board, OrderStatus::Pending).await);
        handle.stop();

        repo.map
            .get_mut("a")
            .unwrap()
            .update_status(OrderStatus::Served);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(board.find("a").unwrap().status, OrderStatus::Pending);
    }
}
