use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tokio::sync::Notify;

use crate::application::progression::{Outcome, StatusProgression};
use crate::errors::AppError;
use quickbite_types::domain::order::Order;
use quickbite_types::ports::notifier::{Notice, Notifier};
use quickbite_types::ports::order_gateway::{OrderSource, OrderStatusUpdater};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Timer-driven; failures are only logged.
    Scheduled,
    /// Asked for by the user or by a completed update; failures are shown.
    Requested,
}

/// Staff view over all open orders, one progression control per order.
pub struct OrderBoard<G>
where
    G: OrderSource + OrderStatusUpdater,
{
    gateway: Arc<G>,
    notifier: Arc<dyn Notifier>,
    orders: RwLock<Vec<Order>>,
    controls: DashMap<String, Arc<StatusProgression>>,
    refresh_signal: Arc<Notify>,
}

impl<G> OrderBoard<G>
where
    G: OrderSource + OrderStatusUpdater,
{
    pub fn new(gateway: Arc<G>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            orders: RwLock::new(Vec::new()),
            controls: DashMap::new(),
            refresh_signal: Arc::new(Notify::new()),
        }
    }

    /// Fires whenever a control finished an update and wants fresh data.
    pub fn refresh_signal(&self) -> Arc<Notify> {
        self.refresh_signal.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders
            .read()
            .map(|o| o.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Finds an order by id or by order number (a leading `#` is ignored).
    pub fn find(&self, reference: &str) -> Option<Order> {
        let number = reference.trim_start_matches('#');
        self.orders()
            .into_iter()
            .find(|o| o.id == reference || o.order_number.trim_start_matches('#') == number)
    }

    pub fn control(&self, order_id: &str) -> Option<Arc<StatusProgression>> {
        self.controls.get(order_id).map(|c| c.clone())
    }

    pub async fn refresh(&self, trigger: Refresh) -> Result<usize, AppError> {
        match self.gateway.list_orders().await {
            Ok(orders) => {
                self.sync_controls(&orders);
                let count = orders.len();
                match self.orders.write() {
                    Ok(mut guard) => *guard = orders,
                    Err(poisoned) => *poisoned.into_inner() = orders,
                }
                tracing::debug!(count, ?trigger, "orders refreshed");
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(error = %err, ?trigger, "failed to fetch orders");
                if trigger == Refresh::Requested {
                    self.notifier.notify(Notice::error("Failed to fetch orders"));
                }
                Err(err.into())
            }
        }
    }

    fn sync_controls(&self, orders: &[Order]) {
        self.controls
            .retain(|id, _| orders.iter().any(|o| &o.id == id));
        for order in orders {
            if let Some(control) = self.controls.get(&order.id) {
                control.sync_status(order.status);
                continue;
            }
            let signal = self.refresh_signal.clone();
            let updater: Arc<dyn OrderStatusUpdater> = self.gateway.clone();
            let control = StatusProgression::new(
                order.id.clone(),
                order.status,
                updater,
                self.notifier.clone(),
                Arc::new(move || signal.notify_one()),
            );
            self.controls.insert(order.id.clone(), Arc::new(control));
        }
    }

    fn resolve(&self, reference: &str) -> Result<Arc<StatusProgression>, AppError> {
        self.find(reference)
            .and_then(|order| self.control(&order.id))
            .ok_or_else(|| AppError::UnknownOrder(reference.to_string()))
    }

    pub async fn advance(&self, reference: &str) -> Result<Outcome, AppError> {
        let control = self.resolve(reference)?;
        Ok(control.advance().await)
    }

    pub fn request_cancel(&self, reference: &str) -> Result<Outcome, AppError> {
        Ok(self.resolve(reference)?.request_cancel())
    }

    pub fn decline_cancel(&self, reference: &str) -> Result<Outcome, AppError> {
        Ok(self.resolve(reference)?.decline_cancel())
    }

    pub async fn confirm_cancel(&self, reference: &str) -> Result<Outcome, AppError> {
        let control = self.resolve(reference)?;
        Ok(control.confirm_cancel().await)
    }
}
