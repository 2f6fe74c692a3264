use async_trait::async_trait;
use dashmap::DashMap;
use quickbite_types::domain::bill::{Bill, BillSummary};
use quickbite_types::domain::order::{Order, OrderStatus, Rates};
use quickbite_types::ports::order_gateway::{GatewayError, OrderSource, OrderStatusUpdater};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Gateway kept entirely in process memory.
#[derive(Clone)]
pub struct InMemoryOrders {
    pub map: Arc<DashMap<String, Order>>,
    sessions: Arc<DashMap<String, Vec<String>>>,
    rates: Rates,
    fail_updates: Arc<AtomicBool>,
    fail_lists: Arc<AtomicBool>,
    update_calls: Arc<AtomicUsize>,
}

impl InMemoryOrders {
    pub fn new(rates: Rates) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            sessions: Arc::new(DashMap::new()),
            rates,
            fail_updates: Arc::new(AtomicBool::new(false)),
            fail_lists: Arc::new(AtomicBool::new(false)),
            update_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn insert(&self, order: Order) {
        self.map.insert(order.id.clone(), order);
    }

    /// Inserts `order` and books it onto a table session's bill.
    pub fn insert_for_session(&self, session_id: &str, order: Order) {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .push(order.id.clone());
        self.insert(order);
    }

    pub fn status_of(&self, order_id: &str) -> Option<OrderStatus> {
        self.map.get(order_id).map(|o| o.status)
    }

    /// Makes every following status update fail until reset.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Makes every following order listing fail until reset.
    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStatusUpdater for InMemoryOrders {
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), GatewayError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected("status updates are failing".into()));
        }
        match self.map.get_mut(order_id) {
            Some(mut order) => {
                order.update_status(status);
                Ok(())
            }
            None => Err(GatewayError::NotFound(format!("order {order_id}"))),
        }
    }
}

#[async_trait]
impl OrderSource for InMemoryOrders {
    async fn list_orders(&self) -> Result<Vec<Order>, GatewayError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(GatewayError::Request("order listing is failing".into()));
        }
        let mut orders: Vec<Order> = self.map.iter().map(|kv| kv.value().clone()).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn get_bill(&self, session_id: &str) -> Result<Bill, GatewayError> {
        let ids = self
            .sessions
            .get(session_id)
            .map(|ids| ids.clone())
            .ok_or_else(|| GatewayError::NotFound(format!("session {session_id}")))?;
        let mut orders: Vec<Order> = ids
            .iter()
            .filter_map(|id| self.map.get(id).map(|o| o.clone()))
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let table_number = orders.first().map(|o| o.table_number).unwrap_or_default();
        let summary = BillSummary::from_orders(&orders, self.rates);
        Ok(Bill {
            session_id: session_id.to_string(),
            table_number,
            orders,
            summary,
        })
    }
}
