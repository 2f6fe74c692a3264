use async_trait::async_trait;

use crate::domain::bill::Bill;
use crate::domain::order::{Order, OrderStatus};

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Sets the status field of one order upstream.
#[async_trait]
pub trait OrderStatusUpdater: Send + Sync + 'static {
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), GatewayError>;
}

/// Read side used by the order surfaces.
#[async_trait]
pub trait OrderSource: Send + Sync + 'static {
    async fn list_orders(&self) -> Result<Vec<Order>, GatewayError>;
    async fn get_bill(&self, session_id: &str) -> Result<Bill, GatewayError>;
}
