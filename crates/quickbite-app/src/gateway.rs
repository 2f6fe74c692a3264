use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use quickbite_client::QuickBiteClient;
use quickbite_core::config::Config;
use quickbite_core::outbound::memory::InMemoryOrders;
use quickbite_types::domain::bill::Bill;
use quickbite_types::domain::order::{Order, OrderItem, OrderStatus, Rates};
use quickbite_types::ports::credentials::CredentialProvider;
use quickbite_types::ports::order_gateway::{GatewayError, OrderSource, OrderStatusUpdater};

pub const MEMORY_SCHEME: &str = "memory:";
pub const DEMO_SESSION: &str = "demo-session";

const DEMO_RATES: Rates = Rates {
    tax_bps: 800,
    service_fee_bps: 1_000,
};

/// Backend the console talks to.
pub enum Gateway {
    Http(QuickBiteClient),
    Memory(InMemoryOrders),
}

pub fn build_gateway(
    config: &Config,
    credentials: Arc<dyn CredentialProvider>,
) -> anyhow::Result<Gateway> {
    if config.api_base_url.starts_with(MEMORY_SCHEME) {
        let session = credentials
            .session_id()
            .unwrap_or_else(|| DEMO_SESSION.to_string());
        let memory = InMemoryOrders::new(DEMO_RATES);
        seed_demo(&memory, &session)?;
        tracing::info!(%session, "using in-memory orders");
        return Ok(Gateway::Memory(memory));
    }

    let client = QuickBiteClient::builder(&config.api_base_url)?
        .with_timeout(config.request_timeout)
        .with_credentials(credentials)
        .build()
        .context("failed to build http client")?;
    tracing::info!(base = %config.api_base_url, "using http backend");
    Ok(Gateway::Http(client))
}

fn item(name: &str, quantity: u32, unit_price_cents: i64) -> OrderItem {
    OrderItem {
        name: name.into(),
        quantity,
        unit_price_cents,
    }
}

fn seed_demo(memory: &InMemoryOrders, session: &str) -> anyhow::Result<()> {
    let demo = [
        ("A001", 4, OrderStatus::Served, vec![item("Miso soup", 2, 450)], 35),
        (
            "A002",
            4,
            OrderStatus::Preparing,
            vec![item("Tonkotsu ramen", 2, 1_350), item("Gyoza", 1, 700)],
            20,
        ),
        ("A003", 7, OrderStatus::Pending, vec![item("Green tea", 3, 300)], 2),
        ("A004", 2, OrderStatus::Cancelled, vec![item("Katsu curry", 1, 1_500)], 50),
    ];
    let now = chrono::Utc::now();
    for (number, table, status, items, minutes_ago) in demo {
        let mut order = Order::new(format!("demo-{number}"), number, table, items, DEMO_RATES)?;
        order.status = status;
        order.created_at = now - chrono::Duration::minutes(minutes_ago);
        if table == 4 {
            memory.insert_for_session(session, order);
        } else {
            memory.insert(order);
        }
    }
    Ok(())
}

#[async_trait]
impl OrderStatusUpdater for Gateway {
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), GatewayError> {
        match self {
            Gateway::Http(client) => {
                OrderStatusUpdater::update_order_status(client, order_id, status).await
            }
            Gateway::Memory(memory) => memory.update_order_status(order_id, status).await,
        }
    }
}

#[async_trait]
impl OrderSource for Gateway {
    async fn list_orders(&self) -> Result<Vec<Order>, GatewayError> {
        match self {
            Gateway::Http(client) => client.list_orders().await,
            Gateway::Memory(memory) => memory.list_orders().await,
        }
    }

    async fn get_bill(&self, session_id: &str) -> Result<Bill, GatewayError> {
        match self {
            Gateway::Http(client) => OrderSource::get_bill(client, session_id).await,
            Gateway::Memory(memory) => memory.get_bill(session_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickbite_types::domain::stepper::Density;
    use quickbite_types::ports::credentials::StaticCredentials;
    use std::time::Duration;

    fn config(base: &str) -> Config {
        Config {
            api_base_url: base.into(),
            poll_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
            admin_token: None,
            session_id: None,
            stepper_density: Density::Full,
        }
    }

    #[tokio::test]
    async fn memory_scheme_seeds_demo_orders() {
        let creds = Arc::new(StaticCredentials::default());
        let gateway = build_gateway(&config("memory://"), creds).unwrap();
        assert!(matches!(gateway, Gateway::Memory(_)));

        let orders = gateway.list_orders().await.unwrap();
        assert_eq!(orders.len(), 4);
        // Newest first.
        assert_eq!(orders[0].order_number, "A003");

        let bill = gateway.get_bill(DEMO_SESSION).await.unwrap();
        assert_eq!(bill.table_number, 4);
        assert_eq!(bill.orders.len(), 2);
    }

    #[test]
    fn http_scheme_builds_client() {
        let creds = Arc::new(StaticCredentials::default());
        let gateway = build_gateway(&config("http://localhost:3001/api"), creds).unwrap();
        assert!(matches!(gateway, Gateway::Http(_)));
    }
}
