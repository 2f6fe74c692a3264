use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use super::status::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl OrderItem {
    pub fn subtotal_cents(&self) -> i64 {
        self.quantity as i64 * self.unit_price_cents
    }
}

/// Tax and service fee rates in basis points (1/100 of a percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rates {
    pub tax_bps: u32,
    pub service_fee_bps: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub service_fee_cents: i64,
    pub total_cents: i64,
}

fn apply_bps(amount: i64, bps: u32) -> i64 {
    // Half-up rounding; amounts are never negative here.
    (amount * bps as i64 + 5_000) / 10_000
}

impl Totals {
    pub fn compute(items: &[OrderItem], rates: Rates) -> Self {
        let subtotal_cents: i64 = items.iter().map(OrderItem::subtotal_cents).sum();
        let tax_cents = apply_bps(subtotal_cents, rates.tax_bps);
        let service_fee_cents = apply_bps(subtotal_cents, rates.service_fee_bps);
        Self {
            subtotal_cents,
            tax_cents,
            service_fee_cents,
            total_cents: subtotal_cents + tax_cents + service_fee_cents,
        }
    }
}

impl std::ops::AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.subtotal_cents += rhs.subtotal_cents;
        self.tax_cents += rhs.tax_cents;
        self.service_fee_cents += rhs.service_fee_cents;
        self.total_cents += rhs.total_cents;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    pub order_number: String,
    pub table_number: u32,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    #[serde(flatten)]
    pub totals: Totals,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        order_number: impl Into<String>,
        table_number: u32,
        items: Vec<OrderItem>,
        rates: Rates,
    ) -> anyhow::Result<Self> {
        let id = id.into();
        let order_number = order_number.into();
        if id.trim().is_empty() {
            anyhow::bail!("order id empty");
        }
        if order_number.trim().is_empty() {
            anyhow::bail!("order number empty");
        }
        if items.is_empty() {
            anyhow::bail!("items empty");
        }
        for it in &items {
            if it.quantity == 0 {
                anyhow::bail!("item quantity must be > 0");
            }
            if it.unit_price_cents < 0 {
                anyhow::bail!("item price must not be negative");
            }
        }
        let totals = Totals::compute(&items, rates);
        Ok(Self {
            id,
            order_number,
            table_number,
            status: OrderStatus::Pending,
            items,
            totals,
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|it| it.quantity).sum()
    }

    pub fn update_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Some(Utc::now());
    }
}
