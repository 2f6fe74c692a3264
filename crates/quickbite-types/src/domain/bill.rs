use serde::{Deserialize, Serialize};

use super::order::{Order, OrderStatus, Rates, Totals};

/// Everything a table session has ordered, with the running bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub session_id: String,
    pub table_number: u32,
    pub orders: Vec<Order>,
    pub summary: BillSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub tax_rate: String,
    pub service_fee_cents: i64,
    pub service_fee_rate: String,
    pub grand_total_cents: i64,
}

fn percent(bps: u32) -> String {
    let whole = bps / 100;
    let frac = bps % 100;
    if frac == 0 {
        format!("{whole}%")
    } else {
        let frac = format!("{frac:02}");
        format!("{whole}.{}%", frac.trim_end_matches('0'))
    }
}

impl BillSummary {
    /// Sums every order that was not cancelled.
    pub fn from_orders(orders: &[Order], rates: Rates) -> Self {
        let mut sum = Totals::default();
        for order in orders.iter().filter(|o| o.status != OrderStatus::Cancelled) {
            sum += order.totals;
        }
        Self {
            subtotal_cents: sum.subtotal_cents,
            tax_cents: sum.tax_cents,
            tax_rate: percent(rates.tax_bps),
            service_fee_cents: sum.service_fee_cents,
            service_fee_rate: percent(rates.service_fee_bps),
            grand_total_cents: sum.total_cents,
        }
    }
}
