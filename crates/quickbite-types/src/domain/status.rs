use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a submitted order.
///
/// `Pending` through `Served` form a strict sequence; `Cancelled` sits beside
/// it and absorbs any order that has not been served yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

/// The ordered, non-cancelled part of the lifecycle.
pub const SEQUENCE: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Served,
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("invalid order status: {0:?}")]
    InvalidStatus(String),
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Human label shown next to a status. Total over the vocabulary.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::Served => "Served",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Position in [`SEQUENCE`]; `None` for `Cancelled`, which is not part of it.
    pub fn sequence_index(self) -> Option<usize> {
        SEQUENCE.iter().position(|s| *s == self)
    }

    /// The status one step forward, if advancing is legal.
    pub fn next(self) -> Option<OrderStatus> {
        let idx = self.sequence_index()?;
        SEQUENCE.get(idx + 1).copied()
    }

    pub fn can_advance(self) -> bool {
        self.next().is_some()
    }

    pub fn can_cancel(self) -> bool {
        !matches!(self, OrderStatus::Served | OrderStatus::Cancelled)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Served | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusError::InvalidStatus(s.to_string()))
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = StatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
