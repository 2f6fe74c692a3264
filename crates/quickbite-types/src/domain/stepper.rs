use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::status::{OrderStatus, SEQUENCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Done,
    Current,
    Pending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Density {
    /// First, current and last step only, with gap markers in between.
    Compact,
    #[default]
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DensityError {
    #[error("unknown stepper density {0:?}")]
    UnknownDensity(String),
}

impl FromStr for Density {
    type Err = DensityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Density::Compact),
            "full" => Ok(Density::Full),
            other => Err(DensityError::UnknownDensity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperNode {
    Step { status: OrderStatus, state: StepState },
    /// One or more skipped steps.
    Gap,
    /// Terminal marker appended after the point of cancellation.
    Cancelled,
}

/// The step a cancelled order is drawn as having stopped at.
pub const CANCELLATION_POINT: OrderStatus = OrderStatus::Preparing;

fn effective_index(status: OrderStatus) -> usize {
    match status.sequence_index() {
        Some(idx) => idx,
        None => CANCELLATION_POINT.sequence_index().unwrap_or(0),
    }
}

/// Classifies `step` relative to the order's `status`.
///
/// Returns `None` when `step` is not drawn at all: `step` is not part of the
/// sequence, or the order was cancelled before reaching it.
pub fn step_state(status: OrderStatus, step: OrderStatus) -> Option<StepState> {
    let idx = step.sequence_index()?;
    let current = effective_index(status);
    if idx < current {
        Some(StepState::Done)
    } else if idx == current {
        Some(StepState::Current)
    } else if status == OrderStatus::Cancelled {
        None
    } else {
        Some(StepState::Pending)
    }
}

/// Read-only progress view of one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stepper {
    pub status: OrderStatus,
    pub density: Density,
    pub nodes: Vec<StepperNode>,
}

impl Stepper {
    pub fn new(status: OrderStatus, density: Density) -> Self {
        let nodes = match density {
            Density::Full => full_nodes(status),
            Density::Compact => compact_nodes(status),
        };
        Self {
            status,
            density,
            nodes,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    pub fn steps(&self) -> impl Iterator<Item = (OrderStatus, StepState)> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            StepperNode::Step { status, state } => Some((*status, *state)),
            _ => None,
        })
    }
}

fn node(status: OrderStatus, step: OrderStatus) -> Option<StepperNode> {
    step_state(status, step).map(|state| StepperNode::Step {
        status: step,
        state,
    })
}

fn full_nodes(status: OrderStatus) -> Vec<StepperNode> {
    let mut nodes: Vec<StepperNode> = SEQUENCE.iter().filter_map(|s| node(status, *s)).collect();
    if status == OrderStatus::Cancelled {
        nodes.push(StepperNode::Cancelled);
    }
    nodes
}

fn compact_nodes(status: OrderStatus) -> Vec<StepperNode> {
    let current = effective_index(status);
    if status == OrderStatus::Cancelled {
        return node(status, SEQUENCE[current])
            .into_iter()
            .chain(std::iter::once(StepperNode::Cancelled))
            .collect();
    }

    let last = SEQUENCE.len() - 1;
    let mut shown = vec![current];
    if current > 0 {
        shown.insert(0, 0);
    }
    if current < last {
        shown.push(last);
    }

    let mut nodes = Vec::with_capacity(shown.len() * 2);
    let mut prev: Option<usize> = None;
    for idx in shown {
        if prev.is_some_and(|p| idx - p > 1) {
            nodes.push(StepperNode::Gap);
        }
        nodes.extend(node(status, SEQUENCE[idx]));
        prev = Some(idx);
    }
    nodes
}

impl fmt::Display for Stepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ─ ")?;
            }
            match node {
                StepperNode::Step { status, state } => {
                    let mark = match state {
                        StepState::Done => '✓',
                        StepState::Current => '●',
                        StepState::Pending => '○',
                    };
                    write!(f, "{mark} {}", status.label())?;
                }
                StepperNode::Gap => f.write_str("…")?,
                StepperNode::Cancelled => f.write_str("✕ Cancelled")?,
            }
        }
        Ok(())
    }
}
