//! Per-order control that moves an order one step forward or cancels it.
//!
//! The control never rewrites the status it displays. It fires the update,
//! reports the result, and leaves it to the container to hand it a fresh
//! snapshot via [`StatusProgression::sync_status`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quickbite_types::domain::order::OrderStatus;
use quickbite_types::ports::notifier::{Notice, Notifier};
use quickbite_types::ports::order_gateway::OrderStatusUpdater;

/// Called once after every successful update so the container can re-fetch.
pub type OnUpdate = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    ConfirmingCancel,
    Updating,
}

/// What a trigger on the control led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The backend accepted the new status.
    Updated(OrderStatus),
    /// The backend call failed; the user was notified.
    Failed(String),
    /// Cancellation now waits for an explicit confirmation.
    AwaitingConfirmation,
    /// The pending cancellation was declined.
    Declined,
    /// An update for this order is already in flight.
    Suppressed,
    /// The action is not offered in the current state.
    Unavailable,
}

/// Render model of the control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlView {
    /// Disabled "order cancelled" element.
    Cancelled,
    /// Informational only; nothing left to do.
    Served,
    Actions {
        next: Option<OrderStatus>,
        can_cancel: bool,
        busy: bool,
        confirming: bool,
    },
}

#[derive(Debug)]
struct Inner {
    status: OrderStatus,
    state: ControlState,
}

pub struct StatusProgression {
    order_id: String,
    inner: Mutex<Inner>,
    updater: Arc<dyn OrderStatusUpdater>,
    notifier: Arc<dyn Notifier>,
    on_update: OnUpdate,
}

/// Puts the control back to `Idle` when the in-flight request finishes or is dropped.
struct InFlight<'a> {
    control: &'a StatusProgression,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.control.lock().state = ControlState::Idle;
    }
}

impl StatusProgression {
    pub fn new(
        order_id: impl Into<String>,
        status: OrderStatus,
        updater: Arc<dyn OrderStatusUpdater>,
        notifier: Arc<dyn Notifier>,
        on_update: OnUpdate,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            inner: Mutex::new(Inner {
                status,
                state: ControlState::Idle,
            }),
            updater,
            notifier,
            on_update,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn status(&self) -> OrderStatus {
        self.lock().status
    }

    pub fn state(&self) -> ControlState {
        self.lock().state
    }

    pub fn view(&self) -> ControlView {
        let inner = self.lock();
        match inner.status {
            OrderStatus::Cancelled => ControlView::Cancelled,
            OrderStatus::Served => ControlView::Served,
            status => ControlView::Actions {
                next: status.next(),
                can_cancel: status.can_cancel(),
                busy: inner.state == ControlState::Updating,
                confirming: inner.state == ControlState::ConfirmingCancel,
            },
        }
    }

    /// Replaces the displayed status with a canonical one from the backend.
    pub fn sync_status(&self, status: OrderStatus) {
        let mut inner = self.lock();
        if inner.status != status {
            tracing::debug!(order_id = %self.order_id, from = %inner.status, to = %status, "status synced");
        }
        inner.status = status;
        if inner.state == ControlState::ConfirmingCancel && !status.can_cancel() {
            inner.state = ControlState::Idle;
        }
    }

    /// Requests the next status in the sequence. No confirmation needed.
    pub async fn advance(&self) -> Outcome {
        let target = {
            let mut inner = self.lock();
            match inner.state {
                ControlState::Updating => return self.suppressed("advance"),
                ControlState::ConfirmingCancel => return Outcome::Unavailable,
                ControlState::Idle => {}
            }
            let Some(next) = inner.status.next() else {
                return Outcome::Unavailable;
            };
            inner.state = ControlState::Updating;
            next
        };
        self.submit(target).await
    }

    /// Opens the cancel confirmation.
    pub fn request_cancel(&self) -> Outcome {
        let mut inner = self.lock();
        match inner.state {
            ControlState::Updating => self.suppressed("cancel"),
            ControlState::ConfirmingCancel => Outcome::AwaitingConfirmation,
            ControlState::Idle if inner.status.can_cancel() => {
                inner.state = ControlState::ConfirmingCancel;
                Outcome::AwaitingConfirmation
            }
            ControlState::Idle => Outcome::Unavailable,
        }
    }

    pub fn decline_cancel(&self) -> Outcome {
        let mut inner = self.lock();
        if inner.state != ControlState::ConfirmingCancel {
            return Outcome::Unavailable;
        }
        inner.state = ControlState::Idle;
        Outcome::Declined
    }

    /// Sends the cancellation the user just confirmed.
    pub async fn confirm_cancel(&self) -> Outcome {
        {
            let mut inner = self.lock();
            match inner.state {
                ControlState::Updating => return self.suppressed("confirm cancel"),
                ControlState::Idle => return Outcome::Unavailable,
                ControlState::ConfirmingCancel => {}
            }
            if !inner.status.can_cancel() {
                inner.state = ControlState::Idle;
                return Outcome::Unavailable;
            }
            inner.state = ControlState::Updating;
        }
        self.submit(OrderStatus::Cancelled).await
    }

    fn suppressed(&self, action: &str) -> Outcome {
        tracing::debug!(order_id = %self.order_id, action, "update already in flight");
        Outcome::Suppressed
    }

    // Caller has already moved the control to `Updating`.
    async fn submit(&self, target: OrderStatus) -> Outcome {
        let guard = InFlight { control: self };
        let res = self
            .updater
            .update_order_status(&self.order_id, target)
            .await;
        drop(guard);

        match res {
            Ok(()) => {
                tracing::info!(order_id = %self.order_id, status = %target, "order status updated");
                self.notifier
                    .notify(Notice::success(format!("Order status updated to {}", target.label())));
                (self.on_update)();
                Outcome::Updated(target)
            }
            Err(err) => {
                tracing::warn!(order_id = %self.order_id, status = %target, error = %err, "failed to update order status");
                self.notifier
                    .notify(Notice::error("Failed to update order status"));
                Outcome::Failed(err.to_string())
            }
        }
    }
}
