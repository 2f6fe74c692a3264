use quickbite_types::ports::notifier::{Notice, NoticeLevel, Notifier};

/// Emits notices as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(target: "notice", "{}", notice.message),
            NoticeLevel::Error => tracing::warn!(target: "notice", "{}", notice.message),
        }
    }
}
