//! Completion and notification closure types.

use std::sync::Arc;

/// One-shot completion for a remote operation.
///
/// Invoked exactly once from inside a platform tick, or dropped without
/// being invoked if the platform is released first.
pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Repeating notification handler (e.g. auth expiration).
pub type Notify<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Handle returned when registering a [`Notify`] handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(pub u64);

impl NotificationId {
    /// Returned when registration failed.
    pub const INVALID: NotificationId = NotificationId(0);

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}
