//! Event types published on the notification channel.
//!
//! Actions publish [`Notification`]s so the owning widgets can react to
//! linkage effects; handler diagnostics surface as [`HandlerLog`]s.

use crate::{common::Vars, model::ActionType, runtime::ComponentId};

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

/// Notification published when an action is applied to a target component.
///
/// The engine only requires fire-and-forget publish semantics; widgets
/// subscribe through [`crate::ChannelEvent`] and re-fetch or re-render as
/// appropriate.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Target component the action was applied to.
    pub component_id: ComponentId,
    /// Linkage that produced this notification.
    pub linkage_id: String,
    /// The kind of effect that was applied.
    pub action: ActionType,
    /// Action-specific parameters (the resolved parameter bag).
    pub params: Vars,
}

impl Notification {
    pub fn is_refresh(&self) -> bool {
        matches!(self.action, ActionType::Refresh)
    }
}

/// Diagnostic line emitted during handler or mapping execution.
#[derive(Debug, Clone)]
pub struct HandlerLog {
    /// Linkage whose handler produced this line.
    pub linkage_id: String,
    /// Target component of that linkage.
    pub component_id: ComponentId,
    /// Log message content.
    pub content: String,
    /// Timestamp in milliseconds of the log entry.
    pub timestamp: i64,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}
